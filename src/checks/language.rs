// SPDX-License-Identifier: PMPL-1.0-or-later
//! Document-level metadata - WCAG 3.1.1 Language of Page, 2.4.2 Page Titled

use super::{issue_at, Check, DOCUMENT_KINDS};
use crate::context::ScanContext;
use crate::markup::non_blank_attribute;
use crate::model::{Dialect, Issue, Rule};
use regex::Regex;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<\s*html(?P<attrs>[^>]*)>").expect("valid regex"));

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*title(?P<attrs>[^>]*)>(?P<content>.*?)</\s*title\s*>").expect("valid regex")
});

/// Flags an `<html>` element without `lang` or `xml:lang`
pub struct MissingDocumentLanguageCheck;

impl Check for MissingDocumentLanguageCheck {
    fn id(&self) -> &str {
        "missing-document-language"
    }

    fn description(&self) -> &str {
        "Checks the document declares its language (WCAG 3.1.1)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        DOCUMENT_KINDS
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        if context.fragment {
            return Vec::new();
        }
        // fragments without an <html> element are not judged
        let Some(caps) = HTML_TAG.captures(&context.content) else {
            return Vec::new();
        };
        let Some(whole) = caps.get(0) else {
            return Vec::new();
        };
        let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
        if non_blank_attribute(attrs, "lang").is_some() || non_blank_attribute(attrs, "xml:lang").is_some() {
            return Vec::new();
        }

        vec![issue_at(
            self.id(),
            context,
            rule,
            whole.start(),
            "Document language is missing or empty.",
            whole.as_str(),
        )]
    }
}

/// Flags documents with no `<title>`, or only empty ones
pub struct MissingPageTitleCheck;

impl Check for MissingPageTitleCheck {
    fn id(&self) -> &str {
        "missing-page-title"
    }

    fn description(&self) -> &str {
        "Checks the document has a non-empty title (WCAG 2.4.2)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        DOCUMENT_KINDS
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        if context.fragment {
            return Vec::new();
        }
        let titles: Vec<_> = TITLE.captures_iter(&context.content).collect();

        let Some(first) = titles.first().and_then(|caps| caps.get(0)) else {
            return vec![Issue::new(rule, self.id(), &context.file_path, 1, "Document title is missing.")
                .with_evidence(&context.content)];
        };

        let has_text = titles.iter().any(|caps| {
            caps.name("content")
                .map(|m| !m.as_str().trim().is_empty())
                .unwrap_or(false)
        });
        if has_text {
            return Vec::new();
        }

        vec![issue_at(
            self.id(),
            context,
            rule,
            first.start(),
            "Document title is missing or empty.",
            first.as_str(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::run_raw;

    #[test]
    fn test_document_language() {
        let missing = "<!DOCTYPE html>\n<html class=\"no-js\">\n<body></body></html>";
        let issues = run_raw(&MissingDocumentLanguageCheck, Dialect::Html, missing);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].evidence.as_deref(), Some("<html class=\"no-js\">"));

        assert!(run_raw(&MissingDocumentLanguageCheck, Dialect::Html, "<html lang=\"en\">").is_empty());
        assert!(run_raw(&MissingDocumentLanguageCheck, Dialect::Html, "<html xml:lang=\"fr\">").is_empty());
        assert_eq!(run_raw(&MissingDocumentLanguageCheck, Dialect::Html, "<html lang=\" \">").len(), 1);
    }

    #[test]
    fn test_fragment_without_html_element_is_skipped() {
        assert!(run_raw(&MissingDocumentLanguageCheck, Dialect::Html, "<div>partial</div>").is_empty());
    }

    #[test]
    fn test_script_fragments_are_not_pages() {
        let fragment = ScanContext::raw("app.js", "<html><span>ok</span></html>", Dialect::Html, Some(Dialect::Js))
            .as_fragment();
        let lang = crate::checks::testing::rule("missing-document-language");
        let title = crate::checks::testing::rule("missing-page-title");
        assert!(MissingDocumentLanguageCheck.run(&fragment, &lang).is_empty());
        assert!(MissingPageTitleCheck.run(&fragment, &title).is_empty());
    }

    #[test]
    fn test_page_title_missing() {
        let content = "<html><head></head></html>";
        let issues = run_raw(&MissingPageTitleCheck, Dialect::Html, content);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 1);
        assert_eq!(issues[0].message, "Document title is missing.");
        assert_eq!(issues[0].evidence.as_deref(), Some(content));
    }

    #[test]
    fn test_page_title_empty() {
        let content = "<html><head>\n<title>  </title>\n</head></html>";
        let issues = run_raw(&MissingPageTitleCheck, Dialect::Html, content);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].message, "Document title is missing or empty.");

        let titled = "<title></title><TITLE>Home</TITLE>";
        assert!(run_raw(&MissingPageTitleCheck, Dialect::Html, titled).is_empty());
    }
}
