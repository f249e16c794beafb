// SPDX-License-Identifier: PMPL-1.0-or-later
//! Image alt text - WCAG 1.1.1 Non-text Content (Level A)
//!
//! Every `<img>` needs a non-blank `alt`. Template `img`/`image` macros are
//! held to the same standard through their `alt` parameter.

use super::{element_issue, issue_at, Check, SourceSpans, HTML_FAMILY};
use crate::context::template::{collect_macros, macro_name_matches};
use crate::context::ScanContext;
use crate::markup::non_blank_attribute;
use crate::model::{Dialect, Issue, Rule};
use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

static IMG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img(?P<attrs>[^>]*)>").expect("valid regex"));

const MESSAGE: &str = "Image missing alt text.";

/// Flags images without alternative text
pub struct MissingAltTextCheck;

impl Check for MissingAltTextCheck {
    fn id(&self) -> &str {
        "missing-alt-text"
    }

    fn description(&self) -> &str {
        "Checks <img> elements and image macros for alt text (WCAG 1.1.1)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let mut issues: Vec<Issue> = match &context.tree {
            Some(tree) => {
                let images = Selector::parse("img").expect("valid selector");
                let spans = SourceSpans::new(&context.content, &IMG);
                tree.select(&images)
                    .enumerate()
                    .filter(|(_, img)| {
                        img.value().attr("alt").map(|a| a.trim().is_empty()).unwrap_or(true)
                    })
                    .map(|(n, img)| element_issue(self.id(), context, rule, spans.locate(n, &img), MESSAGE))
                    .collect()
            }
            None => IMG
                .captures_iter(&context.content)
                .filter(|caps| {
                    let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
                    non_blank_attribute(attrs, "alt").is_none()
                })
                .filter_map(|caps| caps.get(0))
                .map(|m| issue_at(self.id(), context, rule, m.start(), MESSAGE, m.as_str()))
                .collect(),
        };

        for call in collect_macros(&context.content) {
            if !macro_name_matches(call.name, &["img", "image"]) {
                continue;
            }
            if non_blank_attribute(call.attrs, "alt").is_some() {
                continue;
            }
            issues.push(issue_at(self.id(), context, rule, call.index, MESSAGE, call.raw));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{run_raw, run_tree};

    #[test]
    fn test_missing_and_blank_alt() {
        let content = "<p>\n<img src=\"a.png\">\n<img src=\"b.png\" alt=\"  \">\n<img src=\"c.png\" alt=\"Chart\">";
        let issues = run_raw(&MissingAltTextCheck, Dialect::Html, content);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].message, "Image missing alt text.");
        assert_eq!(issues[0].evidence.as_deref(), Some("<img src=\"a.png\">"));
        assert_eq!(issues[1].line, 3);
    }

    #[test]
    fn test_image_macros() {
        let content = "<@ui.image src=\"a.png\"/>\n<@img src=\"b.png\" alt=\"Logo\"/>\n<@icon/>";
        let issues = run_raw(&MissingAltTextCheck, Dialect::Html, content);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 1);
        assert_eq!(issues[0].evidence.as_deref(), Some("<@ui.image src=\"a.png\"/>"));
    }

    #[test]
    fn test_tree_path_matches_raw_path() {
        let content = "<html><body>\n<img src=\"a.png\">\n<img alt=\"ok\" src=\"b.png\">\n</body></html>";
        let raw = run_raw(&MissingAltTextCheck, Dialect::Html, content);
        let tree = run_tree(&MissingAltTextCheck, content);
        assert_eq!(raw, tree);
    }
}
