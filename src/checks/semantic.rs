// SPDX-License-Identifier: PMPL-1.0-or-later
//! Structure and relationships - WCAG 1.3.1 Info and Relationships,
//! 2.4.4 Link Purpose, 4.1.1 Parsing

use super::names::{resolve_name, NamePolicy, NameScope, RawElement};
use super::{element_issue, issue_at, Check, SourceSpans, HTML_FAMILY};
use crate::context::template::{collect_macros, macro_name_matches};
use crate::context::ScanContext;
use crate::markup::{attribute_value, non_blank_attribute};
use crate::model::{Dialect, Issue, Rule};
use regex::Regex;
use scraper::Selector;
use std::collections::HashSet;
use std::sync::LazyLock;

static TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<table(?P<attrs>[^>]*)>(?P<content>.*?)</table>").expect("valid regex")
});

static HEADER_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<th\b").expect("valid regex"));

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<a(?P<attrs>(?:\s[^>]*)?)>(?P<body>[\s\S]*?)</a>").expect("valid regex")
});

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?P<tag>[a-zA-Z][a-zA-Z0-9:-]*)(?P<attrs>[^>]*)>").expect("valid regex")
});

/// Macro links are named by attributes or body text only
const MACRO_LINK: NamePolicy = NamePolicy {
    labels: false,
    content: true,
    image_alt: false,
    native_value: false,
};

/// Flags data tables with no `<th>` cells
pub struct MissingTableHeadersCheck;

impl Check for MissingTableHeadersCheck {
    fn id(&self) -> &str {
        "missing-table-headers"
    }

    fn description(&self) -> &str {
        "Checks data tables declare header cells (WCAG 1.3.1)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let mut issues = Vec::new();
        for caps in TABLE.captures_iter(&context.content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
            let layout = attribute_value(attrs, "role")
                .map(|role| role.eq_ignore_ascii_case("presentation") || role.eq_ignore_ascii_case("none"))
                .unwrap_or(false);
            if layout {
                continue;
            }
            let body = caps.name("content").map(|m| m.as_str()).unwrap_or_default();
            if HEADER_CELL.is_match(body) {
                continue;
            }
            issues.push(issue_at(
                self.id(),
                context,
                rule,
                whole.start(),
                "Table missing header cells.",
                whole.as_str(),
            ));
        }
        issues
    }
}

/// Flags links with no accessible name
pub struct MissingLinkTextCheck;

const LINK_MESSAGE: &str = "Link missing accessible text.";

impl MissingLinkTextCheck {
    fn run_raw(&self, context: &ScanContext, rule: &Rule, scope: &NameScope) -> Vec<Issue> {
        ANCHOR
            .captures_iter(&context.content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let link = RawElement {
                    attrs: caps.name("attrs").map(|m| m.as_str()).unwrap_or_default(),
                    body: caps.name("body").map(|m| m.as_str()),
                    index: whole.start(),
                    label_ranges: &[],
                };
                if resolve_name(&link, scope, NamePolicy::LINK).is_some() {
                    return None;
                }
                Some(issue_at(self.id(), context, rule, whole.start(), LINK_MESSAGE, whole.as_str()))
            })
            .collect()
    }
}

impl Check for MissingLinkTextCheck {
    fn id(&self) -> &str {
        "missing-link-text"
    }

    fn description(&self) -> &str {
        "Checks links and link macros have accessible text (WCAG 2.4.4)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let scope = match &context.tree {
            Some(tree) => NameScope::from_tree(tree),
            None => NameScope::from_markup(&context.content),
        };

        let mut issues: Vec<Issue> = match &context.tree {
            Some(tree) => {
                let anchors = Selector::parse("a").expect("valid selector");
                let spans = SourceSpans::new(&context.content, &ANCHOR);
                tree.select(&anchors)
                    .enumerate()
                    .filter(|(_, link)| resolve_name(link, &scope, NamePolicy::LINK).is_none())
                    .map(|(n, link)| element_issue(self.id(), context, rule, spans.locate(n, &link), LINK_MESSAGE))
                    .collect()
            }
            None => self.run_raw(context, rule, &scope),
        };

        for call in collect_macros(&context.content) {
            if !macro_name_matches(call.name, &["a", "link"]) {
                continue;
            }
            let label = non_blank_attribute(call.attrs, "label")
                .or_else(|| non_blank_attribute(call.attrs, "text"))
                .unwrap_or(call.body);
            let link = RawElement {
                attrs: call.attrs,
                body: Some(label),
                index: call.index,
                label_ranges: &[],
            };
            if resolve_name(&link, &scope, MACRO_LINK).is_none() {
                issues.push(issue_at(self.id(), context, rule, call.index, LINK_MESSAGE, call.raw));
            }
        }

        issues
    }
}

/// Flags every repeat of an element id (ids compare case-sensitively)
pub struct DuplicateIdCheck;

fn has_id_attribute(attrs: &str) -> bool {
    attribute_value(attrs, "id").is_some()
}

impl Check for DuplicateIdCheck {
    fn id(&self) -> &str {
        "duplicate-id"
    }

    fn description(&self) -> &str {
        "Checks element ids are unique within the document (WCAG 4.1.1)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut issues = Vec::new();

        match &context.tree {
            Some(tree) => {
                let with_id = Selector::parse("[id]").expect("valid selector");
                let spans = SourceSpans::matching(&context.content, &OPEN_TAG, |caps| {
                    caps.name("attrs").map(|m| has_id_attribute(m.as_str())).unwrap_or(false)
                });
                for (n, element) in tree.select(&with_id).enumerate() {
                    let Some(id) = element.value().attr("id").filter(|id| !id.is_empty()) else {
                        continue;
                    };
                    if !seen.insert(id.to_string()) {
                        issues.push(element_issue(
                            self.id(),
                            context,
                            rule,
                            spans.locate(n, &element),
                            &format!("Duplicate id found: {}.", id),
                        ));
                    }
                }
            }
            None => {
                for caps in OPEN_TAG.captures_iter(&context.content) {
                    let (Some(whole), Some(attrs)) = (caps.get(0), caps.name("attrs")) else {
                        continue;
                    };
                    let Some(id) = attribute_value(attrs.as_str(), "id").filter(|id| !id.is_empty()) else {
                        continue;
                    };
                    if !seen.insert(id.to_string()) {
                        issues.push(issue_at(
                            self.id(),
                            context,
                            rule,
                            whole.start(),
                            &format!("Duplicate id found: {}.", id),
                            whole.as_str(),
                        ));
                    }
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{run_raw, run_tree};

    #[test]
    fn test_table_headers() {
        let html = "<table>\n<tr><td>1</td></tr>\n</table>\n<table role=\"presentation\"><tr><td>x</td></tr></table>\n<table><tr><th>H</th></tr></table>";
        let issues = run_raw(&MissingTableHeadersCheck, Dialect::Html, html);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 1);
        assert_eq!(issues[0].message, "Table missing header cells.");
    }

    #[test]
    fn test_thead_is_not_a_header_cell() {
        let html = "<table><thead><tr><td>x</td></tr></thead></table>";
        assert_eq!(run_raw(&MissingTableHeadersCheck, Dialect::Html, html).len(), 1);
    }

    #[test]
    fn test_link_text_sources() {
        let html = concat!(
            "<a href=\"/a\">Home</a>\n",
            "<a href=\"/b\"><img src=\"x.png\" alt=\"Profile\"></a>\n",
            "<a href=\"/c\" aria-labelledby=\"hint\"></a><span id=\"hint\">Help</span>\n",
            "<a href=\"/d\"><img src=\"y.png\"></a>\n",
            "<a href=\"/e\" aria-labelledby=\"nothing\"> </a>"
        );
        let raw = run_raw(&MissingLinkTextCheck, Dialect::Html, html);
        let lines: Vec<usize> = raw.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![4, 5]);
        assert_eq!(raw[0].message, "Link missing accessible text.");
    }

    #[test]
    fn test_link_tree_matches_raw() {
        let html = "<html><body>\n<a href=\"/a\"></a>\n<abbr title=\"x\">X</abbr>\n<a href=\"/b\" title=\"Next\"></a>\n<a href=\"/c\"> </a>\n</body></html>";
        let raw = run_raw(&MissingLinkTextCheck, Dialect::Html, html);
        let tree = run_tree(&MissingLinkTextCheck, html);
        assert_eq!(raw.len(), 2);
        assert_eq!(raw, tree);
    }

    #[test]
    fn test_link_macros() {
        let ftl = "<@nav.link href=\"/a\" label=\"Account\"/>\n<@link href=\"/b\"/>\n<@a href=\"/c\">Contact</@a>";
        let issues = run_raw(&MissingLinkTextCheck, Dialect::Html, ftl);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].evidence.as_deref(), Some("<@link href=\"/b\"/>"));
    }

    #[test]
    fn test_duplicate_ids_are_case_sensitive() {
        let html = "<div id=\"main\">\n<p id=\"Main\"></p>\n<span id=\"main\"></span>\n<em id=\"main\"></em>\n</div>";
        let issues = run_raw(&DuplicateIdCheck, Dialect::Html, html);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].line, 3);
        assert_eq!(issues[0].message, "Duplicate id found: main.");
        assert_eq!(issues[0].evidence.as_deref(), Some("<span id=\"main\">"));
        assert_eq!(issues[1].line, 4);
    }

    #[test]
    fn test_duplicate_id_tree_matches_raw() {
        let html = "<html><body>\n<div id=\"a\"></div>\n<div id=\"b\"></div>\n<p id=\"a\">x</p>\n</body></html>";
        assert_eq!(run_tree(&DuplicateIdCheck, html), run_raw(&DuplicateIdCheck, Dialect::Html, html));
    }
}
