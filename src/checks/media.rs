// SPDX-License-Identifier: PMPL-1.0-or-later
//! Embedded frames - WCAG 4.1.2 Name, Role, Value

use super::{element_issue, issue_at, Check, SourceSpans, HTML_FAMILY};
use crate::context::template::{collect_macros, macro_name_matches};
use crate::context::ScanContext;
use crate::markup::non_blank_attribute;
use crate::model::{Dialect, Issue, Rule};
use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

static IFRAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<iframe\b(?P<attrs>(?:[^>"']|"[^"]*"|'[^']*')*)\s*/?>"#).expect("valid regex")
});

const MESSAGE: &str = "Iframe missing title attribute.";

/// Flags iframes (and `iframe` macros) without a title
pub struct MissingIframeTitleCheck;

impl Check for MissingIframeTitleCheck {
    fn id(&self) -> &str {
        "missing-iframe-title"
    }

    fn description(&self) -> &str {
        "Checks iframes carry a descriptive title (WCAG 4.1.2)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let mut issues: Vec<Issue> = match &context.tree {
            Some(tree) => {
                let frames = Selector::parse("iframe").expect("valid selector");
                let spans = SourceSpans::new(&context.content, &IFRAME);
                tree.select(&frames)
                    .enumerate()
                    .filter(|(_, frame)| {
                        frame.value().attr("title").map(|t| t.trim().is_empty()).unwrap_or(true)
                    })
                    .map(|(n, frame)| element_issue(self.id(), context, rule, spans.locate(n, &frame), MESSAGE))
                    .collect()
            }
            None => IFRAME
                .captures_iter(&context.content)
                .filter(|caps| {
                    let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
                    non_blank_attribute(attrs, "title").is_none()
                })
                .filter_map(|caps| caps.get(0))
                .map(|m| issue_at(self.id(), context, rule, m.start(), MESSAGE, m.as_str()))
                .collect(),
        };

        issues.extend(
            collect_macros(&context.content)
                .into_iter()
                .filter(|call| macro_name_matches(call.name, &["iframe"]))
                .filter(|call| non_blank_attribute(call.attrs, "title").is_none())
                .map(|call| issue_at(self.id(), context, rule, call.index, MESSAGE, call.raw)),
        );

        issues
    }
}
