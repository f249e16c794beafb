// SPDX-License-Identifier: PMPL-1.0-or-later
//! Keyboard access - WCAG 2.4.1 Bypass Blocks, 2.4.3 Focus Order, 4.1.2
//!
//! - Hidden elements must not stay in the tab order or be targeted by
//!   in-page navigation.
//! - Documents need a skip link ahead of every other focusable element.

use super::{issue_at, Check, HTML_FAMILY, LAYOUT_KINDS};
use crate::context::template::{collect_macros, macro_name_matches};
use crate::context::ScanContext;
use crate::markup::{
    attribute_value, contains_attribute, line_number, line_number_for_snippet, non_blank_attribute,
    parse_leading_int, strip_tags,
};
use crate::model::{Dialect, Issue, Rule};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(?P<closing>/)?\s*(?P<name>[a-zA-Z0-9:-]+)(?P<attrs>[^>]*?)(?P<self_closing>/?)>")
        .expect("valid regex")
});

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<a(?P<attrs>[^>]*)>(?P<body>[\s\S]*?)</a>").expect("valid regex"));

static FOCUSABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?P<tag>a|button|input|select|textarea|summary)\b(?P<attrs>[^>]*)>").expect("valid regex")
});

pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];

/// `display:none` or `visibility:hidden` in an inline style
pub fn has_hidden_style(style: &str) -> bool {
    let normalized: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    normalized.contains("display:none") || normalized.contains("visibility:hidden")
}

/// HTML element hidden by `aria-hidden`, inline style or the `hidden` attribute
pub fn is_html_hidden(attrs: &str) -> bool {
    let aria_hidden = attribute_value(attrs, "aria-hidden")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    aria_hidden
        || attribute_value(attrs, "style").map(has_hidden_style).unwrap_or(false)
        || contains_attribute(attrs, "hidden", true)
}

fn is_xaml_hidden(attrs: &str) -> bool {
    attribute_value(attrs, "Visibility")
        .map(|v| v.eq_ignore_ascii_case("collapsed") || v.eq_ignore_ascii_case("hidden"))
        .unwrap_or(false)
}

fn is_negative(value: &str) -> bool {
    parse_leading_int(value).map(|n| n < 0).unwrap_or(false)
}

fn is_html_focusable(name: &str, attrs: &str) -> bool {
    if let Some(tabindex) = non_blank_attribute(attrs, "tabindex") {
        return !is_negative(tabindex);
    }
    if contains_attribute(attrs, "disabled", true) {
        return false;
    }
    match name.to_ascii_lowercase().as_str() {
        "a" => non_blank_attribute(attrs, "href").is_some(),
        "input" => !attribute_value(attrs, "type")
            .map(|t| t.eq_ignore_ascii_case("hidden"))
            .unwrap_or(false),
        "button" | "select" | "textarea" => true,
        _ => false,
    }
}

fn is_xaml_focusable(attrs: &str) -> bool {
    let tab_stop = attribute_value(attrs, "IsTabStop");
    if tab_stop.map(|v| v.eq_ignore_ascii_case("false")).unwrap_or(false) {
        return false;
    }
    if let Some(tab_index) = non_blank_attribute(attrs, "TabIndex") {
        return !is_negative(tab_index);
    }
    tab_stop.map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Ids targeted by `href="#id"` or `aria-controls`, lowercased
fn referenced_ids(content: &str) -> HashSet<String> {
    let mut ids = HashSet::new();
    for caps in TAG.captures_iter(content) {
        if caps.name("closing").is_some() {
            continue;
        }
        let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
        if let Some(target) = attribute_value(attrs, "href").and_then(|h| h.strip_prefix('#')) {
            ids.insert(target.to_lowercase());
        }
        if let Some(controls) = attribute_value(attrs, "aria-controls") {
            ids.extend(controls.split_whitespace().map(str::to_lowercase));
        }
    }
    ids
}

/// Flags hidden elements that can still receive focus or are link targets
pub struct HiddenFocusableCheck;

impl Check for HiddenFocusableCheck {
    fn id(&self) -> &str {
        "hidden-focusable"
    }

    fn description(&self) -> &str {
        "Checks hidden content is removed from the focus order (WCAG 2.4.3)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        LAYOUT_KINDS
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let xaml = context.kind == Dialect::Xaml;
        let referenced = if xaml {
            HashSet::new()
        } else {
            referenced_ids(&context.content)
        };

        let mut hidden_stack: Vec<bool> = Vec::new();
        let mut issues = Vec::new();

        for caps in TAG.captures_iter(&context.content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if caps.name("closing").is_some() {
                hidden_stack.pop();
                continue;
            }

            let name = caps.name("name").map(|m| m.as_str()).unwrap_or_default();
            let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
            let parent_hidden = hidden_stack.last().copied().unwrap_or(false);

            let hidden = parent_hidden || if xaml { is_xaml_hidden(attrs) } else { is_html_hidden(attrs) };
            let focusable = if xaml {
                is_xaml_focusable(attrs)
            } else {
                is_html_focusable(name, attrs)
            };
            let is_referenced = !xaml
                && attribute_value(attrs, "id")
                    .map(|id| referenced.contains(&id.to_lowercase()))
                    .unwrap_or(false);

            if hidden && (focusable || is_referenced) {
                issues.push(issue_at(
                    self.id(),
                    context,
                    rule,
                    whole.start(),
                    "Hidden element remains focusable or referenced by navigation.",
                    whole.as_str(),
                ));
            }

            let self_closing = caps.name("self_closing").map(|m| m.as_str() == "/").unwrap_or(false)
                || (!xaml && VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str()));
            if !self_closing {
                hidden_stack.push(hidden);
            }
        }

        issues
    }
}

fn is_skip_label(label: &str) -> bool {
    strip_tags(label).to_lowercase().contains("skip")
}

fn first_non_blank<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Option<&'a str> {
    values.into_iter().flatten().find(|v| !v.is_empty())
}

fn is_in_page_link(href: Option<&str>) -> bool {
    href.map(|h| h.trim().starts_with('#')).unwrap_or(false)
}

/// Raw focusability used for skip-link ordering
fn is_focusable_tag(tag: &str, attrs: &str) -> bool {
    if contains_attribute(attrs, "disabled", true) {
        return false;
    }
    let tabindex = attribute_value(attrs, "tabindex").and_then(parse_leading_int);
    if tabindex.map(|t| t < 0).unwrap_or(false) {
        return false;
    }
    match tag.to_ascii_lowercase().as_str() {
        "a" => non_blank_attribute(attrs, "href").is_some() || tabindex.is_some(),
        "input" => !attribute_value(attrs, "type")
            .map(|t| t.eq_ignore_ascii_case("hidden"))
            .unwrap_or(false),
        _ => true,
    }
}

fn is_focusable_element(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    if value.attr("disabled").is_some() {
        return false;
    }
    let tabindex = value.attr("tabindex").and_then(parse_leading_int);
    if tabindex.map(|t| t < 0).unwrap_or(false) {
        return false;
    }
    match value.name() {
        "a" => value.attr("href").map(|h| !h.trim().is_empty()).unwrap_or(false) || tabindex.is_some(),
        "input" => !value
            .attr("type")
            .map(|t| t.eq_ignore_ascii_case("hidden"))
            .unwrap_or(false),
        _ => true,
    }
}

/// Flags documents whose first focusable element is not a skip link
pub struct MissingSkipLinkCheck;

const SKIP_MISSING: &str = "Skip link is missing from the document.";
const SKIP_NOT_FIRST: &str = "Skip link is not the first focusable element.";

impl MissingSkipLinkCheck {
    fn missing(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        vec![Issue::new(rule, self.id(), &context.file_path, 1, SKIP_MISSING).with_evidence(&context.content)]
    }

    fn run_tree(&self, context: &ScanContext, rule: &Rule, tree: &scraper::Html) -> Vec<Issue> {
        let selector = Selector::parse("a,button,input,select,textarea,summary").expect("valid selector");
        let spans: Vec<(usize, &str)> = FOCUSABLE
            .find_iter(&context.content)
            .map(|m| (m.start(), m.as_str()))
            .collect();

        // (document-order position, element); position pairs with raw spans
        let focusable: Vec<(usize, ElementRef<'_>)> = tree
            .select(&selector)
            .enumerate()
            .filter(|(_, el)| is_focusable_element(el))
            .collect();

        let skip_at = focusable.iter().position(|(_, el)| {
            if el.value().name() != "a" || !is_in_page_link(el.value().attr("href")) {
                return false;
            }
            let text = el.text().collect::<String>();
            let label = first_non_blank([el.value().attr("aria-label"), el.value().attr("title"), Some(text.as_str())]);
            label.map(is_skip_label).unwrap_or(false)
        });

        match skip_at {
            None => self.missing(context, rule),
            Some(0) => Vec::new(),
            Some(_) => {
                let Some((nth, first)) = focusable.first() else {
                    return Vec::new();
                };
                let (line, evidence) = match spans.get(*nth) {
                    Some((index, text)) => (line_number(&context.content, *index), text.to_string()),
                    None => {
                        let html = first.html();
                        (line_number_for_snippet(&context.content, &html, 0), html)
                    }
                };
                vec![Issue::new(rule, self.id(), &context.file_path, line, SKIP_NOT_FIRST).with_evidence(&evidence)]
            }
        }
    }

    fn run_raw(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let content = context.content.as_str();
        let mut skip_index: Option<usize> = None;
        let mut note = |index: usize| {
            skip_index = Some(skip_index.map_or(index, |current| current.min(index)));
        };

        for caps in ANCHOR.captures_iter(content) {
            let (Some(whole), Some(attrs)) = (caps.get(0), caps.name("attrs")) else {
                continue;
            };
            let attrs = attrs.as_str();
            if !is_in_page_link(attribute_value(attrs, "href")) {
                continue;
            }
            let body = caps.name("body").map(|m| m.as_str());
            let label = first_non_blank([attribute_value(attrs, "aria-label"), attribute_value(attrs, "title"), body]);
            if label.map(is_skip_label).unwrap_or(false) {
                note(whole.start());
            }
        }

        for call in collect_macros(content) {
            if !macro_name_matches(call.name, &["a", "link"]) || !is_in_page_link(attribute_value(call.attrs, "href")) {
                continue;
            }
            let label = first_non_blank([
                attribute_value(call.attrs, "aria-label"),
                attribute_value(call.attrs, "title"),
                non_blank_attribute(call.attrs, "label").or_else(|| non_blank_attribute(call.attrs, "text")),
                Some(call.body),
            ]);
            if label.map(is_skip_label).unwrap_or(false) {
                note(call.index);
            }
        }

        let Some(skip_index) = skip_index else {
            return self.missing(context, rule);
        };

        let first_focusable = FOCUSABLE.captures_iter(content).find_map(|caps| {
            let whole = caps.get(0)?;
            let tag = caps.name("tag")?.as_str();
            let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
            is_focusable_tag(tag, attrs).then_some(whole)
        });

        match first_focusable {
            Some(first) if skip_index > first.start() => {
                vec![issue_at(self.id(), context, rule, first.start(), SKIP_NOT_FIRST, first.as_str())]
            }
            _ => Vec::new(),
        }
    }
}

impl Check for MissingSkipLinkCheck {
    fn id(&self) -> &str {
        "missing-skip-link"
    }

    fn description(&self) -> &str {
        "Checks a skip link is the first focusable element (WCAG 2.4.1)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        if context.fragment {
            return Vec::new();
        }
        match &context.tree {
            Some(tree) => self.run_tree(context, rule, tree),
            None => self.run_raw(context, rule),
        }
    }
}
