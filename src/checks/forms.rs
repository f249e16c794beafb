// SPDX-License-Identifier: PMPL-1.0-or-later
//! Forms - WCAG 1.3.1 Info and Relationships, 3.3.2 Labels or Instructions,
//! 4.1.2 Name, Role, Value
//!
//! Controls and buttons are named through [`super::names`]; the label
//! checks work on raw markup only.

use super::names::{label_ranges, resolve_name, NamePolicy, NameScope, RawElement};
use super::{element_issue, issue_at, Check, SourceSpans, HTML_FAMILY};
use crate::context::ScanContext;
use crate::markup::{attribute_value, has_text_content};
use crate::model::{Dialect, Issue, Rule};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static FORM_CONTROL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?P<tag>input|select|textarea)\b(?P<attrs>[^>]*)>").expect("valid regex")
});

static BUTTON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<button(?P<attrs>[^>]*)>(?P<content>.*?)</button>").expect("valid regex")
});

static INPUT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<input(?P<attrs>[^>]*)>").expect("valid regex"));

static FIELDSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<fieldset(?P<attrs>[^>]*)>(?P<body>[\s\S]*?)</fieldset>").expect("valid regex")
});

static LEGEND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<legend[^>]*>(?P<body>[\s\S]*?)</legend>").expect("valid regex"));

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<label(?P<attrs>[^>]*)>(?P<content>[\s\S]*?)</label>").expect("valid regex")
});

static LABEL_FOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<label[^>]*for="(?P<id>[^"]+)"[^>]*>"#).expect("valid regex"));

/// Input types rendered as buttons; compared exactly as written
const BUTTON_INPUT_TYPES: &[&str] = &["button", "submit", "reset", "image"];

/// A label names itself through its text or ARIA attributes
const LABEL_TEXT: NamePolicy = NamePolicy {
    labels: false,
    content: true,
    image_alt: false,
    native_value: false,
};

fn is_hidden_input(kind: Option<&str>) -> bool {
    kind.map(|t| t.eq_ignore_ascii_case("hidden")).unwrap_or(false)
}

fn is_button_input(kind: Option<&str>) -> bool {
    kind.map(|t| BUTTON_INPUT_TYPES.contains(&t)).unwrap_or(false)
}

/// Scope for the view: from the tree when there is one
fn name_scope(context: &ScanContext) -> NameScope {
    match &context.tree {
        Some(tree) => NameScope::from_tree(tree),
        None => NameScope::from_markup(&context.content),
    }
}

/// Flags inputs, selects and text areas with no accessible name
pub struct MissingLabelCheck;

const LABEL_MESSAGE: &str = "Form control missing accessible label.";

impl MissingLabelCheck {
    fn run_tree(&self, context: &ScanContext, rule: &Rule, tree: &Html, scope: &NameScope) -> Vec<Issue> {
        let controls = Selector::parse("input, select, textarea").expect("valid selector");
        let spans = SourceSpans::new(&context.content, &FORM_CONTROL);
        tree.select(&controls)
            .enumerate()
            .filter(|(_, control)| !is_hidden_input(control.value().attr("type")))
            .filter(|(_, control)| resolve_name(control, scope, NamePolicy::FORM_CONTROL).is_none())
            .map(|(n, control)| element_issue(self.id(), context, rule, spans.locate(n, &control), LABEL_MESSAGE))
            .collect()
    }

    fn run_raw(&self, context: &ScanContext, rule: &Rule, scope: &NameScope) -> Vec<Issue> {
        let ranges = label_ranges(&context.content);
        let mut issues = Vec::new();
        for caps in FORM_CONTROL.captures_iter(&context.content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
            if is_hidden_input(attribute_value(attrs, "type")) {
                continue;
            }
            let control = RawElement {
                attrs,
                body: None,
                index: whole.start(),
                label_ranges: &ranges,
            };
            if resolve_name(&control, scope, NamePolicy::FORM_CONTROL).is_none() {
                issues.push(issue_at(self.id(), context, rule, whole.start(), LABEL_MESSAGE, whole.as_str()));
            }
        }
        issues
    }
}

impl Check for MissingLabelCheck {
    fn id(&self) -> &str {
        "missing-label"
    }

    fn description(&self) -> &str {
        "Checks form controls have an accessible label (WCAG 3.3.2)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let scope = name_scope(context);
        match &context.tree {
            Some(tree) => self.run_tree(context, rule, tree, &scope),
            None => self.run_raw(context, rule, &scope),
        }
    }
}

/// Flags buttons and button-type inputs with no accessible name
pub struct UnlabeledButtonCheck;

const BUTTON_MESSAGE: &str = "Button missing accessible label.";

impl UnlabeledButtonCheck {
    fn run_tree(&self, context: &ScanContext, rule: &Rule, tree: &Html, scope: &NameScope) -> Vec<Issue> {
        let buttons = Selector::parse("button").expect("valid selector");
        let inputs = Selector::parse("input").expect("valid selector");
        let button_spans = SourceSpans::new(&context.content, &BUTTON);
        let input_spans = SourceSpans::new(&context.content, &INPUT);

        let unnamed = |element: &ElementRef<'_>, policy| resolve_name(element, scope, policy).is_none();

        let mut issues: Vec<Issue> = tree
            .select(&buttons)
            .enumerate()
            .filter(|(_, button)| unnamed(button, NamePolicy::BUTTON))
            .map(|(n, button)| {
                element_issue(self.id(), context, rule, button_spans.locate(n, &button), BUTTON_MESSAGE)
            })
            .collect();

        issues.extend(
            tree.select(&inputs)
                .enumerate()
                .filter(|(_, input)| is_button_input(input.value().attr("type")))
                .filter(|(_, input)| unnamed(input, NamePolicy::INPUT_BUTTON))
                .map(|(n, input)| {
                    element_issue(self.id(), context, rule, input_spans.locate(n, &input), BUTTON_MESSAGE)
                }),
        );

        issues
    }

    fn run_raw(&self, context: &ScanContext, rule: &Rule, scope: &NameScope) -> Vec<Issue> {
        let ranges = label_ranges(&context.content);
        let mut issues = Vec::new();

        for caps in BUTTON.captures_iter(&context.content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let button = RawElement {
                attrs: caps.name("attrs").map(|m| m.as_str()).unwrap_or_default(),
                body: caps.name("content").map(|m| m.as_str()),
                index: whole.start(),
                label_ranges: &ranges,
            };
            if resolve_name(&button, scope, NamePolicy::BUTTON).is_none() {
                issues.push(issue_at(self.id(), context, rule, whole.start(), BUTTON_MESSAGE, whole.as_str()));
            }
        }

        for caps in INPUT.captures_iter(&context.content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
            if !is_button_input(attribute_value(attrs, "type")) {
                continue;
            }
            let input = RawElement {
                attrs,
                body: None,
                index: whole.start(),
                label_ranges: &ranges,
            };
            if resolve_name(&input, scope, NamePolicy::INPUT_BUTTON).is_none() {
                issues.push(issue_at(self.id(), context, rule, whole.start(), BUTTON_MESSAGE, whole.as_str()));
            }
        }

        issues
    }
}

impl Check for UnlabeledButtonCheck {
    fn id(&self) -> &str {
        "unlabeled-button"
    }

    fn description(&self) -> &str {
        "Checks buttons have an accessible label (WCAG 4.1.2)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let scope = name_scope(context);
        match &context.tree {
            Some(tree) => self.run_tree(context, rule, tree, &scope),
            None => self.run_raw(context, rule, &scope),
        }
    }
}

/// Flags fieldsets whose first legend is missing or has no text
pub struct MissingFieldsetLegendCheck;

impl Check for MissingFieldsetLegendCheck {
    fn id(&self) -> &str {
        "missing-fieldset-legend"
    }

    fn description(&self) -> &str {
        "Checks fieldsets are described by a legend (WCAG 1.3.1)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        FIELDSET
            .captures_iter(&context.content)
            .filter(|caps| {
                let body = caps.name("body").map(|m| m.as_str()).unwrap_or_default();
                let legend = LEGEND
                    .captures(body)
                    .and_then(|legend| legend.name("body"))
                    .map(|m| m.as_str());
                !legend.map(has_text_content).unwrap_or(false)
            })
            .filter_map(|caps| caps.get(0))
            .map(|m| {
                issue_at(
                    self.id(),
                    context,
                    rule,
                    m.start(),
                    "Fieldset missing descriptive legend.",
                    m.as_str(),
                )
            })
            .collect()
    }
}

/// Flags `<label>` elements that name nothing
pub struct EmptyFormLabelCheck;

impl Check for EmptyFormLabelCheck {
    fn id(&self) -> &str {
        "empty-form-label"
    }

    fn description(&self) -> &str {
        "Checks form labels contain readable text (WCAG 3.3.2)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let scope = NameScope::from_markup(&context.content);
        let mut issues = Vec::new();
        for caps in LABEL.captures_iter(&context.content) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let label = RawElement {
                attrs: caps.name("attrs").map(|m| m.as_str()).unwrap_or_default(),
                body: caps.name("content").map(|m| m.as_str()),
                index: whole.start(),
                label_ranges: &[],
            };
            if resolve_name(&label, &scope, LABEL_TEXT).is_none() {
                issues.push(issue_at(
                    self.id(),
                    context,
                    rule,
                    whole.start(),
                    "Form label has no readable text.",
                    whole.as_str(),
                ));
            }
        }
        issues
    }
}

/// Flags `<label for>` pointing at an id no element carries
pub struct OrphanedFormLabelCheck;

impl Check for OrphanedFormLabelCheck {
    fn id(&self) -> &str {
        "orphaned-form-label"
    }

    fn description(&self) -> &str {
        "Checks label for= references resolve to a control (WCAG 1.3.1)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let scope = NameScope::from_markup(&context.content);
        LABEL_FOR
            .captures_iter(&context.content)
            .filter(|caps| {
                caps.name("id")
                    .map(|id| !id.as_str().trim().is_empty() && !scope.has_element(id.as_str()))
                    .unwrap_or(false)
            })
            .filter_map(|caps| caps.get(0))
            .map(|m| {
                issue_at(
                    self.id(),
                    context,
                    rule,
                    m.start(),
                    "Form label references a missing control.",
                    m.as_str(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{run_raw, run_tree};

    #[test]
    fn test_missing_label_sources() {
        let html = concat!(
            "<label for=\"email\">Email</label><input id=\"email\">\n",
            "<input type=\"hidden\" name=\"token\">\n",
            "<label>Name <input name=\"name\"></label>\n",
            "<select name=\"country\"></select>\n",
            "<textarea aria-label=\"Notes\"></textarea>\n",
            "<input title=\"Search\">"
        );
        let issues = run_raw(&MissingLabelCheck, Dialect::Html, html);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 4);
        assert_eq!(issues[0].message, "Form control missing accessible label.");
        assert_eq!(issues[0].evidence.as_deref(), Some("<select name=\"country\">"));
    }

    #[test]
    fn test_missing_label_ignores_buttons() {
        assert!(run_raw(&MissingLabelCheck, Dialect::Html, "<button></button>").is_empty());
    }

    #[test]
    fn test_missing_label_tree_matches_raw() {
        let html = "<html><body>\n<input type=\"text\">\n<label for=\"q\">Query</label>\n<input id=\"q\">\n<textarea></textarea>\n</body></html>";
        let raw = run_raw(&MissingLabelCheck, Dialect::Html, html);
        assert_eq!(raw.len(), 2);
        assert_eq!(run_tree(&MissingLabelCheck, html), raw);
    }

    #[test]
    fn test_labelledby_with_nested_same_tag() {
        let html = "<div id=\"lbl\"><div></div>Postcode</div>\n<input aria-labelledby=\"lbl\">";
        assert!(run_raw(&MissingLabelCheck, Dialect::Html, html).is_empty());
        assert!(run_tree(&MissingLabelCheck, html).is_empty());

        let void = "<img id=\"pic\" alt=\"Logo\">\n<input aria-labelledby=\"pic\">";
        let raw = run_raw(&MissingLabelCheck, Dialect::Html, void);
        assert_eq!(raw.len(), 1);
        assert_eq!(run_tree(&MissingLabelCheck, void), raw);
    }

    #[test]
    fn test_button_names() {
        let html = "<button aria-label=\"Save\"></button>\n<button></button>\n<button><span>Go</span></button>";
        let issues = run_raw(&UnlabeledButtonCheck, Dialect::Html, html);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].message, "Button missing accessible label.");
        assert_eq!(issues[0].evidence.as_deref(), Some("<button></button>"));
    }

    #[test]
    fn test_button_inputs() {
        let html = "<input type=\"submit\" value=\"Send\">\n<input type=\"image\" src=\"go.png\">\n<input type=\"Submit\">\n<input type=\"reset\">";
        let issues = run_raw(&UnlabeledButtonCheck, Dialect::Html, html);
        let lines: Vec<usize> = issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_button_tree_matches_raw() {
        let html = "<html><body>\n<button></button>\n<input type=\"text\">\n<input type=\"button\">\n<button title=\"Close\"></button>\n</body></html>";
        let raw = run_raw(&UnlabeledButtonCheck, Dialect::Html, html);
        assert_eq!(raw.len(), 2);
        assert_eq!(run_tree(&UnlabeledButtonCheck, html), raw);
    }

    #[test]
    fn test_button_labelledby_with_nested_same_tag() {
        let html = "<span id=\"n\"><span></span>Save</span>\n<button aria-labelledby=\"n\"></button>";
        assert!(run_raw(&UnlabeledButtonCheck, Dialect::Html, html).is_empty());
        assert!(run_tree(&UnlabeledButtonCheck, html).is_empty());
    }

    #[test]
    fn test_fieldset_legend() {
        let html = "<fieldset><legend>Address</legend></fieldset>\n<fieldset><legend> <b></b> </legend></fieldset>\n<fieldset><input></fieldset>";
        let issues = run_raw(&MissingFieldsetLegendCheck, Dialect::Html, html);
        let lines: Vec<usize> = issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![2, 3]);
        assert_eq!(issues[0].message, "Fieldset missing descriptive legend.");
    }

    #[test]
    fn test_empty_form_label() {
        let html = "<label for=\"a\"> </label>\n<label aria-label=\"Phone\"></label>\n<label><input id=\"b\"></label>\n<label>Name</label>";
        let issues = run_raw(&EmptyFormLabelCheck, Dialect::Html, html);
        let lines: Vec<usize> = issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn test_orphaned_form_label() {
        let html = "<label for=\"Email\">Email</label><input id=\"email\">\n<label for=\"phone\">Phone</label>";
        let issues = run_raw(&OrphanedFormLabelCheck, Dialect::Html, html);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
        assert_eq!(issues[0].evidence.as_deref(), Some("<label for=\"phone\">"));
        assert_eq!(issues[0].message, "Form label references a missing control.");
    }
}
