// SPDX-License-Identifier: PMPL-1.0-or-later
//! ARIA and platform accessibility APIs - WCAG 4.1.2 Name, Role, Value

use super::keyboard::is_html_hidden;
use super::{issue_at, Check, HTML_FAMILY};
use crate::context::ScanContext;
use crate::markup::contains_attribute;
use crate::model::{Dialect, Issue, Rule};
use regex::Regex;
use std::sync::LazyLock;

static ROLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)role="(?P<role>[^"]+)""#).expect("valid regex"));

static NAV: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<nav(?P<attrs>[^>]*)>").expect("valid regex"));

static XAML_CONTROL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(Image|Button|TextBox)(?P<attrs>[^>]*)>").expect("valid regex"));

/// WAI-ARIA roles accepted in `role` attributes
pub const ARIA_ROLES: &[&str] = &[
    "alert",
    "alertdialog",
    "application",
    "article",
    "banner",
    "button",
    "cell",
    "checkbox",
    "columnheader",
    "combobox",
    "complementary",
    "contentinfo",
    "definition",
    "dialog",
    "directory",
    "document",
    "feed",
    "figure",
    "form",
    "grid",
    "gridcell",
    "group",
    "heading",
    "img",
    "link",
    "list",
    "listbox",
    "listitem",
    "log",
    "main",
    "marquee",
    "math",
    "menu",
    "menubar",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "navigation",
    "none",
    "note",
    "option",
    "presentation",
    "progressbar",
    "radio",
    "radiogroup",
    "region",
    "row",
    "rowgroup",
    "rowheader",
    "scrollbar",
    "search",
    "searchbox",
    "separator",
    "slider",
    "spinbutton",
    "status",
    "switch",
    "tab",
    "table",
    "tablist",
    "tabpanel",
    "term",
    "textbox",
    "timer",
    "toolbar",
    "tooltip",
    "tree",
    "treegrid",
    "treeitem",
];

pub fn is_known_role(token: &str) -> bool {
    let lowered = token.to_ascii_lowercase();
    ARIA_ROLES.contains(&lowered.as_str())
}

/// Flags role tokens outside the WAI-ARIA role list, one issue per token
pub struct InvalidAriaRoleCheck;

impl Check for InvalidAriaRoleCheck {
    fn id(&self) -> &str {
        "invalid-aria-role"
    }

    fn description(&self) -> &str {
        "Checks role attributes use valid WAI-ARIA roles (WCAG 4.1.2)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let mut issues = Vec::new();
        for caps in ROLE.captures_iter(&context.content) {
            let (Some(whole), Some(role)) = (caps.get(0), caps.name("role")) else {
                continue;
            };
            for token in role.as_str().split_whitespace().filter(|t| !is_known_role(t)) {
                issues.push(issue_at(
                    self.id(),
                    context,
                    rule,
                    whole.start(),
                    &format!("Invalid ARIA role '{}'.", token),
                    whole.as_str(),
                ));
            }
        }
        issues
    }
}

/// Flags `<nav>` landmarks hidden from assistive technology
pub struct HiddenNavigationCheck;

impl Check for HiddenNavigationCheck {
    fn id(&self) -> &str {
        "hidden-navigation"
    }

    fn description(&self) -> &str {
        "Checks navigation landmarks are exposed to assistive tech (WCAG 4.1.2)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        HTML_FAMILY
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        NAV.captures_iter(&context.content)
            .filter(|caps| is_html_hidden(caps.name("attrs").map(|m| m.as_str()).unwrap_or_default()))
            .filter_map(|caps| caps.get(0))
            .map(|m| {
                issue_at(
                    self.id(),
                    context,
                    rule,
                    m.start(),
                    "Navigation element is hidden from assistive tech.",
                    m.as_str(),
                )
            })
            .collect()
    }
}

/// Flags XAML images, buttons and text boxes without automation names
pub struct XamlMissingNameCheck;

impl Check for XamlMissingNameCheck {
    fn id(&self) -> &str {
        "xaml-missing-name"
    }

    fn description(&self) -> &str {
        "Checks XAML controls expose AutomationProperties.Name (WCAG 4.1.2)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        &[Dialect::Xaml]
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        XAML_CONTROL
            .captures_iter(&context.content)
            .filter(|caps| {
                let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
                !contains_attribute(attrs, "AutomationProperties.Name", false)
                    && !contains_attribute(attrs, "AutomationProperties.HelpText", false)
            })
            .filter_map(|caps| caps.get(0))
            .map(|m| {
                issue_at(
                    self.id(),
                    context,
                    rule,
                    m.start(),
                    "XAML control missing AutomationProperties.Name.",
                    m.as_str(),
                )
            })
            .collect()
    }
}
