// SPDX-License-Identifier: PMPL-1.0-or-later
//! Schema validation for individual rules.
//!
//! Checks enumerated values (severity, check id, appliesTo) and the token
//! patterns of the comma-separated metadata fields.

use crate::model::{split_list, Rule, Severity};
use regex::Regex;
use std::sync::LazyLock;

/// Check ids a rule may reference
pub const KNOWN_CHECKS: &[&str] = &[
    "absolute-positioning",
    "fixed-width-layout",
    "missing-label",
    "missing-document-language",
    "unlabeled-button",
    "missing-page-title",
    "missing-table-headers",
    "missing-alt-text",
    "non-wrapping-container",
    "invalid-aria-role",
    "hidden-navigation",
    "hidden-focusable",
    "insufficient-contrast",
    "xaml-missing-name",
    "missing-link-text",
    "missing-iframe-title",
    "missing-fieldset-legend",
    "missing-skip-link",
    "text-spacing",
    "duplicate-id",
    "empty-form-label",
    "orphaned-form-label",
];

/// Dialect tags accepted in `appliesTo`
pub const APPLIES_TO_KINDS: &[&str] = &["xaml", "cshtml", "razor", "html", "htm", "css", "js", "ftl"];

static WCAG_CRITERION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid regex"));

static PROBLEM_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid regex"));

/// Validate one rule, returning every schema problem found
pub fn validate_rule(rule: &Rule) -> Vec<String> {
    let mut errors = Vec::new();

    if rule.id.trim().is_empty() {
        errors.push("Rule id is required.".to_string());
    }

    if rule.description.trim().is_empty() {
        errors.push("Rule description is required.".to_string());
    }

    if Severity::parse(&rule.severity).is_none() {
        errors.push("Rule severity must be low, medium, or high.".to_string());
    }

    let check_id = rule.check_id.to_ascii_lowercase();
    if !KNOWN_CHECKS.contains(&check_id.as_str()) {
        errors.push("Rule check id is invalid or missing.".to_string());
    }

    if let Some(applies_to) = rule.applies_to.as_deref() {
        let invalid: Vec<&str> = split_list(applies_to)
            .filter(|kind| !APPLIES_TO_KINDS.contains(&kind.to_ascii_lowercase().as_str()))
            .collect();
        if !invalid.is_empty() {
            errors.push(format!(
                "Rule appliesTo contains invalid values: {}.",
                invalid.join(", ")
            ));
        }
    }

    if let Some(criteria) = rule.wcag_criteria.as_deref() {
        if !all_tokens_match(criteria, &WCAG_CRITERION) {
            errors.push("Rule wcagCriteria must list WCAG success criteria like 1.4.3.".to_string());
        }
    }

    if let Some(tags) = rule.problem_tags.as_deref() {
        if !all_tokens_match(tags, &PROBLEM_TAG) {
            errors.push(
                "Rule problemTags must be comma-separated slugs like document-language.".to_string(),
            );
        }
    }

    errors
}

/// Empty segments (`"1.4.3,"`) count as invalid tokens
fn all_tokens_match(value: &str, pattern: &Regex) -> bool {
    value
        .split(',')
        .map(str::trim)
        .all(|token| !token.is_empty() && pattern.is_match(token))
}
