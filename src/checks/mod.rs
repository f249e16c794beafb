// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessibility checks.
//!
//! A check is a stateless `(context, rule) -> issues` capability registered
//! under an id. Rules name the check they bind to; the scanners look checks
//! up in a [`CheckRegistry`] and run them against every applicable view.
//! Checks never fail: input they cannot interpret yields no issues.

pub mod alt_text;
pub mod aria;
pub mod contrast;
pub mod css;
pub mod forms;
pub mod keyboard;
pub mod language;
pub mod media;
pub mod names;
pub mod semantic;

use crate::context::ScanContext;
use crate::error::{Result, ScanError};
use crate::markup::{line_number, line_number_for_snippet};
use crate::model::{Dialect, Issue, Rule};
use regex::{Captures, Match, Regex};
use scraper::ElementRef;
use std::collections::BTreeMap;

/// Plain and server-templated HTML
pub const HTML_FAMILY: &[Dialect] = &[Dialect::Html, Dialect::Htm, Dialect::Cshtml, Dialect::Razor];

/// HTML family plus XAML, for layout checks that understand both
pub const LAYOUT_KINDS: &[Dialect] = &[
    Dialect::Html,
    Dialect::Htm,
    Dialect::Cshtml,
    Dialect::Razor,
    Dialect::Xaml,
];

/// Full documents only
pub const DOCUMENT_KINDS: &[Dialect] = &[Dialect::Html, Dialect::Htm];

/// Trait implemented by all checks
pub trait Check: Send + Sync {
    /// Registry id rules refer to
    fn id(&self) -> &str;

    /// Short description of what this check looks for
    fn description(&self) -> &str;

    /// Dialects this check knows how to evaluate
    fn applicable_kinds(&self) -> &[Dialect];

    /// Evaluate one view against one rule
    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue>;

    fn applies_to(&self, kind: Dialect) -> bool {
        self.applicable_kinds().contains(&kind)
    }
}

/// Checks keyed by id
#[derive(Default)]
pub struct CheckRegistry {
    checks: BTreeMap<String, Box<dyn Check>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check; ids must be non-empty and unique
    pub fn register(&mut self, check: Box<dyn Check>) -> Result<()> {
        let id = check.id().trim().to_string();
        if id.is_empty() {
            return Err(ScanError::Registry("Check must have an id.".to_string()));
        }
        if self.checks.contains_key(&id) {
            return Err(ScanError::Registry(format!(
                "Check '{}' is already registered.",
                id
            )));
        }
        self.checks.insert(id, check);
        Ok(())
    }

    /// Exact-id lookup
    pub fn find(&self, id: &str) -> Option<&dyn Check> {
        self.checks.get(id).map(|c| c.as_ref())
    }

    /// Registered checks ordered by id
    pub fn list(&self) -> impl Iterator<Item = &dyn Check> {
        self.checks.values().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// All built-in checks
pub fn default_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(css::AbsolutePositioningCheck),
        Box::new(css::FixedWidthLayoutCheck),
        Box::new(forms::MissingLabelCheck),
        Box::new(language::MissingDocumentLanguageCheck),
        Box::new(forms::UnlabeledButtonCheck),
        Box::new(language::MissingPageTitleCheck),
        Box::new(semantic::MissingTableHeadersCheck),
        Box::new(alt_text::MissingAltTextCheck),
        Box::new(css::NonWrappingContainerCheck),
        Box::new(aria::InvalidAriaRoleCheck),
        Box::new(aria::HiddenNavigationCheck),
        Box::new(keyboard::HiddenFocusableCheck),
        Box::new(contrast::InsufficientContrastCheck),
        Box::new(aria::XamlMissingNameCheck),
        Box::new(semantic::MissingLinkTextCheck),
        Box::new(media::MissingIframeTitleCheck),
        Box::new(forms::MissingFieldsetLegendCheck),
        Box::new(keyboard::MissingSkipLinkCheck),
        Box::new(css::TextSpacingCheck),
        Box::new(semantic::DuplicateIdCheck),
        Box::new(forms::EmptyFormLabelCheck),
        Box::new(forms::OrphanedFormLabelCheck),
    ]
}

/// Registry holding every built-in check
pub fn default_registry() -> CheckRegistry {
    let mut registry = CheckRegistry::new();
    for check in default_checks() {
        registry.register(check).expect("built-in check ids are distinct");
    }
    registry
}

/// Issue located at a byte offset of the view, with the matched text as evidence
pub(crate) fn issue_at(
    check_id: &str,
    context: &ScanContext,
    rule: &Rule,
    index: usize,
    message: &str,
    evidence: &str,
) -> Issue {
    Issue::new(rule, check_id, &context.file_path, context.line_at(index), message).with_evidence(evidence)
}

/// Raw-source occurrences of the elements a tree query returns.
///
/// The n-th element from the tree is reported at the n-th occurrence in
/// the view text, so tree and raw evaluation agree on line and evidence.
pub(crate) struct SourceSpans<'a> {
    content: &'a str,
    spans: Vec<Match<'a>>,
}

impl<'a> SourceSpans<'a> {
    pub fn new(content: &'a str, pattern: &Regex) -> Self {
        Self {
            content,
            spans: pattern.find_iter(content).collect(),
        }
    }

    /// Occurrences of `pattern` whose captures satisfy `keep`
    pub fn matching<F>(content: &'a str, pattern: &Regex, keep: F) -> Self
    where
        F: Fn(&Captures<'a>) -> bool,
    {
        Self {
            content,
            spans: pattern
                .captures_iter(content)
                .filter(|caps| keep(caps))
                .filter_map(|caps| caps.get(0))
                .collect(),
        }
    }

    /// Line and evidence for the `nth` element
    pub fn locate(&self, nth: usize, element: &ElementRef<'_>) -> (usize, String) {
        match self.spans.get(nth) {
            Some(span) => (line_number(self.content, span.start()), span.as_str().to_string()),
            None => {
                let html = element.html();
                (line_number_for_snippet(self.content, &html, 0), html)
            }
        }
    }
}

/// Issue for a tree element located through [`SourceSpans`]
pub(crate) fn element_issue(
    check_id: &str,
    context: &ScanContext,
    rule: &Rule,
    location: (usize, String),
    message: &str,
) -> Issue {
    let (line, evidence) = location;
    Issue::new(rule, check_id, &context.file_path, line, message).with_evidence(&evidence)
}
