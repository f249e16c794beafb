// SPDX-License-Identifier: PMPL-1.0-or-later
//! Scan orchestration.
//!
//! Both scanners share the same selection rule: a rule runs against a view
//! when its check exists, the check understands the view's kind, and the
//! rule's `appliesTo` (if any) names the view's kind or its authoring kind.
//! Issues are enriched with team and rule metadata and collapsed on
//! [`Issue::dedup_key`].
//!
//! - [`Scanner::scan_document`]: one captured document, possibly several views
//! - [`Scanner::scan_root`]: every recognised file under a directory

mod project;
mod runtime;

pub use project::RootScan;
pub use runtime::{DocumentRequest, DocumentScan};

use crate::checks::{default_registry, Check, CheckRegistry};
use crate::context::ScanContext;
use crate::error::{Result, ScanError};
use crate::model::{Issue, ResolvedRule, Rule};
use crate::rules;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

type DedupKey = (String, String, String, usize, String);

/// Runs rules against documents using a fixed set of checks
pub struct Scanner {
    registry: CheckRegistry,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(default_registry())
    }
}

impl Scanner {
    pub fn new(registry: CheckRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Run every applicable (rule, check) pair against every view.
    ///
    /// `seen` carries the dedup keys of issues already kept; only issues
    /// with a new key are returned.
    fn evaluate(&self, contexts: &[ScanContext], rules: &[ResolvedRule], seen: &mut HashSet<DedupKey>) -> Vec<Issue> {
        let mut issues = Vec::new();

        for context in contexts {
            for resolved in rules {
                let Some(check) = self.registry.find(&resolved.rule.check_id) else {
                    continue;
                };
                if !selects(check, &resolved.rule, context) {
                    continue;
                }

                for issue in check.run(context, &resolved.rule) {
                    if seen.insert(issue.dedup_key()) {
                        issues.push(issue.enrich(resolved));
                    }
                }
            }
        }

        issues
    }
}

/// Whether `rule` bound to `check` should run against `context`
pub fn selects(check: &dyn Check, rule: &Rule, context: &ScanContext) -> bool {
    if !check.applies_to(context.kind) {
        return false;
    }
    match rule.applies_to_tokens() {
        Some(tokens) => tokens.iter().any(|token| context.matches_kind(token)),
        None => true,
    }
}

/// Validate the corpus and flatten it into (team, rule) pairs.
///
/// Any validation error aborts the scan before a check runs.
pub fn resolve_rules(rules_root: &Path) -> Result<Vec<ResolvedRule>> {
    if rules_root.as_os_str().is_empty() {
        return Err(ScanError::RulesRootRequired);
    }

    let validation = rules::validate(rules_root)?;
    if !validation.is_valid() {
        return Err(ScanError::RuleValidation(validation.errors));
    }

    let resolved = ResolvedRule::from_teams(&validation.teams);
    debug!("Resolved {} rule(s) from {}", resolved.len(), rules_root.display());
    Ok(resolved)
}

/// Scan one captured document with the built-in checks
pub fn scan_document(request: &DocumentRequest) -> Result<DocumentScan> {
    Scanner::default().scan_document(request)
}

/// Scan a directory tree with the built-in checks
pub fn scan_root(root: &Path, rules_root: &Path, config: &crate::config::ScanConfig) -> Result<RootScan> {
    Scanner::default().scan_root(root, rules_root, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;

    fn rule(check_id: &str, applies_to: Option<&str>) -> Rule {
        Rule {
            id: "r".to_string(),
            description: "d".to_string(),
            severity: "low".to_string(),
            check_id: check_id.to_string(),
            applies_to: applies_to.map(str::to_string),
            ..Rule::default()
        }
    }

    #[test]
    fn test_selects_requires_supported_kind() {
        let scanner = Scanner::default();
        let check = scanner.registry().find("xaml-missing-name").unwrap();
        let html = ScanContext::raw("a.html", "", Dialect::Html, None);
        let xaml = ScanContext::raw("a.xaml", "", Dialect::Xaml, Some(Dialect::Xaml));
        assert!(!selects(check, &rule("xaml-missing-name", None), &html));
        assert!(selects(check, &rule("xaml-missing-name", None), &xaml));
    }

    #[test]
    fn test_applies_to_matches_kind_or_source_kind() {
        let scanner = Scanner::default();
        let check = scanner.registry().find("missing-alt-text").unwrap();
        let template = ScanContext::raw("a.ftl", "", Dialect::Html, Some(Dialect::Ftl));
        let plain = ScanContext::raw("a.html", "", Dialect::Html, None);

        let ftl_only = rule("missing-alt-text", Some("ftl"));
        assert!(selects(check, &ftl_only, &template));
        assert!(!selects(check, &ftl_only, &plain));

        let html_or_css = rule("missing-alt-text", Some("CSS, HTML"));
        assert!(selects(check, &html_or_css, &plain));
    }

    #[test]
    fn test_evaluate_collapses_duplicates_across_views() {
        let scanner = Scanner::default();
        let resolved = vec![ResolvedRule {
            team_name: "web".to_string(),
            rule: rule("missing-alt-text", None),
        }];
        let view = ScanContext::raw("a.html", "<img src=\"a.png\">", Dialect::Html, None);
        let contexts = vec![view.clone(), view];

        let mut seen = HashSet::new();
        let issues = scanner.evaluate(&contexts, &resolved, &mut seen);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].team_name.as_deref(), Some("web"));
        assert_eq!(issues[0].severity.as_deref(), Some("low"));
    }

    #[test]
    fn test_unknown_check_is_skipped() {
        let scanner = Scanner::default();
        let resolved = vec![ResolvedRule {
            team_name: "web".to_string(),
            rule: rule("retired-check", None),
        }];
        let contexts = vec![ScanContext::raw("a.html", "<img>", Dialect::Html, None)];
        assert!(scanner.evaluate(&contexts, &resolved, &mut HashSet::new()).is_empty());
    }
}
