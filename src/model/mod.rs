// SPDX-License-Identifier: PMPL-1.0-or-later
//! Core value types shared by the rule loader, checks, scanners and reports.
//!
//! Everything here serializes to camelCase JSON so that scan results and
//! reports can be diffed byte-for-byte between runs.

use serde::{Deserialize, Serialize};

/// Markup or language family a document (or one view of it) is evaluated as
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Html,
    Htm,
    Cshtml,
    Razor,
    Xaml,
    Css,
    Js,
    Ftl,
    Java,
    Cs,
}

impl Dialect {
    /// Every dialect, in declaration order
    pub const ALL: [Dialect; 10] = [
        Dialect::Html,
        Dialect::Htm,
        Dialect::Cshtml,
        Dialect::Razor,
        Dialect::Xaml,
        Dialect::Css,
        Dialect::Js,
        Dialect::Ftl,
        Dialect::Java,
        Dialect::Cs,
    ];

    /// Lowercase tag used in rule files and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Html => "html",
            Dialect::Htm => "htm",
            Dialect::Cshtml => "cshtml",
            Dialect::Razor => "razor",
            Dialect::Xaml => "xaml",
            Dialect::Css => "css",
            Dialect::Js => "js",
            Dialect::Ftl => "ftl",
            Dialect::Java => "java",
            Dialect::Cs => "cs",
        }
    }

    /// Case-insensitive lookup; `None` for tags this crate does not know
    pub fn parse(value: &str) -> Option<Dialect> {
        let needle = value.trim();
        Dialect::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(needle))
    }

    /// Dialects that are plain HTML or server-templated HTML
    pub fn is_html_family(&self) -> bool {
        matches!(
            self,
            Dialect::Html | Dialect::Htm | Dialect::Cshtml | Dialect::Razor
        )
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::parse(s).ok_or_else(|| format!("Unknown dialect: {}", s))
    }
}

/// Severity levels a rule may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn parse(value: &str) -> Option<Severity> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// One accessibility rule as declared in a team's rule file.
///
/// Required fields are kept as plain strings (possibly empty) so that a
/// malformed rule can still be carried through validation and reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub description: String,
    pub severity: String,
    pub check_id: String,
    pub applies_to: Option<String>,
    pub recommendation: Option<String>,
    pub wcag_criteria: Option<String>,
    pub problem_tags: Option<String>,
}

impl Rule {
    /// Lowercased `appliesTo` tokens, or `None` when the rule is unrestricted
    pub fn applies_to_tokens(&self) -> Option<Vec<String>> {
        let raw = self.applies_to.as_deref()?;
        let tokens: Vec<String> = split_list(raw)
            .map(|t| t.to_ascii_lowercase())
            .collect();
        if tokens.is_empty() {
            None
        } else {
            Some(tokens)
        }
    }
}

/// Split a comma-separated rule field into trimmed, non-empty tokens
pub fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// A named, ordered group of rules (one directory of the corpus)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub team_name: String,
    pub rules: Vec<Rule>,
}

/// A rule paired with its owning team, as returned by the scanners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRule {
    pub team_name: String,
    #[serde(flatten)]
    pub rule: Rule,
}

impl ResolvedRule {
    /// Flatten a corpus into (team, rule) pairs, preserving corpus order
    pub fn from_teams(teams: &[Team]) -> Vec<ResolvedRule> {
        teams
            .iter()
            .flat_map(|team| {
                team.rules.iter().map(move |rule| ResolvedRule {
                    team_name: team.team_name.clone(),
                    rule: rule.clone(),
                })
            })
            .collect()
    }
}

/// A single rule violation found by a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub rule_id: String,
    pub check_id: String,
    pub file_path: String,
    /// Line number (1-indexed)
    pub line: usize,
    pub message: String,
    /// Verbatim matched snippet
    pub evidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wcag_criteria: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_tags: Option<String>,
}

impl Issue {
    /// Create a new issue for `rule` raised by the check `check_id`
    pub fn new(rule: &Rule, check_id: &str, file_path: &str, line: usize, message: &str) -> Self {
        Self {
            rule_id: rule.id.clone(),
            check_id: check_id.to_string(),
            file_path: file_path.to_string(),
            line,
            message: message.to_string(),
            evidence: None,
            team_name: None,
            rule_description: None,
            severity: None,
            recommendation: None,
            wcag_criteria: None,
            problem_tags: None,
        }
    }

    /// Attach the matched snippet
    pub fn with_evidence(mut self, evidence: &str) -> Self {
        self.evidence = Some(evidence.to_string());
        self
    }

    /// Copy team and rule metadata onto the issue
    pub fn enrich(mut self, resolved: &ResolvedRule) -> Self {
        let rule = &resolved.rule;
        self.team_name = Some(resolved.team_name.clone());
        self.rule_description = Some(rule.description.clone());
        self.severity = Some(rule.severity.clone());
        self.recommendation = rule.recommendation.clone();
        self.wcag_criteria = rule.wcag_criteria.clone();
        self.problem_tags = rule.problem_tags.clone();
        self
    }

    /// Key under which duplicate issues collapse within one scan
    pub fn dedup_key(&self) -> (String, String, String, usize, String) {
        (
            self.rule_id.clone(),
            self.check_id.clone(),
            self.file_path.clone(),
            self.line,
            self.message.clone(),
        )
    }
}

/// Scan metadata for one document (distinct from its evaluable views)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub url: String,
    pub content_type: String,
    pub kind: String,
    #[serde(default)]
    pub stylesheets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}
