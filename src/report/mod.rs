// SPDX-License-Identifier: PMPL-1.0-or-later
//! Report aggregation for scan results.
//!
//! Reports are derived from (documents, issues, rules) on demand. Every
//! listing is sorted by descending count with ties broken by ascending
//! name, so identical inputs always serialize to identical output.

mod render;

pub use render::{generate_report, OutputFormat, ScanOutput};

use crate::model::{Document, Issue, ResolvedRule};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const UNKNOWN_RULE: &str = "unknown";
const UNASSIGNED_TEAM: &str = "unassigned";
const UNKNOWN_SEVERITY: &str = "unknown";

/// Headline numbers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub documents: usize,
    pub files: usize,
    pub issues: usize,
    pub teams: usize,
    pub checks: usize,
}

/// A name with the number of issues attributed to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRollup {
    pub rule_id: String,
    pub description: String,
    pub severity: String,
    pub team_name: String,
    pub count: usize,
    pub files: Vec<String>,
    pub checks: Vec<String>,
}

/// Issues counted against a stylesheet linked from a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StylesheetCount {
    pub file_path: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRollup {
    pub file_path: String,
    pub issue_count: usize,
    pub rules: Vec<NameCount>,
    pub teams: Vec<NameCount>,
    pub severities: Vec<NameCount>,
    pub checks: Vec<NameCount>,
    pub linked_stylesheets_with_issues: Vec<StylesheetCount>,
}

impl FileRollup {
    fn empty(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            issue_count: 0,
            rules: Vec::new(),
            teams: Vec::new(),
            severities: Vec::new(),
            checks: Vec::new(),
            linked_stylesheets_with_issues: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRollup {
    pub team_name: String,
    pub issue_count: usize,
    pub rules: Vec<NameCount>,
}

/// A configured rule that produced no issues
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingRule {
    pub rule_id: String,
    pub team_name: String,
    pub check_id: String,
    pub severity: String,
    pub description: String,
}

/// Configured-versus-triggered rule accounting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub total_rules: usize,
    pub triggered_rules: usize,
    pub missing_rule_count: usize,
    pub coverage_percent: u32,
    pub missing_rules: Vec<MissingRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: Summary,
    pub by_rule: Vec<RuleRollup>,
    pub by_file: Vec<FileRollup>,
    pub by_team: Vec<TeamRollup>,
    pub by_severity: Vec<NameCount>,
    pub by_check: Vec<NameCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Coverage>,
}

/// Everything known about one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file_path: String,
    pub document: Option<Document>,
    pub issue_count: usize,
    pub issues: Vec<Issue>,
    pub by_rule: Vec<RuleRollup>,
    pub linked_stylesheets_with_issues: Vec<StylesheetCount>,
}

fn rule_name(issue: &Issue) -> &str {
    if issue.rule_id.is_empty() {
        UNKNOWN_RULE
    } else {
        &issue.rule_id
    }
}

fn team_name(issue: &Issue) -> &str {
    issue.team_name.as_deref().unwrap_or(UNASSIGNED_TEAM)
}

fn severity_name(issue: &Issue) -> &str {
    issue
        .severity
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_SEVERITY)
}

/// Count desc, then name asc
fn sorted_counts(counts: HashMap<&str, usize>) -> Vec<NameCount> {
    let mut list: Vec<NameCount> = counts
        .into_iter()
        .map(|(name, count)| NameCount {
            name: name.to_string(),
            count,
        })
        .collect();
    list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    list
}

fn tally<'a>(issues: impl IntoIterator<Item = &'a Issue>, key: impl Fn(&'a Issue) -> &'a str) -> Vec<NameCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for issue in issues {
        *counts.entry(key(issue)).or_default() += 1;
    }
    sorted_counts(counts)
}

fn rule_rollups<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Vec<RuleRollup> {
    let mut rollups: HashMap<&str, RuleRollup> = HashMap::new();
    let mut files: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    let mut checks: HashMap<&str, BTreeSet<&str>> = HashMap::new();

    for issue in issues {
        let id = rule_name(issue);
        let entry = rollups.entry(id).or_insert_with(|| RuleRollup {
            rule_id: id.to_string(),
            description: issue.rule_description.clone().unwrap_or_default(),
            severity: issue.severity.clone().unwrap_or_default(),
            team_name: team_name(issue).to_string(),
            count: 0,
            files: Vec::new(),
            checks: Vec::new(),
        });
        entry.count += 1;
        files.entry(id).or_default().insert(issue.file_path.as_str());
        if !issue.check_id.is_empty() {
            checks.entry(id).or_default().insert(issue.check_id.as_str());
        }
    }

    let mut list: Vec<RuleRollup> = rollups
        .into_values()
        .map(|mut rollup| {
            let id = rollup.rule_id.as_str();
            rollup.files = files.get(id).map(|s| s.iter().map(|f| f.to_string()).collect()).unwrap_or_default();
            rollup.checks = checks.get(id).map(|s| s.iter().map(|c| c.to_string()).collect()).unwrap_or_default();
            rollup
        })
        .collect();
    list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.rule_id.cmp(&b.rule_id)));
    list
}

/// Stylesheets linked from `file_path` that collected issues themselves
fn linked_stylesheets(file_path: &str, documents: &[Document], issue_counts: &HashMap<&str, usize>) -> Vec<StylesheetCount> {
    let Some(document) = documents.iter().find(|d| d.url == file_path) else {
        return Vec::new();
    };
    let mut linked: Vec<StylesheetCount> = document
        .stylesheets
        .iter()
        .filter_map(|sheet| {
            let count = *issue_counts.get(sheet.as_str())?;
            Some(StylesheetCount {
                file_path: sheet.clone(),
                count,
            })
        })
        .collect();
    linked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.file_path.cmp(&b.file_path)));
    linked
}

/// Aggregate issues by rule, file, team, severity and check
pub fn build(documents: &[Document], issues: &[Issue]) -> Report {
    let mut per_file: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
    let mut per_team: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
    for issue in issues {
        per_file.entry(issue.file_path.as_str()).or_default().push(issue);
        per_team.entry(team_name(issue)).or_default().push(issue);
    }
    let file_counts: HashMap<&str, usize> = per_file.iter().map(|(path, list)| (*path, list.len())).collect();

    let mut by_file: Vec<FileRollup> = per_file
        .iter()
        .map(|(path, list)| FileRollup {
            file_path: path.to_string(),
            issue_count: list.len(),
            rules: tally(list.iter().copied(), rule_name),
            teams: tally(list.iter().copied(), team_name),
            severities: tally(list.iter().copied(), severity_name),
            checks: tally(list.iter().copied(), |i| i.check_id.as_str()),
            linked_stylesheets_with_issues: linked_stylesheets(path, documents, &file_counts),
        })
        .collect();
    sort_files(&mut by_file);

    let mut by_team: Vec<TeamRollup> = per_team
        .iter()
        .map(|(team, list)| TeamRollup {
            team_name: team.to_string(),
            issue_count: list.len(),
            rules: tally(list.iter().copied(), rule_name),
        })
        .collect();
    by_team.sort_by(|a, b| b.issue_count.cmp(&a.issue_count).then_with(|| a.team_name.cmp(&b.team_name)));

    let by_check = tally(issues, |i| i.check_id.as_str());

    Report {
        summary: Summary {
            documents: documents.len(),
            files: by_file.len(),
            issues: issues.len(),
            teams: by_team.len(),
            checks: by_check.len(),
        },
        by_rule: rule_rollups(issues),
        by_file,
        by_team,
        by_severity: tally(issues, severity_name),
        by_check,
        coverage: None,
    }
}

fn sort_files(files: &mut [FileRollup]) {
    files.sort_by(|a, b| b.issue_count.cmp(&a.issue_count).then_with(|| a.file_path.cmp(&b.file_path)));
}

/// [`build`] plus an entry for every scanned file and rule coverage
pub fn build_static(documents: &[Document], issues: &[Issue], rules: &[ResolvedRule]) -> Report {
    let mut report = build(documents, issues);

    let known: BTreeSet<String> = report.by_file.iter().map(|f| f.file_path.clone()).collect();
    let mut added: BTreeSet<&str> = BTreeSet::new();
    for document in documents {
        if document.url.is_empty() || known.contains(&document.url) || !added.insert(&document.url) {
            continue;
        }
        report.by_file.push(FileRollup::empty(&document.url));
    }
    sort_files(&mut report.by_file);

    report.summary.documents = report.by_file.len();
    report.summary.files = report.by_file.len();
    report.coverage = Some(coverage(rules, issues));
    report
}

/// Which configured (team, rule) pairs produced at least one issue
pub fn coverage(rules: &[ResolvedRule], issues: &[Issue]) -> Coverage {
    let triggered: BTreeSet<(&str, &str)> = issues
        .iter()
        .filter_map(|i| Some((i.team_name.as_deref()?, i.rule_id.as_str())))
        .collect();

    let mut configured: BTreeMap<(&str, &str), &ResolvedRule> = BTreeMap::new();
    for resolved in rules {
        configured
            .entry((resolved.team_name.as_str(), resolved.rule.id.as_str()))
            .or_insert(resolved);
    }

    // BTreeMap order is (team, id), which is the order missing rules are listed in
    let missing_rules: Vec<MissingRule> = configured
        .iter()
        .filter(|(key, _)| !triggered.contains(*key))
        .map(|(_, resolved)| MissingRule {
            rule_id: resolved.rule.id.clone(),
            team_name: resolved.team_name.clone(),
            check_id: resolved.rule.check_id.clone(),
            severity: resolved.rule.severity.clone(),
            description: resolved.rule.description.clone(),
        })
        .collect();

    let total_rules = configured.len();
    let triggered_rules = total_rules - missing_rules.len();
    let coverage_percent = if total_rules == 0 {
        0
    } else {
        (triggered_rules as f64 / total_rules as f64 * 100.0).round() as u32
    };

    Coverage {
        total_rules,
        triggered_rules,
        missing_rule_count: missing_rules.len(),
        coverage_percent,
        missing_rules,
    }
}

/// Issues, rule rollup and linked stylesheets for one file
pub fn build_file_report(file_path: &str, documents: &[Document], issues: &[Issue]) -> FileReport {
    let mut own: Vec<Issue> = issues.iter().filter(|i| i.file_path == file_path).cloned().collect();
    own.sort_by(|a, b| {
        a.line
            .cmp(&b.line)
            .then_with(|| a.rule_id.cmp(&b.rule_id))
            .then_with(|| a.message.cmp(&b.message))
    });

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for issue in issues {
        *counts.entry(issue.file_path.as_str()).or_default() += 1;
    }

    FileReport {
        file_path: file_path.to_string(),
        document: documents.iter().find(|d| d.url == file_path).cloned(),
        issue_count: own.len(),
        by_rule: rule_rollups(&own),
        linked_stylesheets_with_issues: linked_stylesheets(file_path, documents, &counts),
        issues: own,
    }
}
