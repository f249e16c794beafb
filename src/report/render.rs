// SPDX-License-Identifier: PMPL-1.0-or-later
//! Text and JSON rendering of scan reports

use super::Report;
use crate::model::{Document, Issue};
use serde::Serialize;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// A report together with the raw scan data it was built from
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutput<'a> {
    pub report: &'a Report,
    pub documents: &'a [Document],
    pub issues: &'a [Issue],
}

/// Render a scan in the requested format
pub fn generate_report(output: &ScanOutput<'_>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => generate_text_report(output),
        OutputFormat::Json => generate_json_report(output),
    }
}

fn generate_text_report(output: &ScanOutput<'_>) -> String {
    let report = output.report;
    let mut text = String::new();

    text.push_str("=== a11yscan Accessibility Report ===\n\n");
    text.push_str(&format!(
        "Scanned {} document(s) across {} file(s)\n",
        report.summary.documents, report.summary.files
    ));

    if output.issues.is_empty() {
        text.push_str("No accessibility issues found.\n");
    } else {
        text.push_str(&format!(
            "Found {} issue(s) from {} check(s) owned by {} team(s)\n\n",
            report.summary.issues, report.summary.checks, report.summary.teams
        ));

        if !report.by_severity.is_empty() {
            let severities: Vec<String> = report
                .by_severity
                .iter()
                .map(|s| format!("{} {}", s.count, s.name))
                .collect();
            text.push_str(&format!("Severity: {}\n\n", severities.join(", ")));
        }

        for rollup in &report.by_rule {
            text.push_str(&format!(
                "--- {} [{}] {} ({}) ---\n",
                rollup.rule_id, rollup.team_name, rollup.severity, rollup.count
            ));
            if !rollup.description.is_empty() {
                text.push_str(&format!("{}\n", rollup.description));
            }

            for issue in output.issues.iter().filter(|i| same_rule(i, &rollup.rule_id)) {
                text.push_str(&format!("[{}] {}\n", issue.check_id, issue.message));
                text.push_str(&format!("  Location: {}:{}\n", issue.file_path, issue.line));
                if let Some(ref criteria) = issue.wcag_criteria {
                    text.push_str(&format!("  WCAG: {}\n", criteria));
                }
                if let Some(ref recommendation) = issue.recommendation {
                    text.push_str(&format!("  Fix: {}\n", recommendation));
                }
            }
            text.push('\n');
        }
    }

    if let Some(ref coverage) = report.coverage {
        text.push_str(&format!(
            "Coverage: {}/{} rule(s) triggered ({}%)\n",
            coverage.triggered_rules, coverage.total_rules, coverage.coverage_percent
        ));
        if !coverage.missing_rules.is_empty() {
            text.push_str(&format!("Missing rules ({}):\n", coverage.missing_rule_count));
            for missing in &coverage.missing_rules {
                text.push_str(&format!(
                    "  {}/{} ({}, {})\n",
                    missing.team_name, missing.rule_id, missing.check_id, missing.severity
                ));
            }
        }
    }

    text
}

fn same_rule(issue: &Issue, rule_id: &str) -> bool {
    if issue.rule_id.is_empty() {
        rule_id == super::UNKNOWN_RULE
    } else {
        issue.rule_id == rule_id
    }
}

fn generate_json_report(output: &ScanOutput<'_>) -> String {
    serde_json::to_string_pretty(output)
        .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize report: {}\"}}", e))
}
