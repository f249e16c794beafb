// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rule corpus loading and validation.
//!
//! A corpus is laid out as `<rules-root>/<team>/<rule-file>`, one rule per
//! file. Two serializations are accepted:
//! - `.json`: a strict JSON object whose values are all strings
//! - `.yml` / `.yaml`: flat `key: value` lines
//!
//! [`load`] stops at the first problem; [`validate`] walks the whole corpus
//! and collects every structural and schema error.

pub mod schema;

use crate::error::{Result, ScanError};
use crate::model::{Rule, Team};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use schema::{validate_rule, APPLIES_TO_KINDS, KNOWN_CHECKS};

/// Keys a rule file may declare
const ALLOWED_PROPERTIES: &[&str] = &[
    "id",
    "description",
    "severity",
    "checkId",
    "appliesTo",
    "recommendation",
    "wcagCriteria",
    "problemTags",
];

const REQUIRED_PROPERTIES: &[&str] = &["id", "description", "severity", "checkId"];

/// Rule file extensions, lowercase
const RULE_EXTENSIONS: &[&str] = &["json", "yml", "yaml"];

/// A problem found in the corpus, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleError {
    pub team: String,
    pub rule_id: String,
    pub message: String,
}

/// Outcome of [`validate`]: the full corpus plus every error found in it
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleValidation {
    pub teams: Vec<Team>,
    pub errors: Vec<RuleError>,
}

impl RuleValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of parsing one rule file
#[derive(Debug)]
struct ParsedRule {
    rule: Rule,
    errors: Vec<String>,
    /// Rule id, or the file stem when the id is missing
    error_id: String,
}

/// Load every team's rules, failing on the first malformed file
pub fn load(rules_root: &Path) -> Result<Vec<Team>> {
    let mut teams = Vec::new();

    for (team_name, files) in corpus_layout(rules_root)? {
        let mut rules = Vec::new();
        for file in files {
            let content = std::fs::read_to_string(&file)?;
            let parsed = parse_rule_file(&file, &content);
            if !parsed.errors.is_empty() {
                return Err(ScanError::RuleFile(parsed.errors.join(" ")));
            }
            rules.push(parsed.rule);
        }
        debug!("Loaded {} rule(s) for team {}", rules.len(), team_name);
        teams.push(Team { team_name, rules });
    }

    Ok(teams)
}

/// Walk the whole corpus and collect structural and schema errors.
///
/// Only a missing or empty root is fatal; everything else lands in
/// [`RuleValidation::errors`].
pub fn validate(rules_root: &Path) -> Result<RuleValidation> {
    let mut validation = RuleValidation::default();

    for (team_name, files) in corpus_layout(rules_root)? {
        let mut rules = Vec::new();
        for file in files {
            let parsed = match std::fs::read_to_string(&file) {
                Ok(content) => parse_rule_file(&file, &content),
                Err(e) => ParsedRule {
                    rule: Rule::default(),
                    errors: vec![e.to_string()],
                    error_id: file_stem(&file),
                },
            };

            let schema_errors = validate_rule(&parsed.rule);
            for message in parsed.errors.into_iter().chain(schema_errors) {
                validation.errors.push(RuleError {
                    team: team_name.clone(),
                    rule_id: parsed.error_id.clone(),
                    message,
                });
            }
            rules.push(parsed.rule);
        }
        validation.teams.push(Team { team_name, rules });
    }

    info!(
        "Validated {} team(s), {} error(s)",
        validation.teams.len(),
        validation.errors.len()
    );

    Ok(validation)
}

/// Load a single rule file
pub fn load_rule(path: &Path) -> Result<Rule> {
    let content = std::fs::read_to_string(path)?;
    let parsed = parse_rule_file(path, &content);
    if parsed.errors.is_empty() {
        Ok(parsed.rule)
    } else {
        Err(ScanError::RuleFile(parsed.errors.join(" ")))
    }
}

/// Team directories and their rule files, both in lexical order
fn corpus_layout(rules_root: &Path) -> Result<Vec<(String, Vec<PathBuf>)>> {
    if rules_root.as_os_str().is_empty() {
        return Err(ScanError::RulesRootRequired);
    }
    if !rules_root.exists() {
        return Err(ScanError::RulesNotFound(rules_root.to_path_buf()));
    }

    let mut team_dirs: Vec<PathBuf> = std::fs::read_dir(rules_root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    team_dirs.sort();

    let mut layout = Vec::new();
    for dir in team_dirs {
        let team_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_rule_file(path))
            .collect();
        files.sort();

        layout.push((team_name, files));
    }

    Ok(layout)
}

fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| RULE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn parse_rule_file(path: &Path, content: &str) -> ParsedRule {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if ext == "json" {
        parse_json_rule(path, content)
    } else {
        parse_flat_rule(path, content)
    }
}

/// Parse the strict-object serialization
fn parse_json_rule(path: &Path, content: &str) -> ParsedRule {
    let document: serde_json::Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(_) => {
            return ParsedRule {
                rule: Rule::default(),
                errors: vec![format!(
                    "Rule file {} contains empty or invalid JSON.",
                    path.display()
                )],
                error_id: file_stem(path),
            };
        }
    };

    let Some(object) = document.as_object() else {
        return ParsedRule {
            rule: Rule::default(),
            errors: vec!["Rule definition must be a JSON object.".to_string()],
            error_id: file_stem(path),
        };
    };

    let mut errors = Vec::new();
    let mut values: Vec<(&str, Option<String>)> = Vec::new();

    for (name, value) in object {
        let Some(known) = ALLOWED_PROPERTIES.iter().find(|p| **p == name.as_str()) else {
            errors.push(format!("Unknown property '{}'.", name));
            continue;
        };
        match value.as_str() {
            Some(s) => values.push((*known, Some(s.to_string()))),
            None => {
                errors.push(format!("Property '{}' must be a string.", name));
                values.push((*known, None));
            }
        }
    }

    finish_rule(path, values, errors)
}

/// Parse the flat `key: value` serialization
fn parse_flat_rule(path: &Path, content: &str) -> ParsedRule {
    let mut errors = Vec::new();
    let mut values: Vec<(&str, Option<String>)> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(colon) = trimmed.find(':').filter(|i| *i > 0) else {
            continue;
        };

        let key = trimmed[..colon].trim();
        let value = strip_double_quotes(trimmed[colon + 1..].trim());

        match ALLOWED_PROPERTIES.iter().find(|p| **p == key) {
            Some(known) => values.push((*known, Some(value.to_string()))),
            None => errors.push(format!("Unknown property '{}'.", key)),
        }
    }

    finish_rule(path, values, errors)
}

fn strip_double_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Assemble a rule from collected key/value pairs; later keys win
fn finish_rule(path: &Path, values: Vec<(&str, Option<String>)>, mut errors: Vec<String>) -> ParsedRule {
    for required in REQUIRED_PROPERTIES {
        if !values.iter().any(|(key, _)| key == required) {
            errors.push(format!("Missing required property '{}'.", required));
        }
    }

    let lookup = |name: &str| -> Option<String> {
        values
            .iter()
            .rev()
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| value.clone())
    };

    let rule = Rule {
        id: lookup("id").unwrap_or_default(),
        description: lookup("description").unwrap_or_default(),
        severity: lookup("severity").unwrap_or_default(),
        check_id: lookup("checkId").unwrap_or_default(),
        applies_to: normalize_optional(lookup("appliesTo")),
        recommendation: normalize_optional(lookup("recommendation")),
        wcag_criteria: normalize_optional(lookup("wcagCriteria")),
        problem_tags: normalize_optional(lookup("problemTags")),
    };

    let error_id = if rule.id.is_empty() {
        file_stem(path)
    } else {
        rule.id.clone()
    };

    ParsedRule {
        rule,
        errors,
        error_id,
    }
}

/// Blank optional fields are treated as absent
fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, content).expect("write");
    }

    #[test]
    fn test_json_rule_parses_and_normalizes_optional_fields() {
        let parsed = parse_json_rule(
            Path::new("team/alt.json"),
            r#"{"id":"alt","description":"Alt text","severity":"high","checkId":"missing-alt-text","recommendation":"   "}"#,
        );
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rule.id, "alt");
        assert_eq!(parsed.rule.recommendation, None);
    }

    #[test]
    fn test_json_rule_reports_unknown_and_non_string_properties_in_order() {
        let parsed = parse_json_rule(
            Path::new("team/broken.json"),
            r#"{"zeta":"x","id":5,"description":"d","severity":"low","checkId":"missing-label"}"#,
        );
        assert_eq!(
            parsed.errors,
            vec![
                "Unknown property 'zeta'.",
                "Property 'id' must be a string.",
            ]
        );
        assert_eq!(parsed.error_id, "broken");
    }

    #[test]
    fn test_json_rule_must_be_an_object() {
        let parsed = parse_json_rule(Path::new("team/list.json"), "[1, 2]");
        assert_eq!(parsed.errors, vec!["Rule definition must be a JSON object."]);
    }

    #[test]
    fn test_invalid_json_message_names_the_file() {
        let parsed = parse_json_rule(Path::new("team/empty.json"), "");
        assert_eq!(
            parsed.errors,
            vec!["Rule file team/empty.json contains empty or invalid JSON."]
        );
    }

    #[test]
    fn test_flat_rule_parsing() {
        let parsed = parse_flat_rule(
            Path::new("team/title.yml"),
            "# page titles\n\nid: title\ndescription: \"Pages need titles\"\nseverity: medium\ncheckId: missing-page-title\nwcagCriteria: 2.4.2\nnotes: extra\n",
        );
        assert_eq!(parsed.errors, vec!["Unknown property 'notes'."]);
        assert_eq!(parsed.rule.description, "Pages need titles");
        assert_eq!(parsed.rule.wcag_criteria.as_deref(), Some("2.4.2"));
    }

    #[test]
    fn test_flat_rule_missing_required_uses_file_stem() {
        let parsed = parse_flat_rule(Path::new("team/partial.yaml"), "description: d\n");
        assert_eq!(parsed.error_id, "partial");
        assert_eq!(
            parsed.errors,
            vec![
                "Missing required property 'id'.",
                "Missing required property 'severity'.",
                "Missing required property 'checkId'.",
            ]
        );
    }

    #[test]
    fn test_load_requires_root() {
        assert!(matches!(load(Path::new("")), Err(ScanError::RulesRootRequired)));
        assert!(matches!(
            load(Path::new("/nonexistent/rules/root")),
            Err(ScanError::RulesNotFound(_))
        ));
    }

    #[test]
    fn test_load_fails_fast_and_validate_collects() {
        let dir = TempDir::new().expect("tempdir");
        write(
            dir.path(),
            "a-team/good.json",
            r#"{"id":"good","description":"d","severity":"low","checkId":"missing-label"}"#,
        );
        write(dir.path(), "a-team/bad.json", r#"{"id":"bad","extra":"x"}"#);
        write(
            dir.path(),
            "b-team/severity.yml",
            "id: sev\ndescription: d\nseverity: urgent\ncheckId: missing-label\n",
        );
        write(dir.path(), "b-team/readme.txt", "ignored");

        let err = load(dir.path()).expect_err("load should fail");
        assert!(err.to_string().contains("Unknown property 'extra'."));

        let validation = validate(dir.path()).expect("validate should run");
        assert!(!validation.is_valid());
        assert_eq!(validation.teams.len(), 2);
        assert_eq!(validation.teams[0].team_name, "a-team");
        assert_eq!(validation.teams[0].rules.len(), 2);
        assert_eq!(validation.teams[1].rules.len(), 1);

        let tagged: Vec<(String, String)> = validation
            .errors
            .iter()
            .map(|e| (e.team.clone(), e.rule_id.clone()))
            .collect();
        assert!(tagged.contains(&("a-team".to_string(), "bad".to_string())));
        assert!(tagged.contains(&("b-team".to_string(), "sev".to_string())));
        assert!(validation
            .errors
            .iter()
            .any(|e| e.message == "Rule severity must be low, medium, or high."));
    }

    #[test]
    fn test_load_valid_corpus() {
        let dir = TempDir::new().expect("tempdir");
        write(
            dir.path(),
            "web/lang.yaml",
            "id: lang\ndescription: Language\nseverity: high\ncheckId: missing-document-language\nappliesTo: html\n",
        );
        let teams = load(dir.path()).expect("load");
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].rules[0].applies_to.as_deref(), Some("html"));

        let rule = load_rule(&dir.path().join("web/lang.yaml")).expect("single rule");
        assert_eq!(rule.check_id, "missing-document-language");
    }
}
