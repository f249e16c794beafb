// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for a11yscan

use crate::rules::RuleError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for a11yscan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rules root is required.")]
    RulesRootRequired,

    #[error("Rules directory not found: {}", .0.display())]
    RulesNotFound(PathBuf),

    #[error("Root directory is required.")]
    RootRequired,

    /// First structural problem hit while loading a rule corpus
    #[error("{0}")]
    RuleFile(String),

    #[error("Rule validation failed. {}", format_rule_errors(.0))]
    RuleValidation(Vec<RuleError>),

    #[error("{0}")]
    Registry(String),
}

fn format_rule_errors(errors: &[RuleError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}/{}: {}", e.team, e.rule_id, e.message))
        .collect::<Vec<_>>()
        .join(" ")
}

pub type Result<T> = std::result::Result<T, ScanError>;
