// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration for tree scans

use crate::error::{Result, ScanError};
use crate::model::Dialect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How files with one extension are evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileKind {
    /// Dialect the file is checked as
    pub kind: Dialect,

    /// Authoring dialect when it differs from `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_kind: Option<Dialect>,

    pub content_type: String,
}

impl FileKind {
    fn new(kind: Dialect, source_kind: Option<Dialect>, content_type: &str) -> Self {
        Self {
            kind,
            source_kind,
            content_type: content_type.to_string(),
        }
    }

    /// Dialect recorded on the scanned document
    pub fn document_kind(&self) -> Dialect {
        self.source_kind.unwrap_or(self.kind)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory names never descended into
    #[serde(default = "default_ignored_dirs")]
    pub ignored_dirs: Vec<String>,

    /// Follow symbolic links while walking
    #[serde(default)]
    pub follow_links: bool,

    /// File extension (no dot, lowercase) to dialect mapping
    #[serde(default = "default_extensions")]
    pub extensions: BTreeMap<String, FileKind>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignored_dirs: default_ignored_dirs(),
            follow_links: false,
            extensions: default_extensions(),
        }
    }
}

impl ScanConfig {
    /// Mapping for a file, matched on its lowercased extension
    pub fn file_kind(&self, path: &Path) -> Option<&FileKind> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.extensions.get(&ext)
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dirs.iter().any(|d| d == name)
    }
}

fn default_ignored_dirs() -> Vec<String> {
    [".git", "bin", "obj", "dist", "build", "out", "coverage", "node_modules"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

fn default_extensions() -> BTreeMap<String, FileKind> {
    let html = "text/html";
    [
        ("java", FileKind::new(Dialect::Java, None, "text/x-java-source")),
        ("ftl", FileKind::new(Dialect::Html, Some(Dialect::Ftl), html)),
        ("cs", FileKind::new(Dialect::Cs, None, "text/x-csharp")),
        ("html", FileKind::new(Dialect::Html, None, html)),
        ("htm", FileKind::new(Dialect::Html, None, html)),
        ("cshtml", FileKind::new(Dialect::Cshtml, None, html)),
        ("razor", FileKind::new(Dialect::Razor, None, html)),
        ("xaml", FileKind::new(Dialect::Xaml, None, "application/xaml+xml")),
        ("css", FileKind::new(Dialect::Css, None, "text/css")),
        ("js", FileKind::new(Dialect::Js, None, "text/javascript")),
    ]
    .into_iter()
    .map(|(ext, kind)| (ext.to_string(), kind))
    .collect()
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|e| e == "toml").unwrap_or(false)
}

/// Load configuration from a path
pub fn load_config(path: &Path) -> Result<ScanConfig> {
    if !path.exists() {
        debug!("Config file not found at {}, using defaults", path.display());
        return Ok(ScanConfig::default());
    }

    let content = std::fs::read_to_string(path)?;

    let mut config: ScanConfig = if is_toml(path) {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    config.extensions = config
        .extensions
        .into_iter()
        .map(|(ext, kind)| (ext.trim_start_matches('.').to_ascii_lowercase(), kind))
        .collect();

    debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Get the default config path for a scan root
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(".a11yscan.toml")
}

/// Write default configuration to a file
pub fn write_default_config(path: &Path) -> Result<()> {
    let config = ScanConfig::default();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = if is_toml(path) {
        toml::to_string_pretty(&config).map_err(|e| ScanError::Config(e.to_string()))?
    } else {
        serde_yaml::to_string(&config)?
    };

    std::fs::write(path, content)?;
    Ok(())
}
