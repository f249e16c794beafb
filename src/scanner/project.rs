// SPDX-License-Identifier: PMPL-1.0-or-later
//! Whole-tree scanning.
//!
//! Files are visited in a stable depth-first order and evaluated as raw
//! text only, so every check takes its pattern-based path here.

use super::{resolve_rules, DedupKey, Scanner};
use crate::config::ScanConfig;
use crate::context::stylesheets::LinkBase;
use crate::context::{document_stylesheets, static_contexts};
use crate::error::{Result, ScanError};
use crate::model::{Document, Issue, ResolvedRule};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Result of scanning a directory tree
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootScan {
    pub documents: Vec<Document>,
    pub issues: Vec<Issue>,
    pub rules: Vec<ResolvedRule>,
}

/// `path` relative to `root`, with `/` separators
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_ignored(entry: &DirEntry, config: &ScanConfig) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| config.is_ignored_dir(name))
            .unwrap_or(false)
}

impl Scanner {
    /// Scan every file under `root` whose extension the configuration maps.
    ///
    /// Duplicate issues collapse within one file only. Unreadable files are
    /// logged and skipped.
    pub fn scan_root(&self, root: &Path, rules_root: &Path, config: &ScanConfig) -> Result<RootScan> {
        if root.as_os_str().is_empty() {
            return Err(ScanError::RootRequired);
        }
        if rules_root.as_os_str().is_empty() {
            return Err(ScanError::RulesRootRequired);
        }

        let rules = resolve_rules(rules_root)?;
        info!("Scanning directory: {}", root.display());

        let mut scan = RootScan {
            rules,
            ..RootScan::default()
        };

        let walker = WalkDir::new(root)
            .follow_links(config.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_ignored(e, config));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(file_kind) = config.file_kind(path) else {
                continue;
            };

            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            let file_path = relative_path(root, path);
            let contexts = static_contexts(&file_path, &content, file_kind.kind, file_kind.source_kind);

            let mut seen: HashSet<DedupKey> = HashSet::new();
            let issues = self.evaluate(&contexts, &scan.rules, &mut seen);
            debug!("{}: {} view(s), {} issue(s)", file_path, contexts.len(), issues.len());
            scan.issues.extend(issues);

            let document_kind = file_kind.document_kind();
            scan.documents.push(Document {
                stylesheets: document_stylesheets(&content, Some(document_kind), LinkBase::Path(&file_path)),
                url: file_path,
                content_type: file_kind.content_type.clone(),
                kind: document_kind.as_str().to_string(),
                body: None,
            });
        }

        info!(
            "Scanned {} file(s), found {} issue(s)",
            scan.documents.len(),
            scan.issues.len()
        );

        Ok(scan)
    }
}
