// SPDX-License-Identifier: PMPL-1.0-or-later
//! Single-document scanning for captured pages and fragments

use super::{resolve_rules, DedupKey, Scanner};
use crate::context::stylesheets::LinkBase;
use crate::context::{document_stylesheets, runtime_contexts};
use crate::error::Result;
use crate::model::{Dialect, Document, Issue, ResolvedRule};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

/// A captured document to scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
    pub rules_root: PathBuf,
    pub url: String,
    pub content: String,
    /// Declared dialect; unrecognised values are scanned as HTML
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_kind() -> String {
    "html".to_string()
}

fn default_content_type() -> String {
    "text/html".to_string()
}

impl DocumentRequest {
    pub fn new(rules_root: impl Into<PathBuf>, url: &str, content: &str) -> Self {
        Self {
            rules_root: rules_root.into(),
            url: url.to_string(),
            content: content.to_string(),
            kind: default_kind(),
            content_type: default_content_type(),
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = kind.to_string();
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }
}

/// Result of scanning one document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentScan {
    pub document: Document,
    pub issues: Vec<Issue>,
    pub rules: Vec<ResolvedRule>,
}

impl Scanner {
    /// Scan one captured document.
    ///
    /// The rule corpus is validated first; an invalid corpus fails the scan
    /// before any check runs.
    pub fn scan_document(&self, request: &DocumentRequest) -> Result<DocumentScan> {
        let rules = resolve_rules(&request.rules_root)?;

        let declared = request.kind.trim().to_ascii_lowercase();
        let kind = Dialect::parse(&declared);
        let contexts = runtime_contexts(&request.url, &request.content, kind);
        debug!("Built {} view(s) for {} as {}", contexts.len(), request.url, declared);

        let mut seen: HashSet<DedupKey> = HashSet::new();
        let issues = self.evaluate(&contexts, &rules, &mut seen);
        info!("Scanned {}: {} issue(s)", request.url, issues.len());

        let document = Document {
            url: request.url.clone(),
            content_type: request.content_type.clone(),
            kind: declared,
            stylesheets: document_stylesheets(&request.content, kind, LinkBase::Url(&request.url)),
            body: Some(request.content.clone()),
        };

        Ok(DocumentScan {
            document,
            issues,
            rules,
        })
    }
}
