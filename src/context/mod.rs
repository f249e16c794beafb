// SPDX-License-Identifier: PMPL-1.0-or-later
//! Scan contexts: the evaluable views of a document.
//!
//! One document can yield several views. A script file is checked as script,
//! and every markup or style fragment found in its string literals becomes a
//! view of its own, padded so line numbers still match the file.

pub mod embedded;
pub mod snippet;
pub mod stylesheets;
pub mod template;

use crate::markup::line_number;
use crate::model::Dialect;
use embedded::{extract_embedded, padded_content, SnippetKind};
use scraper::Html;
use snippet::{build_snippet, ensure_html_document};
use stylesheets::{extract_stylesheet_links, LinkBase};

/// One evaluable view of a document
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub file_path: String,
    /// Text of this view; may be padded or rendered rather than the file
    pub content: String,
    pub kind: Dialect,
    /// Authoring dialect used for `appliesTo` matching
    pub source_kind: Option<Dialect>,
    /// Parsed tree, present only for HTML-shaped runtime views
    pub tree: Option<Html>,
    /// Lifted out of a larger document; page-level checks skip it
    pub fragment: bool,
}

impl ScanContext {
    /// A raw-text view with no parsed tree
    pub fn raw(file_path: &str, content: &str, kind: Dialect, source_kind: Option<Dialect>) -> Self {
        Self {
            file_path: file_path.to_string(),
            content: content.to_string(),
            kind,
            source_kind,
            tree: None,
            fragment: false,
        }
    }

    /// Mark this view as a fragment of its document
    pub fn as_fragment(mut self) -> Self {
        self.fragment = true;
        self
    }

    /// Attach a tree parsed from `html`
    pub fn with_tree(mut self, html: &str) -> Self {
        self.tree = Some(Html::parse_document(html));
        self
    }

    /// 1-based line of a byte offset into this view
    pub fn line_at(&self, index: usize) -> usize {
        line_number(&self.content, index)
    }

    /// Whether `tag` names this view's kind or its authoring kind
    pub fn matches_kind(&self, tag: &str) -> bool {
        self.kind.as_str().eq_ignore_ascii_case(tag)
            || self
                .source_kind
                .map(|k| k.as_str().eq_ignore_ascii_case(tag))
                .unwrap_or(false)
    }
}

/// Views derived from markup and style fragments inside script text
pub fn embedded_contexts(file_path: &str, source: &str, with_tree: bool) -> Vec<ScanContext> {
    extract_embedded(source)
        .into_iter()
        .map(|snippet| {
            let padded = padded_content(source, snippet.start, &snippet.content);
            match snippet.kind {
                SnippetKind::Html => {
                    let context = ScanContext::raw(file_path, &padded, Dialect::Html, Some(Dialect::Js)).as_fragment();
                    if with_tree {
                        let html = ensure_html_document(&padded);
                        context.with_tree(&html)
                    } else {
                        context
                    }
                }
                SnippetKind::Css => ScanContext::raw(file_path, &padded, Dialect::Css, Some(Dialect::Js)).as_fragment(),
            }
        })
        .collect()
}

/// Views for a document captured at runtime.
///
/// `kind` is the declared dialect, `None` when it was not recognized.
pub fn runtime_contexts(file_path: &str, content: &str, kind: Option<Dialect>) -> Vec<ScanContext> {
    let snippet = build_snippet(content, kind);
    let primary = match kind {
        Some(raw @ (Dialect::Xaml | Dialect::Java | Dialect::Cs)) => {
            return vec![ScanContext::raw(file_path, content, raw, Some(raw))];
        }
        Some(Dialect::Css) | Some(Dialect::Js) => {
            ScanContext::raw(file_path, content, snippet.kind, snippet.source_kind).with_tree(&snippet.html)
        }
        _ => ScanContext::raw(file_path, &snippet.html, snippet.kind, snippet.source_kind).with_tree(&snippet.html),
    };

    let mut contexts = vec![primary];
    if kind == Some(Dialect::Js) {
        contexts.extend(embedded_contexts(file_path, content, true));
    }
    contexts
}

/// Views for a file found during a tree walk. No parsed trees are built.
pub fn static_contexts(
    file_path: &str,
    content: &str,
    kind: Dialect,
    source_kind: Option<Dialect>,
) -> Vec<ScanContext> {
    let mut contexts = vec![ScanContext::raw(file_path, content, kind, source_kind)];
    if kind == Dialect::Js {
        contexts.extend(embedded_contexts(file_path, content, false));
    }
    contexts
}

/// Stylesheets linked from a document, including links written inside
/// markup fragments of script files
pub fn document_stylesheets(content: &str, kind: Option<Dialect>, base: LinkBase<'_>) -> Vec<String> {
    let mut links = extract_stylesheet_links(content, base);
    if kind == Some(Dialect::Js) {
        for snippet in extract_embedded(content) {
            if snippet.kind != SnippetKind::Html {
                continue;
            }
            for link in extract_stylesheet_links(&snippet.content, base) {
                if !links.contains(&link) {
                    links.push(link);
                }
            }
        }
    }
    links
}
