// SPDX-License-Identifier: PMPL-1.0-or-later
//! Document shells that give fragments an HTML-shaped enclosing view.

use crate::model::Dialect;
use regex::Regex;
use std::sync::LazyLock;

use super::template::render_template;

static HTML_ROOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<\s*html\b").expect("valid regex"));

const HEAD: &str = r#"<!doctype html><html lang="en"><head><meta charset="utf-8">"#;

/// Wrap a fragment in a minimal document; full documents pass through
pub fn ensure_html_document(content: &str) -> String {
    if HTML_ROOT.is_match(content) {
        return content.to_string();
    }
    format!("{}</head><body>{}</body></html>", HEAD, content)
}

/// Put stylesheet text inside a `<style>` element
pub fn style_shell(content: &str) -> String {
    format!("{}<style>{}</style></head><body></body></html>", HEAD, content)
}

/// Put script text inside a `<script>` element
pub fn script_shell(content: &str) -> String {
    format!("{}</head><body><script>{}</script></body></html>", HEAD, content)
}

/// HTML view of a document declared as `kind`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlSnippet {
    pub html: String,
    /// Dialect the enclosing view is evaluated as
    pub kind: Dialect,
    /// Authoring dialect when it differs from the view
    pub source_kind: Option<Dialect>,
}

/// Build the HTML-shaped view for `content`.
///
/// Unknown or non-markup kinds (`None`, xaml, java, cs) are treated as an
/// HTML fragment.
pub fn build_snippet(content: &str, kind: Option<Dialect>) -> HtmlSnippet {
    match kind {
        Some(kind) if kind.is_html_family() => HtmlSnippet {
            html: ensure_html_document(content),
            kind,
            source_kind: Some(if kind == Dialect::Htm { Dialect::Html } else { kind }),
        },
        Some(Dialect::Ftl) => HtmlSnippet {
            html: ensure_html_document(&render_template(content)),
            kind: Dialect::Html,
            source_kind: Some(Dialect::Ftl),
        },
        Some(Dialect::Css) => HtmlSnippet {
            html: style_shell(content),
            kind: Dialect::Css,
            source_kind: Some(Dialect::Css),
        },
        Some(Dialect::Js) => HtmlSnippet {
            html: script_shell(content),
            kind: Dialect::Js,
            source_kind: Some(Dialect::Js),
        },
        other => HtmlSnippet {
            html: ensure_html_document(content),
            kind: Dialect::Html,
            source_kind: other,
        },
    }
}
