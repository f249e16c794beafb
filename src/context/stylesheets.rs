// SPDX-License-Identifier: PMPL-1.0-or-later
//! Linked stylesheet discovery.
//!
//! Static scans resolve `<link rel="stylesheet">` hrefs against the file's
//! path inside the scan root; runtime scans resolve them against the
//! document URL.

use crate::markup::attribute_value;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static LINK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<link(?P<attrs>[^>]*?)>").expect("valid regex"));

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+.-]*:").expect("valid regex"));

/// What relative hrefs are resolved against
#[derive(Debug, Clone, Copy)]
pub enum LinkBase<'a> {
    /// Root-relative file path, `/`-separated
    Path(&'a str),
    Url(&'a str),
}

pub fn strip_query_and_hash(value: &str) -> &str {
    let without_hash = value.split('#').next().unwrap_or_default();
    without_hash.split('?').next().unwrap_or_default()
}

pub fn is_stylesheet_rel(rel: &str) -> bool {
    rel.split_whitespace()
        .any(|token| token.eq_ignore_ascii_case("stylesheet"))
}

/// Lexically normalize a `/`-separated path: drop `.` segments and fold
/// `..` into the preceding segment
fn normalize_posix(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(segments.last(), Some(last) if *last != "..") {
                    segments.pop();
                } else {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        ".".to_string()
    } else {
        segments.join("/")
    }
}

/// Resolve `href` relative to the file at `base_path`.
///
/// Remote and scheme-qualified hrefs are not part of the tree and yield
/// `None`; a leading `/` is rooted at the scan root.
pub fn resolve_stylesheet_path(href: &str, base_path: &str) -> Option<String> {
    if base_path.is_empty() {
        return None;
    }
    let trimmed = strip_query_and_hash(href.trim());
    if trimmed.is_empty() || SCHEME.is_match(trimmed) || trimmed.starts_with("//") {
        return None;
    }
    if let Some(rooted) = trimmed.strip_prefix('/') {
        return Some(normalize_posix(rooted));
    }
    let base_dir = match base_path.rfind('/') {
        Some(index) => &base_path[..index],
        None => "",
    };
    Some(normalize_posix(&format!("{}/{}", base_dir, trimmed)))
}

/// Resolve `href` against a document URL; only http(s) results are kept
pub fn resolve_stylesheet_url(href: &str, base_url: &str) -> Option<String> {
    let trimmed = strip_query_and_hash(href.trim());
    if trimmed.is_empty() {
        return None;
    }
    let base = Url::parse(base_url).ok()?;
    let mut resolved = base.join(trimmed).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved.to_string())
}

/// Stylesheets linked from `content`, de-duplicated in first-seen order
pub fn extract_stylesheet_links(content: &str, base: LinkBase<'_>) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    for caps in LINK_TAG.captures_iter(content) {
        let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
        if !attribute_value(attrs, "rel").map(is_stylesheet_rel).unwrap_or(false) {
            continue;
        }
        let Some(href) = attribute_value(attrs, "href") else {
            continue;
        };
        let resolved = match base {
            LinkBase::Path(path) => resolve_stylesheet_path(href, path),
            LinkBase::Url(url) => resolve_stylesheet_url(href, url),
        };
        if let Some(resolved) = resolved {
            if !links.contains(&resolved) {
                links.push(resolved);
            }
        }
    }
    links
}
