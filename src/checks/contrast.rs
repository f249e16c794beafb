// SPDX-License-Identifier: PMPL-1.0-or-later
//! Color contrast - WCAG 1.4.3 Contrast (Minimum) (Level AA)
//!
//! Finds declared foreground/background pairs and computes their contrast
//! ratio with the WCAG luminance formula. Pairs come from:
//! - CSS rule blocks (`color` with `background-color`/`background`)
//! - inline `style` attributes
//! - XAML `Foreground`/`Background` attributes, including binding
//!   `FallbackValue`s
//!
//! Only hex colors are evaluated. Anything that does not resolve to hex
//! (named colors, functions, `var()` without a fallback) is skipped.

use super::{issue_at, Check};
use crate::context::ScanContext;
use crate::model::{Dialect, Issue, Rule};
use regex::Regex;
use std::sync::LazyLock;

static STYLE_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)style="(?P<style>[^"]+)""#).expect("valid regex"));

static XAML_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?P<tag>[\w:.-]+)(?P<attrs>[^>]*?)>").expect("valid regex"));

static CSS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<selector>[^{]+)\{(?P<body>[^}]+)\}").expect("valid regex"));

static XAML_FOREGROUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)Foreground\s*=\s*"(?P<value>[^"]+)""#).expect("valid regex"));

static XAML_BACKGROUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)Background\s*=\s*"(?P<value>[^"]+)""#).expect("valid regex"));

/// Minimum ratio for normal text
pub const MINIMUM_RATIO: f64 = 4.5;

const BACKGROUND_PROPERTIES: &[&str] = &["background-color", "background"];

/// Where an 8-digit hex color keeps its alpha channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaPosition {
    /// `#RRGGBBAA` (CSS)
    End,
    /// `#AARRGGBB` (XAML)
    Start,
}

/// A declared color pair and where it was found
#[derive(Debug, Clone, PartialEq)]
struct Candidate<'a> {
    foreground: String,
    background: String,
    index: usize,
    snippet: &'a str,
}

/// Flags color pairs below 4.5:1
pub struct InsufficientContrastCheck;

impl Check for InsufficientContrastCheck {
    fn id(&self) -> &str {
        "insufficient-contrast"
    }

    fn description(&self) -> &str {
        "Checks declared color pairs meet a 4.5:1 contrast ratio (WCAG 1.4.3)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        &[
            Dialect::Html,
            Dialect::Htm,
            Dialect::Cshtml,
            Dialect::Razor,
            Dialect::Xaml,
            Dialect::Css,
        ]
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        let alpha = if context.kind == Dialect::Xaml {
            AlphaPosition::Start
        } else {
            AlphaPosition::End
        };

        candidates(context)
            .into_iter()
            .filter_map(|candidate| {
                let fg = parse_hex_color(&resolve_static_color(&candidate.foreground)?, alpha)?;
                let bg = parse_hex_color(&resolve_static_color(&candidate.background)?, alpha)?;
                let ratio = contrast_ratio(fg, bg);
                if ratio >= MINIMUM_RATIO {
                    return None;
                }
                Some(issue_at(
                    self.id(),
                    context,
                    rule,
                    candidate.index,
                    &format!("Color contrast ratio {:.2} is below 4.5:1.", ratio),
                    candidate.snippet,
                ))
            })
            .collect()
    }
}

fn candidates(context: &ScanContext) -> Vec<Candidate<'_>> {
    let content = context.content.as_str();
    match context.kind {
        Dialect::Xaml => XAML_ELEMENT
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let attrs = caps.name("attrs")?.as_str();
                Some(Candidate {
                    foreground: xaml_attribute(attrs, &XAML_FOREGROUND)?,
                    background: xaml_attribute(attrs, &XAML_BACKGROUND)?,
                    index: whole.start(),
                    snippet: whole.as_str(),
                })
            })
            .collect(),
        Dialect::Css => CSS_BLOCK
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let body = caps.name("body")?.as_str();
                Some(Candidate {
                    foreground: parse_css_color(body, &["color"])?,
                    background: parse_css_color(body, BACKGROUND_PROPERTIES)?,
                    index: whole.start(),
                    snippet: whole.as_str(),
                })
            })
            .collect(),
        _ => STYLE_ATTRIBUTE
            .captures_iter(content)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let style = caps.name("style")?.as_str();
                Some(Candidate {
                    foreground: parse_css_color(style, &["color"])?,
                    background: parse_css_color(style, BACKGROUND_PROPERTIES)?,
                    index: whole.start(),
                    snippet: whole.as_str(),
                })
            })
            .collect(),
    }
}

fn xaml_attribute(attrs: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(attrs)
        .and_then(|caps| caps.name("value"))
        .map(|m| m.as_str().trim().to_string())
}

/// Split on whitespace that is not inside parentheses
fn split_outside_parens(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in value.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if c.is_whitespace() && depth == 0 {
            if let Some(s) = start.take() {
                tokens.push(&value[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&value[s..]);
    }
    tokens
}

/// Pick the color token out of a shorthand value like
/// `url(bg.png) no-repeat #fff`
pub fn extract_css_color_token(value: &str) -> Option<&str> {
    split_outside_parens(value.trim()).into_iter().find(|token| {
        let lower = token.to_ascii_lowercase();
        if lower.starts_with("url(") {
            return false;
        }
        token.starts_with('#')
            || lower.starts_with("rgb(")
            || lower.starts_with("rgba(")
            || lower.starts_with("hsl(")
            || lower.starts_with("hsla(")
            || token.chars().all(|c| c.is_ascii_alphabetic())
    })
}

/// Value of the first declaration in `style` whose property is one of
/// `properties`, reduced to its color token when one is recognizable
pub fn parse_css_color(style: &str, properties: &[&str]) -> Option<String> {
    for part in style.split(';').filter(|p| !p.is_empty()) {
        let Some((property, value)) = part.split_once(':') else {
            continue;
        };
        let property = property.trim();
        if !properties.iter().any(|p| p.eq_ignore_ascii_case(property)) {
            continue;
        }
        let value = value.trim();
        return Some(extract_css_color_token(value).unwrap_or(value).to_string());
    }
    None
}

fn strip_important(value: &str) -> &str {
    let trimmed = value.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.ends_with("!important") {
        trimmed[..trimmed.len() - "!important".len()].trim()
    } else {
        trimmed
    }
}

/// Fallback of `var(--name, fallback)`
fn css_var_fallback(value: &str) -> Option<&str> {
    let start = value.find('(')?;
    let end = value.rfind(')')?;
    if end <= start {
        return None;
    }
    let inner = &value[start + 1..end];
    let (_, fallback) = inner.split_once(',')?;
    Some(strip_important(fallback))
}

/// `FallbackValue=` of a XAML binding expression
fn xaml_fallback(value: &str) -> Option<&str> {
    let key = "fallbackvalue=";
    let at = value.to_ascii_lowercase().find(key)?;
    let remainder = &value[at + key.len()..];
    let candidate = match remainder.find([',', '}']) {
        Some(end) => &remainder[..end],
        None => remainder,
    };
    let candidate = candidate.trim();
    let candidate = candidate.strip_prefix('"').unwrap_or(candidate);
    let candidate = candidate.strip_suffix('"').unwrap_or(candidate);
    Some(strip_important(candidate))
}

/// Resolve a declared color to a literal, following `var()` and binding
/// fallbacks
pub fn resolve_static_color(value: &str) -> Option<String> {
    let mut resolved = strip_important(value);
    if resolved.to_ascii_lowercase().starts_with("var(") {
        resolved = css_var_fallback(resolved).unwrap_or_default();
    }
    if resolved.starts_with('{') && resolved.ends_with('}') {
        resolved = xaml_fallback(resolved).unwrap_or_default();
    }
    if resolved.is_empty() {
        None
    } else {
        Some(resolved.to_string())
    }
}

/// Parse a 3, 4, 6 or 8 digit hex color into normalized RGB; alpha is
/// dropped
pub fn parse_hex_color(value: &str, alpha: AlphaPosition) -> Option<[f64; 3]> {
    let trimmed = value.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };
    let rgb = match (expanded.len(), alpha) {
        (8, AlphaPosition::Start) => &expanded[2..],
        _ => &expanded[..6],
    };

    let channel = |i: usize| u8::from_str_radix(&rgb[i..i + 2], 16).ok().map(|c| c as f64 / 255.0);
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Calculate relative luminance per WCAG 2.x
/// <https://www.w3.org/TR/WCAG21/#dfn-relative-luminance>
pub fn relative_luminance(rgb: [f64; 3]) -> f64 {
    let [r, g, b] = rgb.map(|c| {
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    });
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Calculate contrast ratio between two colors
/// Returns a ratio >= 1.0 (e.g., 4.5, 7.0, 21.0)
pub fn contrast_ratio(fg: [f64; 3], bg: [f64; 3]) -> f64 {
    let l1 = relative_luminance(fg);
    let l2 = relative_luminance(bg);
    let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::run_raw;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#fff", AlphaPosition::End), Some([1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_color("000000", AlphaPosition::End), Some([0.0, 0.0, 0.0]));
        assert_eq!(parse_hex_color("#ff000080", AlphaPosition::End), Some([1.0, 0.0, 0.0]));
        assert_eq!(parse_hex_color("#80ff0000", AlphaPosition::Start), Some([1.0, 0.0, 0.0]));
        assert_eq!(parse_hex_color("#f00f", AlphaPosition::End), Some([1.0, 0.0, 0.0]));
        assert_eq!(parse_hex_color("#12345", AlphaPosition::End), None);
        assert_eq!(parse_hex_color("red", AlphaPosition::End), None);
        assert_eq!(parse_hex_color("#ggg", AlphaPosition::End), None);
    }

    #[test]
    fn test_contrast_ratio_black_white() {
        let ratio = contrast_ratio([0.0; 3], [1.0; 3]);
        assert!((ratio - 21.0).abs() < 0.01, "Black on white should be ~21:1, got {:.2}", ratio);
    }

    #[test]
    fn test_contrast_ratio_grays() {
        let fg = parse_hex_color("#777777", AlphaPosition::End).unwrap();
        let bg = parse_hex_color("#888888", AlphaPosition::End).unwrap();
        assert!(contrast_ratio(fg, bg) < MINIMUM_RATIO);
    }

    #[test]
    fn test_resolve_static_color() {
        assert_eq!(resolve_static_color("#fff !important").as_deref(), Some("#fff"));
        assert_eq!(resolve_static_color("var(--fg, #333)").as_deref(), Some("#333"));
        assert_eq!(resolve_static_color("var(--fg)"), None);
        assert_eq!(
            resolve_static_color("{Binding Fg, FallbackValue=\"#222222\"}").as_deref(),
            Some("#222222")
        );
        assert_eq!(resolve_static_color("{StaticResource Brush}"), None);
    }

    #[test]
    fn test_css_color_token() {
        assert_eq!(extract_css_color_token("url(a b.png) no-repeat #fff"), Some("#fff"));
        assert_eq!(extract_css_color_token("url(x.png) #fff"), Some("#fff"));
        assert_eq!(
            parse_css_color("background: rgb(0, 0, 0) url(x.png)", BACKGROUND_PROPERTIES).as_deref(),
            Some("rgb(0, 0, 0)")
        );
        assert_eq!(parse_css_color("color:#000", &["color"]).as_deref(), Some("#000"));
        assert_eq!(parse_css_color("border-color:#000", &["color"]), None);
    }

    #[test]
    fn test_inline_style_pairs() {
        let html = "<p style=\"color: #777777; background-color: #888888\">low</p>\n<p style=\"color:#000000;background:#ffffff\">ok</p>";
        let issues = run_raw(&InsufficientContrastCheck, Dialect::Html, html);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 1);
        assert!(issues[0].message.starts_with("Color contrast ratio 1."));
        assert!(issues[0].message.ends_with(" is below 4.5:1."));
        assert_eq!(
            issues[0].evidence.as_deref(),
            Some("style=\"color: #777777; background-color: #888888\"")
        );
    }

    #[test]
    fn test_stylesheet_blocks() {
        let css = ".good { color: #000; background-color: #fff; }\n.bad { color: #aaa; background: #ccc; }\n.var { color: var(--x); background: #fff; }";
        let issues = run_raw(&InsufficientContrastCheck, Dialect::Css, css);
        assert_eq!(issues.len(), 1);
        // the block match starts on the newline that ends the previous rule
        assert_eq!(issues[0].line, 2);
        assert!(issues[0].evidence.as_deref().unwrap().contains(".bad"));
    }

    #[test]
    fn test_xaml_attributes() {
        let xaml = "<Grid>\n  <TextBlock Foreground=\"#FF777777\" Background=\"{Binding Bg, FallbackValue=#888888}\" />\n</Grid>";
        let issues = run_raw(&InsufficientContrastCheck, Dialect::Xaml, xaml);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, 2);
    }

    #[test]
    fn test_unresolvable_colors_are_skipped() {
        let html = r#"<p style="color: gray; background-color: white">x</p>"#;
        assert!(run_raw(&InsufficientContrastCheck, Dialect::Html, html).is_empty());
    }
}
