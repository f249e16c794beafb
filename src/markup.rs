// SPDX-License-Identifier: PMPL-1.0-or-later
//! Shallow markup helpers shared by context building and checks.
//!
//! These work on raw text: attribute strings as they appear between a tag
//! name and its closing `>`, inline style declarations, and byte offsets
//! into a document.

use regex::Regex;
use std::sync::LazyLock;

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<name>[a-zA-Z0-9:.-]+)(?:\s*=\s*(?:"(?P<double>[^"]*)"|'(?P<single>[^']*)'|(?P<bare>[^\s"'=<>`]+)))?"#)
        .expect("valid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static FIXED_LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<value>-?\d+(?:\.\d+)?)(?:px|pt|pc|cm|mm|in|em|rem)$").expect("valid regex")
});

/// 1-based line of the byte offset `index` in `content`.
///
/// An offset that sits exactly on a newline reports the following line.
pub fn line_number(content: &str, index: usize) -> usize {
    if index == 0 {
        return 1;
    }
    let bytes = content.as_bytes();
    let end = index.min(bytes.len());
    let mut line = 1 + bytes[..end].iter().filter(|b| **b == b'\n').count();
    if bytes.get(index) == Some(&b'\n') {
        line += 1;
    }
    line
}

/// Line of the first occurrence of `snippet`, or of `fallback` when absent
pub fn line_number_for_snippet(content: &str, snippet: &str, fallback: usize) -> usize {
    if content.is_empty() {
        return 1;
    }
    match content.find(snippet).filter(|_| !snippet.is_empty()) {
        Some(index) => line_number(content, index),
        None => line_number(content, fallback),
    }
}

/// Value of the first attribute named `name` (case-insensitive).
///
/// A bare attribute with no value yields `None`, as does a missing one.
pub fn attribute_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    if attrs.is_empty() || name.is_empty() {
        return None;
    }
    for caps in ATTRIBUTE.captures_iter(attrs) {
        let Some(found) = caps.name("name") else {
            continue;
        };
        if !found.as_str().eq_ignore_ascii_case(name) {
            continue;
        }
        return caps
            .name("double")
            .or_else(|| caps.name("single"))
            .or_else(|| caps.name("bare"))
            .map(|m| m.as_str());
    }
    None
}

/// Attribute value that is present and not blank
pub fn non_blank_attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    attribute_value(attrs, name).filter(|v| !v.trim().is_empty())
}

/// Whether `attrs` declares `name`.
///
/// Without `allow_boolean` only `name=` forms count; with it a bare
/// attribute (`hidden`, `disabled`) counts as well.
pub fn contains_attribute(attrs: &str, name: &str, allow_boolean: bool) -> bool {
    if attrs.is_empty() || name.is_empty() {
        return false;
    }
    let haystack = attrs.to_ascii_lowercase();
    let needle = name.to_ascii_lowercase();

    if !allow_boolean {
        return haystack.contains(&format!("{}=", needle));
    }

    let bytes = haystack.as_bytes();
    haystack.match_indices(&needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = start == 0 || bytes[start - 1].is_ascii_whitespace();
        let after_ok = end == bytes.len() || bytes[end] == b'=' || bytes[end].is_ascii_whitespace();
        before_ok && after_ok
    })
}

/// Remove tags and collapse whitespace
pub fn strip_tags(content: &str) -> String {
    let without_tags = TAG.replace_all(content, " ");
    WHITESPACE.replace_all(&without_tags, " ").trim().to_string()
}

/// Whether `content` has readable text once tags are removed
pub fn has_text_content(content: &str) -> bool {
    !TAG.replace_all(content, "").trim().is_empty()
}

/// Last non-empty value declared for `property` in an inline style
pub fn last_property_value<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    let mut value = None;
    for segment in style.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let Some(colon) = segment.find(':').filter(|i| *i > 0) else {
            continue;
        };
        if !segment[..colon].trim().eq_ignore_ascii_case(property) {
            continue;
        }
        let declared = segment[colon + 1..].trim();
        if !declared.is_empty() {
            value = Some(declared);
        }
    }
    value
}

/// Positive absolute CSS length (`12px`, `3.5em`); `auto` and percentages are fluid
pub fn is_fixed_length(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") || trimmed.ends_with('%') {
        return false;
    }
    FIXED_LENGTH
        .captures(trimmed)
        .and_then(|caps| caps.name("value"))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|n| n > 0.0)
        .unwrap_or(false)
}

/// Leading numeric prefix of `value`, parsed the way lenient markup parsers do
pub fn parse_leading_float(value: &str) -> Option<f64> {
    let trimmed = value.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in trimmed.char_indices() {
        match c {
            '-' | '+' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    trimmed[..end].trim_end_matches('.').parse().ok()
}

/// Leading integer prefix of `value` (`"-1abc"` → `-1`)
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        let sign = i == 0 && (c == '-' || c == '+');
        if !sign && !c.is_ascii_digit() {
            break;
        }
        end = i + c.len_utf8();
    }
    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_number() {
        let content = "a\nb\nc";
        assert_eq!(line_number(content, 0), 1);
        assert_eq!(line_number(content, 2), 2);
        assert_eq!(line_number(content, 4), 3);
        // an offset on a newline reports the next line
        assert_eq!(line_number(content, 1), 2);
        assert_eq!(line_number(content, 99), 3);
    }

    #[test]
    fn test_line_number_for_snippet() {
        let content = "<p>\n<img src=x>\n";
        assert_eq!(line_number_for_snippet(content, "<img src=x>", 0), 2);
        assert_eq!(line_number_for_snippet(content, "<missing>", 0), 1);
        assert_eq!(line_number_for_snippet("", "<img>", 5), 1);
    }

    #[test]
    fn test_attribute_value_forms() {
        let attrs = r#" id="main" class='wide' width=300 hidden data-x"#;
        assert_eq!(attribute_value(attrs, "ID"), Some("main"));
        assert_eq!(attribute_value(attrs, "class"), Some("wide"));
        assert_eq!(attribute_value(attrs, "width"), Some("300"));
        assert_eq!(attribute_value(attrs, "hidden"), None);
        assert_eq!(attribute_value(attrs, "title"), None);
    }

    #[test]
    fn test_attribute_value_first_match_wins() {
        assert_eq!(attribute_value(r#"alt="" alt="second""#, "alt"), Some(""));
        assert_eq!(non_blank_attribute(r#"alt="  ""#, "alt"), None);
    }

    #[test]
    fn test_contains_attribute() {
        assert!(contains_attribute(r#" AutomationProperties.Name="x""#, "automationproperties.name", false));
        assert!(!contains_attribute(" hidden", "hidden", false));
        assert!(contains_attribute(" hidden", "hidden", true));
        assert!(contains_attribute(r#" disabled="disabled""#, "disabled", true));
        assert!(!contains_attribute(r#" data-hidden="1""#, "hidden", true));
    }

    #[test]
    fn test_strip_tags_and_text_content() {
        assert_eq!(strip_tags("<span>Save</span>\n  <b>now</b>"), "Save now");
        assert!(has_text_content("<i>x</i>"));
        assert!(!has_text_content("<i class=\"icon\"></i>  "));
    }

    #[test]
    fn test_last_property_value() {
        let style = "width: 10px; color: red; width: 20px ;";
        assert_eq!(last_property_value(style, "WIDTH"), Some("20px"));
        assert_eq!(last_property_value(style, "height"), None);
    }

    #[test]
    fn test_is_fixed_length() {
        assert!(is_fixed_length("320px"));
        assert!(is_fixed_length("2.5REM"));
        assert!(!is_fixed_length("0px"));
        assert!(!is_fixed_length("50%"));
        assert!(!is_fixed_length("auto"));
        assert!(!is_fixed_length("calc(100% - 2px)"));
    }

    #[test]
    fn test_leading_number_parsing() {
        assert_eq!(parse_leading_float("120px"), Some(120.0));
        assert_eq!(parse_leading_float("1.5*"), Some(1.5));
        assert_eq!(parse_leading_float("auto"), None);
        assert_eq!(parse_leading_int("-1"), Some(-1));
        assert_eq!(parse_leading_int("3abc"), Some(3));
        assert_eq!(parse_leading_int("abc"), None);
    }
}
