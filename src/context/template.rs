// SPDX-License-Identifier: PMPL-1.0-or-later
//! Macro-template normalization.
//!
//! Template sources mix HTML with macro calls (`<@name attrs>body</@name>`,
//! `<@name attrs/>`), interpolations (`${expr}`), directives (`<#if>`,
//! `[#list]`) and two comment forms (`<#-- -->`, `[#-- --]`). Rendering turns
//! them into inert markup while keeping every line where it was, so issues
//! found in the rendered view point at the right line of the source.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Token that stands in for every `${...}` interpolation
pub const INTERPOLATION_PLACEHOLDER: &str = "macro";

static ANGLE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<#--.*?-->").expect("valid regex"));

static SQUARE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[#--.*?--\]").expect("valid regex"));

static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{[^}]*\}").expect("valid regex"));

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<#[^>]*?>|</#[^>]*?>|\[#[^\]]*?\]|\[/#[^\]]*?\]").expect("valid regex")
});

static MACRO_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?P<close></@(?P<close_name>[\w.-]+)\s*>)|(?P<open><@(?P<name>[\w.-]+)\b(?P<attrs>(?:[^>"']|"[^"]*"|'[^']*')*?)(?P<self_closing>/?)>)"#,
    )
    .expect("valid regex")
});

/// One macro call found in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCall<'a> {
    pub name: &'a str,
    pub attrs: &'a str,
    /// Empty for self-closing calls
    pub body: &'a str,
    /// Byte offset of the opening `<@`
    pub index: usize,
    /// Full source text of the call
    pub raw: &'a str,
}

/// Replace every character except `\n` with a space
pub fn preserve_newlines(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\n' { '\n' } else { ' ' })
        .collect()
}

fn newlines_in(value: &str) -> String {
    "\n".repeat(value.matches('\n').count())
}

/// Normalized macro name used for open/close pairing: the final dotted
/// segment, lowercased
fn macro_key(name: &str) -> String {
    let trimmed = name.trim().to_lowercase();
    match trimmed.rsplit('.').next() {
        Some(segment) => segment.to_string(),
        None => trimmed,
    }
}

/// Whether a macro called `name` stands for any of `candidates`.
///
/// Compares case-insensitively against the full name and its final
/// dotted segment, so `ui.img` matches `img`.
pub fn macro_name_matches(name: &str, candidates: &[&str]) -> bool {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    let alias = macro_key(&normalized);
    candidates.iter().any(|candidate| {
        let candidate = candidate.trim().to_lowercase();
        candidate == normalized || candidate == alias
    })
}

/// A paired or self-closing macro tag located in the source
enum MacroSpan {
    SelfClosing {
        start: usize,
        end: usize,
        name_start: usize,
        name_end: usize,
        attrs: (usize, usize),
    },
    Block {
        open: (usize, usize),
        close: (usize, usize),
        name: (usize, usize),
        attrs: (usize, usize),
    },
}

/// Pair macro tags with a stack; a closing tag only pairs with the
/// innermost open macro of the same name, anything else stays unpaired.
fn macro_spans(content: &str) -> Vec<MacroSpan> {
    struct Open {
        key: String,
        start: usize,
        end: usize,
        name: (usize, usize),
        attrs: (usize, usize),
    }

    let mut stack: Vec<Open> = Vec::new();
    let mut spans = Vec::new();

    for caps in MACRO_TAG.captures_iter(content) {
        if let Some(close) = caps.name("close") {
            let close_key = caps
                .name("close_name")
                .map(|m| macro_key(m.as_str()))
                .unwrap_or_default();
            if stack.last().map(|open| open.key == close_key).unwrap_or(false) {
                if let Some(open) = stack.pop() {
                    spans.push(MacroSpan::Block {
                        open: (open.start, open.end),
                        close: (close.start(), close.end()),
                        name: open.name,
                        attrs: open.attrs,
                    });
                }
            }
            continue;
        }

        let (Some(open), Some(name)) = (caps.name("open"), caps.name("name")) else {
            continue;
        };
        let attrs = caps
            .name("attrs")
            .map(|m| (m.start(), m.end()))
            .unwrap_or((name.end(), name.end()));
        let self_closing = caps
            .name("self_closing")
            .map(|m| !m.as_str().is_empty())
            .unwrap_or(false);

        if self_closing {
            spans.push(MacroSpan::SelfClosing {
                start: open.start(),
                end: open.end(),
                name_start: name.start(),
                name_end: name.end(),
                attrs,
            });
        } else {
            stack.push(Open {
                key: macro_key(name.as_str()),
                start: open.start(),
                end: open.end(),
                name: (name.start(), name.end()),
                attrs,
            });
        }
    }

    spans
}

/// Every well-formed macro call in `content`, in source order
pub fn collect_macros(content: &str) -> Vec<MacroCall<'_>> {
    let mut calls: Vec<MacroCall<'_>> = macro_spans(content)
        .into_iter()
        .map(|span| match span {
            MacroSpan::SelfClosing {
                start,
                end,
                name_start,
                name_end,
                attrs,
            } => MacroCall {
                name: &content[name_start..name_end],
                attrs: content[attrs.0..attrs.1].trim_end(),
                body: "",
                index: start,
                raw: &content[start..end],
            },
            MacroSpan::Block {
                open,
                close,
                name,
                attrs,
            } => MacroCall {
                name: &content[name.0..name.1],
                attrs: &content[attrs.0..attrs.1],
                body: &content[open.1..close.0],
                index: open.0,
                raw: &content[open.0..close.1],
            },
        })
        .collect();
    calls.sort_by_key(|call| call.index);
    calls
}

/// Render a macro template into inert HTML with identical line structure.
///
/// - comments and directive tags become whitespace of the same shape
/// - `${...}` becomes [`INTERPOLATION_PLACEHOLDER`]
/// - paired macros become `<span data-macro-name="name">body</span>`
/// - self-closing macros become `<span data-macro-name="name"></span>`
///
/// Newlines removed from any rewritten construct are re-emitted right after
/// its replacement.
pub fn render_template(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let blank = |caps: &Captures| preserve_newlines(&caps[0]);
    let output = ANGLE_COMMENT.replace_all(content, blank);
    let output = SQUARE_COMMENT.replace_all(&output, blank);
    let output = INTERPOLATION.replace_all(&output, |caps: &Captures| {
        format!("{}{}", INTERPOLATION_PLACEHOLDER, newlines_in(&caps[0]))
    });
    let output = DIRECTIVE.replace_all(&output, blank).into_owned();

    rewrite_macros(&output)
}

fn rewrite_macros(content: &str) -> String {
    // (start, end, replacement), non-overlapping
    let mut edits: Vec<(usize, usize, String)> = Vec::new();

    for span in macro_spans(content) {
        match span {
            MacroSpan::SelfClosing {
                start,
                end,
                name_start,
                name_end,
                ..
            } => {
                let name = &content[name_start..name_end];
                edits.push((
                    start,
                    end,
                    format!(
                        "<span data-macro-name=\"{}\"></span>{}",
                        name,
                        newlines_in(&content[start..end])
                    ),
                ));
            }
            MacroSpan::Block {
                open, close, name, ..
            } => {
                let name = &content[name.0..name.1];
                edits.push((
                    open.0,
                    open.1,
                    format!(
                        "<span data-macro-name=\"{}\">{}",
                        name,
                        newlines_in(&content[open.0..open.1])
                    ),
                ));
                edits.push((
                    close.0,
                    close.1,
                    format!("</span>{}", newlines_in(&content[close.0..close.1])),
                ));
            }
        }
    }

    edits.sort_by_key(|(start, _, _)| *start);

    let mut rendered = String::with_capacity(content.len());
    let mut cursor = 0;
    for (start, end, replacement) in edits {
        rendered.push_str(&content[cursor..start]);
        rendered.push_str(&replacement);
        cursor = end;
    }
    rendered.push_str(&content[cursor..]);
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_newlines(value: &str) -> usize {
        value.matches('\n').count()
    }

    #[test]
    fn test_directives_are_blanked_and_lines_kept() {
        let input = "Line1\n<#if x>\nLine2\n</#if>\nLine3";
        let output = render_template(input);

        assert_eq!(count_newlines(&output), count_newlines(input));
        assert!(output.contains("Line1"));
        assert!(output.contains("Line2"));
        assert!(output.contains("Line3"));
        assert!(!output.contains("<#if"));
        assert!(!output.contains("</#if>"));
        assert_eq!(output.lines().nth(2), Some("Line2"));
    }

    #[test]
    fn test_comments_keep_their_newlines() {
        let input = "a<#-- one\ntwo\n-->b [#-- x --]c";
        let output = render_template(input);
        assert_eq!(count_newlines(&output), 2);
        assert!(!output.contains("one"));
        assert!(output.starts_with('a'));
        assert!(output.ends_with('c'));
    }

    #[test]
    fn test_interpolations_become_placeholders() {
        let output = render_template("<a href=\"${url}\">${label}</a>");
        assert_eq!(output, "<a href=\"macro\">macro</a>");

        let multi = render_template("x ${a +\n b} y");
        assert_eq!(count_newlines(&multi), 1);
    }

    #[test]
    fn test_block_and_self_closing_macros() {
        let output = render_template("<@ui.button kind=\"primary\">Save</@ui.button><@icon name=\"x\"/>");
        assert_eq!(
            output,
            "<span data-macro-name=\"ui.button\">Save</span><span data-macro-name=\"icon\"></span>"
        );
    }

    #[test]
    fn test_macro_names_pair_on_final_segment() {
        let output = render_template("<@layout.Page>body</@page>");
        assert_eq!(output, "<span data-macro-name=\"layout.Page\">body</span>");
    }

    #[test]
    fn test_mismatched_macros_are_left_alone() {
        let input = "<@card>text</@panel>";
        assert_eq!(render_template(input), input);
    }

    #[test]
    fn test_nested_macros() {
        let output = render_template("<@outer><@inner>x</@inner></@outer>");
        assert_eq!(
            output,
            "<span data-macro-name=\"outer\"><span data-macro-name=\"inner\">x</span></span>"
        );
    }

    #[test]
    fn test_multiline_macro_tag_keeps_lines() {
        let input = "<@link\n  href=\"#main\"\n>Skip</@link>\nafter";
        let output = render_template(input);
        assert_eq!(count_newlines(&output), count_newlines(input));
        assert_eq!(output.lines().last(), Some("after"));
    }

    #[test]
    fn test_collect_macros() {
        let content = "<p>\n<@img src=\"a.png\"/>\n<@ui.link href=\"/\">Home</@ui.link>";
        let calls = collect_macros(content);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "img");
        assert_eq!(calls[0].attrs, " src=\"a.png\"");
        assert_eq!(calls[0].index, 4);
        assert_eq!(calls[1].name, "ui.link");
        assert_eq!(calls[1].body, "Home");
        assert_eq!(calls[1].raw, "<@ui.link href=\"/\">Home</@ui.link>");
    }

    #[test]
    fn test_macro_name_matches() {
        assert!(macro_name_matches("ui.IMG", &["img", "image"]));
        assert!(macro_name_matches("link", &["a", "link"]));
        assert!(!macro_name_matches("linkList", &["link"]));
        assert!(!macro_name_matches("  ", &["a"]));
    }
}
