// SPDX-License-Identifier: PMPL-1.0-or-later
//! Markup and style fragments embedded in script string literals.
//!
//! The lexer walks script text once with an explicit state value. Quoted
//! strings and template literals are collected with their starting offset;
//! comments are skipped. Inside `${...}` only newlines are kept, so the
//! extracted value still spans the same number of lines as its source.

use regex::Regex;
use std::sync::LazyLock;

static HTML_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<\s*[a-z][\w:-]*(\s|>|/)").expect("valid regex"));

static CSS_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-z-]+\s*:\s*[^;]+;").expect("valid regex"));

static CSS_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("valid regex"));

/// A string or template literal lifted out of script text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub value: String,
    /// Byte offset just past the opening quote
    pub start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetKind {
    Html,
    Css,
}

/// A literal classified as markup or style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedSnippet {
    pub kind: SnippetKind,
    pub content: String,
    pub start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Normal,
    LineComment,
    BlockComment,
    Quoted(char),
    Template,
    /// `${...}` inside a template literal; `quote` is set while inside a
    /// nested string
    Interpolation { depth: usize, quote: Option<char> },
}

/// Every string and template literal in `content`, in source order.
///
/// Escapes are kept verbatim (backslash and the escaped character).
/// Unterminated literals are still returned; unterminated comments end
/// the scan.
pub fn extract_literals(content: &str) -> Vec<Literal> {
    let chars: Vec<(usize, char)> = content.char_indices().collect();
    let mut literals = Vec::new();
    let mut state = LexState::Normal;
    let mut value = String::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, n)| *n);

        match state {
            LexState::Normal => match (c, next) {
                ('/', Some('/')) => {
                    state = LexState::LineComment;
                    i += 2;
                    continue;
                }
                ('/', Some('*')) => {
                    state = LexState::BlockComment;
                    i += 2;
                    continue;
                }
                ('\'' | '"', _) => {
                    state = LexState::Quoted(c);
                    start = offset + c.len_utf8();
                    value.clear();
                }
                ('`', _) => {
                    state = LexState::Template;
                    start = offset + c.len_utf8();
                    value.clear();
                }
                _ => {}
            },
            LexState::LineComment => {
                if c == '\n' {
                    state = LexState::Normal;
                }
            }
            LexState::BlockComment => {
                if c == '*' && next == Some('/') {
                    state = LexState::Normal;
                    i += 2;
                    continue;
                }
            }
            LexState::Quoted(quote) => {
                if c == '\\' {
                    value.push(c);
                    value.extend(next);
                    i += 2;
                    continue;
                }
                if c == quote {
                    literals.push(Literal {
                        value: std::mem::take(&mut value),
                        start,
                    });
                    state = LexState::Normal;
                } else {
                    value.push(c);
                }
            }
            LexState::Template => {
                if c == '\\' {
                    value.push(c);
                    value.extend(next);
                    i += 2;
                    continue;
                }
                if c == '`' {
                    literals.push(Literal {
                        value: std::mem::take(&mut value),
                        start,
                    });
                    state = LexState::Normal;
                } else if c == '$' && next == Some('{') {
                    state = LexState::Interpolation {
                        depth: 1,
                        quote: None,
                    };
                    i += 2;
                    continue;
                } else {
                    value.push(c);
                }
            }
            LexState::Interpolation {
                depth,
                quote: Some(quote),
            } => {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if c == quote {
                    state = LexState::Interpolation { depth, quote: None };
                } else if c == '\n' {
                    value.push('\n');
                }
            }
            LexState::Interpolation { depth, quote: None } => match c {
                '\'' | '"' | '`' => {
                    state = LexState::Interpolation {
                        depth,
                        quote: Some(c),
                    };
                }
                '{' => {
                    state = LexState::Interpolation {
                        depth: depth + 1,
                        quote: None,
                    };
                }
                '}' => {
                    state = if depth <= 1 {
                        LexState::Template
                    } else {
                        LexState::Interpolation {
                            depth: depth - 1,
                            quote: None,
                        }
                    };
                }
                '\n' => value.push('\n'),
                _ => {}
            },
        }
        i += 1;
    }

    if matches!(
        state,
        LexState::Quoted(_) | LexState::Template | LexState::Interpolation { .. }
    ) {
        literals.push(Literal { value, start });
    }

    literals
}

pub fn is_html_fragment(value: &str) -> bool {
    HTML_FRAGMENT.is_match(value)
}

pub fn is_css_fragment(value: &str) -> bool {
    CSS_DECLARATION.is_match(value) || CSS_BLOCK.is_match(value)
}

/// HTML and CSS fragments found in script literals. A literal that looks
/// like both is returned once per kind.
pub fn extract_embedded(content: &str) -> Vec<EmbeddedSnippet> {
    let mut snippets = Vec::new();
    for literal in extract_literals(content) {
        if literal.value.is_empty() {
            continue;
        }
        if is_html_fragment(&literal.value) {
            snippets.push(EmbeddedSnippet {
                kind: SnippetKind::Html,
                content: literal.value.clone(),
                start: literal.start,
            });
        }
        if is_css_fragment(&literal.value) {
            snippets.push(EmbeddedSnippet {
                kind: SnippetKind::Css,
                content: literal.value,
                start: literal.start,
            });
        }
    }
    snippets
}

/// Prefix `snippet` with one newline per line that precedes `start` in
/// `source`, so line numbers inside the snippet match the source file
pub fn padded_content(source: &str, start: usize, snippet: &str) -> String {
    let end = start.min(source.len());
    let offset = source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count();
    let mut padded = "\n".repeat(offset);
    padded.push_str(snippet);
    padded
}
