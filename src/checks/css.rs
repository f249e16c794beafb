// SPDX-License-Identifier: PMPL-1.0-or-later
//! Layout and text adaptation - WCAG 1.4.10 Reflow, 1.4.12 Text Spacing
//!
//! Inline styles (and XAML layout attributes) that pin elements in place,
//! fix their width, or stop text from wrapping.

use super::{issue_at, Check, LAYOUT_KINDS};
use crate::context::ScanContext;
use crate::markup::{attribute_value, is_fixed_length, last_property_value, parse_leading_float};
use crate::model::{Dialect, Issue, Rule};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?P<tag>[a-zA-Z0-9:-]+)(?P<attrs>[^>]*)>").expect("valid regex"));

static SPACING_OVERRIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(line-height|letter-spacing|word-spacing)\s*:\s*[^;]+!important").expect("valid regex")
});

static NOWRAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)white-space\s*:\s*nowrap").expect("valid regex"));

const CANVAS_ATTRIBUTES: &[&str] = &[
    "Canvas.Left",
    "Canvas.Top",
    "Canvas.Right",
    "Canvas.Bottom",
    "AbsoluteLayout.LayoutBounds",
];

const TEXT_SPACING_KINDS: &[Dialect] = &[
    Dialect::Html,
    Dialect::Htm,
    Dialect::Cshtml,
    Dialect::Razor,
    Dialect::Css,
];

/// Run `inspect` over every opening tag and turn its messages into issues
fn scan_tags<F>(check_id: &str, context: &ScanContext, rule: &Rule, mut inspect: F) -> Vec<Issue>
where
    F: FnMut(&str) -> Option<String>,
{
    TAG.captures_iter(&context.content)
        .filter_map(|caps: Captures<'_>| {
            let whole = caps.get(0)?;
            let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or_default();
            let message = inspect(attrs)?;
            Some(issue_at(check_id, context, rule, whole.start(), &message, whole.as_str()))
        })
        .collect()
}

fn inline_style(attrs: &str) -> &str {
    attribute_value(attrs, "style").unwrap_or_default()
}

/// Flags `position: absolute|fixed` and XAML canvas coordinates
pub struct AbsolutePositioningCheck;

/// `absolute` or `fixed`
pub fn is_absolute_position(value: &str) -> bool {
    value.eq_ignore_ascii_case("absolute") || value.eq_ignore_ascii_case("fixed")
}

impl Check for AbsolutePositioningCheck {
    fn id(&self) -> &str {
        "absolute-positioning"
    }

    fn description(&self) -> &str {
        "Checks for absolutely positioned layout (WCAG 1.4.10)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        LAYOUT_KINDS
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        if context.kind == Dialect::Xaml {
            return scan_tags(self.id(), context, rule, |attrs| {
                CANVAS_ATTRIBUTES.iter().find_map(|name| {
                    let value = attribute_value(attrs, name).filter(|v| !v.trim().is_empty())?;
                    Some(format!(
                        "XAML element uses absolute positioning ({}=\"{}\").",
                        name, value
                    ))
                })
            });
        }

        scan_tags(self.id(), context, rule, |attrs| {
            let position = last_property_value(inline_style(attrs), "position")?;
            is_absolute_position(position).then(|| format!("Element uses position: {}.", position))
        })
    }
}

/// Flags fixed widths in inline styles, `width` attributes and XAML
pub struct FixedWidthLayoutCheck;

/// XAML `Width`/`MinWidth`: positive number, not `Auto` or star sizing
pub fn is_fixed_xaml_width(value: &str) -> bool {
    if value.trim().is_empty() || value.eq_ignore_ascii_case("auto") || value.contains('*') {
        return false;
    }
    parse_leading_float(value).map(|n| n > 0.0).unwrap_or(false)
}

/// HTML `width` attribute: a length or bare positive number, not a percentage
pub fn is_fixed_markup_width(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.ends_with('%') {
        return false;
    }
    is_fixed_length(trimmed) || parse_leading_float(trimmed).map(|n| n > 0.0).unwrap_or(false)
}

impl Check for FixedWidthLayoutCheck {
    fn id(&self) -> &str {
        "fixed-width-layout"
    }

    fn description(&self) -> &str {
        "Checks for fixed-width containers that prevent reflow (WCAG 1.4.10)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        LAYOUT_KINDS
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        if context.kind == Dialect::Xaml {
            return scan_tags(self.id(), context, rule, |attrs| {
                if let Some(width) = attribute_value(attrs, "Width").filter(|v| is_fixed_xaml_width(v)) {
                    return Some(format!("XAML element uses fixed width (Width=\"{}\").", width));
                }
                let min_width = attribute_value(attrs, "MinWidth").filter(|v| is_fixed_xaml_width(v))?;
                Some(format!(
                    "XAML element uses fixed minimum width (MinWidth=\"{}\").",
                    min_width
                ))
            });
        }

        scan_tags(self.id(), context, rule, |attrs| {
            let style = inline_style(attrs);
            for (property, label) in [("width", "width"), ("min-width", "minimum width")] {
                if let Some(value) = last_property_value(style, property).filter(|v| is_fixed_length(v)) {
                    return Some(format!("Element uses fixed {} ({}: {}).", label, property, value));
                }
            }
            let width = attribute_value(attrs, "width").filter(|v| is_fixed_markup_width(v))?;
            Some(format!("Element uses a fixed width attribute (width=\"{}\").", width))
        })
    }
}

/// Flags `white-space: nowrap|pre` and XAML `TextWrapping="NoWrap"`
pub struct NonWrappingContainerCheck;

impl Check for NonWrappingContainerCheck {
    fn id(&self) -> &str {
        "non-wrapping-container"
    }

    fn description(&self) -> &str {
        "Checks for containers that disable text wrapping (WCAG 1.4.10)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        LAYOUT_KINDS
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        if context.kind == Dialect::Xaml {
            return scan_tags(self.id(), context, rule, |attrs| {
                attribute_value(attrs, "TextWrapping")
                    .filter(|v| v.eq_ignore_ascii_case("nowrap"))
                    .map(|_| "XAML element disables text wrapping (TextWrapping=\"NoWrap\").".to_string())
            });
        }

        scan_tags(self.id(), context, rule, |attrs| {
            let white_space = last_property_value(inline_style(attrs), "white-space")?;
            (white_space.eq_ignore_ascii_case("nowrap") || white_space.eq_ignore_ascii_case("pre"))
                .then(|| format!("Element prevents text wrapping (white-space: {}).", white_space))
        })
    }
}

/// Flags `!important` spacing overrides and disabled wrapping, once each
pub struct TextSpacingCheck;

impl Check for TextSpacingCheck {
    fn id(&self) -> &str {
        "text-spacing"
    }

    fn description(&self) -> &str {
        "Checks for styles that block text spacing adjustments (WCAG 1.4.12)"
    }

    fn applicable_kinds(&self) -> &[Dialect] {
        TEXT_SPACING_KINDS
    }

    fn run(&self, context: &ScanContext, rule: &Rule) -> Vec<Issue> {
        [
            (&*SPACING_OVERRIDE, "Text spacing overrides may block user adjustments."),
            (&*NOWRAP, "Text wrapping is disabled; verify spacing adjustments remain usable."),
        ]
        .into_iter()
        .filter_map(|(pattern, message)| {
            let found = pattern.find(&context.content)?;
            Some(issue_at(self.id(), context, rule, found.start(), message, found.as_str()))
        })
        .collect()
    }
}
