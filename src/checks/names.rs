// SPDX-License-Identifier: PMPL-1.0-or-later
//! Accessible-name resolution.
//!
//! The precedence chain is written once against [`NameSource`], which is
//! implemented for raw attribute text ([`RawElement`]) and for parsed tree
//! elements ([`scraper::ElementRef`]):
//!
//! 1. `aria-label`
//! 2. `aria-labelledby`, when a referenced element has text
//! 3. `title`
//! 4. `<label for=id>` or an enclosing `<label>`
//! 5. own text content
//! 6. image `alt` text inside the element
//! 7. native `value` (or `alt` for image inputs)

use super::keyboard::VOID_ELEMENTS;
use crate::markup::{attribute_value, strip_tags};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static LABEL_FOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<label[^>]*for="([^"]+)"[^>]*>"#).expect("valid regex"));

static LABEL_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<label[^>]*>.*?</label>").expect("valid regex"));

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?P<tag>[a-zA-Z][a-zA-Z0-9:-]*)(?P<attrs>[^>]*)>").expect("valid regex")
});

static TAG_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?P<close>/)?(?P<tag>[a-zA-Z][a-zA-Z0-9:-]*)[^>]*?(?P<self_closing>/)?>").expect("valid regex")
});

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img(?P<attrs>[^>]*)>").expect("valid regex"));

/// Where an accessible name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSourceKind {
    AriaLabel,
    AriaLabelledBy,
    Title,
    Label,
    Content,
    ImageAlt,
    NativeValue,
}

/// Which optional steps of the chain apply to an element type
#[derive(Debug, Clone, Copy, Default)]
pub struct NamePolicy {
    pub labels: bool,
    pub content: bool,
    pub image_alt: bool,
    pub native_value: bool,
}

impl NamePolicy {
    /// Form controls: labels, no content
    pub const FORM_CONTROL: NamePolicy = NamePolicy {
        labels: true,
        content: false,
        image_alt: false,
        native_value: false,
    };

    /// `<button>` elements
    pub const BUTTON: NamePolicy = NamePolicy {
        labels: true,
        content: true,
        image_alt: false,
        native_value: false,
    };

    /// `<input type=button|submit|reset|image>`
    pub const INPUT_BUTTON: NamePolicy = NamePolicy {
        labels: true,
        content: false,
        image_alt: false,
        native_value: true,
    };

    /// Anchors
    pub const LINK: NamePolicy = NamePolicy {
        labels: false,
        content: true,
        image_alt: true,
        native_value: false,
    };
}

/// Document-wide facts the chain consults
#[derive(Debug, Clone, Default)]
pub struct NameScope {
    /// Lowercased id -> collapsed text of that element
    texts: HashMap<String, String>,
    /// Lowercased ids targeted by `<label for>`
    label_for: HashSet<String>,
}

impl NameScope {
    /// Scope built from raw markup
    pub fn from_markup(content: &str) -> Self {
        let mut scope = NameScope::default();

        for caps in LABEL_FOR.captures_iter(content) {
            let id = caps[1].trim();
            if !id.is_empty() {
                scope.label_for.insert(id.to_lowercase());
            }
        }

        for caps in OPEN_TAG.captures_iter(content) {
            let (Some(whole), Some(tag), Some(attrs)) = (caps.get(0), caps.name("tag"), caps.name("attrs")) else {
                continue;
            };
            let Some(id) = attribute_value(attrs.as_str(), "id").map(str::trim).filter(|i| !i.is_empty()) else {
                continue;
            };
            let tag = tag.as_str();
            let empty = attrs.as_str().ends_with('/') || VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str());
            let text = if empty {
                String::new()
            } else {
                matching_close(content, tag, whole.end())
                    .map(|end| strip_tags(&content[whole.end()..end]))
                    .unwrap_or_default()
            };
            scope.texts.entry(id.to_lowercase()).or_insert(text);
        }

        scope
    }

    /// Scope built from a parsed tree
    pub fn from_tree(tree: &Html) -> Self {
        let mut scope = NameScope::default();
        let labels = Selector::parse("label[for]").expect("valid selector");
        let with_id = Selector::parse("[id]").expect("valid selector");

        for label in tree.select(&labels) {
            if let Some(id) = label.value().attr("for").map(str::trim).filter(|i| !i.is_empty()) {
                scope.label_for.insert(id.to_lowercase());
            }
        }
        for element in tree.select(&with_id) {
            if let Some(id) = element.value().id().map(str::trim).filter(|i| !i.is_empty()) {
                scope
                    .texts
                    .entry(id.to_lowercase())
                    .or_insert_with(|| collapse(&element.text().collect::<String>()));
            }
        }

        scope
    }

    /// Whether any whitespace-separated id in `ids` names an element with text
    pub fn labelled_by_has_text(&self, ids: &str) -> bool {
        ids.split_whitespace().any(|id| {
            self.texts
                .get(&id.to_lowercase())
                .map(|text| !text.is_empty())
                .unwrap_or(false)
        })
    }

    /// Whether some element carries `id` (case-insensitive)
    pub fn has_element(&self, id: &str) -> bool {
        self.texts.contains_key(&id.trim().to_lowercase())
    }

    pub fn has_label_for(&self, id: &str) -> bool {
        let id = id.trim();
        !id.is_empty() && self.label_for.contains(&id.to_lowercase())
    }
}

/// Offset of the `</tag>` closing an element whose opening tag ends at
/// `from`, skipping nested elements of the same name
fn matching_close(content: &str, tag: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for caps in TAG_TOKEN.captures_iter(&content[from..]) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.name("tag")) else {
            continue;
        };
        if !name.as_str().eq_ignore_ascii_case(tag) {
            continue;
        }
        if caps.name("close").is_some() {
            depth -= 1;
            if depth == 0 {
                return Some(from + whole.start());
            }
        } else if caps.name("self_closing").is_none() {
            depth += 1;
        }
    }
    None
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The element-side facts the name chain needs
pub trait NameSource {
    fn attr(&self, name: &str) -> Option<String>;

    /// Whether the element sits inside a `<label>`
    fn inside_label(&self) -> bool;

    /// Tag-stripped, whitespace-collapsed text
    fn text_content(&self) -> String;

    /// `alt` values of images inside the element
    fn image_alts(&self) -> Vec<String>;
}

/// An element seen as raw text: its attribute string, optional body and
/// the offset of its opening tag
pub struct RawElement<'a> {
    pub attrs: &'a str,
    pub body: Option<&'a str>,
    pub index: usize,
    /// Byte ranges of every `<label>...</label>` in the document
    pub label_ranges: &'a [(usize, usize)],
}

/// Byte ranges of `<label>` elements in raw markup
pub fn label_ranges(content: &str) -> Vec<(usize, usize)> {
    LABEL_RANGE
        .find_iter(content)
        .map(|m| (m.start(), m.end()))
        .collect()
}

impl NameSource for RawElement<'_> {
    fn attr(&self, name: &str) -> Option<String> {
        attribute_value(self.attrs, name).map(str::to_string)
    }

    fn inside_label(&self) -> bool {
        self.label_ranges
            .iter()
            .any(|(start, end)| self.index >= *start && self.index <= *end)
    }

    fn text_content(&self) -> String {
        self.body.map(strip_tags).unwrap_or_default()
    }

    fn image_alts(&self) -> Vec<String> {
        let Some(body) = self.body else {
            return Vec::new();
        };
        IMAGE
            .captures_iter(body)
            .filter_map(|caps| caps.name("attrs"))
            .filter_map(|attrs| attribute_value(attrs.as_str(), "alt"))
            .map(str::to_string)
            .collect()
    }
}

impl NameSource for ElementRef<'_> {
    fn attr(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn inside_label(&self) -> bool {
        self.ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| ancestor.value().name().eq_ignore_ascii_case("label"))
    }

    fn text_content(&self) -> String {
        collapse(&self.text().collect::<String>())
    }

    fn image_alts(&self) -> Vec<String> {
        let images = Selector::parse("img").expect("valid selector");
        self.select(&images)
            .filter_map(|img| img.value().attr("alt"))
            .map(str::to_string)
            .collect()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// First step of the chain that yields a name, or `None` when the element
/// has no accessible name
pub fn resolve_name(element: &dyn NameSource, scope: &NameScope, policy: NamePolicy) -> Option<NameSourceKind> {
    if non_blank(element.attr("aria-label")).is_some() {
        return Some(NameSourceKind::AriaLabel);
    }

    if let Some(ids) = non_blank(element.attr("aria-labelledby")) {
        if scope.labelled_by_has_text(&ids) {
            return Some(NameSourceKind::AriaLabelledBy);
        }
    }

    if non_blank(element.attr("title")).is_some() {
        return Some(NameSourceKind::Title);
    }

    if policy.labels {
        let labelled = element.attr("id").map(|id| scope.has_label_for(&id)).unwrap_or(false);
        if labelled || element.inside_label() {
            return Some(NameSourceKind::Label);
        }
    }

    if policy.content && !element.text_content().is_empty() {
        return Some(NameSourceKind::Content);
    }

    if policy.image_alt && element.image_alts().iter().any(|alt| !alt.trim().is_empty()) {
        return Some(NameSourceKind::ImageAlt);
    }

    if policy.native_value {
        let image = element
            .attr("type")
            .map(|t| t.trim().eq_ignore_ascii_case("image"))
            .unwrap_or(false);
        let native = if image { element.attr("alt") } else { element.attr("value") };
        if non_blank(native).is_some() {
            return Some(NameSourceKind::NativeValue);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw<'a>(attrs: &'a str, body: Option<&'a str>) -> RawElement<'a> {
        RawElement {
            attrs,
            body,
            index: 0,
            label_ranges: &[],
        }
    }

    #[test]
    fn test_aria_label_wins() {
        let scope = NameScope::default();
        let el = raw(r#" aria-label="Save" title="x""#, Some(""));
        assert_eq!(resolve_name(&el, &scope, NamePolicy::BUTTON), Some(NameSourceKind::AriaLabel));
    }

    #[test]
    fn test_labelledby_requires_text() {
        let content = r#"<span id="Hint">Search the site</span><span id="empty"></span>"#;
        let scope = NameScope::from_markup(content);
        let el = raw(r#" aria-labelledby="missing hint""#, None);
        assert_eq!(
            resolve_name(&el, &scope, NamePolicy::FORM_CONTROL),
            Some(NameSourceKind::AriaLabelledBy)
        );

        let empty = raw(r#" aria-labelledby="empty""#, None);
        assert_eq!(resolve_name(&empty, &scope, NamePolicy::FORM_CONTROL), None);
    }

    #[test]
    fn test_referenced_text_spans_nested_same_tag() {
        let content = "<div id=\"outer\"><div></div>Postcode<div>x</div></div><img id=\"pic\" alt=\"Logo\"><span id=\"s\"/>";
        let scope = NameScope::from_markup(content);
        assert!(scope.labelled_by_has_text("outer"));
        assert!(!scope.labelled_by_has_text("pic"));
        assert!(!scope.labelled_by_has_text("s"));
        assert!(scope.has_element("pic"));

        let tree = NameScope::from_tree(&Html::parse_document(content));
        assert!(tree.labelled_by_has_text("outer"));
        assert!(!tree.labelled_by_has_text("pic"));
    }

    #[test]
    fn test_label_for_and_enclosing_label() {
        let content = r#"<label for="Email">Email</label><input id="email"><label>Name <input></label>"#;
        let scope = NameScope::from_markup(content);
        let ranges = label_ranges(content);

        let by_for = RawElement {
            attrs: r#" id="email""#,
            body: None,
            index: content.find("<input").unwrap(),
            label_ranges: &ranges,
        };
        assert_eq!(resolve_name(&by_for, &scope, NamePolicy::FORM_CONTROL), Some(NameSourceKind::Label));

        let enclosed = RawElement {
            attrs: "",
            body: None,
            index: content.rfind("<input").unwrap(),
            label_ranges: &ranges,
        };
        assert_eq!(resolve_name(&enclosed, &scope, NamePolicy::FORM_CONTROL), Some(NameSourceKind::Label));
    }

    #[test]
    fn test_content_image_alt_and_native_value() {
        let scope = NameScope::default();
        assert_eq!(
            resolve_name(&raw("", Some("<b> Go </b>")), &scope, NamePolicy::BUTTON),
            Some(NameSourceKind::Content)
        );
        assert_eq!(resolve_name(&raw("", Some("<i></i>")), &scope, NamePolicy::BUTTON), None);
        assert_eq!(
            resolve_name(&raw("", Some(r#"<img alt="Home">"#)), &scope, NamePolicy::LINK),
            Some(NameSourceKind::ImageAlt)
        );
        assert_eq!(
            resolve_name(&raw(r#" type="submit" value="Send""#, None), &scope, NamePolicy::INPUT_BUTTON),
            Some(NameSourceKind::NativeValue)
        );
        assert_eq!(
            resolve_name(&raw(r#" type="image" value="x""#, None), &scope, NamePolicy::INPUT_BUTTON),
            None
        );
    }

    #[test]
    fn test_tree_and_raw_agree() {
        let content = r#"<div id="lbl">Postcode</div><label>City <input id="city"></label><input aria-labelledby="lbl"><input>"#;
        let tree = Html::parse_document(content);
        let tree_scope = NameScope::from_tree(&tree);
        let raw_scope = NameScope::from_markup(content);
        let ranges = label_ranges(content);

        let inputs = Selector::parse("input").unwrap();
        let tree_results: Vec<Option<NameSourceKind>> = tree
            .select(&inputs)
            .map(|el| resolve_name(&el, &tree_scope, NamePolicy::FORM_CONTROL))
            .collect();

        let raw_pattern = Regex::new(r"(?i)<input(?P<attrs>[^>]*)>").unwrap();
        let raw_results: Vec<Option<NameSourceKind>> = raw_pattern
            .captures_iter(content)
            .map(|caps| {
                let whole = caps.get(0).unwrap();
                let el = RawElement {
                    attrs: caps.name("attrs").unwrap().as_str(),
                    body: None,
                    index: whole.start(),
                    label_ranges: &ranges,
                };
                resolve_name(&el, &raw_scope, NamePolicy::FORM_CONTROL)
            })
            .collect();

        assert_eq!(tree_results, raw_results);
        assert_eq!(
            tree_results,
            vec![Some(NameSourceKind::Label), Some(NameSourceKind::AriaLabelledBy), None]
        );
    }
}
