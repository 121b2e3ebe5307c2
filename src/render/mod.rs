//! Server-side content injection for template HTML.
//!
//! Applies text and image overrides keyed by CSS selector, then rewrites
//! root-relative asset paths and sets `<base href>` so a template renders
//! correctly when served below a URL prefix. Text substitution follows the same
//! rules as the live preview: a leaf element has its whole text replaced, an
//! element with child elements only has its first text node replaced.

pub mod dom;
pub mod selector;

use std::collections::BTreeMap;

pub use dom::{Document, Element, NodeId};
pub use selector::{Selector, SelectorError};

/// Attributes holding asset URLs.
const URL_ATTRIBUTES: &[&str] = &["src", "href", "poster"];

/// Attribute identifying editable elements in templates.
pub const ELEMENT_ID_ATTR: &str = "data-element-id";

/// Extra rendering steps beyond text overrides.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Value of the `<base href>` inserted into `<head>`
    pub base_href: Option<String>,
    /// Prefix prepended to root-relative `src`/`href` values
    pub asset_prefix: Option<String>,
    /// `src` overrides keyed by selector
    pub image_overrides: BTreeMap<String, String>,
}

/// Apply text overrides keyed by selector, then the extra options.
/// Unknown or invalid selectors are skipped.
pub fn render_with(
    html: &str,
    overrides: &BTreeMap<String, String>,
    options: &RenderOptions,
) -> String {
    let mut doc = Document::parse(html);

    for (selector, text) in overrides {
        for node in select(&doc, selector) {
            apply_text(&mut doc, node, text);
        }
    }

    for (selector, src) in &options.image_overrides {
        for node in select(&doc, selector) {
            if let Some(el) = doc.element_mut(node) {
                el.set_attr("src", src);
            }
        }
    }

    if let Some(prefix) = &options.asset_prefix {
        rewrite_asset_paths(&mut doc, prefix);
    }
    if let Some(href) = &options.base_href {
        set_base_href(&mut doc, href);
    }

    doc.to_html()
}

/// Replace an element's text, keeping child markup when there is any.
pub fn apply_text(doc: &mut Document, node: NodeId, text: &str) {
    if doc.has_element_children(node) {
        doc.set_first_text_child(node, text);
    } else {
        doc.set_text(node, text);
    }
}

/// Selector for a working-data key: keys that already look like selectors are
/// used as-is, plain keys address `[data-element-id="<key>"]`.
pub fn selector_for_key(key: &str) -> String {
    let looks_like_selector = key.starts_with(['#', '.', '['])
        || key.contains(|c: char| c.is_whitespace() || c == '>' || c == ',');
    if looks_like_selector {
        key.to_string()
    } else {
        format!("[{}=\"{}\"]", ELEMENT_ID_ATTR, key.replace('"', ""))
    }
}

/// Map working-data keys to selectors.
pub fn overrides_from_keys(values: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(key, value)| (selector_for_key(key), value.clone()))
        .collect()
}

/// Texts and image sources of the editable elements as written in the template.
///
/// Leaf elements contribute their text, `<img>` elements their `src`. Elements
/// with child markup are left out since their text is not replaced wholesale.
pub fn editable_values(html: &str) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let doc = Document::parse(html);
    let mut texts = BTreeMap::new();
    let mut images = BTreeMap::new();

    for node in doc.elements() {
        let Some(el) = doc.element(node) else {
            continue;
        };
        let Some(key) = el.attr(ELEMENT_ID_ATTR) else {
            continue;
        };
        if el.name == "img" {
            if let Some(src) = el.attr("src") {
                images.insert(key, src);
            }
        } else if !doc.has_element_children(node) {
            texts.insert(key, doc.text_content(node));
        }
    }

    (texts, images)
}

fn select(doc: &Document, selector: &str) -> Vec<NodeId> {
    match Selector::parse(selector) {
        Ok(parsed) => parsed.select(doc),
        Err(e) => {
            tracing::warn!("Skipping override: {}", e);
            Vec::new()
        }
    }
}

fn rewrite_asset_paths(doc: &mut Document, prefix: &str) {
    let prefix = prefix.trim_end_matches('/');
    let already_prefixed = format!("{}/", prefix);
    for id in doc.elements() {
        let Some(el) = doc.element_mut(id) else {
            continue;
        };
        for attr in el.attrs.iter_mut() {
            if !URL_ATTRIBUTES.contains(&attr.name.as_str()) {
                continue;
            }
            if let Some(value) = attr.value.as_mut() {
                if value.starts_with('/')
                    && !value.starts_with("//")
                    && !value.starts_with(&already_prefixed)
                {
                    *value = format!("{}{}", prefix, value);
                }
            }
        }
    }
}

fn set_base_href(doc: &mut Document, href: &str) {
    if let Some(base) = doc.find_element("base") {
        if let Some(el) = doc.element_mut(base) {
            el.set_attr("href", href);
        }
        return;
    }

    let parent = doc
        .find_element("head")
        .or_else(|| doc.find_element("html"))
        .unwrap_or(Document::ROOT);
    let mut base = Element::new("base");
    base.set_attr("href", href);
    doc.prepend_element(parent, base);
}
