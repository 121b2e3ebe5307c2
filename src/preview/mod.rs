//! Live-preview bridge between the editor and the preview iframe.
//!
//! The editor sends [`EditorMessage`]s to the preview, the preview answers with
//! [`PreviewMessage`]s. [`PreviewSurface`] models the preview side: which
//! editable elements exist, their current text/image/style values, and which
//! one is highlighted.

mod coalescer;
mod hub;

pub use coalescer::*;
pub use hub::*;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::render::{Document, ELEMENT_ID_ATTR};

/// Content payload shared by `INIT_PREVIEW` and `UPDATE_CONTENT`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreviewContent {
    #[serde(default)]
    pub texts: BTreeMap<String, String>,
    #[serde(default)]
    pub images: BTreeMap<String, String>,
    /// element id -> CSS property -> value
    #[serde(default)]
    pub colors: BTreeMap<String, BTreeMap<String, String>>,
}

impl PreviewContent {
    /// Fold a later update into this one; later values win per key.
    pub fn merge(&mut self, later: PreviewContent) {
        self.texts.extend(later.texts);
        self.images.extend(later.images);
        for (element, properties) in later.colors {
            self.colors.entry(element).or_default().extend(properties);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.images.is_empty() && self.colors.is_empty()
    }
}

/// Messages from the editor to the preview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum EditorMessage {
    InitPreview {
        data: PreviewContent,
        #[serde(default)]
        selected_element_id: Option<String>,
    },
    UpdateContent {
        data: PreviewContent,
        #[serde(default)]
        selected_element_id: Option<String>,
    },
    HighlightElement {
        element_id: String,
        highlight: bool,
    },
}

/// Messages from the preview back to the editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum PreviewMessage {
    ElementSelected { element_id: String },
    PreviewReady {},
}

/// Current state of one editable element in the preview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewElement {
    pub text: Option<String>,
    pub src: Option<String>,
    pub styles: BTreeMap<String, String>,
}

/// Result of applying one editor message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Elements whose value actually changed
    pub changed: Vec<String>,
    pub reply: Option<PreviewMessage>,
}

/// Model of the preview document's editable elements.
#[derive(Debug, Clone, Default)]
pub struct PreviewSurface {
    elements: BTreeMap<String, PreviewElement>,
    highlighted: Option<String>,
    flashed: BTreeSet<String>,
    ready: bool,
}

impl PreviewSurface {
    /// Collect elements carrying `data-element-id` (or, failing that, `id`).
    pub fn from_html(html: &str) -> Self {
        let doc = Document::parse(html);
        let mut elements = BTreeMap::new();

        for node in doc.elements() {
            let Some(el) = doc.element(node) else {
                continue;
            };
            let Some(key) = el.attr(ELEMENT_ID_ATTR).or_else(|| el.attr("id")) else {
                continue;
            };
            elements.insert(
                key,
                PreviewElement {
                    text: Some(doc.text_content(node)),
                    src: el.attr("src"),
                    styles: parse_inline_style(&el.attr("style").unwrap_or_default()),
                },
            );
        }

        Self {
            elements,
            ..Default::default()
        }
    }

    pub fn element(&self, id: &str) -> Option<&PreviewElement> {
        self.elements.get(id)
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    /// Elements flagged by the last content update.
    pub fn flashed(&self) -> &BTreeSet<String> {
        &self.flashed
    }

    /// Drop the transient change flags (the flash animation ended).
    pub fn clear_flash(&mut self) {
        self.flashed.clear();
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn apply(&mut self, message: EditorMessage) -> ApplyOutcome {
        match message {
            EditorMessage::InitPreview {
                data,
                selected_element_id,
            } => {
                let changed = self.apply_content(&data);
                if let Some(id) = selected_element_id {
                    self.highlight(&id, true);
                }
                self.ready = true;
                ApplyOutcome {
                    changed,
                    reply: Some(PreviewMessage::PreviewReady {}),
                }
            }
            EditorMessage::UpdateContent {
                data,
                selected_element_id,
            } => {
                let changed = self.apply_content(&data);
                if let Some(id) = selected_element_id {
                    self.highlight(&id, true);
                }
                ApplyOutcome {
                    changed,
                    reply: None,
                }
            }
            EditorMessage::HighlightElement {
                element_id,
                highlight,
            } => {
                self.highlight(&element_id, highlight);
                ApplyOutcome::default()
            }
        }
    }

    /// A click on an element in the preview.
    pub fn select(&mut self, element_id: &str) -> Option<PreviewMessage> {
        if !self.elements.contains_key(element_id) {
            return None;
        }
        self.highlight(element_id, true);
        Some(PreviewMessage::ElementSelected {
            element_id: element_id.to_string(),
        })
    }

    fn highlight(&mut self, element_id: &str, on: bool) {
        if !self.elements.contains_key(element_id) {
            return;
        }
        if on {
            self.highlighted = Some(element_id.to_string());
        } else if self.highlighted.as_deref() == Some(element_id) {
            self.highlighted = None;
        }
    }

    fn apply_content(&mut self, content: &PreviewContent) -> Vec<String> {
        let mut changed = BTreeSet::new();

        for (id, text) in &content.texts {
            if let Some(el) = self.elements.get_mut(id) {
                if el.text.as_deref() != Some(text.as_str()) {
                    el.text = Some(text.clone());
                    changed.insert(id.clone());
                }
            }
        }
        for (id, src) in &content.images {
            if let Some(el) = self.elements.get_mut(id) {
                if el.src.as_deref() != Some(src.as_str()) {
                    el.src = Some(src.clone());
                    changed.insert(id.clone());
                }
            }
        }
        for (id, properties) in &content.colors {
            if let Some(el) = self.elements.get_mut(id) {
                for (property, value) in properties {
                    if el.styles.get(property) != Some(value) {
                        el.styles.insert(property.clone(), value.clone());
                        changed.insert(id.clone());
                    }
                }
            }
        }

        self.flashed = changed.clone();
        changed.into_iter().collect()
    }
}

fn parse_inline_style(style: &str) -> BTreeMap<String, String> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                return None;
            }
            Some((property.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"<body>
        <h1 data-element-id="hero_title" style="color: #000">Hello</h1>
        <img id="logo" src="logo.png">
        <p data-element-id="intro">Intro <b>bold</b></p>
    </body>"#;

    fn update(texts: &[(&str, &str)]) -> EditorMessage {
        EditorMessage::UpdateContent {
            data: PreviewContent {
                texts: texts
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Default::default()
            },
            selected_element_id: None,
        }
    }

    #[test]
    fn test_message_wire_format() {
        let message: EditorMessage = serde_json::from_value(json!({
            "type": "UPDATE_CONTENT",
            "data": {"texts": {"hero_title": "Hi"}},
            "selectedElementId": "hero_title"
        }))
        .unwrap();
        assert_eq!(
            message,
            EditorMessage::UpdateContent {
                data: PreviewContent {
                    texts: [("hero_title".to_string(), "Hi".to_string())].into(),
                    ..Default::default()
                },
                selected_element_id: Some("hero_title".to_string()),
            }
        );

        let highlight = serde_json::to_value(EditorMessage::HighlightElement {
            element_id: "logo".to_string(),
            highlight: true,
        })
        .unwrap();
        assert_eq!(
            highlight,
            json!({"type": "HIGHLIGHT_ELEMENT", "elementId": "logo", "highlight": true})
        );

        assert_eq!(
            serde_json::to_value(PreviewMessage::PreviewReady {}).unwrap(),
            json!({"type": "PREVIEW_READY"})
        );
        assert_eq!(
            serde_json::to_value(PreviewMessage::ElementSelected {
                element_id: "intro".to_string()
            })
            .unwrap(),
            json!({"type": "ELEMENT_SELECTED", "elementId": "intro"})
        );
    }

    #[test]
    fn test_surface_collects_editable_elements() {
        let surface = PreviewSurface::from_html(PAGE);
        assert_eq!(
            surface.element("hero_title").unwrap().text.as_deref(),
            Some("Hello")
        );
        assert_eq!(
            surface.element("hero_title").unwrap().styles["color"],
            "#000"
        );
        assert_eq!(
            surface.element("logo").unwrap().src.as_deref(),
            Some("logo.png")
        );
        assert!(surface.element("missing").is_none());
    }

    #[test]
    fn test_init_replies_ready() {
        let mut surface = PreviewSurface::from_html(PAGE);
        let outcome = surface.apply(EditorMessage::InitPreview {
            data: PreviewContent::default(),
            selected_element_id: Some("intro".to_string()),
        });
        assert_eq!(outcome.reply, Some(PreviewMessage::PreviewReady {}));
        assert!(surface.is_ready());
        assert_eq!(surface.highlighted(), Some("intro"));
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut surface = PreviewSurface::from_html(PAGE);

        let first = surface.apply(update(&[("hero_title", "Hi"), ("intro", "Intro")]));
        assert_eq!(first.changed, vec!["hero_title".to_string(), "intro".to_string()]);
        let state_after_first = surface.element("hero_title").cloned();

        let second = surface.apply(update(&[("hero_title", "Hi"), ("intro", "Intro")]));
        assert!(second.changed.is_empty());
        assert!(surface.flashed().is_empty());
        assert_eq!(surface.element("hero_title").cloned(), state_after_first);
    }

    #[test]
    fn test_changed_elements_are_flashed() {
        let mut surface = PreviewSurface::from_html(PAGE);
        let mut colors = BTreeMap::new();
        colors.insert(
            "hero_title".to_string(),
            [("color".to_string(), "#ff0000".to_string())].into(),
        );

        surface.apply(EditorMessage::UpdateContent {
            data: PreviewContent {
                images: [("logo".to_string(), "new.png".to_string())].into(),
                colors,
                ..Default::default()
            },
            selected_element_id: None,
        });

        assert!(surface.flashed().contains("logo"));
        assert!(surface.flashed().contains("hero_title"));
        assert_eq!(surface.element("hero_title").unwrap().styles["color"], "#ff0000");
        surface.clear_flash();
        assert!(surface.flashed().is_empty());
    }

    #[test]
    fn test_unknown_elements_are_ignored() {
        let mut surface = PreviewSurface::from_html(PAGE);
        let outcome = surface.apply(update(&[("does_not_exist", "x")]));
        assert!(outcome.changed.is_empty());

        surface.apply(EditorMessage::HighlightElement {
            element_id: "does_not_exist".to_string(),
            highlight: true,
        });
        assert_eq!(surface.highlighted(), None);
        assert!(surface.select("does_not_exist").is_none());
    }

    #[test]
    fn test_highlight_is_exclusive() {
        let mut surface = PreviewSurface::from_html(PAGE);
        for id in ["hero_title", "logo", "intro"] {
            surface.apply(EditorMessage::HighlightElement {
                element_id: id.to_string(),
                highlight: true,
            });
            assert_eq!(surface.highlighted(), Some(id));
        }

        surface.apply(EditorMessage::HighlightElement {
            element_id: "logo".to_string(),
            highlight: false,
        });
        assert_eq!(surface.highlighted(), Some("intro"));

        surface.apply(EditorMessage::HighlightElement {
            element_id: "intro".to_string(),
            highlight: false,
        });
        assert_eq!(surface.highlighted(), None);
    }

    #[test]
    fn test_select_reports_element() {
        let mut surface = PreviewSurface::from_html(PAGE);
        assert_eq!(
            surface.select("logo"),
            Some(PreviewMessage::ElementSelected {
                element_id: "logo".to_string()
            })
        );
        assert_eq!(surface.highlighted(), Some("logo"));
    }

    #[test]
    fn test_merge_prefers_later_values() {
        let mut content = PreviewContent::default();
        content.texts.insert("a".to_string(), "1".to_string());
        content
            .colors
            .insert("a".to_string(), [("color".to_string(), "red".to_string())].into());

        let mut later = PreviewContent::default();
        later.texts.insert("a".to_string(), "2".to_string());
        later.texts.insert("b".to_string(), "3".to_string());
        later.colors.insert(
            "a".to_string(),
            [("background".to_string(), "blue".to_string())].into(),
        );
        content.merge(later);

        assert_eq!(content.texts["a"], "2");
        assert_eq!(content.texts["b"], "3");
        assert_eq!(content.colors["a"].len(), 2);
    }
}
