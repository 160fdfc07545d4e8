//! Where extraction rules read from.
//!
//! The primary source is the `ng-state` JSON blob embedded in the page.
//! When the page does not carry it, the rules run over the raw markup
//! instead, and list fields that can be recovered from the rendered DOM
//! fall back to it.

use scraper::{Html, Selector};

/// Selector for the embedded application-state blob.
pub const STATE_BLOB_SELECTOR: &str = r#"script[id="ng-state"][type="application/json"]"#;

/// Selector for the visible category chips used as the DOM fallback.
pub const CATEGORY_CHIP_SELECTOR: &str = "div.chip-text";

/// Which text the field rules were applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// The embedded state blob was found and used.
    EmbeddedBlob,
    /// No blob; rules ran against the whole page markup.
    RawMarkup,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmbeddedBlob => write!(f, "embedded state blob"),
            Self::RawMarkup => write!(f, "raw markup"),
        }
    }
}

/// A parsed page plus the text the pattern rules should search.
pub struct PageSource<'a> {
    document: Html,
    markup: &'a str,
    blob: Option<String>,
}

impl<'a> PageSource<'a> {
    /// Parse `markup` and locate the embedded state blob, if any.
    pub fn parse(markup: &'a str) -> Self {
        let document = Html::parse_document(markup);
        let blob = locate_state_blob(&document);
        Self {
            document,
            markup,
            blob,
        }
    }

    /// Which strategy supplies the searchable text.
    pub fn kind(&self) -> SourceKind {
        if self.blob.is_some() {
            SourceKind::EmbeddedBlob
        } else {
            SourceKind::RawMarkup
        }
    }

    /// Text the field patterns are matched against.
    pub fn state_text(&self) -> &str {
        self.blob.as_deref().unwrap_or(self.markup)
    }

    /// Trimmed text of every element matching `selector`, in document order.
    pub fn dom_texts(&self, selector: &str) -> Vec<String> {
        let Ok(sel) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.document
            .select(&sel)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect()
    }
}

fn locate_state_blob(document: &Html) -> Option<String> {
    let sel = Selector::parse(STATE_BLOB_SELECTOR).ok()?;
    let text: String = document.select(&sel).next()?.text().collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
