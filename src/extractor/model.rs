use serde::{Deserialize, Serialize};

/// Link-preview summary of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    /// Always present, possibly empty.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Absolute URL or `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// `data:` URI of the favicon bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

/// The markup-derived part of a result, produced by a site analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub title: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl ExtractionResult {
    pub fn new(url: impl Into<String>, fields: Fields, favicon: Option<String>) -> Self {
        Self {
            url: url.into(),
            title: fields.title,
            description: fields.description,
            image: fields.image,
            favicon,
        }
    }
}

/// Collapse every whitespace run (newlines included) into one space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
