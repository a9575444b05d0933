use crate::document::{element_text, select_within};
use crate::extractor::model::truncate_chars;
use crate::extractor::{PageContext, Rule, first_match};

/// Paragraphs at or below this length are treated as captions or bylines.
pub const MIN_PARAGRAPH_CHARS: usize = 120;
/// Upper bound for any description taken from body text.
pub const MAX_DESCRIPTION_CHARS: usize = 240;

pub const DESCRIPTION_RULES: &[(&str, Rule<String>)] = &[
    ("og:description", og_description),
    ("meta description", meta_description),
    ("container paragraph", container_paragraph),
    ("page paragraph", page_paragraph),
    ("body text", body_text),
];

pub fn extract(page: &PageContext<'_>) -> Option<String> {
    first_match("description", DESCRIPTION_RULES, page)
}

pub fn og_description(page: &PageContext<'_>) -> Option<String> {
    page.document
        .first_attr(r#"meta[property="og:description"]"#, "content")
}

pub fn meta_description(page: &PageContext<'_>) -> Option<String> {
    page.document
        .first_attr(r#"meta[name="description"]"#, "content")
}

pub fn container_paragraph(page: &PageContext<'_>) -> Option<String> {
    let container = page.container.as_ref()?;
    long_paragraph(select_within(container, "p").iter().map(element_text))
}

pub fn page_paragraph(page: &PageContext<'_>) -> Option<String> {
    long_paragraph(page.document.all("p").iter().map(element_text))
}

pub fn body_text(page: &PageContext<'_>) -> Option<String> {
    let text = page.document.body_text();
    if text.is_empty() {
        return None;
    }
    Some(truncate_chars(&text, MAX_DESCRIPTION_CHARS))
}

fn long_paragraph(mut paragraphs: impl Iterator<Item = String>) -> Option<String> {
    paragraphs
        .find(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .map(|text| truncate_chars(&text, MAX_DESCRIPTION_CHARS))
}
