use url::Url;

use crate::document::{attr_value, parent_tag, select_within};
use crate::extractor::{PageContext, Rule, first_match};

/// Substrings that mark an image as the site's own identity artwork.
const IDENTITY_MARKERS: [&str; 2] = ["banner", "logo"];

pub const IMAGE_RULES: &[(&str, Rule<String>)] = &[
    ("og:image name", og_image_name),
    ("og:image property", og_image_property),
    ("container p img", container_paragraph_image),
    ("container img", container_image),
    ("p > img", paragraph_image),
    ("identity img", identity_image),
];

/// Representative image, resolved against the page URL.
pub fn extract(page: &PageContext<'_>) -> Option<String> {
    let candidate = first_match("image", IMAGE_RULES, page)?;
    resolve(page.url, &candidate)
}

/// Make `candidate` absolute. Values already starting with `http` are kept
/// verbatim, so resolving twice is a no-op.
pub fn resolve(base: &Url, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    if candidate.starts_with("http") {
        return Some(candidate.to_string());
    }
    base.join(candidate).ok().map(String::from)
}

pub fn og_image_name(page: &PageContext<'_>) -> Option<String> {
    page.document
        .first_attr(r#"meta[name="og:image"]"#, "content")
}

pub fn og_image_property(page: &PageContext<'_>) -> Option<String> {
    page.document
        .first_attr(r#"meta[property="og:image"]"#, "content")
}

pub fn container_paragraph_image(page: &PageContext<'_>) -> Option<String> {
    let container = page.container.as_ref()?;
    select_within(container, "p img")
        .iter()
        .find_map(|img| attr_value(img, "src"))
}

pub fn container_image(page: &PageContext<'_>) -> Option<String> {
    let container = page.container.as_ref()?;
    select_within(container, "img")
        .iter()
        .find_map(|img| attr_value(img, "src"))
}

pub fn paragraph_image(page: &PageContext<'_>) -> Option<String> {
    page.document
        .all("img")
        .iter()
        .filter(|img| parent_tag(img) == Some("p"))
        .find_map(|img| attr_value(img, "src"))
}

pub fn identity_image(page: &PageContext<'_>) -> Option<String> {
    page.document
        .all("img")
        .iter()
        .filter_map(|img| attr_value(img, "src"))
        .find(|src| IDENTITY_MARKERS.iter().any(|marker| src.contains(marker)))
}
