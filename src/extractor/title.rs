use crate::document::select_within;
use crate::extractor::{PageContext, Rule, first_match};

/// Title strategies in priority order. Heading rules only fire on an
/// unambiguous single match.
pub const TITLE_RULES: &[(&str, Rule<String>)] = &[
    ("og:title", og_title),
    ("container h1", container_heading),
    ("titled h1", titled_heading),
    (".title", title_class),
    ("h1 > a", linked_heading),
    ("header h1", header_heading),
    ("h1", lone_heading),
    ("<title>", document_title),
];

/// Title of the page; empty when no rule finds one.
pub fn extract(page: &PageContext<'_>) -> String {
    first_match("title", TITLE_RULES, page).unwrap_or_default()
}

pub fn og_title(page: &PageContext<'_>) -> Option<String> {
    page.document
        .first_attr(r#"meta[property="og:title"]"#, "content")
}

pub fn container_heading(page: &PageContext<'_>) -> Option<String> {
    let container = page.container.as_ref()?;
    select_within(container, "h1")
        .first()
        .map(crate::document::element_text)
        .filter(|text| !text.is_empty())
}

pub fn titled_heading(page: &PageContext<'_>) -> Option<String> {
    only(page, "h1[class*=title]").or_else(|| only(page, "h1[class*=Title]"))
}

pub fn title_class(page: &PageContext<'_>) -> Option<String> {
    only(page, ".title")
}

pub fn linked_heading(page: &PageContext<'_>) -> Option<String> {
    only(page, "h1 > a")
}

pub fn header_heading(page: &PageContext<'_>) -> Option<String> {
    only(page, "header h1")
}

pub fn lone_heading(page: &PageContext<'_>) -> Option<String> {
    only(page, "h1")
}

pub fn document_title(page: &PageContext<'_>) -> Option<String> {
    page.document
        .first_text("title")
        .filter(|text| !text.is_empty())
}

fn only(page: &PageContext<'_>, selector: &str) -> Option<String> {
    page.document
        .only_text(selector)
        .filter(|text| !text.is_empty())
}
