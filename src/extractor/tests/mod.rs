use std::fs;
use url::Url;

use crate::document::{FetchedDocument, RawPage};
use crate::extractor::PageContext;
use crate::sites::{SiteKind, analyze_markup};

/// Parse `markup` as if fetched from `https://example.com/post` and hand the
/// page context to `f`.
pub(crate) fn with_page(markup: &str, f: impl FnOnce(&PageContext<'_>)) {
    let fetched = FetchedDocument::parse(RawPage {
        url: base_url(),
        markup: markup.to_string(),
    });
    let page = PageContext::new(&fetched);
    f(&page);
}

fn base_url() -> Url {
    Url::parse("https://example.com/post").unwrap()
}

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

#[test]
fn test_article_prefers_open_graph() {
    let fields = analyze_markup(&SiteKind::Generic, base_url(), fixture("article.html"));

    assert_eq!(fields.title, "Understanding Ownership");
    assert_eq!(
        fields.description.as_deref(),
        Some("A walk through moves, borrows and lifetimes.")
    );
    assert_eq!(
        fields.image.as_deref(),
        Some("https://example.com/images/ownership-cover.png")
    );
}

#[test]
fn test_article_without_meta_falls_back_to_container() {
    let markup = fixture("article.html")
        .lines()
        .filter(|line| !line.contains("<meta"))
        .collect::<Vec<_>>()
        .join("\n");
    let fields = analyze_markup(&SiteKind::Generic, base_url(), markup);

    assert_eq!(fields.title, "Understanding Ownership");
    let description = fields.description.unwrap();
    assert!(description.starts_with("Every value has a single owner"));
    assert!(description.ends_with("without taking it over."));
    assert_eq!(
        fields.image.as_deref(),
        Some("https://example.com/images/diagram.png")
    );
}

#[test]
fn test_titlecase_content_container() {
    let fields = analyze_markup(&SiteKind::Generic, base_url(), fixture("bare.html"));

    assert_eq!(fields.title, "Version 2.0 released");
    let description = fields.description.unwrap();
    assert!(description.starts_with("This release rewrites the storage layer"));
    assert!(!description.contains("Tiny lead"));
    assert_eq!(
        fields.image.as_deref(),
        Some("https://cdn.example.net/shots/replication.png")
    );
}

#[test]
fn test_script_payload_generic_vs_headline() {
    let url = Url::parse("https://juejin.cn/post/6844904009887645709").unwrap();
    let markup = fixture("script_payload.html");

    let generic = analyze_markup(&SiteKind::Generic, url.clone(), markup.as_str());
    assert_eq!(generic.title, "Community - Articles");
    assert_eq!(generic.image, None);

    let headline = analyze_markup(&SiteKind::Headline, url, markup);
    assert_eq!(headline.title, "Building a work-stealing scheduler");
    assert_eq!(
        headline.description.as_deref(),
        Some("Notes on building a scheduler")
    );
    assert_eq!(
        headline.image.as_deref(),
        Some("https://p3.example.com/cover.webp")
    );
}

#[test]
fn test_malformed_html() {
    let markup = "<html><head><title>Broken</title><body><p>Unclosed tags<div>More content";
    let fields = analyze_markup(&SiteKind::Generic, base_url(), markup);

    assert_eq!(fields.title, "Broken");
    assert!(fields.description.unwrap().contains("Unclosed tags"));
    assert_eq!(fields.image, None);
}

#[test]
fn test_empty_document() {
    let fields = analyze_markup(&SiteKind::Generic, base_url(), "");

    assert_eq!(fields.title, "");
    assert_eq!(fields.description, None);
    assert_eq!(fields.image, None);
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_analysis_never_panics(
            markup in ".*",
            path in "[a-z0-9/]{0,20}"
        ) {
            let url = Url::parse(&format!("https://example.com/{path}")).unwrap();
            let _ = analyze_markup(&SiteKind::Generic, url.clone(), markup.as_str());
            let _ = analyze_markup(&SiteKind::Headline, url, markup);
        }

        #[test]
        fn test_images_are_absolute(
            src in "[a-zA-Z0-9_./-]{1,30}"
        ) {
            let markup = format!(r#"<article><p><img src="{src}"></p></article>"#);
            let fields = analyze_markup(&SiteKind::Generic, base_url(), markup);
            if let Some(image) = fields.image {
                prop_assert!(image.starts_with("http"));
            }
        }
    }
}
