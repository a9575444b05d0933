//! Sites whose metadata lives in an inline script payload rather than in
//! visible markup. Title and image are read straight from the raw text with
//! fixed patterns; when a pattern misses, the field stays empty instead of
//! falling back to the generic rules.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::extractor::{PageContext, image};
use crate::sites::{SiteAnalysis, SiteKind};

static HEADLINE_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#""headline":"([^"]*)""#).ok());

// Matches `src=\"...` inside a JSON-escaped HTML string.
static ESCAPED_SRC_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"src=\\"([^"]*)""#).ok());

static UNICODE_ESCAPE_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").ok());

#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlineAnalysis;

impl SiteAnalysis for HeadlineAnalysis {
    fn kind(&self) -> SiteKind {
        SiteKind::Headline
    }

    fn title(&self, page: &PageContext<'_>) -> String {
        headline(page.markup).unwrap_or_default()
    }

    fn image(&self, page: &PageContext<'_>) -> Option<String> {
        let src = escaped_image_src(page.markup)?;
        image::resolve(page.url, &src)
    }
}

pub fn headline(markup: &str) -> Option<String> {
    let captures = HEADLINE_REGEX.as_ref()?.captures(markup)?;
    Some(captures.get(1)?.as_str().to_string())
}

pub fn escaped_image_src(markup: &str) -> Option<String> {
    let captures = ESCAPED_SRC_REGEX.as_ref()?.captures(markup)?;
    let raw = captures.get(1)?.as_str();
    let unescaped = unescape_unicode(raw).replace('\\', "");
    Some(unescaped).filter(|src| !src.is_empty())
}

/// Replace `\uXXXX` sequences with the characters they encode.
pub fn unescape_unicode(text: &str) -> String {
    let Some(regex) = UNICODE_ESCAPE_REGEX.as_ref() else {
        return text.to_string();
    };
    regex
        .replace_all(text, |caps: &Captures| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::analyze_markup;
    use url::Url;

    fn url() -> Url {
        Url::parse("https://juejin.cn/post/6844904009887645709").unwrap()
    }

    #[test]
    fn test_headline_from_script_payload() {
        let markup = r#"<html><head><title>Site chrome</title>
            <meta property="og:title" content="Ignored">
            <script>window.__NUXT__={"article":{"headline":"Hello World","x":1}}</script>
            </head><body><h1>Also ignored</h1></body></html>"#;
        let fields = analyze_markup(&SiteKind::Headline, url(), markup);

        assert_eq!(fields.title, "Hello World");
        assert_eq!(fields.image, None);
    }

    #[test]
    fn test_missing_headline_degrades_to_empty() {
        let markup = r#"<title>Site chrome</title><h1>Heading</h1><article><img src="/a.png"></article>"#;
        let fields = analyze_markup(&SiteKind::Headline, url(), markup);

        assert_eq!(fields.title, "");
        assert_eq!(fields.image, None);
    }

    #[test]
    fn test_escaped_image_src() {
        let markup = r#"{"content":"<p><img src=\"https://p3.example.com/cover.png\" alt=\"\"></p>"}"#;
        assert_eq!(
            escaped_image_src(markup).as_deref(),
            Some("https://p3.example.com/cover.png")
        );

        let fields = analyze_markup(&SiteKind::Headline, url(), markup);
        assert_eq!(
            fields.image.as_deref(),
            Some("https://p3.example.com/cover.png")
        );
    }

    #[test]
    fn test_escaped_relative_src_is_resolved() {
        let markup = r#"<img src=\"/static/a.png\">"#;
        let fields = analyze_markup(&SiteKind::Headline, url(), markup);
        assert_eq!(fields.image.as_deref(), Some("https://juejin.cn/static/a.png"));
    }

    #[test]
    fn test_description_keeps_generic_rules() {
        let markup = r#"<meta name="description" content="Summary">"headline":"H""#;
        let fields = analyze_markup(&SiteKind::Headline, url(), markup);
        assert_eq!(fields.title, "H");
        assert_eq!(fields.description.as_deref(), Some("Summary"));
    }

    #[test]
    fn test_unescape_unicode() {
        assert_eq!(unescape_unicode(r"a\u002Fb\u4e2d"), "a/b中");
        assert_eq!(unescape_unicode(r"bad \uZZZZ"), r"bad \uZZZZ");
        assert_eq!(unescape_unicode("plain"), "plain");
    }

    #[test]
    fn test_unicode_escaped_src() {
        let markup = r#"<img src=\"https:\u002F\u002Fp3.example.com\u002Fa.webp\">"#;
        assert_eq!(
            escaped_image_src(markup).as_deref(),
            Some("https://p3.example.com/a.webp")
        );
    }
}
