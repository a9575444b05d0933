//! Queryable view over fetched markup.
//!
//! A thin adapter around `scraper`: selector counts, first-match text and
//! attributes, scoped selection under an element, and parent lookup. It holds
//! no extraction policy of its own.
//!
//! `scraper::Html` is not `Send`, so documents are built and consumed inside
//! synchronous code and never held across an `.await`.

use scraper::{ElementRef, Html, Selector, node::Node};
use url::Url;

use crate::extractor::model::normalize_whitespace;

/// Elements whose text never shows up on the rendered page.
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Markup obtained for a URL, before parsing.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// Effective URL after redirects (or the rendered page's URL).
    pub url: Url,
    pub markup: String,
}

/// Parsed document plus the data it came from. Owned by one analysis.
pub struct FetchedDocument {
    pub url: Url,
    pub markup: String,
    pub document: Document,
}

impl FetchedDocument {
    pub fn parse(raw: RawPage) -> Self {
        let document = Document::parse(&raw.markup);
        Self {
            url: raw.url,
            markup: raw.markup,
            document,
        }
    }
}

pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Number of elements matching `selector`. Invalid selectors match nothing.
    pub fn count(&self, selector: &str) -> usize {
        match parse_selector(selector) {
            Some(selector) => self.html.select(&selector).count(),
            None => 0,
        }
    }

    pub fn first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let selector = parse_selector(selector)?;
        self.html.select(&selector).next()
    }

    pub fn all(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match parse_selector(selector) {
            Some(selector) => self.html.select(&selector).collect(),
            None => Vec::new(),
        }
    }

    /// Trimmed text of the first match.
    pub fn first_text(&self, selector: &str) -> Option<String> {
        self.first(selector).map(|el| element_text(&el))
    }

    /// Trimmed text of the match, but only when exactly one element matches.
    pub fn only_text(&self, selector: &str) -> Option<String> {
        let selector = parse_selector(selector)?;
        let mut matches = self.html.select(&selector);
        let only = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(element_text(&only))
    }

    /// Trimmed, non-empty attribute value of the first match.
    pub fn first_attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.first(selector).and_then(|el| attr_value(&el, attr))
    }

    /// Whitespace-collapsed visible text of `<body>` (or the whole document).
    pub fn body_text(&self) -> String {
        match self.first("body") {
            Some(body) => visible_text(&body),
            None => visible_text(&self.html.root_element()),
        }
    }
}

pub fn parse_selector(selector: &str) -> Option<Selector> {
    Selector::parse(selector).ok()
}

/// Elements matching `selector` under `scope`.
pub fn select_within<'a>(scope: &ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    match parse_selector(selector) {
        Some(selector) => scope.select(&selector).collect(),
        None => Vec::new(),
    }
}

pub fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

pub fn attr_value(el: &ElementRef<'_>, attr: &str) -> Option<String> {
    el.value()
        .attr(attr)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Tag name of the nearest parent element.
pub fn parent_tag<'a>(el: &ElementRef<'a>) -> Option<&'a str> {
    el.parent()
        .and_then(|parent| parent.value().as_element())
        .map(|element| element.name())
}

fn visible_text(el: &ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_TAGS.contains(&element.name()))
        });
        if !hidden {
            out.push_str(text);
            out.push(' ');
        }
    }
    normalize_whitespace(&out)
}
