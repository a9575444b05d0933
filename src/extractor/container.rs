use scraper::ElementRef;

use crate::document::Document;

/// Candidates for the element holding the article body, best first.
const CONTAINER_SELECTORS: [&str; 3] = ["article", "div[class*=content]", "div[class*=Content]"];

/// First `<article>`, else the first `div` whose class mentions "content".
pub fn detect(document: &Document) -> Option<ElementRef<'_>> {
    CONTAINER_SELECTORS
        .iter()
        .find_map(|selector| document.first(selector))
}
