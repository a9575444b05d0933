//! Per-site analysis variants.
//!
//! [`SiteAnalysis`] carries the default strategy for every step; a variant
//! overrides only the steps its site breaks. The [`SiteRegistry`] maps URL
//! substrings to a [`SiteKind`] tag, and the tag builds the analysis.

pub mod generic;
pub mod headline;
pub mod registry;
pub mod rendered;

pub use generic::GenericAnalysis;
pub use headline::HeadlineAnalysis;
pub use registry::{SiteKind, SiteRegistry};
pub use rendered::RenderedAnalysis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::document::{FetchedDocument, RawPage};
use crate::error::ExtractError;
use crate::extractor::{Fields, PageContext, description, image, title};
use crate::fetcher::Fetcher;
use crate::render::Renderer;

/// Where an analysis can get markup from.
pub struct Sources {
    pub fetcher: Fetcher,
    pub renderer: Arc<dyn Renderer>,
    pub render_timeout: Duration,
}

#[async_trait]
pub trait SiteAnalysis: Send + Sync {
    fn kind(&self) -> SiteKind;

    /// Obtain the markup for `url`. Default: plain HTTP fetch.
    async fn init(&self, url: &Url, sources: &Sources) -> Result<RawPage, ExtractError> {
        let page = sources.fetcher.fetch(url.as_str()).await?;
        Ok(RawPage {
            url: page.url_final,
            markup: page.body_utf8,
        })
    }

    fn title(&self, page: &PageContext<'_>) -> String {
        title::extract(page)
    }

    fn description(&self, page: &PageContext<'_>) -> Option<String> {
        description::extract(page)
    }

    fn image(&self, page: &PageContext<'_>) -> Option<String> {
        image::extract(page)
    }

    fn analyze(&self, page: &PageContext<'_>) -> Fields {
        Fields {
            title: self.title(page),
            description: self.description(page),
            image: self.image(page),
        }
    }
}

/// Parse `raw` and run `analysis` over it. Synchronous so the parsed
/// document never lives across an await point.
pub fn analyze(analysis: &dyn SiteAnalysis, raw: RawPage) -> Fields {
    let fetched = FetchedDocument::parse(raw);
    let page = PageContext::new(&fetched);
    analysis.analyze(&page)
}

/// Run the variant selected by `kind` over markup already in hand.
pub fn analyze_markup(kind: &SiteKind, url: Url, markup: impl Into<String>) -> Fields {
    let analysis = kind.analysis();
    analyze(
        analysis.as_ref(),
        RawPage {
            url,
            markup: markup.into(),
        },
    )
}
