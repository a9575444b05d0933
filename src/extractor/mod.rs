//! Field extraction: ordered rule tables per field and the [`Extractor`]
//! entry point tying fetcher, site registry and render bridge together.

pub mod container;
pub mod description;
pub mod favicon;
pub mod image;
pub mod model;
pub mod title;

#[cfg(test)]
mod tests;

pub use model::{ExtractionResult, Fields};

use std::sync::Arc;

use scraper::ElementRef;
use tracing::{Span, info, instrument, trace};
use url::Url;

use crate::config::Config;
use crate::document::{Document, FetchedDocument};
use crate::error::ExtractError;
use crate::fetcher::Fetcher;
use crate::render::{BrowserManager, Renderer};
use crate::sites::{SiteRegistry, Sources, analyze};

/// Everything a rule may look at for one page.
pub struct PageContext<'a> {
    pub url: &'a Url,
    pub markup: &'a str,
    pub document: &'a Document,
    /// Element believed to hold the article body, detected once per page.
    pub container: Option<ElementRef<'a>>,
}

impl<'a> PageContext<'a> {
    pub fn new(fetched: &'a FetchedDocument) -> Self {
        Self {
            url: &fetched.url,
            markup: &fetched.markup,
            document: &fetched.document,
            container: container::detect(&fetched.document),
        }
    }
}

/// A single candidate strategy. `None` means "no unambiguous match here".
pub type Rule<T> = fn(&PageContext<'_>) -> Option<T>;

/// Run `rules` in order and keep the first hit.
pub fn first_match<T>(
    field: &'static str,
    rules: &[(&'static str, Rule<T>)],
    page: &PageContext<'_>,
) -> Option<T> {
    rules.iter().find_map(|(name, rule)| {
        let found = rule(page)?;
        trace!(field, rule = *name, "rule matched");
        Some(found)
    })
}

/// Primary entry point: URL in, [`ExtractionResult`] out.
pub struct Extractor {
    config: Config,
    registry: SiteRegistry,
    sources: Sources,
}

impl Extractor {
    /// Extractor using the default site table and the process-wide browser.
    pub fn new(config: Config) -> Result<Self, ExtractError> {
        let renderer: Arc<dyn Renderer> = BrowserManager::global(&config);
        Self::with_parts(config, SiteRegistry::default(), renderer)
    }

    pub fn with_parts(
        config: Config,
        registry: SiteRegistry,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self, ExtractError> {
        let fetcher = Fetcher::new(&config)?;
        let sources = Sources {
            fetcher,
            renderer,
            render_timeout: config.render_timeout(),
        };
        Ok(Self {
            config,
            registry,
            sources,
        })
    }

    #[instrument(skip(self), fields(site))]
    pub async fn extract(&self, url: &str) -> Result<ExtractionResult, ExtractError> {
        let parsed = Url::parse(url)?;
        let kind = self.registry.select(url);
        Span::current().record("site", kind.label());

        let analysis = kind.analysis();
        // A failed page fetch or render returns at once; the favicon lookup
        // in flight is dropped.
        let (raw, favicon) = tokio::try_join!(analysis.init(&parsed, &self.sources), async {
            Ok::<_, ExtractError>(
                favicon::fetch(&self.sources.fetcher, self.config.favicon_endpoint(), url).await,
            )
        })?;
        let fields = analyze(analysis.as_ref(), raw);

        info!(
            title = %fields.title,
            has_description = fields.description.is_some(),
            has_image = fields.image.is_some(),
            has_favicon = favicon.is_some(),
            "extracted"
        );
        Ok(ExtractionResult::new(url, fields, favicon))
    }

    /// Close the shared browser, if one was launched. Never called implicitly.
    pub async fn shutdown(&self) -> Result<(), ExtractError> {
        self.sources.renderer.shutdown().await?;
        Ok(())
    }
}
