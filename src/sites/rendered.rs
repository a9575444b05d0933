use async_trait::async_trait;
use tracing::instrument;
use url::Url;

use crate::document::RawPage;
use crate::error::ExtractError;
use crate::extractor::{PageContext, description};
use crate::sites::{SiteAnalysis, SiteKind, Sources};

/// Sites that build their content with client-side script. Markup comes
/// from the headless browser once `wait_for` is visible.
#[derive(Debug, Clone)]
pub struct RenderedAnalysis {
    wait_for: String,
}

impl RenderedAnalysis {
    pub fn new(wait_for: impl Into<String>) -> Self {
        Self {
            wait_for: wait_for.into(),
        }
    }
}

#[async_trait]
impl SiteAnalysis for RenderedAnalysis {
    fn kind(&self) -> SiteKind {
        SiteKind::Rendered {
            wait_for: self.wait_for.clone(),
        }
    }

    #[instrument(skip(self, sources), fields(url = %url, wait_for = %self.wait_for))]
    async fn init(&self, url: &Url, sources: &Sources) -> Result<RawPage, ExtractError> {
        let markup = sources
            .renderer
            .render(url, &self.wait_for, sources.render_timeout)
            .await?;
        Ok(RawPage {
            url: url.clone(),
            markup,
        })
    }

    /// The rendered shell has no article body worth scanning.
    fn description(&self, page: &PageContext<'_>) -> Option<String> {
        description::meta_description(page)
    }

    fn image(&self, _page: &PageContext<'_>) -> Option<String> {
        None
    }
}
