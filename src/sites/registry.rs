use serde::{Deserialize, Serialize};

use crate::sites::{GenericAnalysis, HeadlineAnalysis, RenderedAnalysis, SiteAnalysis};

/// Tag naming which analysis handles a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SiteKind {
    Generic,
    /// Title and image read from an inline script payload.
    Headline,
    /// Markup taken from a headless browser after `wait_for` is visible.
    Rendered { wait_for: String },
}

impl SiteKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Headline => "headline",
            Self::Rendered { .. } => "rendered",
        }
    }

    /// Fresh analysis for one request.
    pub fn analysis(&self) -> Box<dyn SiteAnalysis> {
        match self {
            Self::Generic => Box::new(GenericAnalysis),
            Self::Headline => Box::new(HeadlineAnalysis),
            Self::Rendered { wait_for } => Box::new(RenderedAnalysis::new(wait_for.clone())),
        }
    }
}

/// Ordered URL-substring table. First matching pattern wins; no match means
/// [`SiteKind::Generic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRegistry {
    rules: Vec<(String, SiteKind)>,
}

impl SiteRegistry {
    /// Empty table: every URL gets the generic analysis.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Table with the built-in site overrides.
    pub fn with_defaults() -> Self {
        Self::new().route("juejin", SiteKind::Headline).route(
            "zhihu.com",
            SiteKind::Rendered {
                wait_for: "h1".to_string(),
            },
        )
    }

    /// Append a rule. Earlier rules take precedence.
    pub fn route(mut self, pattern: impl Into<String>, kind: SiteKind) -> Self {
        self.rules.push((pattern.into(), kind));
        self
    }

    pub fn select(&self, url: &str) -> SiteKind {
        self.rules
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map(|(_, kind)| kind.clone())
            .unwrap_or(SiteKind::Generic)
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.rules.iter().map(|(pattern, _)| pattern.as_str()).collect()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
