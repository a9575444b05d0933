use crate::sites::{SiteAnalysis, SiteKind};

/// Default heuristics, used for any URL without an override.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericAnalysis;

impl SiteAnalysis for GenericAnalysis {
    fn kind(&self) -> SiteKind {
        SiteKind::Generic
    }
}
