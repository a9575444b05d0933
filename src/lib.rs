//! Link-preview metadata extraction: title, description, image and favicon
//! for an arbitrary web page URL.

pub mod config;
pub mod document;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod render;
pub mod sites;

pub use config::Config;
pub use error::ExtractError;
pub use extractor::{ExtractionResult, Extractor};
pub use sites::{SiteKind, SiteRegistry};
