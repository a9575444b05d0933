use thiserror::Error;

use crate::fetcher::FetchError;
use crate::render::RenderError;

/// Reasons a whole extraction fails. Missing fields are never errors; only
/// failing to obtain markup is.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Render(#[from] RenderError),
}
