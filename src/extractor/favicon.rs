use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::{debug, instrument};
use url::Url;

use crate::fetcher::Fetcher;

const FAVICON_SIZE: &str = "16";
const FALLBACK_MIME: &str = "image/png";

/// Favicon lookup URL for `page_url` on the resolution service.
pub fn service_url(endpoint: &str, page_url: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        endpoint,
        &[
            ("client", "SOCIAL"),
            ("type", "FAVICON"),
            ("fallback_opts", "TYPE,SIZE,URL"),
            ("url", page_url),
            ("size", FAVICON_SIZE),
        ],
    )
}

/// `data:` URI for `bytes`, typed by the response's declared content type.
pub fn data_uri(content_type: Option<&str>, bytes: &[u8]) -> String {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|mime| !mime.is_empty())
        .unwrap_or(FALLBACK_MIME);
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Best effort: any failure yields `None`.
#[instrument(skip(fetcher, endpoint))]
pub async fn fetch(fetcher: &Fetcher, endpoint: &str, page_url: &str) -> Option<String> {
    let lookup = match service_url(endpoint, page_url) {
        Ok(url) => url,
        Err(e) => {
            debug!(error = %e, endpoint, "invalid favicon endpoint");
            return None;
        }
    };

    match fetcher.fetch_binary(lookup).await {
        Ok(response) if !response.body.is_empty() => Some(data_uri(
            response.content_type.as_deref(),
            &response.body,
        )),
        Ok(_) => {
            debug!("favicon service returned an empty body");
            None
        }
        Err(e) => {
            debug!(error = %e, "favicon unavailable");
            None
        }
    }
}
