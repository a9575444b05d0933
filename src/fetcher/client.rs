use crate::config::Config;
use crate::fetcher::{
    errors::FetchError,
    pipeline::process_response,
    types::{BinaryResponse, PageResponse},
};
use reqwest::{
    Client, ClientBuilder, Response, StatusCode,
    header::{self, HeaderMap, HeaderValue},
};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// HTTP transport with browser-like headers and a bounded redirect loop.
///
/// Redirects are followed by hand rather than by reqwest so that the hop
/// budget comes from [`Config`] and a cycle fails with
/// [`FetchError::TooManyRedirects`] instead of looping.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_redirects: usize,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );

        let client = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout())
            .user_agent(config.user_agent())
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects(),
        })
    }

    /// Fetch an HTML document and decode it to UTF-8.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError> {
        let parsed_url = Url::parse(url)?;
        let response = self.follow(parsed_url).await?;

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let final_url = response.url().clone();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Check body size after download (in case Content-Length was missing)
        if body_bytes.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        let page = process_response(final_url, status, body_bytes, &content_type);
        debug!(
            url_final = %page.url_final,
            charset = ?page.charset,
            repaired = page.repaired,
            size = page.body_utf8.len(),
            "fetched document"
        );
        Ok(page)
    }

    /// Fetch any resource as raw bytes, following the same redirect rules.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_binary(&self, url: Url) -> Result<BinaryResponse, FetchError> {
        let response = self.follow(url).await?;

        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let url_final = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        if body.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body.len() as u64));
        }

        Ok(BinaryResponse {
            url_final,
            content_type,
            body,
        })
    }

    /// Issue GETs until a non-redirect answer arrives. Anything but 200 fails.
    async fn follow(&self, url: Url) -> Result<Response, FetchError> {
        let mut current = url;
        let mut hops = 0;

        loop {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(FetchError::from_reqwest_error)?;
            let status = response.status();

            if status.is_redirection() {
                if hops >= self.max_redirects {
                    return Err(FetchError::TooManyRedirects {
                        limit: self.max_redirects,
                    });
                }
                let next = redirect_target(&current, &response)
                    .ok_or(FetchError::MissingLocation { status })?;
                debug!(from = %current, to = %next, %status, "following redirect");
                current = next;
                hops += 1;
                continue;
            }

            if status != StatusCode::OK {
                return Err(FetchError::Http { status });
            }

            return Ok(response);
        }
    }
}

fn redirect_target(current: &Url, response: &Response) -> Option<Url> {
    let location = response.headers().get(header::LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}
