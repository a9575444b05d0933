use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("http error {status}")]
    Http { status: reqwest::StatusCode },

    #[error("too many redirects (limit {limit})")]
    TooManyRedirects { limit: usize },

    #[error("redirect {status} without a usable location header")]
    MissingLocation { status: reqwest::StatusCode },

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("http client error: {0}")]
    Client(String),
}

impl FetchError {
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if let Some(status) = err.status() {
            Self::Http { status }
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else if err.is_builder() {
            Self::Client(err.to_string())
        } else {
            // DNS, refused connections, TLS handshakes
            Self::Network(err.to_string())
        }
    }
}
