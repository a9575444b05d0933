//! Configuration handling for the extractor.
//!
//! Everything has a development default so `Config::from_env` works on a
//! bare machine. Tests build configs explicitly with the `with_*` setters
//! instead of touching the process environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Environment variable names. Public so tests and wrappers can refer to them.
pub const ENV_USER_AGENT: &str = "UNFURL_USER_AGENT";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "UNFURL_REQUEST_TIMEOUT_SECS";
pub const ENV_MAX_REDIRECTS: &str = "UNFURL_MAX_REDIRECTS";
pub const ENV_FAVICON_ENDPOINT: &str = "UNFURL_FAVICON_ENDPOINT";
pub const ENV_RENDER_TIMEOUT_MS: &str = "UNFURL_RENDER_TIMEOUT_MS";
pub const ENV_BROWSER_RUNTIME: &str = "UNFURL_BROWSER_RUNTIME";
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";
pub const ENV_HEADLESS: &str = "UNFURL_HEADLESS";

/// Default values used when environment variables are absent.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_REDIRECTS: usize = 5;
const DEFAULT_FAVICON_ENDPOINT: &str = "https://t3.gstatic.com/faviconV2";
const DEFAULT_RENDER_TIMEOUT_MS: u64 = 30_000;

/// Where the headless browser binary comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserRuntime {
    /// Development machine: use a locally installed Chrome/Chromium.
    #[default]
    Local,
    /// Deployed: download and run a managed, minimal-footprint Chromium.
    Bundled,
}

impl FromStr for BrowserRuntime {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "bundled" => Ok(Self::Bundled),
            other => Err(ConfigError::InvalidValue {
                field: ENV_BROWSER_RUNTIME,
                reason: format!("expected 'local' or 'bundled', got '{other}'"),
            }),
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    user_agent: String,
    request_timeout: Duration,
    max_redirects: usize,
    favicon_endpoint: String,
    render_timeout: Duration,
    browser_runtime: BrowserRuntime,
    chromium_path: Option<PathBuf>,
    headless: bool,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = env::var(ENV_USER_AGENT) {
            config.user_agent = value;
        }
        if let Some(secs) = parse_var::<u64>(ENV_REQUEST_TIMEOUT_SECS)? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(hops) = parse_var::<usize>(ENV_MAX_REDIRECTS)? {
            config.max_redirects = hops;
        }
        if let Ok(value) = env::var(ENV_FAVICON_ENDPOINT) {
            config.favicon_endpoint = value;
        }
        if let Some(ms) = parse_var::<u64>(ENV_RENDER_TIMEOUT_MS)? {
            config.render_timeout = Duration::from_millis(ms);
        }
        if let Some(runtime) = parse_var::<BrowserRuntime>(ENV_BROWSER_RUNTIME)? {
            config.browser_runtime = runtime;
        }
        if let Ok(value) = env::var(ENV_CHROMIUM_PATH) {
            config.chromium_path = Some(PathBuf::from(value));
        }
        if let Some(headless) = parse_var::<bool>(ENV_HEADLESS)? {
            config.headless = headless;
        }

        Ok(config)
    }

    /// Development defaults (mirrors `from_env` with no env overrides).
    pub fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            favicon_endpoint: DEFAULT_FAVICON_ENDPOINT.to_string(),
            render_timeout: Duration::from_millis(DEFAULT_RENDER_TIMEOUT_MS),
            browser_runtime: BrowserRuntime::Local,
            chromium_path: None,
            headless: true,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_redirects(mut self, hops: usize) -> Self {
        self.max_redirects = hops;
        self
    }

    pub fn with_favicon_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.favicon_endpoint = endpoint.into();
        self
    }

    pub fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Header value sent as `User-Agent`.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
    /// Upper bound for a single HTTP request, body included.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
    /// Redirect hops followed before a fetch fails.
    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }
    /// Base URL of the favicon resolution service.
    pub fn favicon_endpoint(&self) -> &str {
        &self.favicon_endpoint
    }
    /// How long a render waits for its selector to become visible.
    pub fn render_timeout(&self) -> Duration {
        self.render_timeout
    }
    pub fn browser_runtime(&self) -> BrowserRuntime {
        self.browser_runtime
    }
    pub fn chromium_path(&self) -> Option<&PathBuf> {
        self.chromium_path.as_ref()
    }
    pub fn headless(&self) -> bool {
        self.headless
    }
}

fn parse_var<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field: key,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
