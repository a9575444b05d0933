use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;
use wiremock::MockServer;

use unfurl::Config;
use unfurl::render::{RenderError, Renderer};

/// Config pointing the favicon service at `server`.
pub fn test_config(server: &MockServer) -> Config {
    Config::default()
        .with_request_timeout(Duration::from_secs(5))
        .with_favicon_endpoint(format!("{}/favicon", server.uri()))
}

/// Renderer returning canned markup and recording what it was asked for.
pub struct StubRenderer {
    markup: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubRenderer {
    pub fn returning(markup: impl Into<String>) -> Self {
        Self {
            markup: Some(markup.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every render times out.
    pub fn timing_out() -> Self {
        Self {
            markup: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, url: &Url, wait_for: &str, timeout: Duration) -> Result<String, RenderError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), wait_for.to_string()));
        match &self.markup {
            Some(markup) => Ok(markup.clone()),
            None => Err(RenderError::Timeout {
                selector: wait_for.to_string(),
                waited_ms: timeout.as_millis() as u64,
            }),
        }
    }
}
