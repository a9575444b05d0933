//! Headless render bridge.
//!
//! One Chromium instance per process, launched on first use and shared by
//! every render. Each render opens its own page and closes it when done;
//! the browser itself stays up until [`Renderer::shutdown`] is called.

mod manager;
pub mod setup;
mod wait;

pub use manager::{BrowserManager, BrowserSession, ChromiumLauncher, Launcher, RenderPage};
pub use setup::LaunchOptions;
pub use wait::wait_until_visible;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("browser executable not found: {0}")]
    NotFound(String),

    #[error("failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("failed to open page: {0}")]
    PageCreationFailed(String),

    #[error("navigation failed: {0}")]
    NavigationFailed(String),

    #[error("timed out after {waited_ms}ms waiting for '{selector}'")]
    Timeout { selector: String, waited_ms: u64 },

    #[error("failed to capture rendered markup: {0}")]
    CaptureFailed(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Navigate, wait for content, serialize the rendered markup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &Url, wait_for: &str, timeout: Duration) -> RenderResult<String>;

    /// Release the shared browser. A no-op when nothing was launched.
    async fn shutdown(&self) -> RenderResult<()> {
        Ok(())
    }
}
