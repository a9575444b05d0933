//! Process-wide browser shared by every render.
//!
//! The browser slot is a `tokio::sync::Mutex<Option<Box<dyn BrowserSession>>>`.
//! Launch happens while the lock is held, so concurrent first renders wait
//! for a single launch instead of racing to start their own.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::render::setup::{LaunchOptions, launch_browser};
use crate::render::{RenderError, RenderResult, Renderer, wait_until_visible};

static GLOBAL_MANAGER: OnceLock<Arc<BrowserManager>> = OnceLock::new();

/// Starts a browser. [`BrowserManager`] calls this at most once per live
/// browser.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> RenderResult<Box<dyn BrowserSession>>;
}

/// A running browser.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Cheap round trip used before every reuse.
    async fn is_alive(&self) -> bool;

    async fn new_page(&self) -> RenderResult<Box<dyn RenderPage>>;

    /// Close the browser and release what it holds. Errors are logged.
    async fn close(self: Box<Self>);
}

/// One tab, used for a single render.
#[async_trait]
pub trait RenderPage: Send + Sync {
    /// Navigate to `url`, wait for `wait_for` to be visible, return the markup.
    async fn capture(&self, url: &Url, wait_for: &str, timeout: Duration) -> RenderResult<String>;

    async fn close(self: Box<Self>) -> RenderResult<()>;
}

/// Launches Chromium with options captured from [`Config`].
pub struct ChromiumLauncher {
    options: LaunchOptions,
}

impl ChromiumLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    async fn launch(&self) -> RenderResult<Box<dyn BrowserSession>> {
        info!(runtime = ?self.options.runtime, "launching browser");
        let (browser, handler, user_data_dir) = launch_browser(&self.options).await?;
        Ok(Box::new(BrowserWrapper::new(browser, handler, user_data_dir)))
    }
}

/// A launched browser, its CDP handler task and its profile directory.
struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        }
    }
}

#[async_trait]
impl BrowserSession for BrowserWrapper {
    async fn is_alive(&self) -> bool {
        match self.browser.version().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "browser health check failed");
                false
            }
        }
    }

    async fn new_page(&self) -> RenderResult<Box<dyn RenderPage>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::PageCreationFailed(e.to_string()))?;
        Ok(Box::new(ChromiumPage(page)))
    }

    /// Close, wait for the process to exit, then remove the profile directory.
    async fn close(self: Box<Self>) {
        let mut wrapper = *self;
        if let Err(e) = wrapper.browser.close().await {
            warn!(error = %e, "failed to close browser cleanly");
        }
        if let Err(e) = wrapper.browser.wait().await {
            warn!(error = %e, "failed to wait for browser exit");
        }
        if let Some(path) = wrapper.user_data_dir.take()
            && let Err(e) = std::fs::remove_dir_all(&path)
        {
            warn!(path = %path.display(), error = %e, "failed to remove browser profile");
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        self.handler.abort();
        if let Some(path) = &self.user_data_dir {
            warn!(
                path = %path.display(),
                "browser dropped without shutdown; profile directory left behind"
            );
        }
    }
}

struct ChromiumPage(Page);

#[async_trait]
impl RenderPage for ChromiumPage {
    async fn capture(&self, url: &Url, wait_for: &str, timeout: Duration) -> RenderResult<String> {
        self.0
            .goto(url.as_str())
            .await
            .map_err(|e| RenderError::NavigationFailed(e.to_string()))?;
        wait_until_visible(&self.0, wait_for, timeout).await?;
        self.0
            .content()
            .await
            .map_err(|e| RenderError::CaptureFailed(e.to_string()))
    }

    async fn close(self: Box<Self>) -> RenderResult<()> {
        self.0
            .close()
            .await
            .map_err(|e| RenderError::PageCreationFailed(format!("closing page: {e}")))
    }
}

pub struct BrowserManager {
    launcher: Box<dyn Launcher>,
    browser: Mutex<Option<Box<dyn BrowserSession>>>,
}

impl BrowserManager {
    /// The process-wide manager.
    ///
    /// The first call fixes the launch options; later calls get the same
    /// instance whatever config they pass. No browser starts until the first
    /// render.
    pub fn global(config: &Config) -> Arc<BrowserManager> {
        GLOBAL_MANAGER
            .get_or_init(|| {
                let launcher = ChromiumLauncher::new(LaunchOptions::from_config(config));
                Arc::new(BrowserManager::new(launcher))
            })
            .clone()
    }

    /// A standalone manager around `launcher`. Most callers want [`global`].
    ///
    /// [`global`]: BrowserManager::global
    pub fn new(launcher: impl Launcher + 'static) -> Self {
        Self {
            launcher: Box::new(launcher),
            browser: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }

    /// Open a page on the shared browser, launching or relaunching it first
    /// when needed.
    async fn open_page(&self) -> RenderResult<Box<dyn RenderPage>> {
        let mut guard = self.browser.lock().await;

        let alive = match guard.as_ref() {
            Some(session) => Some(session.is_alive().await),
            None => None,
        };
        match alive {
            Some(true) => debug!("reusing browser"),
            Some(false) => {
                info!("relaunching crashed browser");
                if let Some(crashed) = guard.take() {
                    crashed.close().await;
                }
            }
            None => {}
        }

        if guard.is_none() {
            *guard = Some(self.launcher.launch().await?);
        }

        match guard.as_ref() {
            Some(session) => session.new_page().await,
            None => Err(RenderError::LaunchFailed("browser slot empty after launch".to_string())),
        }
    }

    /// Close the shared browser if one is running. Safe to call repeatedly.
    pub async fn shutdown(&self) -> RenderResult<()> {
        if let Some(session) = self.browser.lock().await.take() {
            info!("shutting down browser");
            session.close().await;
        }
        Ok(())
    }
}

#[async_trait]
impl Renderer for BrowserManager {
    #[instrument(skip(self), fields(url = %url))]
    async fn render(&self, url: &Url, wait_for: &str, timeout: Duration) -> RenderResult<String> {
        let page = self.open_page().await?;
        let captured = page.capture(url, wait_for, timeout).await;

        // The page is closed on every path; the browser stays up.
        if let Err(e) = page.close().await {
            warn!(error = %e, "failed to close page");
        }

        let markup = captured?;
        debug!(bytes = markup.len(), "captured rendered markup");
        Ok(markup)
    }

    async fn shutdown(&self) -> RenderResult<()> {
        BrowserManager::shutdown(self).await
    }
}
