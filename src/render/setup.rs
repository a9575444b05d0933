//! Locating, downloading and launching Chromium.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

use crate::config::{BrowserRuntime, Config};
use crate::render::{RenderError, RenderResult};

const CACHE_SUBDIR: &str = "unfurl/chromium";

/// Everything the launcher needs, captured from [`Config`] once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub runtime: BrowserRuntime,
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub user_agent: String,
}

impl LaunchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            runtime: config.browser_runtime(),
            executable: config.chromium_path().cloned(),
            headless: config.headless(),
            user_agent: config.user_agent().to_string(),
        }
    }
}

/// Removes the profile directory on drop unless [`TempDirGuard::into_path`]
/// was called.
struct TempDirGuard {
    path: PathBuf,
    keep: bool,
}

impl TempDirGuard {
    fn new(path: PathBuf) -> RenderResult<Self> {
        std::fs::create_dir_all(&path).map_err(|e| {
            RenderError::LaunchFailed(format!(
                "cannot create profile directory {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self { path, keep: false })
    }

    fn into_path(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to clean up profile directory");
        }
    }
}

/// Find an installed Chrome/Chromium.
///
/// Order: explicit path (from `CHROMIUM_PATH` via [`Config`]), platform
/// install locations, then `which` on Unix.
pub fn find_browser_executable(explicit: Option<&Path>) -> RenderResult<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            info!(path = %path.display(), "using configured browser");
            return Ok(path.to_path_buf());
        }
        warn!(path = %path.display(), "configured browser path does not exist");
    }

    for candidate in platform_paths() {
        let path = match candidate.strip_prefix("~/") {
            Some(rest) => match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            },
            None => PathBuf::from(candidate),
        };
        if path.exists() {
            info!(path = %path.display(), "found browser");
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    info!(path = %found, "found browser on PATH");
                    return Ok(PathBuf::from(found));
                }
            }
        }
    }

    Err(RenderError::NotFound(
        "no Chrome/Chromium installation found".to_string(),
    ))
}

fn platform_paths() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    }
}

/// Download (or reuse a cached) managed Chromium and return its executable.
pub async fn download_managed_browser() -> RenderResult<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(|| std::env::temp_dir().join(".cache"))
        .join(CACHE_SUBDIR);
    std::fs::create_dir_all(&cache_dir).map_err(|e| {
        RenderError::LaunchFailed(format!(
            "cannot create cache directory {}: {e}",
            cache_dir.display()
        ))
    })?;

    info!(cache_dir = %cache_dir.display(), "fetching managed chromium");
    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .map_err(|e| RenderError::LaunchFailed(format!("fetcher options: {e}")))?;
    let revision = BrowserFetcher::new(options)
        .fetch()
        .await
        .map_err(|e| RenderError::LaunchFailed(format!("chromium download failed: {e}")))?;

    info!(folder = %revision.folder_path.display(), "managed chromium ready");
    Ok(revision.executable_path)
}

/// Resolve the executable for the configured runtime.
///
/// The local runtime falls back to a managed download when nothing is
/// installed.
async fn resolve_executable(options: &LaunchOptions) -> RenderResult<PathBuf> {
    match options.runtime {
        BrowserRuntime::Bundled => download_managed_browser().await,
        BrowserRuntime::Local => match find_browser_executable(options.executable.as_deref()) {
            Ok(path) => Ok(path),
            Err(e) => {
                warn!(error = %e, "falling back to managed chromium");
                download_managed_browser().await
            }
        },
    }
}

/// Launch Chromium and spawn its CDP handler task.
///
/// Returns the browser, the handler task and the profile directory, which
/// the caller owns from here on.
pub async fn launch_browser(
    options: &LaunchOptions,
) -> RenderResult<(Browser, JoinHandle<()>, PathBuf)> {
    let executable = resolve_executable(options).await?;

    let profile = std::env::temp_dir().join(format!("unfurl_chrome_{}", std::process::id()));
    let guard = TempDirGuard::new(profile)?;

    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(1280, 800)
        .user_data_dir(guard.path.clone())
        .chrome_executable(executable);

    builder = if options.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    builder = builder
        .arg(format!("--user-agent={}", options.user_agent))
        .arg("--disable-blink-features=AutomationControlled")
        .arg("--disable-notifications")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--disable-extensions")
        .arg("--mute-audio")
        .arg("--hide-scrollbars");

    if options.runtime == BrowserRuntime::Bundled {
        builder = builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-software-rasterizer")
            .arg("--disable-background-networking")
            .arg("--disable-breakpad")
            .arg("--single-process")
            .arg("--no-zygote");
    }

    if should_disable_sandbox() {
        info!("container detected, disabling sandbox");
        builder = builder.arg("--no-sandbox").arg("--disable-setuid-sandbox");
    }

    let browser_config = builder
        .build()
        .map_err(|e| RenderError::LaunchFailed(format!("browser config: {e}")))?;

    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .map_err(|e| RenderError::LaunchFailed(e.to_string()))?;

    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                let message = e.to_string();
                // chromiumoxide cannot decode every CDP event Chrome emits.
                if message.contains("data did not match any variant of untagged enum Message")
                    || message.contains("Failed to deserialize WS response")
                {
                    trace!(error = %message, "ignored undecodable CDP event");
                } else {
                    error!(error = ?e, "browser handler error");
                }
            }
        }
        info!("browser handler task completed");
    });

    Ok((browser, handler_task, guard.into_path()))
}

/// setuid sandboxes do not work inside containers.
fn should_disable_sandbox() -> bool {
    Path::new("/.dockerenv").exists()
        || std::env::var("container").is_ok()
        || std::env::var("KUBERNETES_SERVICE_HOST").is_ok()
}
