use std::time::{Duration, Instant};

use chromiumoxide::Page;
use tracing::trace;

use crate::render::{RenderError, RenderResult};

const FIRST_POLL: Duration = Duration::from_millis(100);
const MAX_POLL: Duration = Duration::from_secs(1);

/// Poll until an element matching `selector` exists and is visible.
///
/// Backs off from 100ms to 1s between polls. Exceeding `timeout` is
/// [`RenderError::Timeout`]; there is no retry.
pub async fn wait_until_visible(page: &Page, selector: &str, timeout: Duration) -> RenderResult<()> {
    let script = visibility_script(selector);
    let start = Instant::now();
    let mut poll_interval = FIRST_POLL;

    loop {
        // Evaluation errors mid-navigation are expected; keep polling.
        if let Ok(result) = page.evaluate(script.as_str()).await
            && let Ok(true) = result.into_value::<bool>()
        {
            trace!(selector, elapsed_ms = start.elapsed().as_millis() as u64, "selector visible");
            return Ok(());
        }

        if start.elapsed() >= timeout {
            return Err(RenderError::Timeout {
                selector: selector.to_string(),
                waited_ms: timeout.as_millis() as u64,
            });
        }

        tokio::time::sleep(poll_interval).await;
        poll_interval = (poll_interval * 2).min(MAX_POLL);
    }
}

/// JS expression that is `true` once the first match is present and shown.
fn visibility_script(selector: &str) -> String {
    // JSON string literals are valid JS string literals.
    let quoted = serde_json::Value::String(selector.to_string()).to_string();
    format!(
        "(() => {{ \
            const el = document.querySelector({quoted}); \
            if (!el) return false; \
            const style = window.getComputedStyle(el); \
            if (style.display === 'none' || style.visibility === 'hidden') return false; \
            const rect = el.getBoundingClientRect(); \
            return rect.width > 0 || rect.height > 0; \
        }})()"
    )
}
