//! Renderer abstraction for browser-based page capture.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide).

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// How often element waits re-check the page.
const WAIT_POLL: Duration = Duration::from_millis(250);

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<NavigationResult>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;

    /// Wait until an element matching `selector` exists. Returns `false` on
    /// timeout.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let script = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        poll_js_flag(self, &script, timeout).await
    }

    /// Click the first visible element matching `selector` if one shows up
    /// within `timeout`. Returns whether a click happened.
    async fn click_if_visible(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); \
             if (!el || el.offsetParent === null) return false; \
             el.click(); return true; }})()",
            serde_json::to_string(selector)?
        );
        poll_js_flag(self, &script, timeout).await
    }
}

/// Evaluate `script` until it yields `true` or `timeout` passes.
async fn poll_js_flag<C: RenderContext + ?Sized>(
    ctx: &C,
    script: &str,
    timeout: Duration,
) -> Result<bool> {
    let start = Instant::now();
    loop {
        if ctx.execute_js(script).await?.as_bool() == Some(true) {
            return Ok(true);
        }
        if start.elapsed() >= timeout {
            return Ok(false);
        }
        tokio::time::sleep(WAIT_POLL).await;
    }
}

/// A renderer that refuses to open contexts, for tests of the failure path.
#[cfg(test)]
pub(crate) struct NoopRenderer;

#[cfg(test)]
#[async_trait]
impl Renderer for NoopRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Err(anyhow::anyhow!("Browser not available"))
    }
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
    fn active_contexts(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Context whose JS flag turns true after a number of evaluations.
    struct FlagContext {
        true_after: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RenderContext for FlagContext {
        async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<NavigationResult> {
            Ok(NavigationResult {
                final_url: url.to_string(),
                load_time_ms: 0,
            })
        }
        async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(serde_json::Value::Bool(n >= self.true_after))
        }
        async fn get_html(&self) -> Result<String> {
            Ok(String::new())
        }
        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_wait_for_selector_succeeds_after_retries() {
        let ctx = FlagContext {
            true_after: 2,
            calls: AtomicUsize::new(0),
        };
        assert!(ctx
            .wait_for_selector("#ng-state", Duration::from_secs(5))
            .await
            .unwrap());
        assert_eq!(ctx.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_click_if_visible_times_out() {
        let ctx = FlagContext {
            true_after: usize::MAX,
            calls: AtomicUsize::new(0),
        };
        assert!(!ctx
            .click_if_visible("#consent", Duration::ZERO)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_noop_renderer_refuses_contexts() {
        let renderer = NoopRenderer;
        assert!(renderer.new_context().await.is_err());
        assert_eq!(renderer.active_contexts(), 0);
    }
}
