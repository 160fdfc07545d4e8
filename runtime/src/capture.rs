//! Browser-based acquisition: render a profile page and extract it locally.

use crate::error::HarvestError;
use crate::extraction::source::SourceKind;
use crate::extraction::{extract_with_source, ExtractedRecord};
use crate::progress::{self, ProgressEventKind, ProgressSender};
use crate::renderer::Renderer;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Element that signals the application state has been rendered.
pub const STATE_BLOB_CSS: &str = r#"script[id="ng-state"]"#;

/// Cookie-consent button dismissed before reading the page.
pub const CONSENT_BUTTON_CSS: &str = "#onetrust-accept-btn-handler";

/// Timing knobs for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub navigation_timeout: Duration,
    /// How long to wait for the state blob to appear.
    pub blob_wait: Duration,
    /// How long to look for the consent banner.
    pub consent_wait: Duration,
    /// Pause before reading the HTML so late content can load.
    pub settle: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            blob_wait: Duration::from_secs(20),
            consent_wait: Duration::from_secs(5),
            settle: Duration::from_secs(2),
        }
    }
}

/// A captured and extracted profile page.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedProfile {
    pub url: String,
    pub final_url: String,
    pub load_time_ms: u64,
    pub source: SourceKind,
    pub record: ExtractedRecord,
}

/// Render `url`, wait for its state blob, and extract the company profile.
///
/// A page that never shows the blob is still extracted from its markup.
pub async fn fetch_profile(
    renderer: &dyn Renderer,
    url: &str,
    options: &CaptureOptions,
    progress_tx: Option<ProgressSender>,
) -> Result<CapturedProfile, HarvestError> {
    let mut ctx = renderer
        .new_context()
        .await
        .map_err(|e| HarvestError::Browser(format!("{e:#}")))?;

    // Always close the tab, whatever happened on it.
    let outcome = async {
        let nav = ctx.navigate(url, options.navigation_timeout).await?;
        debug!(final_url = %nav.final_url, "page loaded in {}ms", nav.load_time_ms);

        if !ctx.wait_for_selector(STATE_BLOB_CSS, options.blob_wait).await? {
            warn!("state blob did not appear within {:?}", options.blob_wait);
        }
        if ctx
            .click_if_visible(CONSENT_BUTTON_CSS, options.consent_wait)
            .await?
        {
            debug!("dismissed cookie consent banner");
        }
        tokio::time::sleep(options.settle).await;

        let html = ctx.get_html().await?;
        Ok::<_, anyhow::Error>((nav, html))
    }
    .await;

    if let Err(e) = ctx.close().await {
        warn!("failed to close browser context: {e}");
    }

    let (nav, html) = outcome.map_err(|e| HarvestError::Browser(format!("{e:#}")))?;
    let (record, source) = extract_with_source(&html);

    if source == SourceKind::RawMarkup {
        warn!(url, "no embedded state blob; extracted from raw markup");
    }
    info!(
        url,
        fields = record.filled_fields(),
        "extracted profile from {source}"
    );

    let mut seq = 0;
    progress::emit(
        &progress_tx,
        url,
        &mut seq,
        ProgressEventKind::PageCaptured {
            url: url.to_string(),
            load_time_ms: nav.load_time_ms,
            source: source.to_string(),
        },
    );

    Ok(CapturedProfile {
        url: url.to_string(),
        final_url: nav.final_url,
        load_time_ms: nav.load_time_ms,
        source,
        record,
    })
}
