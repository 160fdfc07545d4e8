//! `orgscope scrape <url>`: render one profile page in Chromium and extract it.

use super::output;
use crate::capture::{self, CaptureOptions};
use crate::persist;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Output file used when neither `--output` nor `--timestamped` is given.
pub const DEFAULT_OUTPUT: &str = "company_data.json";

/// Where the captured record goes.
pub fn output_path(explicit: Option<&Path>, timestamped: bool) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None if timestamped => persist::default_filename("company_data"),
        None => PathBuf::from(DEFAULT_OUTPUT),
    }
}

/// Run the scrape command.
pub async fn run(
    url: &str,
    output_file: Option<&Path>,
    headed: bool,
    timestamped: bool,
    blob_wait: Option<u64>,
) -> Result<()> {
    let parsed = url::Url::parse(url).with_context(|| format!("invalid URL '{url}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("unsupported URL scheme '{}'", parsed.scheme());
    }

    let mut options = CaptureOptions::default();
    if let Some(secs) = blob_wait {
        options.blob_wait = Duration::from_secs(secs);
    }

    output::note(&format!("Rendering {url}..."));
    let renderer = ChromiumRenderer::new(!headed).await?;
    let result = capture::fetch_profile(&renderer, url, &options, None).await;
    if let Err(e) = renderer.shutdown().await {
        warn!("browser shutdown failed: {e:#}");
    }
    let profile = result.with_context(|| format!("failed to capture {url}"))?;

    let path = output_path(output_file, timestamped);
    persist::save_json(&profile.record, &path)?;
    info!("Saved company data to {}", path.display());

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "url": profile.url,
            "final_url": profile.final_url,
            "source": profile.source,
            "fields": profile.record.filled_fields(),
            "path": path.display().to_string(),
            "record": profile.record,
        }));
    } else if !output::is_quiet() {
        let pretty = serde_json::to_string_pretty(&profile.record)?;
        println!("{pretty}");
        output::note(&format!(
            "{} fields extracted from {} in {}ms",
            profile.record.filled_fields(),
            profile.source,
            profile.load_time_ms
        ));
    }

    Ok(())
}
