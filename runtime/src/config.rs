//! Static configuration and credential resolution.

use crate::dataset::types::PollBudget;
use crate::error::HarvestError;
use std::path::PathBuf;
use std::time::Duration;

/// Default dataset-service endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.brightdata.com/datasets/v3";

/// Dataset holding Crunchbase organization profiles.
pub const DEFAULT_DATASET_ID: &str = "gd_l1vijqt9jfj7olije";

/// Seconds between progress polls.
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Per-request timeout for trigger and progress calls. Snapshot fetches
/// get twice this.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "BRIGHTDATA_API_TOKEN";

/// Settings for the dataset-service client and job controller.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    pub base_url: String,
    pub dataset_id: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub budget: PollBudget,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            dataset_id: DEFAULT_DATASET_ID.to_string(),
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            budget: PollBudget::unbounded(),
        }
    }
}

impl DatasetConfig {
    /// Defaults, overridden by `ORGSCOPE_API_BASE` and `ORGSCOPE_DATASET_ID`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base) = std::env::var("ORGSCOPE_API_BASE") {
            if !base.trim().is_empty() {
                config.base_url = base.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(id) = std::env::var("ORGSCOPE_DATASET_ID") {
            if !id.trim().is_empty() {
                config.dataset_id = id.trim().to_string();
            }
        }
        config
    }

    /// Timeout for snapshot downloads, which carry the whole result set.
    pub fn snapshot_timeout(&self) -> Duration {
        self.request_timeout * 2
    }

    pub fn with_budget(mut self, budget: PollBudget) -> Self {
        self.budget = budget;
        self
    }
}

/// Resolve the bearer token: explicit value first, then `BRIGHTDATA_API_TOKEN`.
pub fn resolve_token(explicit: Option<&str>) -> Result<String, HarvestError> {
    let token = match explicit {
        Some(t) => t.to_string(),
        None => std::env::var(TOKEN_ENV).unwrap_or_default(),
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(HarvestError::MissingToken);
    }
    Ok(token.to_string())
}

/// Directory for local state (`~/.orgscope`).
pub fn state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".orgscope")
}
