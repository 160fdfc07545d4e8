//! JSON output files.

use crate::error::HarvestError;
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Timestamp embedded in default output filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `"{prefix}_{YYYYmmdd_HHMMSS}.json"` in the current directory.
pub fn default_filename(prefix: &str) -> PathBuf {
    PathBuf::from(format!(
        "{prefix}_{}.json",
        Local::now().format(TIMESTAMP_FORMAT)
    ))
}

/// Write `value` as pretty-printed UTF-8 JSON (two-space indent, non-ASCII
/// kept as-is), replacing any existing file.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), HarvestError> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| HarvestError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, json).map_err(|source| HarvestError::Io {
        path: path.to_path_buf(),
        source,
    })
}
