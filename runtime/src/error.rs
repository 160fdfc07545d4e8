//! Error taxonomy shared by the dataset client, the persister and the
//! capture path.
//!
//! Nothing here crosses the job controller's boundary: the controller logs
//! the error and folds it into its boolean outcome.

use std::path::PathBuf;

/// Maximum number of characters of a response body kept for logging.
pub const BODY_EXCERPT_LEN: usize = 500;

/// All errors produced while acquiring or persisting company data.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("no targets provided")]
    EmptyTargets,

    #[error("API token required")]
    MissingToken,

    #[error("API {operation} error: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("API {operation} error: HTTP {status}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("trigger response did not contain a snapshot id")]
    MissingJobId,

    #[error("API {operation} returned an unreadable body: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("browser error: {0}")]
    Browser(String),
}

impl HarvestError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            HarvestError::Status { status, .. } => Some(*status),
            HarvestError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Leading part of the response body, truncated for log output.
    pub fn body_excerpt(&self) -> Option<&str> {
        match self {
            HarvestError::Status { body, .. } => Some(truncate_chars(body, BODY_EXCERPT_LEN)),
            _ => None,
        }
    }
}

/// Cut `text` to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
