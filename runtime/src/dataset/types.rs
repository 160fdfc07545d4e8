//! Request, job and outcome types for the dataset-service path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// One target handed to the dataset service, e.g. `{"url": "..."}` or
/// `{"keyword": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetDescriptor(BTreeMap<String, String>);

impl TargetDescriptor {
    /// A descriptor with a single key.
    pub fn single(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self(BTreeMap::from([(key.into(), value.into())]))
    }

    /// `{"url": url}`.
    pub fn url(url: impl Into<String>) -> Self {
        Self::single("url", url)
    }

    /// `{"keyword": keyword}`.
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self::single("keyword", keyword)
    }

    /// Parse `key=value[,key=value...]`.
    pub fn parse_pairs(spec: &str) -> Option<Self> {
        let mut map = BTreeMap::new();
        for pair in spec.split(',') {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            map.insert(key.to_string(), value.trim().to_string());
        }
        Some(Self(map))
    }
}

/// How the dataset service should interpret the targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMode {
    /// Collect the organizations behind the given URLs.
    CollectByUrl,
    /// Discover new organizations matching the given keywords.
    DiscoverByKeyword,
}

impl DiscoveryMode {
    /// Query parameters added to the trigger call on top of the dataset id.
    pub fn trigger_params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::CollectByUrl => &[("include_errors", "true")],
            Self::DiscoverByKeyword => &[
                ("include_errors", "true"),
                ("type", "discover_new"),
                ("discover_by", "keyword"),
            ],
        }
    }

    /// Operation name used when the trigger call fails.
    pub fn trigger_operation(&self) -> &'static str {
        match self {
            Self::CollectByUrl => "collection trigger",
            Self::DiscoverByKeyword => "search trigger",
        }
    }

    /// Prefix of the default output filename.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::CollectByUrl => "crunchbase_organizations",
            Self::DiscoverByKeyword => "crunchbase_keywords",
        }
    }

    /// Activity name for log lines ("Starting search for ...").
    pub fn activity(&self) -> &'static str {
        match self {
            Self::CollectByUrl => "collection",
            Self::DiscoverByKeyword => "search",
        }
    }

    /// Noun for log lines ("collection for 2 organizations").
    pub fn target_noun(&self) -> &'static str {
        match self {
            Self::CollectByUrl => "organizations",
            Self::DiscoverByKeyword => "keywords",
        }
    }
}

/// An ordered, immutable set of targets plus the mode they are sent in.
#[derive(Debug, Clone)]
pub struct CollectionRequest {
    mode: DiscoveryMode,
    targets: Vec<TargetDescriptor>,
}

impl CollectionRequest {
    pub fn new(mode: DiscoveryMode, targets: Vec<TargetDescriptor>) -> Self {
        Self { mode, targets }
    }

    /// Collect-by-URL request for the given organization URLs.
    pub fn urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            DiscoveryMode::CollectByUrl,
            urls.into_iter().map(TargetDescriptor::url).collect(),
        )
    }

    /// Keyword-discovery request.
    pub fn keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            DiscoveryMode::DiscoverByKeyword,
            keywords.into_iter().map(TargetDescriptor::keyword).collect(),
        )
    }

    pub fn mode(&self) -> DiscoveryMode {
        self.mode
    }

    pub fn targets(&self) -> &[TargetDescriptor] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Status reported by the progress endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the service, not yet polled.
    Triggered,
    Running,
    Ready,
    Failed,
    Error,
    /// The progress response carried no status at all.
    Unknown,
    /// Any other status string; treated as still in progress.
    Other(String),
}

impl JobStatus {
    /// Map the `status` field of a progress response.
    pub fn from_wire(status: Option<&str>) -> Self {
        match status {
            None => Self::Unknown,
            Some("running") => Self::Running,
            Some("ready") => Self::Ready,
            Some("failed") => Self::Failed,
            Some("error") => Self::Error,
            Some("triggered") => Self::Triggered,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    /// No further polling happens once a job reaches a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed | Self::Error | Self::Unknown)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Error | Self::Unknown)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Triggered => write!(f, "triggered"),
            Self::Running => write!(f, "running"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
            Self::Error => write!(f, "error"),
            Self::Unknown => write!(f, "unknown"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// One remote batch job, from trigger to terminal status.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub elapsed: Duration,
    started: Instant,
    last_observed: Option<JobStatus>,
    polls: u32,
}

impl Job {
    /// A freshly triggered job. `started` is when the run began.
    pub fn new(id: impl Into<String>, started: Instant) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Triggered,
            elapsed: started.elapsed(),
            started,
            last_observed: None,
            polls: 0,
        }
    }

    /// Record one poll result. Returns `true` when the status differs from
    /// the previous poll (the first poll always counts as a change).
    pub fn observe(&mut self, status: JobStatus) -> bool {
        self.elapsed = self.started.elapsed();
        self.polls += 1;
        let changed = self.last_observed.as_ref() != Some(&status);
        self.last_observed = Some(status.clone());
        self.status = status;
        changed
    }

    /// Number of progress polls issued so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }
}

/// Upper bound on how long the controller keeps polling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollBudget {
    /// `None` polls until the job reaches a terminal status.
    pub max_wait: Option<Duration>,
}

impl PollBudget {
    pub fn unbounded() -> Self {
        Self { max_wait: None }
    }

    pub fn max_wait(limit: Duration) -> Self {
        Self {
            max_wait: Some(limit),
        }
    }

    pub fn exceeded(&self, elapsed: Duration) -> bool {
        self.max_wait.is_some_and(|limit| elapsed >= limit)
    }
}

/// How a controller run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Snapshot fetched and written.
    Saved { path: PathBuf, records: usize },
    /// Input rejected before any network call.
    Rejected,
    /// Trigger failed or returned no job id.
    TriggerFailed,
    /// Job ended in a failure status.
    JobFailed { status: JobStatus },
    /// Job was ready but the snapshot could not be fetched.
    FetchFailed,
    /// Snapshot fetched but could not be written.
    SaveFailed,
    /// Poll budget ran out while the job was still in progress.
    TimedOut { elapsed: Duration },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Saved { .. })
    }
}

/// Acknowledgement returned by the trigger endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerAck {
    pub snapshot_id: Option<String>,
}

/// Body of a progress response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressReport {
    pub status: Option<String>,
}
