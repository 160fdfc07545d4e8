// Copyright 2026 Orgscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Drives one dataset job from trigger to saved snapshot.
//!
//! ```text
//! trigger ──► poll ──► running ──(sleep)──► poll ...
//!               │
//!               ├─► ready ──► fetch snapshot ──► save ──► done
//!               └─► failed | error | no status ──► done (failure)
//! ```
//!
//! A failed progress request counts as an `error` status for that cycle,
//! which ends the run. Nothing escapes as an error: every failure is logged
//! and reported through [`RunOutcome`].

use super::client::DatasetApi;
use super::types::{CollectionRequest, Job, JobStatus, PollBudget, RunOutcome};
use crate::config::{DatasetConfig, POLL_INTERVAL_SECS};
use crate::error::HarvestError;
use crate::persist;
use crate::progress::{self, ProgressEventKind, ProgressSender};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Polling behavior of a [`JobController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    pub budget: PollBudget,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            budget: PollBudget::unbounded(),
        }
    }
}

impl From<&DatasetConfig> for ControllerConfig {
    fn from(config: &DatasetConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            budget: config.budget,
        }
    }
}

/// Job lifecycle controller over any [`DatasetApi`].
pub struct JobController<A> {
    api: A,
    config: ControllerConfig,
    progress: Option<ProgressSender>,
}

impl<A: DatasetApi> JobController<A> {
    pub fn new(api: A, config: ControllerConfig) -> Self {
        Self {
            api,
            config,
            progress: None,
        }
    }

    /// Attach a progress channel.
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run the job and save its snapshot. Returns `true` only when the
    /// snapshot was written.
    pub async fn run(&self, request: &CollectionRequest, destination: Option<&Path>) -> bool {
        self.run_with_outcome(request, destination)
            .await
            .is_success()
    }

    /// Run the job and report how it ended.
    ///
    /// With no `destination`, output goes to a timestamped file named after
    /// the request mode.
    pub async fn run_with_outcome(
        &self,
        request: &CollectionRequest,
        destination: Option<&Path>,
    ) -> RunOutcome {
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut seq = 0u64;
        let mode = request.mode();

        if request.is_empty() {
            warn!("No {} provided", mode.target_noun());
            return RunOutcome::Rejected;
        }

        let started = Instant::now();
        info!(
            run_id = %run_id,
            "Starting {} for {} {}",
            mode.activity(),
            request.len(),
            mode.target_noun()
        );

        let job_id = match self.api.trigger(request).await {
            Ok(id) => id,
            Err(e) => {
                self.log_request_error(&e, &run_id, &mut seq);
                return RunOutcome::TriggerFailed;
            }
        };
        info!(job_id = %job_id, "Job triggered");
        self.emit(
            &run_id,
            &mut seq,
            ProgressEventKind::JobTriggered {
                job_id: job_id.clone(),
                targets: request.len(),
            },
        );

        let mut job = Job::new(job_id, started);

        loop {
            let status = match self.api.progress(&job.id).await {
                Ok(status) => JobStatus::from_wire(status.as_deref()),
                Err(e) => {
                    self.log_request_error(&e, &run_id, &mut seq);
                    JobStatus::Error
                }
            };

            if job.observe(status) {
                log_status_change(&job.status, job.elapsed);
                self.emit(
                    &run_id,
                    &mut seq,
                    ProgressEventKind::StatusChanged {
                        job_id: job.id.clone(),
                        status: job.status.to_string(),
                        elapsed_ms: job.elapsed.as_millis() as u64,
                    },
                );
            }

            if job.status.is_terminal() {
                if job.status.is_failure() {
                    return RunOutcome::JobFailed {
                        status: job.status.clone(),
                    };
                }
                let path = destination
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| persist::default_filename(mode.file_prefix()));
                return self.finish(&job, path, &run_id, &mut seq).await;
            }

            if self.config.budget.exceeded(job.elapsed) {
                warn!(
                    job_id = %job.id,
                    polls = job.polls(),
                    "Gave up after {:.1}s with job still {}",
                    job.elapsed.as_secs_f64(),
                    job.status
                );
                self.emit(
                    &run_id,
                    &mut seq,
                    ProgressEventKind::TimedOut {
                        job_id: job.id.clone(),
                        elapsed_ms: job.elapsed.as_millis() as u64,
                    },
                );
                return RunOutcome::TimedOut {
                    elapsed: job.elapsed,
                };
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn finish(&self, job: &Job, path: PathBuf, run_id: &str, seq: &mut u64) -> RunOutcome {
        let records = match self.api.snapshot(&job.id).await {
            Ok(records) => records,
            Err(e) => {
                self.log_request_error(&e, run_id, seq);
                return RunOutcome::FetchFailed;
            }
        };
        self.emit(
            run_id,
            seq,
            ProgressEventKind::SnapshotFetched {
                job_id: job.id.clone(),
                records: records.len(),
            },
        );

        match persist::save_json(&records, &path) {
            Ok(()) => {
                info!("Saved {} records to {}", records.len(), path.display());
                self.emit(
                    run_id,
                    seq,
                    ProgressEventKind::Saved {
                        path: path.display().to_string(),
                        records: records.len(),
                    },
                );
                RunOutcome::Saved {
                    path,
                    records: records.len(),
                }
            }
            Err(e) => {
                error!("Data save failed: {e}");
                RunOutcome::SaveFailed
            }
        }
    }

    fn log_request_error(&self, err: &HarvestError, run_id: &str, seq: &mut u64) {
        error!("{err}");
        if let Some(status) = err.status_code() {
            error!("Response {status}: {}", err.body_excerpt().unwrap_or(""));
        }
        self.emit(
            run_id,
            seq,
            ProgressEventKind::RequestFailed {
                message: err.to_string(),
                status: err.status_code(),
            },
        );
    }

    fn emit(&self, run_id: &str, seq: &mut u64, event: ProgressEventKind) {
        progress::emit(&self.progress, run_id, seq, event);
    }
}

fn log_status_change(status: &JobStatus, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    match status {
        JobStatus::Running => info!("Status: running ({secs:.1}s elapsed)"),
        JobStatus::Ready => info!("Completed in {secs:.1} seconds"),
        JobStatus::Failed | JobStatus::Error => error!("Failed after {secs:.1} seconds"),
        other => info!("Status: {other} ({secs:.1}s)"),
    }
}
