//! `orgscope collect` and `orgscope search`: run a dataset-service job.

use super::output;
use crate::config::{self, DatasetConfig};
use crate::dataset::{
    CollectionRequest, ControllerConfig, DiscoveryMode, HttpDatasetClient, JobController,
    PollBudget, RunOutcome, TargetDescriptor,
};
use crate::error::HarvestError;
use crate::progress;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Options shared by both dataset subcommands.
#[derive(Debug, Clone, Default)]
pub struct DatasetArgs {
    /// Plain targets: organization URLs or keywords depending on the mode.
    pub values: Vec<String>,
    /// Extra `key=value[,key=value]` descriptors.
    pub pairs: Vec<String>,
    pub token: Option<String>,
    pub output: Option<PathBuf>,
    /// Stop polling after this many seconds.
    pub max_wait: Option<u64>,
    /// Override the poll interval, in seconds.
    pub poll_interval: Option<u64>,
}

/// Build the request for `mode` from positional values and `--target` pairs.
pub fn build_request(mode: DiscoveryMode, args: &DatasetArgs) -> Result<CollectionRequest> {
    let mut targets: Vec<TargetDescriptor> = args
        .values
        .iter()
        .map(|v| match mode {
            DiscoveryMode::CollectByUrl => TargetDescriptor::url(v.as_str()),
            DiscoveryMode::DiscoverByKeyword => TargetDescriptor::keyword(v.as_str()),
        })
        .collect();
    for spec in &args.pairs {
        match TargetDescriptor::parse_pairs(spec) {
            Some(d) => targets.push(d),
            None => bail!("invalid target '{spec}', expected key=value[,key=value]"),
        }
    }
    Ok(CollectionRequest::new(mode, targets))
}

/// Run a collection or keyword search to completion.
pub async fn run(mode: DiscoveryMode, args: DatasetArgs) -> Result<()> {
    let request = build_request(mode, &args)?;
    if request.is_empty() {
        warn!("No {} provided", mode.target_noun());
        return Err(HarvestError::EmptyTargets.into());
    }

    let token = match config::resolve_token(args.token.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            warn!("{e}");
            return Err(e.into());
        }
    };

    let mut dataset = DatasetConfig::from_env();
    if let Some(secs) = args.poll_interval {
        dataset.poll_interval = Duration::from_secs(secs.max(1));
    }
    if let Some(secs) = args.max_wait {
        dataset = dataset.with_budget(PollBudget::max_wait(Duration::from_secs(secs)));
    }

    let controller_config = ControllerConfig::from(&dataset);
    let client = HttpDatasetClient::new(dataset, token);
    let mut controller = JobController::new(client, controller_config);

    // In JSON mode every progress event is streamed to stdout as it happens.
    let printer = if output::is_json() {
        let (tx, mut rx) = progress::channel();
        controller = controller.with_progress(tx);
        Some(tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                if let Ok(value) = serde_json::to_value(&event) {
                    output::print_json(&value);
                }
            }
        }))
    } else {
        None
    };

    let outcome = controller
        .run_with_outcome(&request, args.output.as_deref())
        .await;

    drop(controller);
    if let Some(handle) = printer {
        let _ = handle.await;
    }

    let label = match mode {
        DiscoveryMode::CollectByUrl => "Process",
        DiscoveryMode::DiscoverByKeyword => "Search",
    };
    if outcome.is_success() {
        info!("{label} completed");
    } else {
        warn!("{label} failed");
    }

    report(&outcome);
    match outcome {
        RunOutcome::Saved { .. } => Ok(()),
        other => bail!("{} did not produce a snapshot: {}", mode.activity(), describe(&other)),
    }
}

fn report(outcome: &RunOutcome) {
    if output::is_json() {
        output::print_json(&serde_json::json!({
            "success": outcome.is_success(),
            "outcome": describe(outcome),
            "path": match outcome {
                RunOutcome::Saved { path, .. } => Some(path.display().to_string()),
                _ => None,
            },
            "records": match outcome {
                RunOutcome::Saved { records, .. } => Some(*records),
                _ => None,
            },
        }));
    } else if let RunOutcome::Saved { path, records } = outcome {
        output::note(&format!("{records} records written to {}", path.display()));
    }
}

/// Short label for an outcome.
pub fn describe(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Saved { .. } => "saved".into(),
        RunOutcome::Rejected => "rejected".into(),
        RunOutcome::TriggerFailed => "trigger failed".into(),
        RunOutcome::JobFailed { status } => format!("job {status}"),
        RunOutcome::FetchFailed => "fetch failed".into(),
        RunOutcome::SaveFailed => "save failed".into(),
        RunOutcome::TimedOut { elapsed } => {
            format!("timed out after {:.1}s", elapsed.as_secs_f64())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::JobStatus;

    #[test]
    fn test_build_request_url_mode() {
        let args = DatasetArgs {
            values: vec!["https://www.crunchbase.com/organization/acme".into()],
            pairs: vec!["url=https://www.crunchbase.com/organization/beta".into()],
            ..Default::default()
        };
        let req = build_request(DiscoveryMode::CollectByUrl, &args).unwrap();
        assert_eq!(req.len(), 2);
        assert_eq!(
            req.targets()[0],
            TargetDescriptor::url("https://www.crunchbase.com/organization/acme")
        );
    }

    #[test]
    fn test_build_request_keyword_mode() {
        let args = DatasetArgs {
            values: vec!["fintech".into()],
            ..Default::default()
        };
        let req = build_request(DiscoveryMode::DiscoverByKeyword, &args).unwrap();
        assert_eq!(req.mode(), DiscoveryMode::DiscoverByKeyword);
        assert_eq!(req.targets()[0], TargetDescriptor::keyword("fintech"));
    }

    #[test]
    fn test_build_request_rejects_bad_pair() {
        let args = DatasetArgs {
            pairs: vec!["oops".into()],
            ..Default::default()
        };
        assert!(build_request(DiscoveryMode::CollectByUrl, &args).is_err());
    }

    #[test]
    fn test_describe_outcomes() {
        assert_eq!(describe(&RunOutcome::Rejected), "rejected");
        assert_eq!(
            describe(&RunOutcome::JobFailed {
                status: JobStatus::Failed
            }),
            "job failed"
        );
        assert_eq!(
            describe(&RunOutcome::TimedOut {
                elapsed: Duration::from_millis(1500)
            }),
            "timed out after 1.5s"
        );
    }
}
