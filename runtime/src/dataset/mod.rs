//! Dataset-service acquisition path.
//!
//! A [`controller::JobController`] triggers a remote collection job through a
//! [`client::DatasetApi`], polls it to a terminal status and saves the
//! resulting snapshot.

pub mod client;
pub mod controller;
pub mod types;

pub use client::{DatasetApi, HttpDatasetClient};
pub use controller::{ControllerConfig, JobController};
pub use types::{
    CollectionRequest, DiscoveryMode, Job, JobStatus, PollBudget, RunOutcome, TargetDescriptor,
};
