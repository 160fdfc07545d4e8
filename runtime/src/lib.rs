// Copyright 2026 Orgscope Contributors
// SPDX-License-Identifier: Apache-2.0

//! Orgscope: company-profile acquisition.
//!
//! Two independent paths produce company records:
//!
//! - [`dataset`] drives a remote batch job on a dataset service (trigger,
//!   poll, fetch snapshot) and saves the raw records.
//! - [`capture`] renders a profile page in a browser, and [`extraction`]
//!   pulls an [`extraction::ExtractedRecord`] out of the embedded state blob,
//!   cleaned by [`normalize`].

pub mod capture;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extraction;
pub mod logging;
pub mod normalize;
pub mod persist;
pub mod progress;
pub mod renderer;

pub use error::HarvestError;
pub use extraction::{extract, ExtractedRecord};
