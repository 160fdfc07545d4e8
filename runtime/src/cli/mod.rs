//! CLI subcommand implementations for the orgscope binary.

pub mod dataset_cmd;
pub mod extract_cmd;
pub mod output;
pub mod scrape_cmd;
