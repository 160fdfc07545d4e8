// Copyright 2026 Orgscope Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use orgscope::cli;
use orgscope::cli::dataset_cmd::DatasetArgs;
use orgscope::dataset::DiscoveryMode;
use orgscope::logging::{self, Verbosity};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "orgscope",
    about = "Orgscope: collect company profiles from a dataset service or a rendered page",
    version,
    after_help = "Run 'orgscope <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by `collect` and `search`.
#[derive(clap::Args)]
struct JobFlags {
    /// Extra target descriptor as key=value[,key=value] (repeatable)
    #[arg(long = "target", value_name = "PAIRS")]
    targets: Vec<String>,

    /// API token (defaults to $BRIGHTDATA_API_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Output file (defaults to a timestamped name)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Give up polling after this many seconds
    #[arg(long)]
    max_wait: Option<u64>,

    /// Seconds between progress polls
    #[arg(long)]
    poll_interval: Option<u64>,
}

impl JobFlags {
    fn into_args(self, values: Vec<String>) -> DatasetArgs {
        DatasetArgs {
            values,
            pairs: self.targets,
            token: self.token,
            output: self.output,
            max_wait: self.max_wait,
            poll_interval: self.poll_interval,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Collect organization records for the given profile URLs
    Collect {
        /// Organization profile URLs
        urls: Vec<String>,

        #[command(flatten)]
        flags: JobFlags,
    },

    /// Discover organizations matching the given keywords
    Search {
        /// Search keywords
        keywords: Vec<String>,

        #[command(flatten)]
        flags: JobFlags,
    },

    /// Render a profile page in Chromium and extract its company data
    Scrape {
        /// Profile page URL
        url: String,

        /// Output file (defaults to company_data.json)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Use a timestamped output filename
        #[arg(long)]
        timestamped: bool,

        /// Seconds to wait for the page state to appear
        #[arg(long)]
        wait: Option<u64>,
    },

    /// Extract company data from a saved HTML page
    Extract {
        /// HTML file
        file: PathBuf,

        /// Write the record here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var(cli::output::JSON_ENV, "1");
    }
    if cli.quiet {
        std::env::set_var(cli::output::QUIET_ENV, "1");
    }
    logging::init(Verbosity::from_flags(cli.quiet, cli.verbose), cli.log_json);

    let result = match cli.command {
        Commands::Collect { urls, flags } => {
            cli::dataset_cmd::run(DiscoveryMode::CollectByUrl, flags.into_args(urls)).await
        }
        Commands::Search { keywords, flags } => {
            cli::dataset_cmd::run(DiscoveryMode::DiscoverByKeyword, flags.into_args(keywords))
                .await
        }
        Commands::Scrape {
            url,
            output,
            headed,
            timestamped,
            wait,
        } => cli::scrape_cmd::run(&url, output.as_deref(), headed, timestamped, wait).await,
        Commands::Extract { file, output } => {
            cli::extract_cmd::run(&file, output.as_deref()).await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "orgscope", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli::output::is_quiet() && !cli::output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
