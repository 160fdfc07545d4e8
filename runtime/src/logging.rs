//! `tracing` subscriber setup for the binary.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Verbosity requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (_, true) => Self::Verbose,
            (true, false) => Self::Quiet,
            _ => Self::Normal,
        }
    }

    fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "orgscope=warn",
            Self::Normal => "orgscope=info",
            Self::Verbose => "orgscope=debug",
        }
    }
}

/// Build the filter: `RUST_LOG` if set, plus the crate directive.
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(
        verbosity
            .directive()
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into()),
    )
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(verbosity: Verbosity, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
