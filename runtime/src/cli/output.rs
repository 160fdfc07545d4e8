//! Output helpers shared by the subcommands.
//!
//! Global flags are passed through environment variables so any module can
//! check them without threading the parsed CLI around.

/// Set when `--json` was given.
pub const JSON_ENV: &str = "ORGSCOPE_JSON";
/// Set when `--quiet` was given.
pub const QUIET_ENV: &str = "ORGSCOPE_QUIET";

/// Whether machine-readable output was requested.
pub fn is_json() -> bool {
    std::env::var(JSON_ENV).is_ok_and(|v| v == "1")
}

/// Whether non-essential output should be suppressed.
pub fn is_quiet() -> bool {
    std::env::var(QUIET_ENV).is_ok_and(|v| v == "1")
}

/// Print a value as one line of JSON on stdout.
pub fn print_json(value: &serde_json::Value) {
    println!("{value}");
}

/// Print a human-facing status line on stderr unless quiet or JSON mode.
pub fn note(message: &str) {
    if !is_quiet() && !is_json() {
        eprintln!("  {message}");
    }
}
