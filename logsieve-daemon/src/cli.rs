//! CLI argument definitions for logsieve-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// logsieve log event filter daemon.
///
/// Reads JSON-lines log events from stdin (or `--input`), drops every event
/// matched by the configured filter rules, and writes the remaining lines
/// to stdout unchanged. Rule sources are reloaded periodically.
#[derive(Parser, Debug, Default)]
#[command(name = "logsieve-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to logsieve.toml configuration file.
    ///
    /// Without it, built-in defaults plus `LOGSIEVE_*` environment variables are used.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override rule sources (comma-separated, loaded in order).
    #[arg(short, long, value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Override the rule refresh interval in seconds.
    #[arg(long)]
    pub refresh_interval_secs: Option<u64>,

    /// Override the default level mode (equality, threshold).
    #[arg(long)]
    pub level_mode: Option<String>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Read events from this file instead of stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Load every rule source once, print a report, and exit.
    ///
    /// Exits with an error if any source or rule record was rejected.
    #[arg(long)]
    pub validate: bool,
}
