//! Command-line arguments for the standalone alarm check.

use std::path::PathBuf;

use clap::Parser;

/// Load the alarm configuration and evaluate one archive record against it.
///
/// Without `--record`, a synthetic record is used:
/// `{"extraTemp1": 1.0, "outTemp": 38.2, "dateTime": <now>}`.
#[derive(Debug, Parser)]
#[command(name = "wxalarm", version)]
pub struct Args {
    /// Path to the station configuration file (TOML).
    pub config_path: PathBuf,

    /// JSON object of field name to number (or null) to evaluate instead of
    /// the synthetic record.
    #[arg(long, value_name = "JSON")]
    pub record: Option<String>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, env = "WXALARM_VERBOSE")]
    pub verbose: bool,
}
