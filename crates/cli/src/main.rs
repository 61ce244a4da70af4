//! `wxalarm` -- standalone check of the weather alarm configuration.
//!
//! Loads the station configuration, builds every configured alarm and
//! evaluates one archive record against them, sending real email through
//! the configured SMTP host. Exits non-zero if the configuration cannot be
//! read or has no `[Alarm]` section.
//!
//! # Environment variables
//!
//! | Variable          | Required | Default        | Description                      |
//! |-------------------|----------|----------------|----------------------------------|
//! | `RUST_LOG`        | no       | `wxalarm=info` | Log filter                       |
//! | `WXALARM_VERBOSE` | no       | --             | Same as `--verbose`              |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wxalarm_cli::cli::Args;
use wxalarm_cli::run;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_filter = if args.verbose {
        "wxalarm=debug,wxalarm_core=debug,wxalarm_events=debug,wxalarm_cli=debug"
    } else {
        "wxalarm=info,wxalarm_core=info,wxalarm_events=info,wxalarm_cli=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run::run(&args).await {
        Ok(summary) => {
            tracing::info!(
                alarms = summary.alarms,
                notifications = summary.notifications,
                "Alarm check complete",
            );
        }
        Err(e) => {
            tracing::error!("{e:#}");
            std::process::exit(1);
        }
    }
}
