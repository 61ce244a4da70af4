//! The standalone check: load config, build alarms, evaluate one record.

use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::runtime::Handle;
use wxalarm_core::config::ALARM_SECTION;
use wxalarm_core::types::EpochSeconds;
use wxalarm_core::{ConfigSource, Record, TomlConfig};
use wxalarm_events::{AlarmService, EmailDelivery, MailDispatcher};

use crate::cli::Args;

/// The record used when none is given on the command line.
pub fn synthetic_record(now: EpochSeconds) -> Record {
    Record::new()
        .with("extraTemp1", 1.0)
        .with("outTemp", 38.2)
        .with("dateTime", now as f64)
}

/// Parse a `--record` argument.
pub fn parse_record(json: &str) -> anyhow::Result<Record> {
    serde_json::from_str(json).context("--record must be a JSON object of field to number or null")
}

/// Outcome of one standalone run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Alarms that were fully configured.
    pub alarms: usize,
    /// Notices dispatched (and awaited) for the record.
    pub notifications: usize,
}

/// Run the check with real SMTP delivery.
pub async fn run(args: &Args) -> anyhow::Result<RunSummary> {
    run_with(args, EmailDelivery::lettre()).await
}

/// Run the check with the given delivery service.
///
/// Waits for every dispatched email before returning.
pub async fn run_with(args: &Args, delivery: EmailDelivery) -> anyhow::Result<RunSummary> {
    let config = TomlConfig::from_file(&args.config_path).with_context(|| {
        format!(
            "Unable to open configuration file {}",
            args.config_path.display()
        )
    })?;
    if !config.has_section(ALARM_SECTION) {
        bail!(
            "No [{ALARM_SECTION}] section in the configuration file {}",
            args.config_path.display()
        );
    }

    let record = match &args.record {
        Some(json) => parse_record(json)?,
        None => synthetic_record(chrono::Utc::now().timestamp()),
    };

    let dispatcher = Arc::new(MailDispatcher::new(delivery, Handle::current()));
    let mut service = AlarmService::from_config(&config, dispatcher.clone());

    let notifications = service.on_new_record(&record);
    dispatcher.drain().await;

    Ok(RunSummary {
        alarms: service.alarms().len(),
        notifications,
    })
}
