//! Notification snapshots handed from the evaluator to delivery.

use std::sync::Arc;

use chrono::{Local, TimeZone};

use crate::config::AlarmConfig;
use crate::record::Record;
use crate::types::EpochSeconds;

/// Which edge of the condition a notice reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The expression evaluated true and passed the debounce checks.
    Fired,
    /// The expression went back to false.
    Cleared,
}

impl NoticeKind {
    /// Outcome of the expression, as written into the message.
    pub const fn outcome(self) -> &'static str {
        match self {
            Self::Fired => "True",
            Self::Cleared => "False",
        }
    }
}

/// Everything a delivery worker needs, detached from the evaluator.
///
/// Workers only read this snapshot; they never touch alarm state.
#[derive(Debug, Clone)]
pub struct AlarmNotice {
    pub config: Arc<AlarmConfig>,
    pub kind: NoticeKind,
    pub record: Record,
    /// Time the notice refers to, from the record's `dateTime` when present.
    pub at: EpochSeconds,
}

impl AlarmNotice {
    /// One-line description, also used as the log message.
    pub fn summary(&self) -> String {
        format!(
            "Alarm expression '{}' evaluated {} at {}",
            self.config.expression.source(),
            self.kind.outcome(),
            format_timestamp(self.at)
        )
    }

    /// Plain-text mail body: the summary followed by the full record.
    pub fn body(&self) -> String {
        format!(
            "{}\nRecord:\n{}",
            self.summary(),
            serde_json::to_string_pretty(&self.record).unwrap_or_default()
        )
    }
}

/// Render epoch seconds as local time followed by the raw value, e.g.
/// `2024-01-01 10:00:00 +01:00 (1704099600)`.
pub fn format_timestamp(ts: EpochSeconds) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(local) => format!("{} ({ts})", local.format("%Y-%m-%d %H:%M:%S %Z")),
        None => format!("****** N/A ******** ({ts})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AlarmKeys, TomlConfig};

    fn notice(kind: NoticeKind) -> AlarmNotice {
        let src = TomlConfig::from_toml(
            "[Alarm]\nexpression = \"outTemp < 40.0\"\nsmtp_host = \"h\"\nmailto = \"a@x.com\"\n",
        )
        .expect("config should parse");
        let config = AlarmConfig::from_source(&src, &AlarmKeys::SIMPLE).expect("should load");
        AlarmNotice {
            config: Arc::new(config),
            kind,
            record: Record::new().with("outTemp", 38.2).with("dateTime", 1000.0),
            at: 1000,
        }
    }

    #[test]
    fn body_names_expression_outcome_time_and_record() {
        let body = notice(NoticeKind::Fired).body();
        assert!(body.starts_with("Alarm expression 'outTemp < 40.0' evaluated True at "));
        assert!(body.contains("(1000)"));
        assert!(body.contains("Record:\n"));
        assert!(body.contains("\"outTemp\": 38.2"));
    }

    #[test]
    fn cleared_notice_reports_false() {
        let summary = notice(NoticeKind::Cleared).summary();
        assert!(summary.contains("evaluated False"));
    }

    #[test]
    fn timestamp_keeps_raw_epoch() {
        assert!(format_timestamp(0).ends_with("(0)"));
    }
}
