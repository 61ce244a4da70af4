//! Configuration loading for alarms.
//!
//! - [`ConfigSource`] abstracts nested `section.key` lookup; [`TomlConfig`]
//!   is the file-backed implementation.
//! - [`AlarmConfig`] is the resolved, immutable configuration of one alarm.
//!   [`AlarmConfig::load`] never fails: a missing required option logs and
//!   yields `None`, leaving the alarm disabled.

mod alarm;
mod source;

pub use alarm::{
    AlarmConfig, AlarmKeys, DurationGate, SmtpSettings, ALARM_SECTION,
    DEFAULT_ARCHIVE_INTERVAL_SECS, DEFAULT_COOLDOWN_SECS, DEFAULT_FROM_ADDRESS,
    DEFAULT_LOOP_INTERVAL_SECS, DEFAULT_SMTP_PORT, DEFAULT_SMTP_TIMEOUT_SECS, DEFAULT_SUBJECT,
};
pub use source::{ConfigSource, ConfigValue, TomlConfig};
