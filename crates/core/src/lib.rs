//! Core alarm logic for weather-station archive records.
//!
//! Everything here is synchronous and free of I/O:
//!
//! - [`record`] -- archive records as field-name to reading maps.
//! - [`expression`] -- the restricted condition language.
//! - [`config`] -- configuration sources and the resolved [`AlarmConfig`].
//! - [`debounce`] -- cooldown and duration-gate state machine.
//! - [`alarm`] -- the [`Alarm`] component and its [`NotificationSink`] seam.
//! - [`notice`] -- notification snapshots and message text.

pub mod alarm;
pub mod config;
pub mod debounce;
pub mod error;
pub mod expression;
pub mod notice;
pub mod record;
pub mod types;

pub use alarm::{Alarm, NotificationSink};
pub use config::{AlarmConfig, AlarmKeys, ConfigSource, TomlConfig};
pub use debounce::{AlarmRuntimeState, Transition};
pub use error::CoreError;
pub use expression::{EvalError, Expression, ExpressionError};
pub use notice::{AlarmNotice, NoticeKind};
pub use record::Record;
