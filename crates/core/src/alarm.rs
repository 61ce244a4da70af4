//! The alarm component: evaluate each archive record and decide whether to
//! notify.
//!
//! [`Alarm::on_new_record`] is the single entry point a host adapter calls.
//! It runs synchronously on the caller's thread, never blocks on I/O, and
//! never fails: evaluation problems are logged and the record is skipped.
//! Notices go to a [`NotificationSink`], which is expected to hand them off
//! to a background worker.

use std::sync::Arc;

use crate::config::AlarmConfig;
use crate::debounce::{AlarmRuntimeState, Debouncer, Transition};
use crate::notice::{AlarmNotice, NoticeKind};
use crate::record::Record;
use crate::types::EpochSeconds;

/// Receives notices produced by an [`Alarm`].
///
/// Implementations must return promptly; delivery belongs off the calling
/// thread.
pub trait NotificationSink: Send + Sync {
    fn dispatch(&self, notice: AlarmNotice);
}

/// One configured alarm and its runtime state.
pub struct Alarm {
    config: Arc<AlarmConfig>,
    debouncer: Debouncer,
    sink: Arc<dyn NotificationSink>,
}

impl Alarm {
    pub fn new(config: AlarmConfig, sink: Arc<dyn NotificationSink>) -> Self {
        let debouncer = Debouncer::new(config.cooldown, config.duration_gate);
        Self {
            config: Arc::new(config),
            debouncer,
            sink,
        }
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    pub fn state(&self) -> &AlarmRuntimeState {
        self.debouncer.state()
    }

    /// Handle a new archive record.
    ///
    /// Returns the transition taken, mostly for callers that want to log or
    /// test it; the notice itself has already been dispatched.
    pub fn on_new_record(&mut self, record: &Record) -> Transition {
        let matched = match self.config.expression.evaluate(record) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::debug!(alarm = self.config.name, error = %e, "alarm: {e}");
                return Transition::None;
            }
        };

        let now = record.date_time().unwrap_or_else(current_epoch);
        let transition = self.debouncer.observe(matched, now);
        let kind = match transition {
            Transition::None => return transition,
            Transition::Fired => NoticeKind::Fired,
            Transition::Cleared => NoticeKind::Cleared,
        };

        self.sink.dispatch(AlarmNotice {
            config: Arc::clone(&self.config),
            kind,
            record: record.clone(),
            at: now,
        });
        transition
    }
}

fn current_epoch() -> EpochSeconds {
    chrono::Utc::now().timestamp()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
