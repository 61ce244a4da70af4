//! Host adapter: feed archive events from the [`EventBus`](crate::EventBus)
//! into alarms.
//!
//! [`AlarmService`] owns every configured [`Alarm`] and is the only code that
//! touches their runtime state. It processes events one at a time on a
//! single task, so alarm state needs no locking.

use std::sync::Arc;

use tokio::sync::broadcast;
use wxalarm_core::{Alarm, AlarmConfig, ConfigSource, NotificationSink, Record, Transition};

use crate::bus::ArchiveEvent;

pub struct AlarmService {
    alarms: Vec<Alarm>,
}

impl AlarmService {
    pub fn new(alarms: Vec<Alarm>) -> Self {
        Self { alarms }
    }

    /// Build every alarm the configuration enables, all sharing one sink.
    ///
    /// Variants that are not fully configured are logged and left out; an
    /// empty service is valid and simply ignores records.
    pub fn from_config(source: &impl ConfigSource, sink: Arc<dyn NotificationSink>) -> Self {
        let alarms = AlarmConfig::load_all(source)
            .into_iter()
            .map(|config| Alarm::new(config, Arc::clone(&sink)))
            .collect();
        Self::new(alarms)
    }

    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// Evaluate one record against every alarm.
    ///
    /// Returns how many notices were dispatched.
    pub fn on_new_record(&mut self, record: &Record) -> usize {
        self.alarms
            .iter_mut()
            .map(|alarm| alarm.on_new_record(record))
            .filter(|transition| *transition != Transition::None)
            .count()
    }

    /// Run the subscription loop.
    ///
    /// Exits when the channel is closed (the [`EventBus`](crate::EventBus)
    /// was dropped). Returns the service so callers can inspect final state.
    pub async fn run(mut self, mut receiver: broadcast::Receiver<ArchiveEvent>) -> Self {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::debug!(
                        published_at = %event.published_at,
                        fields = event.record.len(),
                        "Archive record received"
                    );
                    self.on_new_record(&event.record);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Alarm service lagged, records were skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, alarm service shutting down");
                    break;
                }
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
