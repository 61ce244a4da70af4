//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! The host engine publishes an [`ArchiveEvent`] for every record it
//! archives; alarm services subscribe and evaluate each one. The bus is
//! meant to be shared via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use wxalarm_core::Record;

// ---------------------------------------------------------------------------
// ArchiveEvent
// ---------------------------------------------------------------------------

/// "New archive record" notification emitted by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveEvent {
    /// The archived record.
    pub record: Record,

    /// When the host published the event (UTC).
    pub published_at: DateTime<Utc>,
}

impl ArchiveEvent {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            published_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out bus for archive records.
///
/// # Usage
///
/// ```rust
/// use wxalarm_core::Record;
/// use wxalarm_events::bus::{ArchiveEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ArchiveEvent::new(Record::new().with("outTemp", 38.2)));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ArchiveEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest records are dropped and slow
    /// subscribers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a record to all current subscribers.
    ///
    /// With no subscribers the event is silently dropped.
    pub fn publish(&self, event: ArchiveEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArchiveEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
