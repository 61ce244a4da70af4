//! Fire-and-forget dispatch of alarm notices.
//!
//! [`MailDispatcher`] is the [`NotificationSink`] used in production: every
//! notice becomes its own Tokio task that composes and sends the email.
//! The caller never waits for, or observes, the result. There is no
//! backpressure, no retry and no ordering between concurrent sends; volume
//! is bounded by the alarm cooldown.
//!
//! Tasks are tracked so a short-lived process (the standalone binary) can
//! [`drain`](MailDispatcher::drain) before exiting.

use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use wxalarm_core::{AlarmNotice, NotificationSink};

use crate::delivery::email::EmailDelivery;

pub struct MailDispatcher {
    delivery: EmailDelivery,
    handle: Handle,
    tracker: TaskTracker,
}

impl MailDispatcher {
    /// Spawn sends on the runtime behind `handle`.
    ///
    /// The handle lets the dispatcher be called from threads that are not
    /// part of the runtime, such as a host's record-processing thread.
    pub fn new(delivery: EmailDelivery, handle: Handle) -> Self {
        Self {
            delivery,
            handle,
            tracker: TaskTracker::new(),
        }
    }

    /// Number of sends still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every send dispatched so far to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

impl NotificationSink for MailDispatcher {
    fn dispatch(&self, notice: AlarmNotice) {
        tracing::info!(alarm = notice.config.name, kind = ?notice.kind, "{}", notice.summary());

        let delivery = self.delivery.clone();
        // The JoinHandle is dropped on purpose: failures end with this task.
        self.tracker.spawn_on(
            async move { delivery.deliver(&notice).await },
            &self.handle,
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
