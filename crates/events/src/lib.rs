//! Event plumbing and notification delivery for weather-station alarms.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub for archive records,
//!   backed by `tokio::sync::broadcast`.
//! - [`AlarmService`] -- subscribes to the bus and drives the configured
//!   alarms.
//! - [`delivery`] -- email composition and SMTP submission.
//! - [`MailDispatcher`] -- fire-and-forget sink that sends each notice on its
//!   own task.

pub mod bus;
pub mod delivery;
pub mod dispatch;
pub mod service;

pub use bus::{ArchiveEvent, EventBus};
pub use delivery::email::{EmailDelivery, EmailError};
pub use delivery::smtp::{Encryption, LettreSmtp, SmtpBackend, SubmitRequest};
pub use dispatch::MailDispatcher;
pub use service::AlarmService;
