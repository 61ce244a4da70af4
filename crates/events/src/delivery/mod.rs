//! Outbound delivery of alarm notices.
//!
//! [`email`] composes and sends the message; [`smtp`] is the transport seam
//! underneath it.

pub mod email;
pub mod smtp;
