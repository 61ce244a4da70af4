//! SMTP submission backends.
//!
//! [`SmtpBackend`] is one complete submission: connect, optional STARTTLS,
//! optional AUTH, `MAIL`/`RCPT`/`DATA`, `QUIT`. [`LettreSmtp`] performs it
//! with `lettre`'s async transport; tests substitute a recording backend.

use async_trait::async_trait;
use lettre::address::Envelope;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use wxalarm_core::config::SmtpSettings;

use super::email::EmailError;

/// How the session is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    /// Upgrade with STARTTLS; fail with [`EmailError::StartTlsUnsupported`]
    /// if the server does not offer it.
    StartTls,
    /// Plain-text session.
    None,
}

/// One submission attempt.
#[derive(Debug, Clone, Copy)]
pub struct SubmitRequest<'a> {
    pub settings: &'a SmtpSettings,
    pub encryption: Encryption,
    /// `None` means no AUTH command is issued at all.
    pub credentials: Option<(&'a str, &'a str)>,
    pub envelope: &'a Envelope,
    /// The fully formatted RFC 5322 message.
    pub payload: &'a [u8],
}

#[async_trait]
pub trait SmtpBackend: Send + Sync {
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<(), EmailError>;
}

// ---------------------------------------------------------------------------
// LettreSmtp
// ---------------------------------------------------------------------------

/// Submits through `lettre`'s Tokio SMTP transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct LettreSmtp;

#[async_trait]
impl SmtpBackend for LettreSmtp {
    async fn submit(&self, request: SubmitRequest<'_>) -> Result<(), EmailError> {
        let settings = request.settings;
        let builder = match request.encryption {
            Encryption::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            }
            Encryption::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(settings.host.as_str())
            }
        };

        let mut builder = builder
            .port(settings.port)
            .timeout(Some(settings.timeout));
        if let Some((user, pass)) = request.credentials {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        let mailer = builder.build();
        match mailer.send_raw(request.envelope, request.payload).await {
            Ok(_) => Ok(()),
            Err(e) if request.encryption == Encryption::StartTls && is_starttls_refusal(&e) => {
                Err(EmailError::StartTlsUnsupported)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// lettre reports a server without STARTTLS as a client-side error.
fn is_starttls_refusal(err: &lettre::transport::smtp::Error) -> bool {
    err.is_client() && err.to_string().to_ascii_lowercase().contains("starttls")
}
