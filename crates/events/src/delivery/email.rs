//! Alarm notification emails via SMTP.
//!
//! [`EmailDelivery`] turns an [`AlarmNotice`] into a plain-text MIME message
//! and submits it to the configured host. Encryption is opportunistic: a
//! STARTTLS session is tried first and, if the server does not offer
//! STARTTLS, the message goes out over an unencrypted session instead.
//! Credentials are only sent when both `smtp_user` and `smtp_password` are
//! configured.

use std::sync::Arc;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::Message;
use wxalarm_core::AlarmNotice;

use super::smtp::{Encryption, LettreSmtp, SmtpBackend, SubmitRequest};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, rejection).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// A sender or recipient address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The server does not offer STARTTLS.
    #[error("STARTTLS is not supported by the server")]
    StartTlsUnsupported,

    /// The server refused the message. Used by non-lettre backends.
    #[error("Message rejected: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Message composition
// ---------------------------------------------------------------------------

/// Build the MIME message for a notice: configured subject, sender and all
/// recipients in one `To` header, plain-text body.
pub fn compose(notice: &AlarmNotice) -> Result<Message, EmailError> {
    let config = &notice.config;

    let mut builder = Message::builder()
        .from(config.from.parse::<Mailbox>()?)
        .subject(config.subject.clone());
    for recipient in &config.mail_to {
        builder = builder.to(recipient.parse::<Mailbox>()?);
    }

    builder
        .header(ContentType::TEXT_PLAIN)
        .body(notice.body())
        .map_err(|e| EmailError::Build(e.to_string()))
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends alarm notices by email.
#[derive(Clone)]
pub struct EmailDelivery {
    backend: Arc<dyn SmtpBackend>,
}

impl EmailDelivery {
    /// Create a delivery service on top of an arbitrary backend.
    pub fn new(backend: Arc<dyn SmtpBackend>) -> Self {
        Self { backend }
    }

    /// Delivery through `lettre`.
    pub fn lettre() -> Self {
        Self::new(Arc::new(LettreSmtp))
    }

    /// Compose and submit one notice.
    ///
    /// Failures are logged at error level and returned to the caller, which
    /// is the background worker that owns this attempt.
    pub async fn deliver(&self, notice: &AlarmNotice) -> Result<(), EmailError> {
        let result = self.try_deliver(notice).await;
        match &result {
            Ok(()) => {
                tracing::info!(
                    alarm = notice.config.name,
                    to = ?notice.config.mail_to,
                    "email sent to: {:?}",
                    notice.config.mail_to
                );
            }
            Err(e) => {
                tracing::error!(
                    alarm = notice.config.name,
                    error = %e,
                    "alarm: SMTP mailer refused message with error {e}"
                );
            }
        }
        result
    }

    async fn try_deliver(&self, notice: &AlarmNotice) -> Result<(), EmailError> {
        let message = compose(notice)?;
        let envelope = message.envelope().clone();
        let payload = message.formatted();
        let settings = &notice.config.smtp;

        let mut request = SubmitRequest {
            settings,
            encryption: Encryption::StartTls,
            credentials: settings.credentials(),
            envelope: &envelope,
            payload: &payload,
        };
        if let Some((user, _)) = request.credentials {
            tracing::debug!(host = %settings.host, "logging in with user name {user}");
        }

        match self.backend.submit(request).await {
            Ok(()) => {
                tracing::debug!(host = %settings.host, "using encrypted transport");
                Ok(())
            }
            Err(EmailError::StartTlsUnsupported) => {
                tracing::debug!(host = %settings.host, "using unencrypted transport");
                request.encryption = Encryption::None;
                self.backend.submit(request).await
            }
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use wxalarm_core::config::{AlarmKeys, TomlConfig};
    use wxalarm_core::{AlarmConfig, NoticeKind, Record};

    use super::*;

    /// One submission as seen by the backend.
    #[derive(Debug, Clone, PartialEq)]
    struct Attempt {
        encryption: Encryption,
        credentials: Option<(String, String)>,
        recipients: Vec<String>,
    }

    /// Records attempts and answers from a scripted queue (default: accept).
    #[derive(Default)]
    struct ScriptedBackend {
        attempts: Mutex<Vec<Attempt>>,
        replies: Mutex<VecDeque<Result<(), EmailError>>>,
    }

    impl ScriptedBackend {
        fn replying(replies: Vec<Result<(), EmailError>>) -> Arc<Self> {
            Arc::new(Self {
                attempts: Mutex::default(),
                replies: Mutex::new(replies.into()),
            })
        }

        fn attempts(&self) -> Vec<Attempt> {
            self.attempts.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait]
    impl SmtpBackend for ScriptedBackend {
        async fn submit(&self, request: SubmitRequest<'_>) -> Result<(), EmailError> {
            self.attempts.lock().expect("lock poisoned").push(Attempt {
                encryption: request.encryption,
                credentials: request
                    .credentials
                    .map(|(u, p)| (u.to_string(), p.to_string())),
                recipients: request.envelope.to().iter().map(ToString::to_string).collect(),
            });
            self.replies
                .lock()
                .expect("lock poisoned")
                .pop_front()
                .unwrap_or(Ok(()))
        }
    }

    /// The summary line is long enough for lettre to pick quoted-printable.
    fn unfold_quoted_printable(text: &str) -> String {
        text.replace("=\r\n", "").replace("=20", " ").replace("=3D", "=")
    }

    fn notice(extra: &str) -> AlarmNotice {
        let toml = format!(
            "[Alarm]\nexpression = \"outTemp < 40.0\"\nsmtp_host = \"smtp.example.com\"\n\
             mailto = \"a@x.com, b@y.com\"\n{extra}"
        );
        let src = TomlConfig::from_toml(&toml).expect("config should parse");
        let config = AlarmConfig::from_source(&src, &AlarmKeys::SIMPLE).expect("should load");
        AlarmNotice {
            config: Arc::new(config),
            kind: NoticeKind::Fired,
            record: Record::new().with("outTemp", 38.2).with("dateTime", 1000.0),
            at: 1000,
        }
    }

    #[test]
    fn compose_addresses_every_recipient() {
        let message = compose(&notice("")).expect("should compose");
        let recipients: Vec<String> = message
            .envelope()
            .to()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(recipients, vec!["a@x.com", "b@y.com"]);

        let text = unfold_quoted_printable(
            &String::from_utf8(message.formatted()).expect("ascii message"),
        );
        assert!(text.contains("Subject: Alarm message from weewx"));
        assert!(text.contains("From: alarm@weewx.com"));
        assert!(text.contains("a@x.com"));
        assert!(text.contains("b@y.com"));
        assert!(text.contains("outTemp"));
        assert!(text.contains("(1000)"));
    }

    #[test]
    fn compose_rejects_bad_sender() {
        assert_matches!(
            compose(&notice("from = \"not-an-email\"\n")),
            Err(EmailError::Address(_))
        );
    }

    #[tokio::test]
    async fn no_credentials_means_no_auth_attempt() {
        let backend = ScriptedBackend::replying(vec![]);
        let delivery = EmailDelivery::new(backend.clone());

        delivery.deliver(&notice("")).await.expect("should deliver");

        let attempts = backend.attempts();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].encryption, Encryption::StartTls);
        assert_eq!(attempts[0].credentials, None);
        assert_eq!(attempts[0].recipients, vec!["a@x.com", "b@y.com"]);
    }

    #[tokio::test]
    async fn user_without_password_does_not_authenticate() {
        let backend = ScriptedBackend::replying(vec![]);
        let delivery = EmailDelivery::new(backend.clone());

        delivery
            .deliver(&notice("smtp_user = \"station\"\n"))
            .await
            .expect("should deliver");

        assert_eq!(backend.attempts()[0].credentials, None);
    }

    #[tokio::test]
    async fn configured_credentials_are_used() {
        let backend = ScriptedBackend::replying(vec![]);
        let delivery = EmailDelivery::new(backend.clone());

        delivery
            .deliver(&notice("smtp_user = \"station\"\nsmtp_password = \"pw\"\n"))
            .await
            .expect("should deliver");

        assert_eq!(
            backend.attempts()[0].credentials,
            Some(("station".to_string(), "pw".to_string()))
        );
    }

    #[tokio::test]
    async fn falls_back_to_plain_session_without_starttls() {
        let backend = ScriptedBackend::replying(vec![Err(EmailError::StartTlsUnsupported)]);
        let delivery = EmailDelivery::new(backend.clone());

        delivery.deliver(&notice("")).await.expect("fallback should deliver");

        let encryptions: Vec<_> = backend.attempts().iter().map(|a| a.encryption).collect();
        assert_eq!(encryptions, vec![Encryption::StartTls, Encryption::None]);
    }

    #[tokio::test]
    async fn rejection_is_returned_without_retry() {
        let backend =
            ScriptedBackend::replying(vec![Err(EmailError::Rejected("550 no such user".into()))]);
        let delivery = EmailDelivery::new(backend.clone());

        let result = delivery.deliver(&notice("")).await;

        assert_matches!(result, Err(EmailError::Rejected(_)));
        assert_eq!(backend.attempts().len(), 1);
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
