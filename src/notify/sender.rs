//! Mail transports.

use std::sync::Mutex;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::config::{MailConfig, SmtpSecurity};
use crate::{BoerseError, Result};

/// A fully rendered mail ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers rendered mails.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver one mail. No retries.
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

fn parse_mailbox(addr: &str) -> Result<Mailbox> {
    addr.parse::<Mailbox>()
        .map_err(|e| BoerseError::Notification(format!("invalid address {addr:?}: {e}")))
}

/// SMTP delivery through lettre's async transport.
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    /// Build the transport from the mail config. Does not connect.
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let host = config.smtp_host.as_str();
        let builder = match config.smtp_security {
            SmtpSecurity::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| BoerseError::Config(format!("smtp relay {host:?}: {e}")))?,
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| BoerseError::Config(format!("smtp relay {host:?}: {e}")))?,
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };

        let mut builder = builder.port(config.smtp_port);
        if !config.smtp_user.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let message = Message::builder()
            .from(parse_mailbox(&email.from)?)
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| BoerseError::Notification(format!("failed to build mail: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| BoerseError::Notification(format!("smtp delivery failed: {e}")))?;

        debug!(to = %email.to, subject = %email.subject, "mail delivered");
        Ok(())
    }
}

/// In-memory outbox for tests and local development.
#[derive(Debug, Default)]
pub struct MemorySender {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: Mutex<bool>,
}

impl MemorySender {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        if let Ok(mut f) = self.fail.lock() {
            *f = fail;
        }
    }

    /// All mails delivered so far.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Mails delivered to the given address.
    pub fn sent_to(&self, to: &str) -> Vec<OutgoingEmail> {
        self.sent().into_iter().filter(|m| m.to == to).collect()
    }

    /// Forget delivered mails.
    pub fn clear(&self) {
        if let Ok(mut s) = self.sent.lock() {
            s.clear();
        }
    }
}

#[async_trait]
impl EmailSender for MemorySender {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let failing = self.fail.lock().map(|f| *f).unwrap_or(false);
        if failing {
            return Err(BoerseError::Notification(
                "outbox configured to fail".to_string(),
            ));
        }
        self.sent
            .lock()
            .map_err(|_| BoerseError::Internal("outbox lock poisoned".to_string()))?
            .push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail(to: &str) -> OutgoingEmail {
        OutgoingEmail {
            from: "boerse@example.org".to_string(),
            to: to.to_string(),
            subject: "Betreff".to_string(),
            body: "Text".to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_sender_records() {
        let sender = MemorySender::new();
        sender.send(&mail("a@example.org")).await.unwrap();
        sender.send(&mail("b@example.org")).await.unwrap();

        assert_eq!(sender.sent().len(), 2);
        assert_eq!(sender.sent_to("a@example.org").len(), 1);

        sender.clear();
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_memory_sender_failing() {
        let sender = MemorySender::new();
        sender.set_failing(true);
        let result = sender.send(&mail("a@example.org")).await;
        assert!(matches!(result, Err(BoerseError::Notification(_))));
        assert!(sender.sent().is_empty());

        sender.set_failing(false);
        assert!(sender.send(&mail("a@example.org")).await.is_ok());
    }

    #[tokio::test]
    async fn test_smtp_sender_builds_without_connecting() {
        let mut config = MailConfig::default();
        config.smtp_security = SmtpSecurity::None;
        config.smtp_host = "127.0.0.1".to_string();
        config.smtp_port = 2525;
        assert!(SmtpSender::from_config(&config).is_ok());

        config.smtp_user = "user".to_string();
        config.smtp_password = "secret".to_string();
        assert!(SmtpSender::from_config(&config).is_ok());
    }

    #[test]
    fn test_parse_mailbox() {
        assert!(parse_mailbox("Boerse <boerse@example.org>").is_ok());
        assert!(matches!(
            parse_mailbox("nope"),
            Err(BoerseError::Notification(_))
        ));
    }
}
