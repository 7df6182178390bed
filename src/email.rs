use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::{
    config::EmailConfig,
    error::{AppError, Result},
};

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, email: OutgoingEmail) -> Result<()>;
}

/// Delivers over SMTP with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, config: &EmailConfig) -> Result<Self> {
        let from: Mailbox = config.from_address.parse()
            .map_err(|e| AppError::Internal(format!("Invalid from address {}: {}", config.from_address, e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::Internal(format!("Invalid SMTP relay {}: {}", host, e)))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        let to: Mailbox = email.to.parse()
            .map_err(|e| AppError::Validation(format!("Invalid recipient {}: {}", email.to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Internal(format!("SMTP delivery failed: {}", e)))?;

        Ok(())
    }
}

/// Development fallback: the message goes to the log and nowhere else.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        tracing::info!(to = %email.to, subject = %email.subject, "email not sent (no SMTP host):\n{}", email.body);
        Ok(())
    }
}

pub fn from_config(config: &EmailConfig) -> Result<Arc<dyn Mailer>> {
    match config.smtp_host.as_deref().filter(|h| !h.is_empty()) {
        Some(host) => Ok(Arc::new(SmtpMailer::new(host, config)?)),
        None => {
            tracing::warn!("No SMTP host configured; outgoing email will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_host_falls_back_to_log() {
        let mailer = from_config(&EmailConfig::default()).unwrap();
        assert_eq!(mailer.name(), "log");
    }

    #[tokio::test]
    async fn test_smtp_mailer_rejects_bad_recipient() {
        let config = EmailConfig {
            smtp_host: Some("localhost".to_string()),
            ..Default::default()
        };
        let mailer = from_config(&config).unwrap();
        assert_eq!(mailer.name(), "smtp");

        let result = mailer.send(OutgoingEmail {
            to: "not an address".to_string(),
            subject: "x".to_string(),
            body: "x".to_string(),
        }).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
