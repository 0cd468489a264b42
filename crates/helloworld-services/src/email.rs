//! SMTP delivery for administrator notifications.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use helloworld_core::{AppError, Notifier, SmtpConfig};

/// Plain-text mail over SMTP
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl EmailService {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, AppError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid SMTP_FROM: {}", e)))?;

        let credentials = match (&config.user, &config.password) {
            (Some(user), Some(password)) => Some(Credentials::new(user.clone(), password.clone())),
            _ => None,
        };

        let mailer = if config.tls {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| AppError::Config(format!("Invalid SMTP_HOST: {}", e)))?
                .port(config.port);
            let builder = match credentials {
                Some(c) => builder.credentials(c),
                None => builder,
            };
            tracing::info!(
                host = %config.host,
                port = config.port,
                "Email service initialized (SMTP with STARTTLS)"
            );
            builder.build()
        } else {
            let builder =
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port);
            let builder = match credentials {
                Some(c) => builder.credentials(c),
                None => builder,
            };
            tracing::info!(host = %config.host, port = config.port, "Email service initialized (SMTP)");
            builder.build()
        };

        Ok(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message, AppError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| AppError::Mail(format!("Invalid recipient address '{}': {}", to, e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Mail(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        let email = self.build_message(to, subject, body)?;
        self.mailer
            .send(email)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;
        tracing::info!(to = %to, "Notification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config(from: &str) -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            user: None,
            password: None,
            from: from.to_string(),
            tls: false,
        }
    }

    #[test]
    fn test_invalid_from_is_config_error() {
        let result = EmailService::from_config(&smtp_config("not an address"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_build_message() {
        let service = EmailService::from_config(&smtp_config("site@example.com")).unwrap();

        let message = service
            .build_message("admin@example.com", "New helloworld message added by ann", "New greeting is hi")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: New helloworld message added by ann"));
        assert!(raw.contains("New greeting is hi"));

        assert!(matches!(
            service.build_message("nobody", "s", "b"),
            Err(AppError::Mail(_))
        ));
    }
}
