use anyhow::{Context, Result};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::Mailbox,
    transport::smtp::authentication::Credentials,
};
use std::time::Duration;
use tracing::info;

use crate::config::MailConfig;
use crate::forms::ContactForm;

/// Synchronous-per-request outbound mail over an authenticated SMTP relay.
/// The contact request blocks until the relay accepts or rejects the
/// message; failures surface to the submitter.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
    recipient: Option<Mailbox>,
}

impl Mailer {
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        if !config.enabled {
            return Ok(Self {
                transport: None,
                from: None,
                recipient: None,
            });
        }

        let from: Mailbox = config
            .username
            .parse()
            .context("Invalid SMTP account address")?;
        let recipient: Mailbox = config
            .recipient
            .parse()
            .context("Invalid mail recipient address")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .context("Failed to configure SMTP relay")?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_seconds)))
            .build();

        Ok(Self {
            transport: Some(transport),
            from: Some(from),
            recipient: Some(recipient),
        })
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Compose and deliver a contact-form submission to the site owner.
    pub async fn send_contact(&self, form: &ContactForm) -> Result<()> {
        let (Some(transport), Some(from), Some(recipient)) =
            (&self.transport, &self.from, &self.recipient)
        else {
            anyhow::bail!("Mail delivery is not configured");
        };

        let body = format!(
            "Sender: {}\n{}\nPhone: {}\nName: {}",
            form.email, form.msg, form.phone, form.name
        );

        let message = Message::builder()
            .from(from.clone())
            .to(recipient.clone())
            .subject("New Message")
            .body(body)
            .context("Failed to compose contact message")?;

        transport
            .send(message)
            .await
            .context("SMTP relay rejected the message")?;

        info!("Contact message delivered to {}", recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_mailer_reports_failure() {
        let mailer = Mailer::from_config(&MailConfig::default()).unwrap();
        assert!(!mailer.is_configured());

        let form = ContactForm {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            phone: "555-0100".to_string(),
            msg: "Hello".to_string(),
        };
        assert!(mailer.send_contact(&form).await.is_err());
    }

    #[test]
    fn test_enabled_mailer_requires_parseable_addresses() {
        let config = MailConfig {
            enabled: true,
            username: "not an address".to_string(),
            password: "secret".to_string(),
            recipient: "owner@example.com".to_string(),
            ..MailConfig::default()
        };
        assert!(Mailer::from_config(&config).is_err());
    }
}
