//! # Registration Mailer Module
//!
//! Sends registration confirmation codes over SMTP via the `lettre` async
//! transport. Configuration comes from environment variables; when
//! `SMTP_HOST` is not set the mailer is disabled and registration proceeds
//! without email confirmation.

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use rand::Rng;
use tracing::info;

/// Default SMTP port (STARTTLS)
const DEFAULT_SMTP_PORT: u16 = 587;

/// Configuration for the SMTP confirmation-code mailer
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl MailerConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// confirmation is not configured and should be skipped.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        let smtp_port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_SMTP_PORT);
        let from_address = std::env::var("SMTP_FROM")
            .unwrap_or_else(|_| "noreply@tube-rewards.local".to_string());

        Some(Self {
            smtp_host,
            smtp_port,
            from_address,
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Generate a six-digit confirmation code
pub fn generate_confirmation_code() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// SMTP delivery of registration confirmation codes
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    /// Build the mailer from its configuration
    pub fn new(config: &MailerConfig) -> Result<Self> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .context("Failed to create SMTP transport")?
                .port(config.smtp_port);

        if let (Some(user), Some(password)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        let from = config
            .from_address
            .parse::<Mailbox>()
            .context("Invalid SMTP from address")?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Send a confirmation code to the given address
    pub async fn send_confirmation_code(&self, to: &str, code: &str) -> Result<()> {
        let to_mailbox = to
            .parse::<Mailbox>()
            .with_context(|| format!("Invalid recipient address: {}", to))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject("Your TubeRewards confirmation code")
            .body(format!(
                "Your registration confirmation code is: {}\n\n\
                 Enter this code in the Telegram chat to finish signing up.",
                code
            ))
            .context("Failed to build confirmation email")?;

        self.transport
            .send(email)
            .await
            .context("Failed to send confirmation email")?;

        info!(recipient = %to, "Confirmation code email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_confirmation_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_mailer_config_defaults() {
        let config = MailerConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: "noreply@tube-rewards.local".to_string(),
            smtp_user: None,
            smtp_password: None,
        };
        assert_eq!(config.smtp_port, 587);
    }
}
