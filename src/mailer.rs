//! Email delivery over SMTP.
//!
//! - [`Mailer`]: the delivery seam; the job only ever talks to this trait
//! - [`SmtpSettings`]: raw settings as read from the CLI/environment
//! - [`SmtpConfig`]: settings after validation
//! - [`SmtpMailer`]: STARTTLS relay with login credentials via `lettre`
//!
//! Settings are validated lazily, on the first send, so a dry run works
//! without any SMTP configuration at all.

use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_SMTP_PORT: u16 = 587;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// A fully rendered email, ready to hand to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Something that can deliver an email to the configured recipient.
pub trait Mailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), Box<dyn Error>>;
}

/// SMTP settings as supplied; any field may be missing.
#[derive(Clone, Default)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Defaults to `user` when unset.
    pub sender: Option<String>,
    pub recipient: Option<String>,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Validated SMTP settings.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub sender: String,
    pub recipient: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl SmtpSettings {
    /// Check every required setting, reporting all missing ones at once.
    ///
    /// # Errors
    ///
    /// `Missing required environment variables: SMTP_HOST, EMAIL_RECIPIENT`
    pub fn validate(&self) -> Result<SmtpConfig, Box<dyn Error>> {
        let required = [
            ("SMTP_HOST", present(&self.host)),
            ("SMTP_USER", present(&self.user)),
            ("SMTP_PASSWORD", self.password.clone().filter(|p| !p.is_empty())),
            ("EMAIL_RECIPIENT", present(&self.recipient)),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )
            .into());
        }

        let [host, user, password, recipient] = required.map(|(_, value)| value.unwrap_or_default());
        let sender = present(&self.sender).unwrap_or_else(|| user.clone());
        Ok(SmtpConfig {
            host,
            port: self.port,
            user,
            password,
            sender,
            recipient,
        })
    }
}

/// Sends through an SMTP relay using STARTTLS and login credentials.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    settings: SmtpSettings,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// Build the multipart/alternative message for `config`.
    pub fn build_message(config: &SmtpConfig, email: &OutgoingEmail) -> Result<Message, Box<dyn Error>> {
        let from: Mailbox = config.sender.parse()?;
        let to: Mailbox = config.recipient.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )?;
        Ok(message)
    }
}

impl Mailer for SmtpMailer {
    #[instrument(level = "info", skip_all, fields(subject = %email.subject))]
    async fn send(&self, email: &OutgoingEmail) -> Result<(), Box<dyn Error>> {
        let config = self.settings.validate()?;
        let message = Self::build_message(&config, email)?;

        let transport: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
                .port(config.port)
                .credentials(Credentials::new(config.user.clone(), config.password.clone()))
                .timeout(Some(SMTP_TIMEOUT))
                .build();

        transport.send(message).await?;
        info!(to = %config.recipient, host = %config.host, port = config.port, "Email sent");
        Ok(())
    }
}
