use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use watcher_logging::watcher_info;

use super::{Notification, NotificationError, NotifyChannel};
use crate::config::Secret;

pub const DEFAULT_SUBJECT: &str = "New Executive Order Signed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SmtpTls {
    /// TLS from the first byte, usually port 465.
    #[default]
    Implicit,
    /// Plain connection upgraded with STARTTLS, usually port 587.
    StartTls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub tls: SmtpTls,
    pub username: Secret,
    pub password: Secret,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub timeout: Duration,
}

/// Plain-text message with title, link and summary.
pub fn build_message(
    settings: &EmailSettings,
    notification: &Notification,
) -> Result<Message, NotificationError> {
    let from: Mailbox = settings
        .from
        .parse()
        .map_err(|err| NotificationError::Permanent(format!("invalid from address: {err}")))?;

    let mut builder = Message::builder().from(from).subject(settings.subject.clone());
    for recipient in &settings.to {
        let to: Mailbox = recipient.parse().map_err(|err| {
            NotificationError::Permanent(format!("invalid recipient {recipient:?}: {err}"))
        })?;
        builder = builder.to(to);
    }

    let body = format!(
        "{}\nRead more: {}\n\nSummary:\n{}\n",
        notification.title, notification.link, notification.summary
    );
    builder
        .header(ContentType::TEXT_PLAIN)
        .body(body)
        .map_err(|err| NotificationError::Permanent(format!("failed to build email: {err}")))
}

pub struct EmailChannel {
    name: String,
    settings: EmailSettings,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailChannel {
    pub fn new(name: impl Into<String>, settings: EmailSettings) -> Result<Self, NotificationError> {
        let relay = match settings.tls {
            SmtpTls::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host),
            SmtpTls::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
            }
        }
        .map_err(|err| NotificationError::Permanent(format!("invalid smtp relay: {err}")))?;

        let creds = Credentials::new(
            settings.username.expose().to_string(),
            settings.password.expose().to_string(),
        );
        let mailer = relay
            .port(settings.smtp_port)
            .credentials(creds)
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self {
            name: name.into(),
            settings,
            mailer,
        })
    }
}

#[async_trait::async_trait]
impl NotifyChannel for EmailChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "email"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let message = build_message(&self.settings, notification)?;
        self.mailer.send(message).await.map_err(|err| {
            if err.is_permanent() {
                NotificationError::Permanent(err.to_string())
            } else {
                NotificationError::Transient(err.to_string())
            }
        })?;
        watcher_info!(
            "email {} sent to {} recipient(s)",
            self.name,
            self.settings.to.len()
        );
        Ok(())
    }
}
