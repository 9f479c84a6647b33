//! Notification channels and the fan-out dispatcher.
//!
//! Each channel is independent: a failing webhook never delays the email, and
//! the dispatcher reports one [`NotificationResult`] per configured channel.
//!
//! [`NotificationResult`]: watcher_core::NotificationResult

mod discord;
mod dispatcher;
mod email;
mod webhook;

pub use discord::DiscordChannel;
pub use dispatcher::Dispatcher;
pub use email::{build_message, EmailChannel, EmailSettings, SmtpTls, DEFAULT_SUBJECT};
pub use webhook::WebhookChannel;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use watcher_core::{Item, Summary};

use crate::config::Secret;
use crate::retry::Retryable;

/// Used when no label is configured.
pub const DEFAULT_NOTICE_LABEL: &str = "New Executive Order";

/// What every channel delivers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub link: String,
    pub summary: String,
}

impl Notification {
    pub fn new(item: &Item, summary: &Summary) -> Self {
        Self {
            title: item.title().to_string(),
            link: item.link().to_string(),
            summary: summary.text().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("transient delivery failure: {0}")]
    Transient(String),
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
}

impl Retryable for NotificationError {
    fn is_transient(&self) -> bool {
        !matches!(self, NotificationError::Permanent(_))
    }
}

#[async_trait::async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Configured name, unique per run.
    fn name(&self) -> &str;

    fn kind(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// A delivery target with its resolved endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub name: String,
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelKind {
    Webhook {
        url: Secret,
        bearer_token: Option<Secret>,
    },
    Discord {
        webhook_url: Secret,
    },
    Email(EmailSettings),
}

/// Builds the channel described by `config`. HTTP channels share `client`.
pub fn build_channel(
    config: &ChannelConfig,
    client: &reqwest::Client,
    label: &str,
) -> Result<Arc<dyn NotifyChannel>, NotificationError> {
    let channel: Arc<dyn NotifyChannel> = match &config.kind {
        ChannelKind::Webhook { url, bearer_token } => Arc::new(WebhookChannel::new(
            &config.name,
            url.clone(),
            bearer_token.clone(),
            client.clone(),
        )),
        ChannelKind::Discord { webhook_url } => Arc::new(DiscordChannel::new(
            &config.name,
            webhook_url.clone(),
            label,
            client.clone(),
        )),
        ChannelKind::Email(settings) => Arc::new(EmailChannel::new(&config.name, settings.clone())?),
    };
    Ok(channel)
}

pub(crate) fn classify_status(status: reqwest::StatusCode, detail: &str) -> NotificationError {
    let message = format!("{status}: {}", detail.trim());
    let code = status.as_u16();
    if code == 408 || code == 429 || status.is_server_error() {
        NotificationError::Transient(message)
    } else {
        NotificationError::Permanent(message)
    }
}

pub(crate) fn classify_reqwest(err: reqwest::Error) -> NotificationError {
    if err.is_builder() {
        NotificationError::Permanent(err.to_string())
    } else {
        NotificationError::Transient(err.to_string())
    }
}

/// POST `payload` as JSON and map the response onto a delivery result.
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    bearer_token: Option<&str>,
    payload: &T,
) -> Result<(), NotificationError> {
    let mut request = client.post(url).json(payload);
    if let Some(token) = bearer_token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await.map_err(classify_reqwest)?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let detail = response.text().await.unwrap_or_default();
    Err(classify_status(status, &detail))
}
