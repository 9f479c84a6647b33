use watcher_logging::watcher_debug;

use super::{post_json, Notification, NotificationError, NotifyChannel};
use crate::config::Secret;

/// Generic JSON webhook: `{"title", "link", "summary"}`.
pub struct WebhookChannel {
    name: String,
    url: Secret,
    bearer_token: Option<Secret>,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(
        name: impl Into<String>,
        url: Secret,
        bearer_token: Option<Secret>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            url,
            bearer_token,
            client,
        }
    }
}

#[async_trait::async_trait]
impl NotifyChannel for WebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        post_json(
            &self.client,
            self.url.expose(),
            self.bearer_token.as_ref().map(Secret::expose),
            notification,
        )
        .await?;
        watcher_debug!("webhook {} accepted {:?}", self.name, notification.title);
        Ok(())
    }
}
