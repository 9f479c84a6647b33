use serde_json::json;

use super::{post_json, Notification, NotificationError, NotifyChannel};
use crate::config::Secret;

/// Discord rejects message content longer than this.
const DISCORD_CONTENT_LIMIT: usize = 2000;

pub struct DiscordChannel {
    name: String,
    webhook_url: Secret,
    label: String,
    client: reqwest::Client,
}

impl DiscordChannel {
    pub fn new(
        name: impl Into<String>,
        webhook_url: Secret,
        label: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            webhook_url,
            label: label.into(),
            client,
        }
    }

    pub fn format_content(&self, notification: &Notification) -> String {
        let content = format!(
            "📜 **{}:** {}\n🔗 {}\n\n📌 **Summary:** {}",
            self.label, notification.title, notification.link, notification.summary
        );
        watcher_core::text::truncate_chars(&content, DISCORD_CONTENT_LIMIT)
    }
}

#[async_trait::async_trait]
impl NotifyChannel for DiscordChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "discord"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let payload = json!({ "content": self.format_content(notification) });
        post_json(&self.client, self.webhook_url.expose(), None, &payload).await
    }
}
