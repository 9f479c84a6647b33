use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use watcher_core::{DeliveryOutcome, Item, NotificationResult, Summary};
use watcher_logging::{watcher_info, watcher_warn};

use super::{Notification, NotificationError, NotifyChannel};
use crate::retry::RetryPolicy;

/// Fans one notification out to every channel concurrently.
pub struct Dispatcher {
    channels: Vec<Arc<dyn NotifyChannel>>,
    attempt_timeout: Duration,
    retry: RetryPolicy,
}

impl Dispatcher {
    pub fn new(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            channels,
            attempt_timeout: Duration::from_secs(15),
            retry: RetryPolicy::single_retry(),
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Attempts every channel and returns one result per channel, in
    /// configuration order. Never fails as a whole.
    pub async fn dispatch(&self, item: &Item, summary: &Summary) -> Vec<NotificationResult> {
        let notification = Notification::new(item, summary);
        let deliveries = self
            .channels
            .iter()
            .map(|channel| self.deliver(channel.as_ref(), &notification));
        let results = join_all(deliveries).await;

        let delivered = results.iter().filter(|r| r.is_delivered()).count();
        watcher_info!(
            "dispatched {:?} to {}/{} channel(s)",
            notification.title,
            delivered,
            results.len()
        );
        results
    }

    async fn deliver(
        &self,
        channel: &dyn NotifyChannel,
        notification: &Notification,
    ) -> NotificationResult {
        let timeout = self.attempt_timeout;
        let label = format!("notify {}", channel.name());
        let result = self
            .retry
            .run(&label, |_| async move {
                match tokio::time::timeout(timeout, channel.send(notification)).await {
                    Ok(result) => result,
                    Err(_) => Err(NotificationError::Timeout(timeout)),
                }
            })
            .await;

        let (outcome, attempts) = match result {
            Ok(((), attempts)) => (DeliveryOutcome::Delivered, attempts),
            Err((err, attempts)) => {
                watcher_warn!("channel {} failed: {}", channel.name(), err);
                (
                    DeliveryOutcome::Failed {
                        reason: err.to_string(),
                    },
                    attempts,
                )
            }
        };
        NotificationResult {
            channel: channel.name().to_string(),
            kind: channel.kind().to_string(),
            attempts,
            outcome,
        }
    }
}
