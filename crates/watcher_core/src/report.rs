use serde::Serialize;

use crate::{Item, Stage, SummarySource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed { reason: String },
}

/// Result of one channel's delivery attempt(s) for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationResult {
    pub channel: String,
    pub kind: String,
    pub attempts: u32,
    pub outcome: DeliveryOutcome,
}

impl NotificationResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, DeliveryOutcome::Delivered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Run has not reached `Idle` yet.
    #[default]
    Pending,
    NoNewItem,
    /// Every channel succeeded.
    Delivered,
    /// At least one channel succeeded and at least one failed.
    PartiallyDelivered,
    /// No channel succeeded (or none is configured).
    NotDelivered,
    /// State was committed but the detail page could not be fetched; the item
    /// will not be retried.
    ItemDropped { reason: String },
    Aborted { stage: Stage, reason: String },
    Cancelled { stage: Stage },
}

/// Structured account of a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub item: Option<Item>,
    pub state_committed: bool,
    pub summary_source: Option<SummarySource>,
    /// Errors that were swallowed in favour of degraded output.
    pub degradations: Vec<String>,
    pub deliveries: Vec<NotificationResult>,
}

impl RunReport {
    pub fn delivered_count(&self) -> usize {
        self.deliveries.iter().filter(|r| r.is_delivered()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.deliveries.len() - self.delivered_count()
    }

    /// True when the run ended without an abort, a dropped item or a
    /// cancellation. Partial delivery still counts as completed.
    pub fn completed(&self) -> bool {
        !matches!(
            self.outcome,
            RunOutcome::Pending
                | RunOutcome::ItemDropped { .. }
                | RunOutcome::Aborted { .. }
                | RunOutcome::Cancelled { .. }
        )
    }
}
