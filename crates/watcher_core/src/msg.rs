use crate::{Item, NotificationResult, ProcessState, Summary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Begin a run with the state loaded from the store.
    Start { state: ProcessState },
    /// Listing fetched and its most recent entry extracted.
    ListingExtracted(Item),
    /// Listing fetch or extraction failed.
    ListingFailed { reason: String },
    /// The new title is durably stored.
    StateCommitted,
    StateCommitFailed { reason: String },
    /// Detail page fetched and its body extracted.
    DetailExtracted { body: String },
    /// Detail page fetched but the body could not be extracted; `body` is the
    /// placeholder to notify with.
    DetailDegraded { body: String, reason: String },
    /// Detail page could not be fetched.
    DetailFailed { reason: String },
    Summarized(Summary),
    SummarizeFailed { reason: String },
    /// Every configured channel was attempted.
    Dispatched(Vec<NotificationResult>),
    /// Shutdown was requested between stages.
    Cancelled,
}
