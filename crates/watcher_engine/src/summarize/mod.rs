//! Pluggable summarization strategies.
//!
//! The pipeline only sees [`Summarizer`]. Every strategy honours the same
//! contract: output never exceeds the requested [`LengthBound`], and empty or
//! trivial input comes back unchanged rather than as an error.

mod extractive;
mod generative;

pub use extractive::ExtractiveSummarizer;
pub use generative::{GenerativeSettings, GenerativeSummarizer};

use watcher_core::text::word_count;
use watcher_core::{LengthBound, Summary};

use crate::retry::Retryable;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SummarizationError {
    #[error("summarizer backend unavailable: {0}")]
    Transient(String),
    #[error("summarizer backend rejected the request: {0}")]
    Permanent(String),
}

impl Retryable for SummarizationError {
    fn is_transient(&self) -> bool {
        matches!(self, SummarizationError::Transient(_))
    }
}

#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn summarize(&self, text: &str, bound: LengthBound)
        -> Result<Summary, SummarizationError>;
}

/// Input too small to be worth summarizing.
pub(crate) fn is_trivial(text: &str, min_input_words: usize) -> bool {
    text.trim().is_empty() || word_count(text) < min_input_words
}

/// Returns the passthrough summary for trivial input, or input that already
/// fits the bound.
pub(crate) fn passthrough(text: &str, bound: LengthBound, min_input_words: usize) -> Option<Summary> {
    if is_trivial(text, min_input_words) || bound.fits(text) {
        Some(Summary::unchanged(text, bound))
    } else {
        None
    }
}
