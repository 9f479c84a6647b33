//! Watcher engine: the IO side of a run.
//!
//! `watcher_core::update` decides what happens next; [`Pipeline`] performs
//! each requested effect (fetch, extract, persist, summarize, notify) and
//! feeds the outcome back as a message.
mod config;
mod decode;
mod extract;
mod fetch;
mod notify;
mod persist;
mod pipeline;
mod retry;
mod summarize;
mod types;

pub use config::{
    ChannelEntry, ConfigError, FetchConfig, ResolvedConfig, Secret, SummarizerChoice,
    SummaryConfig, SummaryStrategy, WatcherConfig,
};
pub use decode::{decode_html, DecodedHtml};
pub use extract::{ExtractionError, Extractor, ExtractorSettings, ListingSelectors, SelectorExtractor};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use notify::{
    build_channel, build_message, ChannelConfig, ChannelKind, DiscordChannel, Dispatcher,
    EmailChannel, EmailSettings, Notification, NotificationError, NotifyChannel, SmtpTls,
    WebhookChannel, DEFAULT_NOTICE_LABEL, DEFAULT_SUBJECT,
};
pub use persist::{ensure_dir, AtomicFileWriter, FileStateStore, MemoryStateStore, StateStore, StoreError};
pub use pipeline::{BuildError, Pipeline, PipelineParts, DETAIL_PLACEHOLDER};
pub use retry::{RetryPolicy, Retryable};
pub use summarize::{
    ExtractiveSummarizer, GenerativeSettings, GenerativeSummarizer, SummarizationError, Summarizer,
};
pub use types::{FailureKind, FetchError, FetchMetadata, RawDocument};
