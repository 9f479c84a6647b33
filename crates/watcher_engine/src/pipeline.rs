use std::collections::VecDeque;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use watcher_core::{update, Effect, LengthBound, Msg, RunOutcome, RunReport, RunState};
use watcher_logging::{watcher_error, watcher_info, watcher_warn};

use crate::config::{ResolvedConfig, SummarizerChoice};
use crate::extract::{ExtractionError, Extractor, SelectorExtractor};
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::notify::{build_channel, Dispatcher, NotificationError};
use crate::persist::{FileStateStore, StateStore};
use crate::summarize::{
    ExtractiveSummarizer, GenerativeSummarizer, SummarizationError, Summarizer,
};

/// Notified instead of the body when the detail page has no usable text.
pub const DETAIL_PLACEHOLDER: &str = "Full text not available.";

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("extractor: {0}")]
    Extractor(#[from] ExtractionError),
    #[error("summarizer: {0}")]
    Summarizer(#[from] SummarizationError),
    #[error("channel {name}: {source}")]
    Channel {
        name: String,
        #[source]
        source: NotificationError,
    },
    #[error("http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Everything a pipeline is assembled from.
pub struct PipelineParts {
    pub listing_url: String,
    pub bound: LengthBound,
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<dyn Extractor>,
    pub store: Arc<dyn StateStore>,
    pub summarizer: Arc<dyn Summarizer>,
    pub dispatcher: Dispatcher,
}

/// Executes the effects of `watcher_core::update` for one run at a time.
///
/// Runs must not overlap: the store has a single writer only because the
/// caller awaits `run` before starting the next one.
pub struct Pipeline {
    listing_url: String,
    bound: LengthBound,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn StateStore>,
    summarizer: Arc<dyn Summarizer>,
    dispatcher: Dispatcher,
}

impl Pipeline {
    pub fn new(parts: PipelineParts) -> Self {
        Self {
            listing_url: parts.listing_url,
            bound: parts.bound,
            fetcher: parts.fetcher,
            extractor: parts.extractor,
            store: parts.store,
            summarizer: parts.summarizer,
            dispatcher: parts.dispatcher,
        }
    }

    pub fn from_config(config: ResolvedConfig) -> Result<Self, BuildError> {
        let extractor = SelectorExtractor::new(&config.extractor)?;
        let summarizer: Arc<dyn Summarizer> = match config.summarizer {
            SummarizerChoice::Extractive { min_input_words } => {
                Arc::new(ExtractiveSummarizer::new(min_input_words))
            }
            SummarizerChoice::Generative(settings) => Arc::new(GenerativeSummarizer::new(settings)?),
        };

        let client = reqwest::Client::builder()
            .timeout(config.dispatch_timeout)
            .build()?;
        let channels = config
            .channels
            .iter()
            .map(|channel| {
                build_channel(channel, &client, &config.notice_label).map_err(|source| {
                    BuildError::Channel {
                        name: channel.name.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(PipelineParts {
            listing_url: config.listing_url,
            bound: config.bound,
            fetcher: Arc::new(ReqwestFetcher::new(config.fetch)?),
            extractor: Arc::new(extractor),
            store: Arc::new(FileStateStore::new(config.state_path)),
            summarizer,
            dispatcher: Dispatcher::new(channels).with_attempt_timeout(config.dispatch_timeout),
        }))
    }

    /// One traversal from `Idle` back to `Idle`. Cancellation is observed
    /// between stages only; a stage in flight finishes or hits its own timeout.
    pub async fn run(&self, cancel: &CancellationToken) -> RunReport {
        watcher_logging::begin_run();
        let prior = self.store.load();
        watcher_info!(
            "run started; last title {:?}",
            prior.last_title.as_deref().unwrap_or("<none>")
        );

        let (mut state, effects) = update(RunState::new(self.bound), Msg::Start { state: prior });
        let mut pending: VecDeque<Effect> = effects.into();
        while let Some(effect) = pending.pop_front() {
            let msg = if cancel.is_cancelled() {
                Msg::Cancelled
            } else {
                self.execute(effect).await
            };
            let (next, effects) = update(state, msg);
            state = next;
            pending.extend(effects);
        }

        let report = state.into_report();
        log_outcome(&report);
        report
    }

    async fn execute(&self, effect: Effect) -> Msg {
        match effect {
            Effect::FetchListing => {
                let document = match self.fetcher.fetch(&self.listing_url).await {
                    Ok(document) => document,
                    Err(err) => {
                        return Msg::ListingFailed {
                            reason: err.to_string(),
                        }
                    }
                };
                match self.extractor.extract_listing(&document) {
                    Ok(item) => {
                        watcher_info!("latest item {:?} at {}", item.title(), item.link());
                        Msg::ListingExtracted(item)
                    }
                    Err(err) => Msg::ListingFailed {
                        reason: err.to_string(),
                    },
                }
            }
            Effect::CommitState { title } => match self.store.save(&title) {
                Ok(()) => Msg::StateCommitted,
                Err(err) => Msg::StateCommitFailed {
                    reason: err.to_string(),
                },
            },
            Effect::FetchDetail { link } => {
                let document = match self.fetcher.fetch(link.as_str()).await {
                    Ok(document) => document,
                    Err(err) => {
                        return Msg::DetailFailed {
                            reason: err.to_string(),
                        }
                    }
                };
                match self.extractor.extract_body(&document) {
                    Ok(body) => Msg::DetailExtracted { body },
                    Err(err) => {
                        watcher_warn!("detail extraction failed for {}: {}", link, err);
                        Msg::DetailDegraded {
                            body: DETAIL_PLACEHOLDER.to_string(),
                            reason: err.to_string(),
                        }
                    }
                }
            }
            Effect::Summarize { text, bound } => {
                match self.summarizer.summarize(&text, bound).await {
                    Ok(summary) => Msg::Summarized(summary),
                    Err(err) => {
                        watcher_warn!(
                            "{} summarizer failed: {}; sending raw text",
                            self.summarizer.name(),
                            err
                        );
                        Msg::SummarizeFailed {
                            reason: err.to_string(),
                        }
                    }
                }
            }
            Effect::Dispatch { item, summary } => {
                Msg::Dispatched(self.dispatcher.dispatch(&item, &summary).await)
            }
        }
    }
}

fn log_outcome(report: &RunReport) {
    match &report.outcome {
        RunOutcome::NoNewItem => watcher_info!("no new item"),
        RunOutcome::Delivered => {
            watcher_info!("delivered to all {} channel(s)", report.deliveries.len())
        }
        RunOutcome::PartiallyDelivered => watcher_warn!(
            "partial delivery: {} ok, {} failed",
            report.delivered_count(),
            report.failed_count()
        ),
        RunOutcome::NotDelivered => watcher_error!(
            "new item was not delivered to any of {} channel(s)",
            report.deliveries.len()
        ),
        RunOutcome::ItemDropped { reason } => watcher_error!(
            "item marked seen but never notified; detail fetch failed: {}",
            reason
        ),
        RunOutcome::Aborted { stage, reason } => {
            watcher_error!("run aborted during {:?}: {}", stage, reason)
        }
        RunOutcome::Cancelled { stage } if report.state_committed => watcher_error!(
            "run cancelled before {:?}; item marked seen but never notified",
            stage
        ),
        RunOutcome::Cancelled { stage } => watcher_warn!("run cancelled before {:?}", stage),
        RunOutcome::Pending => watcher_error!("run ended without an outcome"),
    }
    for note in &report.degradations {
        watcher_warn!("degraded: {}", note);
    }
}
