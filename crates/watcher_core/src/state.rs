use serde::Serialize;

use crate::{Item, LengthBound, RunOutcome, RunReport};

/// What the store remembers between runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProcessState {
    pub last_title: Option<String>,
}

impl ProcessState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn seen(title: impl Into<String>) -> Self {
        Self {
            last_title: Some(title.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    FetchingListing,
    Detecting,
    CommittingState,
    FetchingDetail,
    Summarizing,
    Dispatching,
}

/// In-flight state of one run. Only `update` moves it forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub(crate) stage: Stage,
    pub(crate) started: bool,
    pub(crate) prior: ProcessState,
    pub(crate) item: Option<Item>,
    pub(crate) bound: LengthBound,
    pub(crate) report: RunReport,
}

impl RunState {
    pub fn new(bound: LengthBound) -> Self {
        Self {
            stage: Stage::Idle,
            started: false,
            prior: ProcessState::empty(),
            item: None,
            bound,
            report: RunReport::default(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// True once the run has started and returned to `Idle`.
    pub fn is_finished(&self) -> bool {
        self.started && self.stage == Stage::Idle
    }

    pub fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn into_report(self) -> RunReport {
        self.report
    }

    pub(crate) fn finish(&mut self, outcome: RunOutcome) {
        self.stage = Stage::Idle;
        self.report.outcome = outcome;
    }
}
