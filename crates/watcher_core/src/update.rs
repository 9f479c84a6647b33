use crate::{
    is_new, DeliveryOutcome, Effect, Msg, NotificationResult, RunOutcome, RunState, Stage,
    Summary,
};

/// Pure update function: applies a message to the run and returns the effects
/// the engine must execute next.
///
/// Messages that do not belong to the current stage are ignored. A finished
/// run ignores everything, which keeps a late message from reopening it.
pub fn update(mut state: RunState, msg: Msg) -> (RunState, Vec<Effect>) {
    let effects = match (state.stage, msg) {
        (Stage::Idle, Msg::Start { state: prior }) if !state.started => {
            state.started = true;
            state.prior = prior;
            state.stage = Stage::FetchingListing;
            vec![Effect::FetchListing]
        }
        (Stage::FetchingListing, Msg::ListingExtracted(item)) => {
            state.stage = Stage::Detecting;
            state.report.item = Some(item.clone());
            if is_new(&item, &state.prior) {
                state.stage = Stage::CommittingState;
                let title = item.title().to_string();
                state.item = Some(item);
                vec![Effect::CommitState { title }]
            } else {
                state.finish(RunOutcome::NoNewItem);
                Vec::new()
            }
        }
        (Stage::FetchingListing, Msg::ListingFailed { reason }) => {
            state.finish(RunOutcome::Aborted {
                stage: Stage::FetchingListing,
                reason,
            });
            Vec::new()
        }
        (Stage::CommittingState, Msg::StateCommitted) => {
            state.report.state_committed = true;
            match state.item.as_ref() {
                Some(item) => {
                    let link = item.link().clone();
                    state.stage = Stage::FetchingDetail;
                    vec![Effect::FetchDetail { link }]
                }
                None => abort_missing_item(&mut state),
            }
        }
        (Stage::CommittingState, Msg::StateCommitFailed { reason }) => {
            state.finish(RunOutcome::Aborted {
                stage: Stage::CommittingState,
                reason,
            });
            Vec::new()
        }
        (Stage::FetchingDetail, Msg::DetailExtracted { body }) => begin_summarizing(&mut state, body),
        (Stage::FetchingDetail, Msg::DetailDegraded { body, reason }) => {
            state
                .report
                .degradations
                .push(format!("detail extraction failed: {reason}"));
            begin_summarizing(&mut state, body)
        }
        (Stage::FetchingDetail, Msg::DetailFailed { reason }) => {
            state.finish(RunOutcome::ItemDropped { reason });
            Vec::new()
        }
        (Stage::Summarizing, Msg::Summarized(summary)) => begin_dispatching(&mut state, summary),
        (Stage::Summarizing, Msg::SummarizeFailed { reason }) => {
            state
                .report
                .degradations
                .push(format!("summarization failed: {reason}"));
            let body = state
                .item
                .as_ref()
                .and_then(|item| item.body_text())
                .unwrap_or_default();
            let summary = Summary::raw_fallback(body, state.bound);
            begin_dispatching(&mut state, summary)
        }
        (Stage::Dispatching, Msg::Dispatched(results)) => {
            let outcome = delivery_outcome(&results);
            state.report.deliveries = results;
            state.finish(outcome);
            Vec::new()
        }
        (stage, Msg::Cancelled) if state.started && stage != Stage::Idle => {
            if state.report.state_committed {
                let title = state.item.as_ref().map(|item| item.title()).unwrap_or_default();
                state.report.degradations.push(format!(
                    "cancelled after commit: {title:?} is marked seen but was not notified"
                ));
            }
            state.finish(RunOutcome::Cancelled { stage });
            Vec::new()
        }
        _ => Vec::new(),
    };

    (state, effects)
}

fn begin_summarizing(state: &mut RunState, body: String) -> Vec<Effect> {
    match state.item.take() {
        Some(item) => {
            state.item = Some(item.with_body(body.clone()));
            state.stage = Stage::Summarizing;
            vec![Effect::Summarize {
                text: body,
                bound: state.bound,
            }]
        }
        None => abort_missing_item(state),
    }
}

fn begin_dispatching(state: &mut RunState, summary: Summary) -> Vec<Effect> {
    match state.item.clone() {
        Some(item) => {
            state.report.summary_source = Some(summary.source());
            state.stage = Stage::Dispatching;
            vec![Effect::Dispatch { item, summary }]
        }
        None => abort_missing_item(state),
    }
}

fn abort_missing_item(state: &mut RunState) -> Vec<Effect> {
    let stage = state.stage;
    state.finish(RunOutcome::Aborted {
        stage,
        reason: "no item in flight".to_string(),
    });
    Vec::new()
}

fn delivery_outcome(results: &[NotificationResult]) -> RunOutcome {
    let delivered = results
        .iter()
        .filter(|r| matches!(r.outcome, DeliveryOutcome::Delivered))
        .count();
    if delivered == 0 {
        RunOutcome::NotDelivered
    } else if delivered == results.len() {
        RunOutcome::Delivered
    } else {
        RunOutcome::PartiallyDelivered
    }
}
