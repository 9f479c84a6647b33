use pretty_assertions::assert_eq;
use watcher_core::{
    update, DeliveryOutcome, Effect, Item, LengthBound, Msg, NotificationResult, ProcessState,
    RunOutcome, RunState, Stage, SummarySource,
};

fn init_logging() {
    watcher_logging::initialize_for_tests();
}

fn item(title: &str) -> Item {
    Item::new(title, "https://example.gov/orders/b").unwrap()
}

fn started(prior: ProcessState) -> RunState {
    let (state, effects) = update(
        RunState::new(LengthBound::Sentences(2)),
        Msg::Start { state: prior },
    );
    assert_eq!(effects, vec![Effect::FetchListing]);
    assert_eq!(state.stage(), Stage::FetchingListing);
    state
}

fn result(channel: &str, delivered: bool) -> NotificationResult {
    NotificationResult {
        channel: channel.to_string(),
        kind: "webhook".to_string(),
        attempts: 1,
        outcome: if delivered {
            DeliveryOutcome::Delivered
        } else {
            DeliveryOutcome::Failed {
                reason: "boom".to_string(),
            }
        },
    }
}

/// Drives a new item up to the dispatch effect and returns the state.
fn run_to_dispatch(prior: ProcessState, body: &str) -> (RunState, Vec<Effect>) {
    let state = started(prior);
    let (state, effects) = update(state, Msg::ListingExtracted(item("Order B")));
    assert_eq!(
        effects,
        vec![Effect::CommitState {
            title: "Order B".to_string()
        }]
    );
    let (state, effects) = update(state, Msg::StateCommitted);
    assert!(matches!(effects.as_slice(), [Effect::FetchDetail { .. }]));
    let (state, effects) = update(
        state,
        Msg::DetailExtracted {
            body: body.to_string(),
        },
    );
    assert!(matches!(effects.as_slice(), [Effect::Summarize { .. }]));
    (state, effects)
}

#[test]
fn unchanged_title_finishes_without_effects() {
    init_logging();
    let state = started(ProcessState::seen("Order A"));
    let (state, effects) = update(state, Msg::ListingExtracted(item("Order A")));

    assert!(effects.is_empty());
    assert!(state.is_finished());
    assert_eq!(state.report().outcome, RunOutcome::NoNewItem);
    assert!(!state.report().state_committed);
}

#[test]
fn new_title_commits_before_fetching_detail() {
    init_logging();
    let state = started(ProcessState::seen("Order A"));
    let (state, effects) = update(state, Msg::ListingExtracted(item("Order B")));
    assert_eq!(state.stage(), Stage::CommittingState);
    assert_eq!(
        effects,
        vec![Effect::CommitState {
            title: "Order B".to_string()
        }]
    );

    let (state, effects) = update(state, Msg::StateCommitted);
    assert_eq!(state.stage(), Stage::FetchingDetail);
    assert!(state.report().state_committed);
    assert_eq!(
        effects,
        vec![Effect::FetchDetail {
            link: item("Order B").link().clone()
        }]
    );
}

#[test]
fn first_run_treats_any_item_as_new() {
    init_logging();
    let state = started(ProcessState::empty());
    let (_, effects) = update(state, Msg::ListingExtracted(item("Anything")));
    assert!(matches!(effects.as_slice(), [Effect::CommitState { .. }]));
}

#[test]
fn listing_failure_aborts_with_state_untouched() {
    init_logging();
    let state = started(ProcessState::seen("Order A"));
    let (state, effects) = update(
        state,
        Msg::ListingFailed {
            reason: "http status 503".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(state.is_finished());
    assert_eq!(
        state.report().outcome,
        RunOutcome::Aborted {
            stage: Stage::FetchingListing,
            reason: "http status 503".to_string()
        }
    );
    assert!(!state.report().state_committed);
}

#[test]
fn commit_failure_aborts_before_detail_fetch() {
    init_logging();
    let state = started(ProcessState::empty());
    let (state, _) = update(state, Msg::ListingExtracted(item("Order B")));
    let (state, effects) = update(
        state,
        Msg::StateCommitFailed {
            reason: "disk full".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(matches!(
        state.report().outcome,
        RunOutcome::Aborted {
            stage: Stage::CommittingState,
            ..
        }
    ));
}

#[test]
fn detail_fetch_failure_drops_item_after_commit() {
    init_logging();
    let state = started(ProcessState::empty());
    let (state, _) = update(state, Msg::ListingExtracted(item("Order B")));
    let (state, _) = update(state, Msg::StateCommitted);
    let (state, effects) = update(
        state,
        Msg::DetailFailed {
            reason: "timeout".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(state.report().state_committed);
    assert_eq!(
        state.report().outcome,
        RunOutcome::ItemDropped {
            reason: "timeout".to_string()
        }
    );
    assert!(!state.report().completed());
}

#[test]
fn degraded_detail_still_reaches_summarizing() {
    init_logging();
    let state = started(ProcessState::empty());
    let (state, _) = update(state, Msg::ListingExtracted(item("Order B")));
    let (state, _) = update(state, Msg::StateCommitted);
    let (state, effects) = update(
        state,
        Msg::DetailDegraded {
            body: "Full text not available.".to_string(),
            reason: "no paragraphs".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Summarize {
            text: "Full text not available.".to_string(),
            bound: LengthBound::Sentences(2),
        }]
    );
    assert_eq!(state.report().degradations.len(), 1);
}

#[test]
fn summarizer_failure_falls_back_to_bounded_raw_body() {
    init_logging();
    let body = "One. Two. Three. Four.";
    let (state, _) = run_to_dispatch(ProcessState::empty(), body);
    let (state, effects) = update(
        state,
        Msg::SummarizeFailed {
            reason: "quota".to_string(),
        },
    );

    let summary = match effects.as_slice() {
        [Effect::Dispatch { item, summary }] => {
            assert_eq!(item.body_text(), Some(body));
            summary.clone()
        }
        other => panic!("unexpected effects: {other:?}"),
    };
    assert_eq!(summary.text(), "One. Two.");
    assert_eq!(summary.source(), SummarySource::RawFallback);
    assert_eq!(
        state.report().summary_source,
        Some(SummarySource::RawFallback)
    );
    assert_eq!(state.report().degradations, vec!["summarization failed: quota"]);
}

#[test]
fn partial_delivery_completes_the_run() {
    init_logging();
    let (state, _) = run_to_dispatch(ProcessState::empty(), "Body.");
    let (state, _) = update(
        state,
        Msg::Summarized(watcher_core::Summary::unchanged(
            "Body.",
            LengthBound::Sentences(2),
        )),
    );
    let (state, effects) = update(
        state,
        Msg::Dispatched(vec![result("ops-hook", true), result("inbox", false)]),
    );

    assert!(effects.is_empty());
    assert!(state.is_finished());
    let report = state.into_report();
    assert_eq!(report.outcome, RunOutcome::PartiallyDelivered);
    assert_eq!(report.delivered_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert!(report.completed());
}

#[test]
fn all_channels_failing_is_reported_not_rolled_back() {
    init_logging();
    let (state, _) = run_to_dispatch(ProcessState::empty(), "Body.");
    let (state, _) = update(
        state,
        Msg::Summarized(watcher_core::Summary::unchanged(
            "Body.",
            LengthBound::Sentences(2),
        )),
    );
    let (state, _) = update(state, Msg::Dispatched(vec![result("inbox", false)]));
    assert_eq!(state.report().outcome, RunOutcome::NotDelivered);
    assert!(state.report().state_committed);
}

#[test]
fn cancellation_between_stages_ends_run() {
    init_logging();
    let state = started(ProcessState::empty());
    let (state, _) = update(state, Msg::ListingExtracted(item("Order B")));
    let (state, _) = update(state, Msg::StateCommitted);
    let (state, effects) = update(state, Msg::Cancelled);
    assert!(effects.is_empty());
    assert_eq!(
        state.report().outcome,
        RunOutcome::Cancelled {
            stage: Stage::FetchingDetail
        }
    );
    assert!(state.report().state_committed);
    assert_eq!(state.report().degradations.len(), 1);
    assert!(state.report().degradations[0].contains("\"Order B\" is marked seen"));
}

#[test]
fn cancellation_before_commit_loses_nothing() {
    init_logging();
    let state = started(ProcessState::empty());
    let (state, _) = update(state, Msg::ListingExtracted(item("Order B")));
    let (state, _) = update(state, Msg::Cancelled);
    assert_eq!(
        state.report().outcome,
        RunOutcome::Cancelled {
            stage: Stage::CommittingState
        }
    );
    assert!(!state.report().state_committed);
    assert!(state.report().degradations.is_empty());
}

#[test]
fn finished_run_ignores_late_messages() {
    init_logging();
    let state = started(ProcessState::seen("Order A"));
    let (state, _) = update(state, Msg::ListingExtracted(item("Order A")));
    let (next, effects) = update(
        state.clone(),
        Msg::Start {
            state: ProcessState::empty(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state, next);
}

#[test]
fn report_serializes_to_json() {
    let state = started(ProcessState::seen("Order A"));
    let (state, _) = update(state, Msg::ListingExtracted(item("Order A")));
    let json = serde_json::to_value(state.report()).unwrap();
    assert_eq!(json["outcome"]["kind"], "no_new_item");
    assert_eq!(json["item"]["title"], "Order A");
    assert_eq!(json["item"]["link"], "https://example.gov/orders/b");
}
