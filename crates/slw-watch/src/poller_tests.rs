use super::*;

use std::sync::atomic::Ordering;

use chrono::NaiveDate;

use slw_notify::NotifySet;

use crate::action::{DetectAction, RescheduleAction};
use crate::testutil::{FetchStep, ScriptedSession};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn feb_window() -> DateWindow {
    DateWindow::new(date(2026, 2, 1), date(2026, 2, 28))
}

fn open(y: i32, m: u32, d: u32) -> SlotListing {
    SlotListing::Open(CandidateDate::new(date(y, m, d)))
}

fn sentinel(location: &str) -> SlotListing {
    SlotListing::NoneAvailable {
        location: Some(location.to_string()),
    }
}

fn calls(session: &ScriptedSession) -> u32 {
    session.fetch_calls.load(Ordering::SeqCst)
}

async fn poll(
    session: &ScriptedSession,
    budget: &mut PollBudget,
    stop: &CancellationToken,
) -> PollOutcome {
    poll_until_match(
        session,
        &ScheduleRef::new("42"),
        &feb_window(),
        budget,
        Duration::ZERO,
        stop,
    )
    .await
}

#[tokio::test]
async fn first_acceptable_date_wins_in_feed_order() {
    let session = ScriptedSession::new().script_fetches(vec![FetchStep::Feed(vec![
        open(2026, 3, 5),
        open(2026, 2, 14),
        open(2026, 2, 2),
    ])]);
    let mut budget = PollBudget::new(10, Duration::from_secs(60));

    let outcome = poll(&session, &mut budget, &CancellationToken::new()).await;

    assert_eq!(
        outcome,
        PollOutcome::MatchFound(CandidateDate::new(date(2026, 2, 14)))
    );
    assert_eq!(calls(&session), 1);
    assert_eq!(budget.attempts_made(), 1);
}

#[tokio::test]
async fn keeps_polling_past_unacceptable_feeds() {
    let session = ScriptedSession::new().script_fetches(vec![
        FetchStep::Feed(vec![]),
        FetchStep::Feed(vec![open(2026, 5, 1)]),
        FetchStep::Feed(vec![open(2026, 2, 20)]),
    ]);
    let mut budget = PollBudget::new(10, Duration::from_secs(60));

    let outcome = poll(&session, &mut budget, &CancellationToken::new()).await;

    assert_eq!(
        outcome,
        PollOutcome::MatchFound(CandidateDate::new(date(2026, 2, 20)))
    );
    assert_eq!(calls(&session), 3);
}

#[tokio::test]
async fn sentinel_entries_never_match() {
    let session = ScriptedSession::new().script_fetches(vec![
        FetchStep::Feed(vec![sentinel("Ottawa"), sentinel("Calgary")]),
        FetchStep::Feed(vec![open(2026, 2, 14)]),
    ]);
    let mut budget = PollBudget::new(10, Duration::from_secs(60));

    let outcome = poll(&session, &mut budget, &CancellationToken::new()).await;

    assert_eq!(
        outcome,
        PollOutcome::MatchFound(CandidateDate::new(date(2026, 2, 14)))
    );
    assert_eq!(calls(&session), 2);
}

#[tokio::test]
async fn a_fetch_error_then_a_match_still_lands() {
    let session = ScriptedSession::new().script_fetches(vec![
        FetchStep::Fail,
        FetchStep::Feed(vec![open(2026, 2, 14)]),
    ]);
    let mut budget = PollBudget::new(5, Duration::from_secs(60));

    let outcome = poll(&session, &mut budget, &CancellationToken::new()).await;

    assert_eq!(
        outcome,
        PollOutcome::MatchFound(CandidateDate::new(date(2026, 2, 14)))
    );
    assert_eq!(budget.attempts_made(), 2);
}

#[tokio::test]
async fn outside_window_feeds_exhaust_the_budget() {
    let session = ScriptedSession::new().script_fetches(vec![
        FetchStep::Feed(vec![open(2027, 1, 1)]),
        FetchStep::Feed(vec![open(2027, 1, 1)]),
        FetchStep::Feed(vec![open(2027, 1, 1)]),
    ]);
    let mut budget = PollBudget::new(3, Duration::from_secs(60));

    let outcome = poll(&session, &mut budget, &CancellationToken::new()).await;

    assert_eq!(outcome, PollOutcome::Exhausted);
    assert_eq!(budget.attempts_made(), 3);
}

#[tokio::test]
async fn exhausts_when_no_feed_ever_matches() {
    let session = ScriptedSession::new();
    let mut budget = PollBudget::new(3, Duration::from_secs(60));

    let outcome = poll(&session, &mut budget, &CancellationToken::new()).await;

    assert_eq!(outcome, PollOutcome::Exhausted);
    assert_eq!(calls(&session), 3);
    assert_eq!(budget.attempts_made(), 3);
}

#[tokio::test]
async fn all_fetches_failing_is_a_transport_error() {
    let session = ScriptedSession::new().script_fetches(vec![
        FetchStep::Fail,
        FetchStep::Fail,
        FetchStep::Fail,
    ]);
    let mut budget = PollBudget::new(3, Duration::from_secs(60));

    let outcome = poll(&session, &mut budget, &CancellationToken::new()).await;

    assert_eq!(outcome, PollOutcome::TransportError);
    assert_eq!(calls(&session), 3);
}

#[tokio::test]
async fn one_good_fetch_downgrades_transport_error_to_exhausted() {
    let session = ScriptedSession::new()
        .script_fetches(vec![FetchStep::Fail, FetchStep::Feed(vec![])]);
    let mut budget = PollBudget::new(2, Duration::from_secs(60));

    let outcome = poll(&session, &mut budget, &CancellationToken::new()).await;

    assert_eq!(outcome, PollOutcome::Exhausted);
}

#[tokio::test]
async fn pre_exhausted_gate_means_zero_traffic() {
    let session = ScriptedSession::new();
    let mut budget = PollBudget::new(0, Duration::from_secs(60));

    let outcome = poll(&session, &mut budget, &CancellationToken::new()).await;

    assert_eq!(outcome, PollOutcome::Exhausted);
    assert_eq!(calls(&session), 0);
}

#[tokio::test]
async fn a_gate_spent_before_the_call_still_means_exhausted() {
    let session = ScriptedSession::new().script_fetches(vec![FetchStep::Fail]);
    let mut budget = PollBudget::new(2, Duration::from_secs(60));
    budget.record_attempt();
    budget.record_attempt();

    let outcome = poll(&session, &mut budget, &CancellationToken::new()).await;

    assert_eq!(outcome, PollOutcome::Exhausted);
    assert_eq!(calls(&session), 0);
}

#[tokio::test]
async fn cancelled_token_stops_before_the_first_fetch() {
    let session = ScriptedSession::new();
    let mut budget = PollBudget::new(10, Duration::from_secs(60));
    let stop = CancellationToken::new();
    stop.cancel();

    let outcome = poll(&session, &mut budget, &stop).await;

    assert_eq!(outcome, PollOutcome::Stopped);
    assert_eq!(calls(&session), 0);
}

#[tokio::test]
async fn stop_during_the_interval_wait_cuts_the_loop() {
    let session = ScriptedSession::new();
    let mut budget = PollBudget::new(10, Duration::from_secs(60));
    let stop = CancellationToken::new();
    let canceller = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let outcome = poll_until_match(
        &session,
        &ScheduleRef::new("42"),
        &feb_window(),
        &mut budget,
        Duration::from_secs(30),
        &stop,
    )
    .await;

    assert_eq!(outcome, PollOutcome::Stopped);
    assert_eq!(calls(&session), 1);
}

#[tokio::test]
async fn sleep_unless_stopped_handles_zero_delay() {
    let stop = CancellationToken::new();
    assert!(sleep_unless_stopped(&stop, Duration::ZERO).await);
    stop.cancel();
    assert!(!sleep_unless_stopped(&stop, Duration::ZERO).await);
}

#[test]
fn evaluation_prefers_feed_order_over_date_order() {
    let listings = vec![open(2026, 2, 20), open(2026, 2, 2)];
    match evaluate_listings(&listings, &feb_window()) {
        Verdict::Match(slot) => assert_eq!(slot.date, date(2026, 2, 20)),
        _ => panic!("expected a match"),
    }
}

#[test]
fn evaluation_reports_the_earliest_outside_date() {
    let listings = vec![open(2026, 6, 1), open(2026, 4, 10), open(2026, 5, 5)];
    match evaluate_listings(&listings, &feb_window()) {
        Verdict::EarliestOutside(slot) => assert_eq!(slot.date, date(2026, 4, 10)),
        _ => panic!("expected earliest-outside"),
    }
}

#[test]
fn evaluation_collects_closed_facilities() {
    let listings = vec![
        sentinel("Ottawa"),
        SlotListing::NoneAvailable { location: None },
    ];
    match evaluate_listings(&listings, &feb_window()) {
        Verdict::NoneOpen { closed } => {
            assert_eq!(closed, vec!["Ottawa".to_string(), "unknown".to_string()]);
        }
        _ => panic!("expected none-open"),
    }
}

#[test]
fn evaluation_of_an_empty_feed_is_none_open() {
    match evaluate_listings(&[], &feb_window()) {
        Verdict::NoneOpen { closed } => assert!(closed.is_empty()),
        _ => panic!("expected none-open"),
    }
}

#[tokio::test]
async fn match_action_lands_on_the_first_try() {
    let session = ScriptedSession::new();
    let action = RescheduleAction::new(NotifySet::new(vec![]));
    let slot = CandidateDate::new(date(2026, 2, 14));

    let outcome = run_match_action(
        &action,
        &session,
        &ScheduleRef::new("42"),
        &slot,
        3,
        Duration::ZERO,
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(outcome, ActionOutcome::Done));
    assert_eq!(session.commit_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn match_action_retries_then_lands() {
    let session = ScriptedSession::new().script_commits(&[false, true]);
    let action = RescheduleAction::new(NotifySet::new(vec![]));
    let slot = CandidateDate::new(date(2026, 2, 14));

    let outcome = run_match_action(
        &action,
        &session,
        &ScheduleRef::new("42"),
        &slot,
        3,
        Duration::ZERO,
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(outcome, ActionOutcome::Done));
    assert_eq!(session.commit_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn match_action_gives_up_after_the_bound() {
    let session = ScriptedSession::new().script_commits(&[false, false, false]);
    let action = RescheduleAction::new(NotifySet::new(vec![]));
    let slot = CandidateDate::new(date(2026, 2, 14));

    let outcome = run_match_action(
        &action,
        &session,
        &ScheduleRef::new("42"),
        &slot,
        3,
        Duration::ZERO,
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(outcome, ActionOutcome::Failed(_)));
    assert_eq!(session.commit_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn zero_action_attempts_still_tries_once() {
    let session = ScriptedSession::new().script_commits(&[false]);
    let action = RescheduleAction::new(NotifySet::new(vec![]));
    let slot = CandidateDate::new(date(2026, 2, 14));

    let outcome = run_match_action(
        &action,
        &session,
        &ScheduleRef::new("42"),
        &slot,
        0,
        Duration::ZERO,
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(outcome, ActionOutcome::Failed(_)));
    assert_eq!(session.commit_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn detect_action_never_touches_commit() {
    let session = ScriptedSession::new();
    let action = DetectAction::new(NotifySet::new(vec![]));
    let slot = CandidateDate::new(date(2026, 2, 14));

    let outcome = run_match_action(
        &action,
        &session,
        &ScheduleRef::new("42"),
        &slot,
        3,
        Duration::ZERO,
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(outcome, ActionOutcome::Done));
    assert_eq!(session.commit_calls.load(Ordering::SeqCst), 0);
}
