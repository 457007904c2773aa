//! The gate-bounded availability polling loop.
//!
//! The loop never calls the feed without asking [`PollBudget`] first, so a
//! pre-exhausted gate means zero network traffic. Fetch failures only burn
//! budget; the loop keeps going until a match, the gate closing, or a stop.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use slw_browser::{AppointmentSession, CommitError, ScheduleRef};
use slw_core::{CandidateDate, DateWindow, PollOutcome, SlotListing};

use crate::action::MatchAction;
use crate::budget::PollBudget;

/// Sleep for `delay` unless the stop token fires first.
/// Returns false when the wait was cut short by a stop.
pub(crate) async fn sleep_unless_stopped(stop: &CancellationToken, delay: Duration) -> bool {
    if delay.is_zero() {
        return !stop.is_cancelled();
    }
    tokio::select! {
        _ = stop.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

/// Poll the feed until an acceptable date shows up or the budget closes.
pub async fn poll_until_match(
    session: &dyn AppointmentSession,
    schedule: &ScheduleRef,
    window: &DateWindow,
    budget: &mut PollBudget,
    interval: Duration,
    stop: &CancellationToken,
) -> PollOutcome {
    let attempts_before = budget.attempts_made();
    let mut feed_reached = false;
    while budget.should_attempt() {
        if stop.is_cancelled() {
            info!("stop requested, abandoning poll loop");
            return PollOutcome::Stopped;
        }
        budget.record_attempt();
        let listings = match session.fetch_listings(schedule).await {
            Ok(listings) => {
                feed_reached = true;
                listings
            }
            Err(err) => {
                warn!(
                    attempt = budget.attempts_made(),
                    error = %err,
                    "availability fetch failed, will retry"
                );
                if !sleep_unless_stopped(stop, interval).await {
                    return PollOutcome::Stopped;
                }
                continue;
            }
        };
        match evaluate_listings(&listings, window) {
            Verdict::Match(slot) => {
                info!(
                    attempt = budget.attempts_made(),
                    date = %slot.date,
                    "found an acceptable date"
                );
                return PollOutcome::MatchFound(slot);
            }
            Verdict::EarliestOutside(earliest) => {
                info!(
                    attempt = budget.attempts_made(),
                    earliest = %earliest,
                    window = %window,
                    "earliest available date is outside the window"
                );
            }
            Verdict::NoneOpen { closed } => {
                info!(
                    attempt = budget.attempts_made(),
                    closed = ?closed,
                    "no open dates in the feed"
                );
            }
        }
        if !sleep_unless_stopped(stop, interval).await {
            return PollOutcome::Stopped;
        }
    }
    // Only attempts made by this call count toward the transport verdict; a
    // gate spent before entry is plain exhaustion.
    if budget.attempts_made() > attempts_before && !feed_reached {
        PollOutcome::TransportError
    } else {
        PollOutcome::Exhausted
    }
}

enum Verdict {
    /// First acceptable date, in feed order.
    Match(CandidateDate),
    /// Open dates exist but all fall outside the window.
    EarliestOutside(CandidateDate),
    /// Nothing open at all; names the facilities that reported closed.
    NoneOpen { closed: Vec<String> },
}

fn evaluate_listings(listings: &[SlotListing], window: &DateWindow) -> Verdict {
    let mut earliest: Option<&CandidateDate> = None;
    let mut closed = Vec::new();
    for listing in listings {
        match listing {
            SlotListing::Open(candidate) => {
                if window.contains(candidate.date) {
                    return Verdict::Match(candidate.clone());
                }
                if earliest.is_none_or(|current| candidate.date < current.date) {
                    earliest = Some(candidate);
                }
            }
            SlotListing::NoneAvailable { location } => {
                closed.push(location.clone().unwrap_or_else(|| "unknown".to_string()));
            }
        }
    }
    match earliest {
        Some(candidate) => Verdict::EarliestOutside(candidate.clone()),
        None => Verdict::NoneOpen { closed },
    }
}

/// Outcome of driving a match action through its bounded retries.
pub(crate) enum ActionOutcome {
    Done,
    Failed(CommitError),
    Stopped,
}

/// Run the action against a found slot, retrying a bounded number of times
/// with a short pause in between. The slot does not go back into the pool:
/// either the action lands or the whole session attempt is declared failed.
pub(crate) async fn run_match_action(
    action: &dyn MatchAction,
    session: &dyn AppointmentSession,
    schedule: &ScheduleRef,
    slot: &CandidateDate,
    max_attempts: u32,
    retry_delay: Duration,
    stop: &CancellationToken,
) -> ActionOutcome {
    let attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match action.execute(session, schedule, slot).await {
            Ok(()) => return ActionOutcome::Done,
            Err(err) => {
                warn!(
                    action = action.name(),
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "match action failed"
                );
                if attempt >= attempts {
                    return ActionOutcome::Failed(err);
                }
                if !sleep_unless_stopped(stop, retry_delay).await {
                    return ActionOutcome::Stopped;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
