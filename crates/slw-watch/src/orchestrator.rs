//! The outer recovery loop.
//!
//! Sessions are expendable. A session that fails its steps past the bound,
//! or polls its whole budget without a match, is closed and replaced after a
//! delay; the loop itself only ends when a slot is handled or a stop is
//! requested.

use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use ulid::Ulid;

use slw_browser::{AppointmentSession, SessionFactory};
use slw_config::WatchConfig;
use slw_core::{CandidateDate, DateWindow, PollOutcome, SessionOutcome};

use crate::action::MatchAction;
use crate::budget::PollBudget;
use crate::phase::{WatchEvent, WatchPhase};
use crate::poller::{self, ActionOutcome, sleep_unless_stopped};

/// Every knob the orchestrator needs, lifted out of the config so tests can
/// build tiny ones directly.
#[derive(Clone, Debug)]
pub struct WatchTuning {
    pub window: DateWindow,
    pub poll_max_attempts: u32,
    pub poll_max_duration: Duration,
    pub poll_interval: Duration,
    pub max_session_failures: u32,
    pub step_retry_delay: Duration,
    pub restart_delay: Duration,
    pub commit_attempts: u32,
    pub commit_retry_delay: Duration,
    pub success_cooldown: Duration,
}

impl WatchTuning {
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            window: config.poll.window(),
            poll_max_attempts: config.poll.max_attempts,
            poll_max_duration: config.poll.max_duration(),
            poll_interval: config.poll.interval(),
            max_session_failures: config.recovery.max_session_failures,
            step_retry_delay: config.recovery.step_retry_delay(),
            restart_delay: config.recovery.restart_delay(),
            commit_attempts: config.recovery.commit_attempts,
            commit_retry_delay: config.recovery.commit_retry_delay(),
            success_cooldown: config.recovery.success_cooldown(),
        }
    }
}

/// How a watch run ended.
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The action landed on this slot.
    Fulfilled { slot: CandidateDate },
    /// A stop was requested before any slot was handled.
    Stopped,
}

/// Final report of a watch run.
#[derive(Debug, Serialize)]
pub struct WatchReport {
    pub sessions_attempted: u32,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

pub struct Orchestrator {
    factory: Box<dyn SessionFactory>,
    action: Box<dyn MatchAction>,
    tuning: WatchTuning,
    stop: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        factory: Box<dyn SessionFactory>,
        action: Box<dyn MatchAction>,
        tuning: WatchTuning,
        stop: CancellationToken,
    ) -> Self {
        Self {
            factory,
            action,
            tuning,
            stop,
        }
    }

    /// Run session attempts until one is fulfilled or a stop is requested.
    /// There is no attempt limit at this level; only the stop token ends an
    /// unfulfilled run.
    pub async fn run(&self) -> WatchReport {
        let mut sessions_attempted = 0u32;
        loop {
            if self.stop.is_cancelled() {
                info!("stop requested, shutting down");
                return WatchReport {
                    sessions_attempted,
                    outcome: RunOutcome::Stopped,
                };
            }
            sessions_attempted += 1;
            let attempt_id = Ulid::new();
            info!(
                session = %attempt_id,
                ordinal = sessions_attempted,
                action = self.action.name(),
                "starting session attempt"
            );
            let session = match self.factory.open().await {
                Ok(session) => session,
                Err(err) => {
                    warn!(session = %attempt_id, error = %err, "could not open a session");
                    if !sleep_unless_stopped(&self.stop, self.tuning.restart_delay).await {
                        return WatchReport {
                            sessions_attempted,
                            outcome: RunOutcome::Stopped,
                        };
                    }
                    continue;
                }
            };
            let outcome = self.run_one_attempt(session.as_ref()).await;
            info!(session = %attempt_id, outcome = %outcome, "session attempt finished");
            match outcome {
                SessionOutcome::Committed(slot) => {
                    // The session stays open through the cooldown so the
                    // remote sees the settled state before teardown.
                    sleep_unless_stopped(&self.stop, self.tuning.success_cooldown).await;
                    session.close().await;
                    return WatchReport {
                        sessions_attempted,
                        outcome: RunOutcome::Fulfilled { slot },
                    };
                }
                SessionOutcome::Stopped => {
                    session.close().await;
                    return WatchReport {
                        sessions_attempted,
                        outcome: RunOutcome::Stopped,
                    };
                }
                SessionOutcome::Exhausted | SessionOutcome::SessionFailed => {
                    session.close().await;
                    if !sleep_unless_stopped(&self.stop, self.tuning.restart_delay).await {
                        return WatchReport {
                            sessions_attempted,
                            outcome: RunOutcome::Stopped,
                        };
                    }
                }
            }
        }
    }

    /// Drive one session from login to a terminal outcome. Login and
    /// navigation retries share a single failure budget; polling has its own
    /// gate.
    async fn run_one_attempt(&self, session: &dyn AppointmentSession) -> SessionOutcome {
        let mut phase = WatchPhase::Init;
        let mut step_failures = 0u32;

        loop {
            match session.login().await {
                Ok(()) => {
                    advance(&mut phase, WatchEvent::LoginSucceeded);
                    break;
                }
                Err(err) => {
                    step_failures += 1;
                    warn!(
                        failures = step_failures,
                        max_failures = self.tuning.max_session_failures,
                        error = %err,
                        "login failed"
                    );
                    if step_failures >= self.tuning.max_session_failures {
                        advance(&mut phase, WatchEvent::StepFailed);
                        return SessionOutcome::SessionFailed;
                    }
                    if !sleep_unless_stopped(&self.stop, self.tuning.step_retry_delay).await {
                        return SessionOutcome::Stopped;
                    }
                }
            }
        }

        let schedule = loop {
            match session.open_schedule_page().await {
                Ok(schedule) => {
                    advance(&mut phase, WatchEvent::SchedulePageOpened);
                    break schedule;
                }
                Err(err) => {
                    step_failures += 1;
                    warn!(
                        failures = step_failures,
                        max_failures = self.tuning.max_session_failures,
                        error = %err,
                        "schedule navigation failed"
                    );
                    if step_failures >= self.tuning.max_session_failures {
                        advance(&mut phase, WatchEvent::StepFailed);
                        return SessionOutcome::SessionFailed;
                    }
                    if !sleep_unless_stopped(&self.stop, self.tuning.step_retry_delay).await {
                        return SessionOutcome::Stopped;
                    }
                }
            }
        };

        advance(&mut phase, WatchEvent::PollingStarted);
        info!(schedule = %schedule, window = %self.tuning.window, "polling for an acceptable date");
        let mut budget = PollBudget::new(
            self.tuning.poll_max_attempts,
            self.tuning.poll_max_duration,
        );
        let poll_outcome = poller::poll_until_match(
            session,
            &schedule,
            &self.tuning.window,
            &mut budget,
            self.tuning.poll_interval,
            &self.stop,
        )
        .await;
        match poll_outcome {
            PollOutcome::MatchFound(slot) => {
                let action_outcome = poller::run_match_action(
                    self.action.as_ref(),
                    session,
                    &schedule,
                    &slot,
                    self.tuning.commit_attempts,
                    self.tuning.commit_retry_delay,
                    &self.stop,
                )
                .await;
                match action_outcome {
                    ActionOutcome::Done => {
                        advance(&mut phase, WatchEvent::CommitConfirmed);
                        SessionOutcome::Committed(slot)
                    }
                    ActionOutcome::Failed(err) => {
                        warn!(date = %slot.date, error = %err, "giving up on this slot");
                        advance(&mut phase, WatchEvent::StepFailed);
                        SessionOutcome::SessionFailed
                    }
                    ActionOutcome::Stopped => SessionOutcome::Stopped,
                }
            }
            PollOutcome::Exhausted => {
                advance(&mut phase, WatchEvent::BudgetExhausted);
                info!(
                    attempts = budget.attempts_made(),
                    elapsed_secs = budget.elapsed().as_secs(),
                    "poll budget exhausted without a match"
                );
                SessionOutcome::Exhausted
            }
            PollOutcome::TransportError => {
                advance(&mut phase, WatchEvent::StepFailed);
                warn!(
                    attempts = budget.attempts_made(),
                    "feed never answered, treating the session as dead"
                );
                SessionOutcome::SessionFailed
            }
            PollOutcome::Stopped => SessionOutcome::Stopped,
        }
    }
}

fn advance(phase: &mut WatchPhase, event: WatchEvent) {
    match phase.transition(event) {
        Ok(next) => {
            debug!(from = %phase, to = %next, "phase transition");
            *phase = next;
        }
        Err(reason) => warn!(%reason, "phase transition rejected"),
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
