//! Session orchestration for the watcher: the recovery loop, the dual-bounded
//! polling gate, and the action taken when an acceptable date appears.
//!
//! The layering is strict. [`PollBudget`] only answers "may I try again";
//! [`poll_until_match`] drives one gate-bounded polling loop over a session;
//! [`Orchestrator::run`] replaces expendable sessions until the run is
//! fulfilled or stopped. Nothing here knows about HTTP.

pub mod action;
pub mod budget;
pub mod orchestrator;
pub mod phase;
pub mod poller;

#[cfg(test)]
mod testutil;

pub use action::{DetectAction, MatchAction, RescheduleAction};
pub use budget::PollBudget;
pub use orchestrator::{Orchestrator, RunOutcome, WatchReport, WatchTuning};
pub use phase::{WatchEvent, WatchPhase};
pub use poller::poll_until_match;
