use std::time::{Duration, Instant};

use tracing::info;

/// Permission gate for polling attempts, bounded two ways at once: a fixed
/// attempt count and a wall-clock ceiling. Whichever closes first wins, and
/// a closed gate stays closed.
///
/// The gate only answers "may I?" and counts; it never sleeps and never
/// resets. Each polling session constructs a fresh one.
#[derive(Debug)]
pub struct PollBudget {
    attempts_made: u32,
    max_attempts: u32,
    started_at: Instant,
    max_duration: Duration,
}

impl PollBudget {
    /// Opens the gate and starts the wall clock. Zero bounds are legal and
    /// produce a gate that never grants an attempt.
    pub fn new(max_attempts: u32, max_duration: Duration) -> Self {
        Self {
            attempts_made: 0,
            max_attempts,
            started_at: Instant::now(),
            max_duration,
        }
    }

    /// True while both bounds still have room. Re-reads the clock on every
    /// call: time keeps passing even when the count does not move.
    pub fn should_attempt(&self) -> bool {
        self.should_attempt_at(Instant::now())
    }

    pub fn should_attempt_at(&self, now: Instant) -> bool {
        self.attempts_made < self.max_attempts && self.elapsed_at(now) < self.max_duration
    }

    /// Count an attempt and emit the progress event. Deciding whether the
    /// attempt was allowed is `should_attempt`'s job, not this one's.
    pub fn record_attempt(&mut self) {
        self.record_attempt_at(Instant::now());
    }

    pub fn record_attempt_at(&mut self, now: Instant) {
        self.attempts_made += 1;
        info!(
            attempt = self.attempts_made,
            max_attempts = self.max_attempts,
            elapsed_secs = self.elapsed_at(now).as_secs(),
            "poll attempt recorded"
        );
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }
}
