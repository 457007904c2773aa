/// Lifecycle of a single session attempt.
///
/// ```text
/// Init -> LoggedIn -> OnSchedulePage -> Polling -> Committed
///                                               -> Exhausted
/// Init | LoggedIn | Polling -> SessionFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    Init,
    LoggedIn,
    OnSchedulePage,
    Polling,
    Committed,
    Exhausted,
    SessionFailed,
}

/// Events that move a session attempt between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    LoginSucceeded,
    SchedulePageOpened,
    PollingStarted,
    CommitConfirmed,
    BudgetExhausted,
    StepFailed,
}

impl WatchPhase {
    /// Attempt a transition. Returns the next phase, or an error describing
    /// the invalid move.
    pub fn transition(&self, event: WatchEvent) -> Result<WatchPhase, String> {
        use WatchEvent::*;
        use WatchPhase::*;

        match (self, event) {
            (Init, LoginSucceeded) => Ok(LoggedIn),
            (LoggedIn, SchedulePageOpened) => Ok(OnSchedulePage),
            (OnSchedulePage, PollingStarted) => Ok(Polling),
            (Polling, CommitConfirmed) => Ok(Committed),
            (Polling, BudgetExhausted) => Ok(Exhausted),
            (Init | LoggedIn | Polling, StepFailed) => Ok(SessionFailed),
            (phase, event) => Err(format!("invalid transition: {phase:?} on {event:?}")),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WatchPhase::Committed | WatchPhase::Exhausted | WatchPhase::SessionFailed
        )
    }
}

impl std::fmt::Display for WatchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WatchPhase::Init => "init",
            WatchPhase::LoggedIn => "logged-in",
            WatchPhase::OnSchedulePage => "on-schedule-page",
            WatchPhase::Polling => "polling",
            WatchPhase::Committed => "committed",
            WatchPhase::Exhausted => "exhausted",
            WatchPhase::SessionFailed => "session-failed",
        };
        write!(f, "{name}")
    }
}
