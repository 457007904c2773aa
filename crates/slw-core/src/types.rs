use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A concrete appointment date offered by the remote scheduler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDate {
    /// Calendar date of the open slot.
    pub date: NaiveDate,
    /// Facility the slot belongs to, when the feed reports one.
    pub location: Option<String>,
}

impl CandidateDate {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            location: None,
        }
    }

    pub fn at_location(date: NaiveDate, location: impl Into<String>) -> Self {
        Self {
            date,
            location: Some(location.into()),
        }
    }
}

impl std::fmt::Display for CandidateDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({})", self.date, location),
            None => write!(f, "{}", self.date),
        }
    }
}

/// One entry of the remote availability feed.
///
/// The remote reports "no appointments" as a sentinel entry rather than an
/// empty list. The parse boundary lifts that sentinel into a typed variant so
/// nothing downstream compares display strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotListing {
    /// An open slot on a concrete date.
    Open(CandidateDate),
    /// Sentinel entry: the facility reported no open slots.
    NoneAvailable { location: Option<String> },
}

impl SlotListing {
    /// Returns the candidate for an open listing, `None` for sentinels.
    pub fn open_date(&self) -> Option<&CandidateDate> {
        match self {
            Self::Open(candidate) => Some(candidate),
            Self::NoneAvailable { .. } => None,
        }
    }
}

/// Inclusive window of acceptable appointment dates.
///
/// `earliest <= latest` is a precondition enforced by config validation; the
/// window itself does not re-check it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl DateWindow {
    pub fn new(earliest: NaiveDate, latest: NaiveDate) -> Self {
        Self { earliest, latest }
    }

    /// True when `date` falls inside the window, boundaries included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.earliest <= date && date <= self.latest
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.earliest, self.latest)
    }
}

/// Terminal outcome of one gate-bounded polling loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// An acceptable date was found; polling stopped at that instant.
    MatchFound(CandidateDate),
    /// The budget ran out; listings were seen but none fell in the window.
    Exhausted,
    /// The budget ran out and not a single fetch produced a listing.
    TransportError,
    /// A stop was requested while the loop was still open.
    Stopped,
}

impl PollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MatchFound(_) => "match-found",
            Self::Exhausted => "exhausted",
            Self::TransportError => "transport-error",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal outcome of one full session attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A slot was found and the action against it succeeded.
    Committed(CandidateDate),
    /// The poll budget ran out without an acceptable date.
    Exhausted,
    /// A session step failed past its retry bound.
    SessionFailed,
    /// A stop was requested mid-attempt.
    Stopped,
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Committed(_) => "committed",
            Self::Exhausted => "exhausted",
            Self::SessionFailed => "session-failed",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output format for CLI responses
#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
