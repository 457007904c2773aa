use async_trait::async_trait;

use slw_core::{CandidateDate, SlotListing};

use crate::error::{AuthError, CommitError, FetchError, NavigationError, OpenError};

/// The scheduling resource a session operates on, resolved during navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleRef {
    /// Numeric schedule id as it appears in the service's URLs.
    pub id: String,
}

impl ScheduleRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl std::fmt::Display for ScheduleRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "schedule/{}", self.id)
    }
}

/// Proof that a commit went through (or was skipped in dry-run mode).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Confirmation line taken from the service response.
    pub message: String,
    pub dry_run: bool,
}

/// One authenticated conversation with the scheduling service.
///
/// Steps are ordered: `login` before `open_schedule_page` before the rest.
/// Every method may fail transiently; callers own the retry policy.
#[async_trait]
pub trait AppointmentSession: Send + Sync {
    /// Confirm the remote still accepts this session's identity.
    async fn login(&self) -> Result<(), AuthError>;

    /// Resolve the schedule this session will poll.
    async fn open_schedule_page(&self) -> Result<ScheduleRef, NavigationError>;

    /// Fetch the current availability feed, sentinels included.
    async fn fetch_listings(&self, schedule: &ScheduleRef)
    -> Result<Vec<SlotListing>, FetchError>;

    /// Book the slot and confirm the service acknowledged it.
    async fn commit(
        &self,
        schedule: &ScheduleRef,
        slot: &CandidateDate,
    ) -> Result<CommitReceipt, CommitError>;

    /// Release whatever the session holds. Always safe to call once.
    async fn close(&self);
}

/// Produces fresh sessions; one per recovery cycle.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn AppointmentSession>, OpenError>;
}
