use async_trait::async_trait;
use tracing::info;

use slw_browser::{AppointmentSession, CommitError, ScheduleRef};
use slw_core::CandidateDate;
use slw_notify::NotifySet;

/// What happens once the poller lands on an acceptable slot.
///
/// The poller owns the retry policy around `execute`; implementations do the
/// thing once and report.
#[async_trait]
pub trait MatchAction: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        session: &dyn AppointmentSession,
        schedule: &ScheduleRef,
        slot: &CandidateDate,
    ) -> Result<(), CommitError>;
}

/// Books the found slot, then fans out notifications. Sink failures are
/// logged inside the set and never turn a booked slot into a failure.
pub struct RescheduleAction {
    notifiers: NotifySet,
}

impl RescheduleAction {
    pub fn new(notifiers: NotifySet) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl MatchAction for RescheduleAction {
    fn name(&self) -> &'static str {
        "reschedule"
    }

    async fn execute(
        &self,
        session: &dyn AppointmentSession,
        schedule: &ScheduleRef,
        slot: &CandidateDate,
    ) -> Result<(), CommitError> {
        let receipt = session.commit(schedule, slot).await?;
        info!(confirmation = %receipt.message, dry_run = receipt.dry_run, "slot booked");
        self.notifiers.notify_all(slot).await;
        Ok(())
    }
}

/// Watch-only: seeing the slot is the success. Notifies and leaves the
/// booking to a human.
pub struct DetectAction {
    notifiers: NotifySet,
}

impl DetectAction {
    pub fn new(notifiers: NotifySet) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl MatchAction for DetectAction {
    fn name(&self) -> &'static str {
        "detect"
    }

    async fn execute(
        &self,
        _session: &dyn AppointmentSession,
        _schedule: &ScheduleRef,
        slot: &CandidateDate,
    ) -> Result<(), CommitError> {
        self.notifiers.notify_all(slot).await;
        Ok(())
    }
}
