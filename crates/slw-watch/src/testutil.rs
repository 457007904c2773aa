//! Scripted session doubles for orchestration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use slw_browser::{
    AppointmentSession, AuthError, CommitError, CommitReceipt, FetchError, NavigationError,
    OpenError, ScheduleRef, SessionFactory,
};
use slw_core::{CandidateDate, SlotListing};
use slw_notify::Notifier;

/// One scripted fetch response.
pub(crate) enum FetchStep {
    Feed(Vec<SlotListing>),
    Fail,
}

/// A session whose step results are played back from per-step queues.
///
/// Empty queues fall back to benign defaults (login ok, schedule "42",
/// empty feed, commit ok), so tests only script the interesting prefix.
#[derive(Default)]
pub(crate) struct ScriptedSession {
    login_script: Mutex<VecDeque<bool>>,
    open_script: Mutex<VecDeque<bool>>,
    fetch_script: Mutex<VecDeque<FetchStep>>,
    commit_script: Mutex<VecDeque<bool>>,
    pub login_calls: AtomicU32,
    pub open_calls: AtomicU32,
    pub fetch_calls: AtomicU32,
    pub commit_calls: AtomicU32,
    pub closed: AtomicBool,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` entries succeed, `false` entries fail with a stale-session error.
    pub fn script_logins(self, results: &[bool]) -> Self {
        self.login_script.lock().unwrap().extend(results.iter().copied());
        self
    }

    pub fn script_opens(self, results: &[bool]) -> Self {
        self.open_script.lock().unwrap().extend(results.iter().copied());
        self
    }

    pub fn script_fetches(self, steps: Vec<FetchStep>) -> Self {
        self.fetch_script.lock().unwrap().extend(steps);
        self
    }

    pub fn script_commits(self, results: &[bool]) -> Self {
        self.commit_script.lock().unwrap().extend(results.iter().copied());
        self
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppointmentSession for ScriptedSession {
    async fn login(&self) -> Result<(), AuthError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        match self.login_script.lock().unwrap().pop_front() {
            Some(false) => Err(AuthError::SessionRejected { status: 401 }),
            _ => Ok(()),
        }
    }

    async fn open_schedule_page(&self) -> Result<ScheduleRef, NavigationError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        match self.open_script.lock().unwrap().pop_front() {
            Some(false) => Err(NavigationError::ScheduleIdNotFound),
            _ => Ok(ScheduleRef::new("42")),
        }
    }

    async fn fetch_listings(
        &self,
        _schedule: &ScheduleRef,
    ) -> Result<Vec<SlotListing>, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        match self.fetch_script.lock().unwrap().pop_front() {
            Some(FetchStep::Feed(listings)) => Ok(listings),
            Some(FetchStep::Fail) => Err(FetchError::Status { status: 503 }),
            None => Ok(Vec::new()),
        }
    }

    async fn commit(
        &self,
        _schedule: &ScheduleRef,
        slot: &CandidateDate,
    ) -> Result<CommitReceipt, CommitError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        match self.commit_script.lock().unwrap().pop_front() {
            Some(false) => Err(CommitError::Unconfirmed {
                marker: "successfully".to_string(),
            }),
            _ => Ok(CommitReceipt {
                message: format!("booked {slot}"),
                dry_run: false,
            }),
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Delegating handle around a shared [`ScriptedSession`], so the orchestrator
/// can own the boxed double while the test keeps the [`Arc`] and reads the
/// call counters after the run.
pub(crate) struct SharedSession(pub(crate) Arc<ScriptedSession>);

#[async_trait]
impl AppointmentSession for SharedSession {
    async fn login(&self) -> Result<(), AuthError> {
        self.0.login().await
    }

    async fn open_schedule_page(&self) -> Result<ScheduleRef, NavigationError> {
        self.0.open_schedule_page().await
    }

    async fn fetch_listings(
        &self,
        schedule: &ScheduleRef,
    ) -> Result<Vec<SlotListing>, FetchError> {
        self.0.fetch_listings(schedule).await
    }

    async fn commit(
        &self,
        schedule: &ScheduleRef,
        slot: &CandidateDate,
    ) -> Result<CommitReceipt, CommitError> {
        self.0.commit(schedule, slot).await
    }

    async fn close(&self) {
        self.0.close().await;
    }
}

/// One scripted factory response.
pub(crate) enum OpenStep {
    Session(Arc<ScriptedSession>),
    Fail,
}

/// Hands out scripted sessions in order; runs dry with open failures.
pub(crate) struct ScriptedFactory {
    script: Mutex<VecDeque<OpenStep>>,
    pub open_calls: AtomicU32,
}

impl ScriptedFactory {
    pub fn new(steps: Vec<OpenStep>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            open_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn open(&self) -> Result<Box<dyn AppointmentSession>, OpenError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(OpenStep::Session(session)) => Ok(Box::new(SharedSession(session))),
            Some(OpenStep::Fail) => Err(OpenError::Config("scripted open failure".to_string())),
            None => Err(OpenError::Config("scripted factory ran dry".to_string())),
        }
    }
}

/// Delegating handle around a shared [`ScriptedFactory`].
pub(crate) struct SharedFactory(pub(crate) Arc<ScriptedFactory>);

#[async_trait]
impl SessionFactory for SharedFactory {
    async fn open(&self) -> Result<Box<dyn AppointmentSession>, OpenError> {
        self.0.open().await
    }
}

/// Notification sink that records every slot it is handed.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub seen: Mutex<Vec<CandidateDate>>,
}

#[async_trait]
impl Notifier for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, slot: &CandidateDate) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(slot.clone());
        Ok(())
    }
}

/// Delegating handle around a shared [`RecordingSink`].
pub(crate) struct SharedSink(pub(crate) Arc<RecordingSink>);

#[async_trait]
impl Notifier for SharedSink {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    async fn notify(&self, slot: &CandidateDate) -> anyhow::Result<()> {
        self.0.notify(slot).await
    }
}
