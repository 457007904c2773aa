//! Notification sinks for matched appointment slots.
//!
//! A [`Notifier`] receives the slot that was found (or booked) and forwards
//! it somewhere a human will see it. Delivery is best effort: a failing sink
//! is logged and skipped, it never aborts the watch.

use anyhow::Result;
use async_trait::async_trait;
use slw_core::types::CandidateDate;
use tracing::warn;

pub mod command;

pub use command::CommandNotifier;

/// A single delivery channel for slot notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name used in logs.
    fn name(&self) -> &'static str;

    /// Deliver a notification for `slot`.
    async fn notify(&self, slot: &CandidateDate) -> Result<()>;
}

/// Prints the slot to stdout with a wall-clock timestamp.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn notify(&self, slot: &CandidateDate) -> Result<()> {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        match &slot.location {
            Some(location) => {
                println!("{stamp} FOUND SLOT ON {}, location: {location}!!!", slot.date);
            }
            None => println!("{stamp} FOUND SLOT ON {}!!!", slot.date),
        }
        Ok(())
    }
}

/// An ordered set of sinks that all receive every notification.
pub struct NotifySet {
    sinks: Vec<Box<dyn Notifier>>,
}

impl NotifySet {
    pub fn new(sinks: Vec<Box<dyn Notifier>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Deliver `slot` to every sink in order. Failures are logged, not raised.
    pub async fn notify_all(&self, slot: &CandidateDate) {
        for sink in &self.sinks {
            if let Err(err) = sink.notify(slot).await {
                warn!(sink = sink.name(), error = %err, "notification sink failed");
            }
        }
    }
}
