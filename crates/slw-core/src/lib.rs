//! Shared value types and error taxonomy for the slotwatch workspace.

pub mod error;
pub mod types;

// Re-export key types
pub use error::AppError;
pub use types::{
    CandidateDate, DateWindow, OutputFormat, PollOutcome, SessionOutcome, SlotListing,
};
