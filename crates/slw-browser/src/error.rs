//! Step-specific session errors.
//!
//! Each session step gets its own error type so the orchestration layer can
//! tell "this session is stale" from "this fetch hiccuped" without string
//! matching. All variants are transient from the caller's point of view; the
//! recovery policy, not the error, decides what happens next.

use thiserror::Error;

/// Failure to construct a session at all.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Session configuration unusable: {0}")]
    Config(String),
}

/// The remote refused the presented identity.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Login probe failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Session rejected by the remote (status {status})")]
    SessionRejected { status: u16 },

    #[error("Redirected to the sign-in page; the exported cookies are stale")]
    RedirectedToSignIn,
}

/// Could not reach or read the schedule page.
#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Account page request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Account page returned status {status}")]
    Status { status: u16 },

    #[error("No schedule id found on the account page; set target.schedule_id explicitly")]
    ScheduleIdNotFound,
}

/// One availability fetch failed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Availability request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Availability feed returned status {status}")]
    Status { status: u16 },

    #[error("Availability feed body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unrecognized date '{text}' in availability feed")]
    Date { text: String },
}

/// The final action against a found slot did not go through.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Commit request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Commit returned status {status}")]
    Status { status: u16 },

    #[error("Commit response did not contain the confirmation marker '{marker}'")]
    Unconfirmed { marker: String },
}
