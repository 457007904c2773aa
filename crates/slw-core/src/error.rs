use std::path::PathBuf;

use chrono::NaiveDate;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Acceptance window is inverted: earliest {earliest} is after latest {latest}")]
    WindowInverted {
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("Invalid value for '{name}': {value} (must be greater than zero)")]
    NonPositiveBound { name: &'static str, value: u64 },

    #[error("Config file not found at {}: run 'slw init' to create one", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Interrupted by stop signal")]
    Cancelled,
}
