//! Availability feed decoding.
//!
//! The service reports closed facilities with a sentinel entry ("No
//! Appointments Available") instead of omitting them. Parsing lifts that
//! sentinel into [`SlotListing::NoneAvailable`] right here so nothing
//! downstream ever compares display strings.

use chrono::NaiveDate;
use serde::Deserialize;

use slw_core::{CandidateDate, SlotListing};

use crate::error::FetchError;

const NO_APPOINTMENTS_SENTINEL: &str = "no appointments available";

/// One row of the days feed. Extra fields (business_day flags and the like)
/// are ignored.
#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    location: Option<String>,
}

/// Decode a days-feed body into typed listings, feed order preserved.
pub fn parse_days_feed(body: &str) -> Result<Vec<SlotListing>, FetchError> {
    let entries: Vec<FeedEntry> = serde_json::from_str(body)?;
    entries.into_iter().map(listing_from_entry).collect()
}

fn listing_from_entry(entry: FeedEntry) -> Result<SlotListing, FetchError> {
    let Some(text) = entry.date else {
        return Ok(SlotListing::NoneAvailable {
            location: entry.location,
        });
    };
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NO_APPOINTMENTS_SENTINEL) {
        return Ok(SlotListing::NoneAvailable {
            location: entry.location,
        });
    }
    let date = parse_listing_date(trimmed).ok_or_else(|| FetchError::Date {
        text: trimmed.to_string(),
    })?;
    Ok(SlotListing::Open(match entry.location {
        Some(location) => CandidateDate::at_location(date, location),
        None => CandidateDate::new(date),
    }))
}

/// Feed rows carry ISO dates; the rendered location table uses the long form
/// ("14 February, 2026"). Accept both.
pub fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d %B, %Y"))
        .ok()
}
