//! # Temporal Types — Epoch-Second Timestamps
//!
//! AnonCreds exchanges every point in time as Unix epoch seconds: status
//! list timestamps, non-revocation intervals, presentation identifiers.
//! `Timestamp` keeps that representation on the wire (a bare JSON integer)
//! and uses `chrono` only for the clock and for rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in time in Unix epoch seconds, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(u64::try_from(Utc::now().timestamp()).unwrap_or(0))
    }

    /// Wrap an epoch-second value.
    pub const fn from_epoch_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub const fn epoch_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp moved forward by `secs`, saturating.
    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Render as ISO8601 with Z suffix (e.g., `2026-01-15T12:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_else(|| format!("@{}", self.0))
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
