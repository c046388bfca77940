//! # Non-Revocation Interval Policy
//!
//! A proof request asks that a credential was "non-revoked between `from`
//! and `to`". Holders prove against a single snapshot, so wide intervals
//! are ambiguous. The best-practice check accepts only intervals with both
//! bounds present, ordered, and no wider than the configured maximum
//! (`0` requires `from == to`).

use ancr_core::{NonRevokedInterval, Timestamp};

use crate::error::RevocationError;

/// A non-revocation interval that passed the best-practice check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedInterval {
    /// Start of the interval.
    pub from: Timestamp,
    /// End of the interval; the primary lookup point.
    pub to: Timestamp,
}

fn invalid(interval: &NonRevokedInterval, reason: impl Into<String>) -> RevocationError {
    RevocationError::InvalidRevocationInterval {
        from: interval.from,
        to: interval.to,
        reason: reason.into(),
    }
}

/// Reject intervals a holder cannot prove unambiguously.
pub fn assert_best_practice_interval(
    interval: &NonRevokedInterval,
    max_interval_secs: u64,
) -> Result<CheckedInterval, RevocationError> {
    let to = interval.to.ok_or_else(|| invalid(interval, "`to` is required"))?;
    let from = interval.from.ok_or_else(|| invalid(interval, "`from` is required"))?;
    if from > to {
        return Err(invalid(interval, "`from` is after `to`"));
    }
    let width = to.epoch_secs() - from.epoch_secs();
    if width > max_interval_secs {
        return Err(invalid(
            interval,
            format!("interval spans {width}s, at most {max_interval_secs}s allowed"),
        ));
    }
    Ok(CheckedInterval { from, to })
}
