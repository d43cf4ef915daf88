// crates/dispute-engine-core/src/core/time.rs
// ============================================================================
// Module: Dispute Engine Time Model
// Description: Canonical timestamp and month-granularity date representations.
// Purpose: Provide deterministic, replayable time values across engine records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The engine uses explicit time values embedded in operations and logs to
//! keep behavior deterministic. The core never reads wall-clock time directly;
//! hosts must supply timestamps with each mutating call. Month-granularity
//! values cover furnisher-reported anchor dates such as the date of first
//! delinquency, which bureaus report without a day component.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Milliseconds in one day, used for deadline arithmetic on unix timestamps.
const MILLIS_PER_DAY: i64 = 86_400_000;

/// Canonical timestamp used in engine logs and operation records.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Timestamp {
    /// Unix epoch milliseconds.
    UnixMillis(i64),
    /// Monotonic logical time value.
    Logical(u64),
}

impl Timestamp {
    /// Returns the timestamp as unix milliseconds when available.
    #[must_use]
    pub const fn as_unix_millis(&self) -> Option<i64> {
        match self {
            Self::UnixMillis(value) => Some(*value),
            Self::Logical(_) => None,
        }
    }

    /// Returns the timestamp as logical time when available.
    #[must_use]
    pub const fn as_logical(&self) -> Option<u64> {
        match self {
            Self::UnixMillis(_) => None,
            Self::Logical(value) => Some(*value),
        }
    }

    /// Returns a timestamp advanced by the given number of days.
    ///
    /// Logical timestamps treat one day as one logical tick so that
    /// deadline arithmetic stays deterministic in replay harnesses.
    #[must_use]
    pub const fn plus_days(self, days: u32) -> Self {
        match self {
            Self::UnixMillis(value) => {
                Self::UnixMillis(value.saturating_add(days as i64 * MILLIS_PER_DAY))
            }
            Self::Logical(value) => Self::Logical(value.saturating_add(days as u64)),
        }
    }

    /// Returns whole days from `self` until `later` (negative when past).
    ///
    /// Returns `None` for mixed timestamp kinds; deadline math fails closed.
    #[must_use]
    pub const fn days_until(self, later: Self) -> Option<i64> {
        match (self, later) {
            (Self::UnixMillis(now), Self::UnixMillis(then)) => {
                Some(then.saturating_sub(now) / MILLIS_PER_DAY)
            }
            (Self::Logical(now), Self::Logical(then)) => {
                Some((then as i64).saturating_sub(now as i64))
            }
            _ => None,
        }
    }

    /// Returns `true` when `self` is at or after `other`.
    ///
    /// Comparisons across timestamp kinds return `false`; mixed-kind
    /// comparisons indicate a caller configuration error and fail closed
    /// (no deadline is considered elapsed).
    #[must_use]
    pub const fn is_at_or_after(self, other: Self) -> bool {
        match (self, other) {
            (Self::UnixMillis(lhs), Self::UnixMillis(rhs)) => lhs >= rhs,
            (Self::Logical(lhs), Self::Logical(rhs)) => lhs >= rhs,
            _ => false,
        }
    }
}

// ============================================================================
// SECTION: Month Stamps
// ============================================================================

/// Month-granularity date for furnisher-reported anchors (e.g. DOFD).
///
/// # Invariants
/// - `month` is 1-based (1 = January, 12 = December); enforced at construction.
/// - Ordering is chronological (year-major, then month).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MonthStamp {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-based.
    pub month: u8,
}

impl MonthStamp {
    /// Creates a month stamp (returns `None` when the month is out of range).
    #[must_use]
    pub const fn new(year: i32, month: u8) -> Option<Self> {
        if month >= 1 && month <= 12 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Returns the number of whole months from `earlier` to `self`.
    ///
    /// Negative when `self` precedes `earlier`.
    #[must_use]
    pub const fn months_since(self, earlier: Self) -> i64 {
        let lhs = self.year as i64 * 12 + self.month as i64;
        let rhs = earlier.year as i64 * 12 + earlier.month as i64;
        lhs - rhs
    }
}

impl fmt::Display for MonthStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::MonthStamp;
    use super::Timestamp;

    #[test]
    fn plus_days_advances_unix_millis_by_whole_days() {
        let start = Timestamp::UnixMillis(1_000);
        assert_eq!(start.plus_days(2), Timestamp::UnixMillis(1_000 + 2 * 86_400_000));
    }

    #[test]
    fn mixed_kind_comparison_fails_closed() {
        assert!(!Timestamp::UnixMillis(10).is_at_or_after(Timestamp::Logical(1)));
    }

    #[test]
    fn month_stamp_ordering_is_chronological() {
        let jan_2020 = MonthStamp::new(2020, 1);
        let jun_2022 = MonthStamp::new(2022, 6);
        assert!(jan_2020 < jun_2022);
        assert_eq!(
            jun_2022.and_then(|b| jan_2020.map(|a| b.months_since(a))),
            Some(29)
        );
    }

    #[test]
    fn month_stamp_rejects_out_of_range_months() {
        assert!(MonthStamp::new(2024, 0).is_none());
        assert!(MonthStamp::new(2024, 13).is_none());
    }
}
