//! Timestamp precision model.
//!
//! Raw numeric timestamps arrive without a declared unit: the same column may
//! hold epoch seconds, milliseconds, microseconds, or nanoseconds depending on
//! the source database. [`classify_magnitude`] infers the precision from the
//! order of magnitude of a value assumed to lie near "now"; [`to_instant`] and
//! [`from_instant`] convert between epoch integers and absolute instants at a
//! known precision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Precision of an epoch-integer timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Number of units per millisecond, as a scale factor.
    ///
    /// Less than 1.0 for seconds (one second spans many milliseconds).
    fn per_millisecond(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1e-3,
            TimeUnit::Milliseconds => 1.0,
            TimeUnit::Microseconds => 1e3,
            TimeUnit::Nanoseconds => 1e6,
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Microseconds => "microseconds",
            TimeUnit::Nanoseconds => "nanoseconds",
        };
        write!(f, "{}", name)
    }
}

/// Classify the precision of a raw timestamp by its order of magnitude.
///
/// Buckets a positive value assumed to represent an instant near the present:
/// `> 1e18` is nanoseconds, `> 1e15` microseconds, `> 1e12` milliseconds,
/// anything else seconds. This is a heuristic, not an exact decoding - a value
/// near a threshold lands in the coarser bucket it exceeds. It holds for
/// timestamps between roughly 2001 and 2286 at every precision.
pub fn classify_magnitude(n: f64) -> TimeUnit {
    if n > 1e18 {
        TimeUnit::Nanoseconds
    } else if n > 1e15 {
        TimeUnit::Microseconds
    } else if n > 1e12 {
        TimeUnit::Milliseconds
    } else {
        TimeUnit::Seconds
    }
}

/// Convert an epoch integer at a known precision to an absolute instant.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn to_instant(n: i64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Seconds => DateTime::from_timestamp(n, 0),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(n),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(n),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(n)),
    }
}

/// Convert an absolute instant to an epoch integer at the given precision.
///
/// Exact inverse of [`to_instant`] for integers aligned to the unit's
/// resolution. Nanosecond output saturates through microseconds for instants
/// outside the i64-nanosecond range (beyond ~2262).
pub fn from_instant(instant: DateTime<Utc>, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Seconds => instant.timestamp(),
        TimeUnit::Milliseconds => instant.timestamp_millis(),
        TimeUnit::Microseconds => instant.timestamp_micros(),
        TimeUnit::Nanoseconds => instant
            .timestamp_nanos_opt()
            .unwrap_or_else(|| instant.timestamp_micros().saturating_mul(1_000)),
    }
}

/// Rescale a raw value from one precision to another.
pub fn rescale(n: f64, from: TimeUnit, to: TimeUnit) -> f64 {
    n / from.per_millisecond() * to.per_millisecond()
}

/// Coerce a raw numeric timestamp of unknown precision to epoch milliseconds,
/// classifying the precision by magnitude first.
pub fn to_epoch_ms(n: f64) -> f64 {
    rescale(n, classify_magnitude(n), TimeUnit::Milliseconds)
}
