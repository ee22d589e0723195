//! Time range descriptors and their resolution to concrete instant pairs.
//!
//! Three descriptor shapes arrive from different call sites and all funnel
//! through a single [`resolve`] entry point:
//!
//! - *Relative-labeled*: `{ "kind": "relative", "from": "6h", "to": "now" }`
//! - *Absolute-labeled*: `{ "kind": "absolute", "from": <instant>, "to": <instant> }`
//! - *Query-range*: `{ "from": "now-1h", "to": "now", "enabled": true }`
//!
//! Resolution failure is a signal, not an error: an unparsable bound, a
//! disabled query range, or `from >= to` all yield `None`, and the dominant
//! caller behavior on `None` is "omit the time filter entirely".

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Core Types
// ============================================================================

/// One bound of an absolute-labeled range: either a parsed instant or a raw
/// timestamp string resolved at lookup time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeBound {
    /// A concrete instant (serialized as RFC 3339)
    Instant(DateTime<Utc>),
    /// A timestamp string parsed during resolution
    Text(String),
}

impl TimeBound {
    fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            TimeBound::Instant(instant) => Some(*instant),
            TimeBound::Text(text) => parse_absolute(text),
        }
    }
}

/// A time range as supplied by a caller, in one of the three accepted wire
/// shapes. These variants are the complete input surface; no other shape is
/// valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimeRangeDescriptor {
    /// `{ kind: "relative", from: "<n><unit>", to: "now" }`, unit in s/m/h/d/w
    Relative { from: String, to: String },
    /// `{ kind: "absolute", from: <instant|string>, to: <instant|string> }`
    Absolute { from: TimeBound, to: TimeBound },
    /// Untagged query-range shape: `from`/`to` are `"now"`, a `"now-<n><unit>"`
    /// expression, or an absolute timestamp string. `enabled: false` means no
    /// time filtering should be applied.
    #[serde(untagged)]
    Query {
        from: String,
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enabled: Option<bool>,
    },
}

impl TimeRangeDescriptor {
    /// Whether this is a query-range variant explicitly switched off.
    pub fn is_disabled(&self) -> bool {
        matches!(
            self,
            TimeRangeDescriptor::Query {
                enabled: Some(false),
                ..
            }
        )
    }
}

/// A concrete, validated `from < to` instant pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ResolvedRange {
    /// Span of the range in milliseconds. Positive by construction.
    pub fn duration_ms(&self) -> i64 {
        (self.to - self.from).num_milliseconds()
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve a descriptor against a reference instant.
///
/// Snap expressions (`now-1d/d`) snap down in the zone of `now`, so callers
/// wanting local-midnight semantics pass a zoned `now`. Month and year offsets
/// are fixed 30-day / 365-day approximations.
///
/// Returns `None` when either bound fails to parse, the descriptor is a
/// disabled query range, or the bounds do not satisfy `from < to`.
pub fn resolve<Tz: TimeZone>(
    descriptor: &TimeRangeDescriptor,
    now: DateTime<Tz>,
) -> Option<ResolvedRange> {
    let (from, to) = resolve_bounds(descriptor, &now)?;
    if from >= to {
        return None;
    }
    Some(ResolvedRange { from, to })
}

/// Resolve both bounds without the ordering check.
///
/// The validator uses this to report `from >= to` as a distinct diagnostic
/// instead of folding it into "no bound".
pub(crate) fn resolve_bounds<Tz: TimeZone>(
    descriptor: &TimeRangeDescriptor,
    now: &DateTime<Tz>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match descriptor {
        TimeRangeDescriptor::Relative { from, to } => {
            let to = resolve_point(to, now)?;
            let from = now.clone() - parse_span(from.trim())?;
            Some((from.with_timezone(&Utc), to))
        }
        TimeRangeDescriptor::Absolute { from, to } => Some((from.resolve()?, to.resolve()?)),
        TimeRangeDescriptor::Query { from, to, enabled } => {
            if *enabled == Some(false) {
                return None;
            }
            Some((resolve_point(from, now)?, resolve_point(to, now)?))
        }
    }
}

/// Resolve a single `"now"` / `"now-<n><unit>[/<snap>]"` / absolute expression.
fn resolve_point<Tz: TimeZone>(text: &str, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text == "now" {
        return Some(now.with_timezone(&Utc));
    }
    if let Some(expr) = text.strip_prefix("now-") {
        let (span_text, boundary) = match expr.split_once('/') {
            Some((span, boundary)) => (span, Some(boundary)),
            None => (expr, None),
        };
        let shifted = now.clone() - parse_span(span_text.trim())?;
        let point = match boundary {
            Some(boundary) => snap_down(shifted, boundary.trim())?,
            None => shifted,
        };
        return Some(point.with_timezone(&Utc));
    }
    parse_absolute(text)
}

/// Parse a `<n><unit>` span. Months and years are approximate.
fn parse_span(text: &str) -> Option<Duration> {
    let digits_end = text.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let count: i64 = text[..digits_end].parse().ok()?;
    match &text[digits_end..] {
        "s" => Some(Duration::seconds(count)),
        "m" => Some(Duration::minutes(count)),
        "h" => Some(Duration::hours(count)),
        "d" => Some(Duration::days(count)),
        "w" => Some(Duration::weeks(count)),
        "M" => Some(Duration::days(count * 30)),
        "y" => Some(Duration::days(count * 365)),
        _ => None,
    }
}

/// Snap an instant down to the start of a day/week/month/year boundary in its
/// own zone. Start of week is the most recent Sunday at 00:00:00.
fn snap_down<Tz: TimeZone>(at: DateTime<Tz>, boundary: &str) -> Option<DateTime<Tz>> {
    let date = at.date_naive();
    let snapped = match boundary {
        "d" => date,
        "w" => date - Duration::days(i64::from(date.weekday().num_days_from_sunday())),
        "M" => date.with_day(1)?,
        "y" => date.with_day(1)?.with_month(1)?,
        _ => return None,
    };
    at.timezone()
        .from_local_datetime(&snapped.and_hms_opt(0, 0, 0)?)
        .earliest()
}

/// Parse an absolute ISO-ish timestamp string.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.fff]` (space or `T` separated,
/// read as UTC), and bare `YYYY-MM-DD` dates.
pub(crate) fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-15 is a Friday
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }

    fn query(from: &str, to: &str) -> TimeRangeDescriptor {
        TimeRangeDescriptor::Query {
            from: from.to_string(),
            to: to.to_string(),
            enabled: None,
        }
    }

    #[test]
    fn test_resolve_now_minus_hour_is_exact() {
        let range = resolve(&query("now-1h", "now"), fixed_now()).unwrap();
        assert_eq!(range.to, fixed_now());
        assert_eq!(range.from, fixed_now() - Duration::hours(1));
        assert_eq!(range.duration_ms(), 3_600_000);
    }

    #[test]
    fn test_resolve_snap_to_day() {
        let range = resolve(&query("now-1d/d", "now"), fixed_now()).unwrap();
        assert_eq!(range.from, Utc.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_snap_to_week_is_sunday() {
        let range = resolve(&query("now-1d/w", "now"), fixed_now()).unwrap();
        // 2024-03-14 is a Thursday; most recent Sunday is 2024-03-10
        assert_eq!(range.from, Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_snap_to_month_and_year() {
        let month = resolve(&query("now-1d/M", "now"), fixed_now()).unwrap();
        assert_eq!(month.from, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

        let year = resolve(&query("now-1d/y", "now"), fixed_now()).unwrap();
        assert_eq!(year.from, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_approximate_month_and_year_spans() {
        let range = resolve(&query("now-1M", "now"), fixed_now()).unwrap();
        assert_eq!(range.from, fixed_now() - Duration::days(30));

        let range = resolve(&query("now-1y", "now"), fixed_now()).unwrap();
        assert_eq!(range.from, fixed_now() - Duration::days(365));
    }

    #[test]
    fn test_resolve_relative_labeled() {
        let descriptor = TimeRangeDescriptor::Relative {
            from: "5m".to_string(),
            to: "now".to_string(),
        };
        let range = resolve(&descriptor, fixed_now()).unwrap();
        assert_eq!(range.from, fixed_now() - Duration::minutes(5));
        assert_eq!(range.to, fixed_now());
    }

    #[test]
    fn test_resolve_absolute_labeled() {
        let descriptor = TimeRangeDescriptor::Absolute {
            from: TimeBound::Text("2024-01-01 00:00:00".to_string()),
            to: TimeBound::Instant(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
        };
        let range = resolve(&descriptor, fixed_now()).unwrap();
        assert_eq!(range.from, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.to, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_absolute_strings_in_query_shape() {
        let range = resolve(&query("2024-03-01", "2024-03-02T12:00:00"), fixed_now()).unwrap();
        assert_eq!(range.from, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(range.to, Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_disabled_is_none() {
        let descriptor = TimeRangeDescriptor::Query {
            from: "now-1h".to_string(),
            to: "now".to_string(),
            enabled: Some(false),
        };
        assert!(resolve(&descriptor, fixed_now()).is_none());
        assert!(descriptor.is_disabled());
    }

    #[test]
    fn test_resolve_inverted_bounds_is_none() {
        assert!(resolve(&query("now", "now-1h"), fixed_now()).is_none());
        // from == to fails too
        assert!(resolve(&query("now", "now"), fixed_now()).is_none());
    }

    #[test]
    fn test_resolve_unparsable_is_none() {
        assert!(resolve(&query("yesterday-ish", "now"), fixed_now()).is_none());
        assert!(resolve(&query("now-1fortnight", "now"), fixed_now()).is_none());
        assert!(resolve(&query("now-h", "now"), fixed_now()).is_none());
    }

    #[test]
    fn test_snap_in_zoned_now_is_local_midnight() {
        let zone = chrono_tz::America::New_York;
        let now = zone.with_ymd_and_hms(2024, 3, 15, 1, 30, 0).unwrap();
        let range = resolve(&query("now-1d/d", "now"), now).unwrap();
        let local_midnight = zone.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap();
        assert_eq!(range.from, local_midnight.with_timezone(&Utc));
    }

    #[test]
    fn test_wire_shape_relative() {
        let descriptor: TimeRangeDescriptor =
            serde_json::from_str(r#"{"kind":"relative","from":"6h","to":"now"}"#).unwrap();
        assert!(matches!(descriptor, TimeRangeDescriptor::Relative { .. }));
    }

    #[test]
    fn test_wire_shape_absolute() {
        let descriptor: TimeRangeDescriptor = serde_json::from_str(
            r#"{"kind":"absolute","from":"2024-01-01T00:00:00Z","to":"2024-02-01 08:00:00"}"#,
        )
        .unwrap();
        match descriptor {
            TimeRangeDescriptor::Absolute { from, to } => {
                assert!(matches!(from, TimeBound::Instant(_)));
                // Non-RFC-3339 strings stay textual until resolution
                assert!(matches!(to, TimeBound::Text(_)));
            }
            other => panic!("expected absolute variant, got {:?}", other),
        }
    }

    #[test]
    fn test_wire_shape_query_range() {
        let descriptor: TimeRangeDescriptor =
            serde_json::from_str(r#"{"from":"now-15m","to":"now","enabled":true}"#).unwrap();
        assert!(matches!(
            descriptor,
            TimeRangeDescriptor::Query {
                enabled: Some(true),
                ..
            }
        ));

        let descriptor: TimeRangeDescriptor =
            serde_json::from_str(r#"{"from":"now-15m","to":"now"}"#).unwrap();
        assert!(matches!(
            descriptor,
            TimeRangeDescriptor::Query { enabled: None, .. }
        ));
    }

    #[test]
    fn test_parse_absolute_formats() {
        assert!(parse_absolute("2024-03-15T10:30:00Z").is_some());
        assert!(parse_absolute("2024-03-15T10:30:00+02:00").is_some());
        assert!(parse_absolute("2024-03-15 10:30:00").is_some());
        assert!(parse_absolute("2024-03-15 10:30:00.250").is_some());
        assert!(parse_absolute("2024-03-15").is_some());
        assert!(parse_absolute("March 15th").is_none());
    }
}
