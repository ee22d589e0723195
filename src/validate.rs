//! Pre-flight validation of macro-bearing queries without interpolation.
//!
//! The validator checks that a query's macros have the supporting context
//! (a time column, an enabled time range) before interpolation is attempted.
//! It is purely advisory: it collects human-readable diagnostics, never
//! throws, and never mutates the query - callers choose whether to block on
//! the result.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::naming;
use crate::time::range::{resolve_bounds, TimeRangeDescriptor};

// ============================================================================
// Core Types
// ============================================================================

/// Result of `validate()` - advisory diagnostics for one query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

// ============================================================================
// Validation
// ============================================================================

/// Validate against the current wall clock.
pub fn validate(
    query: &str,
    time_column: Option<&str>,
    time_range: Option<&TimeRangeDescriptor>,
) -> Validation {
    validate_at(query, time_column, time_range, Utc::now())
}

/// Validate against an explicit reference instant.
pub fn validate_at(
    query: &str,
    time_column: Option<&str>,
    time_range: Option<&TimeRangeDescriptor>,
    now: DateTime<Utc>,
) -> Validation {
    let mut errors = Vec::new();

    let has_filter = query.contains(naming::TIME_FILTER_MACRO);
    let has_field = query.contains(naming::TIME_FIELD_MACRO);
    let has_endpoints =
        query.contains(naming::TIME_FROM_MACRO) || query.contains(naming::TIME_TO_MACRO);
    let has_any_macro = naming::TIME_MACROS.iter().any(|token| query.contains(token));

    if has_filter && time_column.is_none() && !mentions_time_column(query) {
        errors.push(format!(
            "{} requires a time field; configure a time column or reference one in the query",
            naming::TIME_FILTER_MACRO
        ));
    }
    if has_filter && time_range.is_none() {
        errors.push(format!(
            "{} requires a time range",
            naming::TIME_FILTER_MACRO
        ));
    }
    if has_field && time_column.is_none() {
        errors.push(format!(
            "{} requires a configured time column",
            naming::TIME_FIELD_MACRO
        ));
    }
    if has_endpoints && time_range.is_none() {
        errors.push(format!(
            "{}/{} require a time range",
            naming::TIME_FROM_MACRO,
            naming::TIME_TO_MACRO
        ));
    }

    if let Some(range) = time_range {
        if range.is_disabled() && has_any_macro {
            errors.push("time range must be enabled when time macros are present".to_string());
        }
        if let Some((from, to)) = resolve_bounds(range, &now) {
            if from >= to {
                errors.push("time range start must precede its end".to_string());
            }
        }
    }

    Validation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Whether the raw query text itself mentions a plausible time column name.
fn mentions_time_column(query: &str) -> bool {
    let lower = query.to_ascii_lowercase();
    lower.contains("timestamp") || lower.contains("time")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap()
    }

    fn hour_range() -> TimeRangeDescriptor {
        TimeRangeDescriptor::Query {
            from: "now-1h".to_string(),
            to: "now".to_string(),
            enabled: None,
        }
    }

    #[test]
    fn test_plain_query_is_valid() {
        let validation = validate_at("SELECT 1", None, None, fixed_now());
        assert!(validation.is_valid);
        assert!(validation.errors.is_empty());
    }

    #[test]
    fn test_filter_without_field_or_mention() {
        let validation = validate_at(
            "SELECT v FROM m WHERE $__timeFilter",
            None,
            Some(&hour_range()),
            fixed_now(),
        );
        assert!(!validation.is_valid);
        assert!(validation.errors[0].contains("requires a time field"));
    }

    #[test]
    fn test_filter_with_textual_time_mention_passes_field_check() {
        let validation = validate_at(
            "SELECT timestamp, v FROM m WHERE $__timeFilter",
            None,
            Some(&hour_range()),
            fixed_now(),
        );
        assert!(validation.is_valid);
    }

    #[test]
    fn test_filter_without_range() {
        let validation = validate_at(
            "SELECT v FROM m WHERE $__timeFilter",
            Some("ts"),
            None,
            fixed_now(),
        );
        assert!(!validation.is_valid);
        assert!(validation.errors[0].contains("requires a time range"));
    }

    #[test]
    fn test_field_without_column() {
        let validation = validate_at("SELECT $__timeField FROM m", None, None, fixed_now());
        assert!(!validation.is_valid);
        assert!(validation.errors[0].contains("time column"));
    }

    #[test]
    fn test_endpoints_without_range() {
        let validation = validate_at(
            "SELECT * FROM m WHERE t > $__timeFrom",
            Some("t"),
            None,
            fixed_now(),
        );
        assert!(!validation.is_valid);
    }

    #[test]
    fn test_disabled_range_with_macros() {
        let range = TimeRangeDescriptor::Query {
            from: "now-1h".to_string(),
            to: "now".to_string(),
            enabled: Some(false),
        };
        let validation = validate_at(
            "SELECT v FROM m WHERE $__timeFilter",
            Some("ts"),
            Some(&range),
            fixed_now(),
        );
        assert!(validation
            .errors
            .iter()
            .any(|e| e.contains("must be enabled")));
    }

    #[test]
    fn test_inverted_range_reported() {
        let range = TimeRangeDescriptor::Query {
            from: "now".to_string(),
            to: "now-1h".to_string(),
            enabled: None,
        };
        let validation = validate_at(
            "SELECT v FROM m WHERE $__timeFilter",
            Some("ts"),
            Some(&range),
            fixed_now(),
        );
        assert!(validation
            .errors
            .iter()
            .any(|e| e.contains("must precede")));
    }

    #[test]
    fn test_validator_reports_every_problem_at_once() {
        let validation = validate_at(
            "SELECT $__timeField FROM m WHERE $__timeFilter",
            None,
            None,
            fixed_now(),
        );
        // missing range for the filter, missing column for the field; the
        // field check itself is satisfied because the macro text says "time"
        assert_eq!(validation.errors.len(), 2);
    }
}
