//! Centralized naming conventions for tsviz query macros and identifiers.
//!
//! All recognized macro tokens share the `$__` prefix. The five tokens below
//! are the complete, fixed macro surface; no other macro names are recognized.
//!
//! # Categories
//!
//! - **Macro tokens**: substitution targets in raw SQL text (`$__timeFilter`, ...)
//! - **Default identifiers**: fallback column names used when the caller
//!   configures nothing (`__timestamp`)
//! - **Neutral literals**: SQL fragments substituted when a macro cannot be
//!   satisfied (`1=1`)

use const_format::concatcp;

// ============================================================================
// Base Building Blocks
// ============================================================================

/// Prefix shared by every recognized macro token
const MACRO_PREFIX: &str = "$__";

// ============================================================================
// Macro Tokens
// ============================================================================

/// Time-filter macro, replaced by a `col >= lo AND col <= hi` clause
pub const TIME_FILTER_MACRO: &str = concatcp!(MACRO_PREFIX, "timeFilter");

/// Time-field macro, replaced by the configured time column name
pub const TIME_FIELD_MACRO: &str = concatcp!(MACRO_PREFIX, "timeField");

/// Interval macro, replaced by a per-bucket granularity like `30s`
pub const INTERVAL_MACRO: &str = concatcp!(MACRO_PREFIX, "interval");

/// Range-start macro, replaced by an epoch integer
pub const TIME_FROM_MACRO: &str = concatcp!(MACRO_PREFIX, "timeFrom");

/// Range-end macro, replaced by an epoch integer
pub const TIME_TO_MACRO: &str = concatcp!(MACRO_PREFIX, "timeTo");

/// The complete macro vocabulary, used for presence detection.
pub const TIME_MACROS: [&str; 5] = [
    TIME_FILTER_MACRO,
    TIME_FIELD_MACRO,
    INTERVAL_MACRO,
    TIME_FROM_MACRO,
    TIME_TO_MACRO,
];

// ============================================================================
// Default Identifiers & Neutral Literals
// ============================================================================

/// Column name assumed when no explicit time column is configured
pub const DEFAULT_TIME_COLUMN: &str = "__timestamp";

/// Tautology substituted for an unsatisfiable `$__timeFilter`, keeping the
/// query syntactically valid and effectively unfiltered
pub const NEUTRAL_FILTER: &str = "1=1";

/// Fallback interval when the time range does not resolve
pub const FALLBACK_INTERVAL_SECONDS: i64 = 60;

// ============================================================================
// Column-Name Heuristics
// ============================================================================

/// Name fragments that mark a column as storing raw epoch integers.
const EPOCH_NAME_FRAGMENTS: [&str; 5] = ["epoch", "_ts", "_ns", "_ms", "_us"];

/// Whether a column name looks like it stores epoch integers rather than
/// database-native timestamps.
///
/// This drives the epoch-vs-quoted decision for time-filter bound literals.
/// It is a best-effort default keyed on name substrings, not a contract;
/// callers needing guaranteed correctness pass an explicit
/// [`TimeUnit`](crate::time::TimeUnit) via the column schema.
pub fn is_epoch_column_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == DEFAULT_TIME_COLUMN
        || lower == "timestamp"
        || EPOCH_NAME_FRAGMENTS.iter().any(|f| lower.contains(f))
}
