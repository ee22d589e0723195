//! Macro interpolation: substituting time macros into raw SQL text.
//!
//! The engine performs targeted, best-effort substitution of the five
//! recognized macro tokens using word-boundary regex matches anchored to known
//! column and alias names. Everything outside those tokens is opaque text -
//! no general SQL understanding is attempted.
//!
//! Substitution never fails the query: an unresolvable time range neutralizes
//! `$__timeFilter` to `1=1`, and missing context degrades to defaults while
//! the diagnostics record what happened.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::Serialize;

use crate::analyze::ColumnDescriptor;
use crate::naming;
use crate::time::range::{resolve, ResolvedRange, TimeRangeDescriptor};
use crate::time::{from_instant, TimeUnit};

/// Default cap on the number of time buckets `$__interval` aims for.
pub const DEFAULT_MAX_POINTS: u32 = 1_000;

// ============================================================================
// Core Types
// ============================================================================

/// Supporting context for one interpolation call.
#[derive(Debug, Clone)]
pub struct InterpolateContext {
    /// Column chosen to represent the temporal axis. `__timestamp` is assumed
    /// when unset.
    pub time_column: Option<String>,
    /// Schema hint for the time column; a declared time unit forces epoch
    /// output in that unit.
    pub time_column_schema: Option<ColumnDescriptor>,
    /// Time range descriptor; `None` (or a range that fails to resolve)
    /// neutralizes the time filter.
    pub time_range: Option<TimeRangeDescriptor>,
    /// Zone used for quoted bound literals and for snap expressions.
    pub time_zone: Tz,
    /// Bucket-count cap driving `$__interval`.
    pub max_points: u32,
}

impl Default for InterpolateContext {
    fn default() -> Self {
        Self {
            time_column: None,
            time_column_schema: None,
            time_range: None,
            time_zone: chrono_tz::UTC,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

/// Result of interpolation: the rewritten query plus an observability record
/// of every substitution that was actually made.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interpolated {
    pub query: String,
    pub has_time_variables: bool,
    /// Macro token -> concrete substituted value.
    pub interpolated: BTreeMap<String, String>,
    pub errors: Vec<String>,
}

// ============================================================================
// Interpolation
// ============================================================================

/// Interpolate against the current wall clock.
pub fn interpolate(query: &str, ctx: &InterpolateContext) -> Interpolated {
    interpolate_at(query, ctx, Utc::now())
}

/// Interpolate against an explicit reference instant.
///
/// Each macro is handled independently; a macro absent from the text is
/// skipped entirely. The relative-range resolver runs in `ctx.time_zone` so
/// snap expressions land on local boundaries.
pub fn interpolate_at(query: &str, ctx: &InterpolateContext, now: DateTime<Utc>) -> Interpolated {
    let has_time_variables = naming::TIME_MACROS
        .iter()
        .any(|token| query.contains(token));

    let mut out = query.to_string();
    let mut interpolated = BTreeMap::new();
    let mut errors = Vec::new();

    let resolved = ctx
        .time_range
        .as_ref()
        .and_then(|range| resolve(range, now.with_timezone(&ctx.time_zone)));

    let column = ctx
        .time_column
        .clone()
        .unwrap_or_else(|| naming::DEFAULT_TIME_COLUMN.to_string());
    let schema = ctx.time_column_schema.as_ref();

    // Field substitution, then alias-sensitive GROUP BY / ORDER BY rewrite.
    let field_macro_used = out.contains(naming::TIME_FIELD_MACRO);
    if field_macro_used {
        if ctx.time_column.is_none() {
            errors.push(format!(
                "{} used without a configured time column; assuming {}",
                naming::TIME_FIELD_MACRO,
                naming::DEFAULT_TIME_COLUMN
            ));
        }
        out = out.replace(naming::TIME_FIELD_MACRO, &column);
        interpolated.insert(naming::TIME_FIELD_MACRO.to_string(), column.clone());
    }
    if field_macro_used || ctx.time_column.is_some() {
        out = rewrite_time_aliases(&out, &column);
    }

    // Filter substitution.
    if out.contains(naming::TIME_FILTER_MACRO) {
        let clause = match &resolved {
            Some(range) => filter_clause(&column, schema, range, ctx.time_zone),
            None => naming::NEUTRAL_FILTER.to_string(),
        };
        out = out.replace(naming::TIME_FILTER_MACRO, &clause);
        interpolated.insert(naming::TIME_FILTER_MACRO.to_string(), clause);
    }

    // Interval substitution.
    if out.contains(naming::INTERVAL_MACRO) {
        let seconds = match &resolved {
            Some(range) => interval_seconds(range, ctx.max_points),
            None => naming::FALLBACK_INTERVAL_SECONDS,
        };
        let literal = format!("{}s", seconds);
        out = out.replace(naming::INTERVAL_MACRO, &literal);
        interpolated.insert(naming::INTERVAL_MACRO.to_string(), literal);
    }

    // Endpoint substitution, independent of whether the filter was present.
    let endpoints = [
        (naming::TIME_FROM_MACRO, resolved.as_ref().map(|r| r.from)),
        (naming::TIME_TO_MACRO, resolved.as_ref().map(|r| r.to)),
    ];
    for (token, bound) in endpoints {
        if !out.contains(token) {
            continue;
        }
        let literal = match bound {
            Some(instant) => from_instant(instant, epoch_unit(&column, schema)).to_string(),
            None => {
                errors.push(format!("{} requires a resolvable time range", token));
                "0".to_string()
            }
        };
        out = out.replace(token, &literal);
        interpolated.insert(token.to_string(), literal);
    }

    Interpolated {
        query: out,
        has_time_variables,
        interpolated,
        errors,
    }
}

/// Coarsest per-bucket granularity (in seconds) keeping the bucket count for
/// `range` at or under `max_points`. Never below one second.
pub fn interval_seconds(range: &ResolvedRange, max_points: u32) -> i64 {
    let per_bucket_ms = range.duration_ms() / i64::from(max_points.max(1));
    (per_bucket_ms / 1_000).max(1)
}

// ============================================================================
// Alias Rewriting
// ============================================================================

/// Rewrite `SELECT <col> AS <alias>` occurrences so downstream GROUP BY /
/// ORDER BY clauses reference the real column.
///
/// A self-alias (`t AS t`, any case) is dropped outright and any clause
/// already naming it is left untouched. For a genuine alias, `GROUP BY
/// <alias>` / `ORDER BY <alias>` are rewritten to the column, word-boundary
/// and case-insensitive.
fn rewrite_time_aliases(query: &str, column: &str) -> String {
    let pattern = format!(
        r"(?i)\b{}\s+AS\s+([A-Za-z_][A-Za-z0-9_]*)",
        regex::escape(column)
    );
    let alias_re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(_) => return query.to_string(),
    };

    let mut aliases = Vec::new();
    let mut out = alias_re
        .replace_all(query, |caps: &regex::Captures| {
            let alias = &caps[1];
            if alias.eq_ignore_ascii_case(column) {
                // Self-referential alias: `SELECT t AS t` becomes `SELECT t`
                column.to_string()
            } else {
                aliases.push(alias.to_string());
                caps[0].to_string()
            }
        })
        .into_owned();

    for alias in aliases {
        let clause_pattern = format!(
            r"(?i)\b(GROUP\s+BY|ORDER\s+BY)\s+{}\b",
            regex::escape(&alias)
        );
        if let Ok(clause_re) = Regex::new(&clause_pattern) {
            out = clause_re
                .replace_all(&out, |caps: &regex::Captures| {
                    format!("{} {}", &caps[1], column)
                })
                .into_owned();
        }
    }
    out
}

// ============================================================================
// Bound Literals
// ============================================================================

/// Build the `col >= lo AND col <= hi` comparison clause.
///
/// Bounds are unquoted epoch integers when the column looks like an epoch
/// column (or a unit is declared); otherwise they are quoted timestamps
/// formatted in the caller's zone.
fn filter_clause(
    column: &str,
    schema: Option<&ColumnDescriptor>,
    range: &ResolvedRange,
    zone: Tz,
) -> String {
    if uses_epoch_literals(column, schema) {
        let unit = epoch_unit(column, schema);
        format!(
            "{} >= {} AND {} <= {}",
            column,
            from_instant(range.from, unit),
            column,
            from_instant(range.to, unit)
        )
    } else {
        format!(
            "{} >= '{}' AND {} <= '{}'",
            column,
            range.from.with_timezone(&zone).format("%Y-%m-%d %H:%M:%S"),
            column,
            range.to.with_timezone(&zone).format("%Y-%m-%d %H:%M:%S")
        )
    }
}

fn uses_epoch_literals(column: &str, schema: Option<&ColumnDescriptor>) -> bool {
    naming::is_epoch_column_name(column) || schema.and_then(|s| s.time_unit).is_some()
}

/// Unit for epoch literals: a schema-declared unit wins, else a `_ns`/`_us`/
/// `_ms` name suffix, else seconds.
fn epoch_unit(column: &str, schema: Option<&ColumnDescriptor>) -> TimeUnit {
    if let Some(unit) = schema.and_then(|s| s.time_unit) {
        return unit;
    }
    let lower = column.to_ascii_lowercase();
    if lower.ends_with("_ns") {
        TimeUnit::Nanoseconds
    } else if lower.ends_with("_us") {
        TimeUnit::Microseconds
    } else if lower.ends_with("_ms") {
        TimeUnit::Milliseconds
    } else {
        TimeUnit::Seconds
    }
}
