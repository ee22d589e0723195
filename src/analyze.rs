//! Result-column classification: semantic type, chart role, and time-field
//! detection.
//!
//! The analyzer works from three signals, strongest first: an optional
//! database schema hint, a column-name heuristic, and the sampled data itself.
//! The data layer validates or overrides a suspicious schema/name signal but
//! never silently contradicts a confident one - contradictions are logged.
//! With no signal at all, classification degrades to the most conservative
//! answer (`string`/`categorical`) rather than guessing aggressively.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::time::range::parse_absolute;
use crate::time::{classify_magnitude, TimeUnit};
use crate::Row;

/// Maximum non-null values sampled per column.
const SAMPLE_LIMIT: usize = 100;

// ============================================================================
// Core Types
// ============================================================================

/// Schema hint for one column, supplied by a schema collaborator.
///
/// Takes precedence over the name-based heuristic but is itself cross-checked
/// against sampled values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<TimeUnit>,
}

/// Database-flavored value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Integer,
    Bigint,
    Float,
    String,
    Boolean,
    Date,
    Datetime,
    Time,
}

/// Chart role of a column: something to aggregate, or something to slice by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    Measure,
    Dimension,
}

/// Axis-level content classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Numeric,
    Categorical,
    Temporal,
    Text,
}

/// Analyzer output for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    pub semantic_type: SemanticType,
    pub role: FieldRole,
    pub content_type: ContentType,
    pub is_time_field: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<TimeUnit>,
    pub cardinality: usize,
}

// ============================================================================
// Analysis
// ============================================================================

/// Classify every column present in `rows`.
///
/// Column order follows first appearance across rows. `schema_hints` may be
/// empty; when a hint exists for a column it seeds the semantic type and time
/// unit, and the sampled data is used to confirm or flag it.
pub fn analyze(rows: &[Row], schema_hints: &[ColumnDescriptor]) -> Vec<FieldInfo> {
    column_names(rows)
        .into_iter()
        .map(|name| {
            let hint = schema_hints.iter().find(|h| h.column_name == name);
            analyze_column(&name, rows, hint)
        })
        .collect()
}

/// Column names in first-appearance order across all rows.
fn column_names(rows: &[Row]) -> Vec<String> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.clone()) {
                names.push(key.clone());
            }
        }
    }
    names
}

fn analyze_column(name: &str, rows: &[Row], hint: Option<&ColumnDescriptor>) -> FieldInfo {
    let samples: Vec<&Value> = rows
        .iter()
        .filter_map(|row| row.get(name))
        .filter(|value| !value.is_null())
        .take(SAMPLE_LIMIT)
        .collect();

    let cardinality = samples
        .iter()
        .map(|value| value.to_string())
        .collect::<HashSet<_>>()
        .len();

    let numeric = numeric_samples(&samples);
    let name_hit = name_suggests_time(name);

    let (semantic_type, is_time_field, time_unit) = match hint {
        Some(hint) => reconcile_with_hint(name, hint, name_hit, &samples, numeric.as_deref()),
        None => classify_from_data(name_hit, &samples, numeric.as_deref()),
    };

    let (role, content_type) = assign_role(semantic_type, is_time_field, cardinality, samples.len());

    FieldInfo {
        name: name.to_string(),
        semantic_type,
        role,
        content_type,
        is_time_field,
        time_unit,
        cardinality,
    }
}

/// Schema-present path: seed from the hint, cross-validate with data.
fn reconcile_with_hint(
    name: &str,
    hint: &ColumnDescriptor,
    name_hit: bool,
    samples: &[&Value],
    numeric: Option<&[f64]>,
) -> (SemanticType, bool, Option<TimeUnit>) {
    let semantic = semantic_from_sql_type(&hint.data_type);
    let mut is_time = hint.time_unit.is_some() || name_hit;
    let mut unit = hint.time_unit;

    match semantic {
        SemanticType::Integer | SemanticType::Bigint => {
            if !samples.is_empty() && numeric.is_none() {
                tracing::warn!(
                    column = name,
                    declared = %hint.data_type,
                    "schema declares a numeric column but sampled values are not numeric"
                );
            }
            if is_time && unit.is_none() {
                // Name heuristic fired on an integer column: confirm against
                // the sampled magnitude before trusting it.
                match numeric.map(mean) {
                    Some(avg) if is_plausible_timestamp(avg) => {
                        unit = Some(classify_magnitude(avg));
                    }
                    _ => {
                        tracing::warn!(
                            column = name,
                            "column name suggests a timestamp but sampled values are not in a plausible epoch range"
                        );
                        is_time = false;
                    }
                }
            } else if let (Some(declared), Some(values)) = (unit, numeric) {
                let avg = mean(values);
                if is_plausible_timestamp(avg) && classify_magnitude(avg) != declared {
                    tracing::warn!(
                        column = name,
                        declared = %declared,
                        observed = %classify_magnitude(avg),
                        "sampled magnitude contradicts the schema-declared time unit"
                    );
                }
            }
        }
        SemanticType::Date | SemanticType::Datetime | SemanticType::Time => {
            is_time = true;
        }
        _ => {}
    }

    (semantic, is_time, unit)
}

/// No-schema path: classify purely from the sampled data and the name.
fn classify_from_data(
    name_hit: bool,
    samples: &[&Value],
    numeric: Option<&[f64]>,
) -> (SemanticType, bool, Option<TimeUnit>) {
    if samples.is_empty() {
        // All-null column: nothing to sample, fall back to the most
        // conservative classification.
        return (SemanticType::String, false, None);
    }

    if let Some(values) = numeric {
        let semantic = if values.iter().any(|v| v.fract() != 0.0) {
            SemanticType::Float
        } else if values.iter().any(|v| v.abs() > f64::from(i32::MAX)) {
            SemanticType::Bigint
        } else {
            SemanticType::Integer
        };
        let avg = mean(values);
        if is_plausible_timestamp(avg) || name_hit {
            return (semantic, true, Some(classify_magnitude(avg)));
        }
        return (semantic, false, None);
    }

    if samples.iter().all(|value| value.is_boolean()) {
        return (SemanticType::Boolean, false, None);
    }

    let parsed = samples
        .iter()
        .filter(|value| value.as_str().is_some_and(|s| parse_absolute(s).is_some()))
        .count();
    if parsed * 5 >= samples.len() * 4 || name_hit {
        return (SemanticType::Datetime, true, None);
    }

    (SemanticType::String, false, None)
}

fn assign_role(
    semantic: SemanticType,
    is_time: bool,
    cardinality: usize,
    sample_count: usize,
) -> (FieldRole, ContentType) {
    if is_time {
        return (FieldRole::Dimension, ContentType::Temporal);
    }
    match semantic {
        SemanticType::Integer | SemanticType::Bigint | SemanticType::Float => {
            (FieldRole::Measure, ContentType::Numeric)
        }
        SemanticType::Boolean => (FieldRole::Dimension, ContentType::Categorical),
        SemanticType::Date | SemanticType::Datetime | SemanticType::Time => {
            (FieldRole::Dimension, ContentType::Temporal)
        }
        SemanticType::String => {
            if sample_count == 0 || cardinality * 2 < sample_count {
                (FieldRole::Dimension, ContentType::Categorical)
            } else {
                (FieldRole::Dimension, ContentType::Text)
            }
        }
    }
}

// ============================================================================
// Heuristics
// ============================================================================

/// Name-based time-field candidate check.
///
/// Fires on exact `__timestamp`/`timestamp`/`time`, on `time`/`date`
/// substrings, and on the conventional `created_at`/`updated_at` columns.
fn name_suggests_time(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    matches!(lower.as_str(), "__timestamp" | "timestamp" | "time" | "created_at" | "updated_at")
        || lower.contains("time")
        || lower.contains("date")
}

/// Whether a value sits in a magnitude range any epoch precision could
/// produce for a present-day timestamp (roughly 2001 in seconds through the
/// i64 nanosecond ceiling).
fn is_plausible_timestamp(value: f64) -> bool {
    (1e9..1e19).contains(&value)
}

fn numeric_samples(samples: &[&Value]) -> Option<Vec<f64>> {
    if samples.is_empty() {
        return None;
    }
    samples.iter().map(|value| value.as_f64()).collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Map a database type name onto a [`SemanticType`].
fn semantic_from_sql_type(data_type: &str) -> SemanticType {
    let lower = data_type.to_ascii_lowercase();
    if lower.contains("bigint") || lower.contains("int64") || lower.contains("long") {
        SemanticType::Bigint
    } else if lower.contains("int") {
        SemanticType::Integer
    } else if lower.contains("float")
        || lower.contains("double")
        || lower.contains("decimal")
        || lower.contains("real")
        || lower.contains("numeric")
    {
        SemanticType::Float
    } else if lower.contains("bool") {
        SemanticType::Boolean
    } else if lower.contains("datetime") || lower.contains("timestamp") {
        SemanticType::Datetime
    } else if lower.contains("date") {
        SemanticType::Date
    } else if lower.contains("time") {
        SemanticType::Time
    } else {
        SemanticType::String
    }
}
