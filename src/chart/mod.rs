//! Chart configuration synthesis.
//!
//! This module turns tabular result rows plus a declared field mapping into a
//! renderer-agnostic chart specification: series construction, axis typing,
//! sorting, grouping, multi-series fan-out, and null-safe series breaks.
//!
//! The module is organized into submodules:
//!
//! - `types` - configuration value types ([`ChartConfiguration`] and friends)
//! - `series` - x-coercion, sorting, and series construction
//!
//! [`synthesize`] is the top-level entry point; any internal failure degrades
//! to a `None` render spec rather than propagating, because the caller is
//! interactive code that must treat `None` as "nothing to draw", not as a
//! hard failure.

pub(crate) mod series;
pub mod types;

pub use types::{ChartConfiguration, ChartKind, FieldMapping, Styling, TimeFormatting};

use chrono::Utc;

use crate::analyze::{ContentType, FieldInfo, FieldRole};
use crate::writer::{EChartsWriter, Writer};
use crate::Row;

/// Upper bound on group-by cardinality for auto-detection; more distinct
/// values than this makes an unreadable legend.
const AUTO_GROUP_MAX_CARDINALITY: usize = 20;

/// Synthesize a render spec, returning a new configuration with
/// `render_spec` populated.
///
/// Empty rows and any internal synthesis failure both yield a configuration
/// whose render spec is `None`.
pub fn synthesize(
    rows: &[Row],
    config: &ChartConfiguration,
    theme_colors: &[String],
) -> ChartConfiguration {
    let mut out = config.clone();
    out.updated_at = Utc::now();

    if rows.is_empty() {
        out.render_spec = None;
        return out;
    }

    out.render_spec = match EChartsWriter::new().write(rows, config, theme_colors) {
        Ok(spec) => Some(spec),
        Err(error) => {
            tracing::debug!(%error, "chart synthesis degraded to an empty render spec");
            None
        }
    };
    out
}

/// Pick a baseline field mapping from analyzed fields.
///
/// Applied immediately on first load (not debounced) so users edit from a
/// sensible starting point: the first time field (else the first dimension)
/// becomes x, the first measure becomes y, and a low-cardinality categorical
/// dimension, when one exists, becomes the group-by.
pub fn auto_detect_mapping(fields: &[FieldInfo]) -> Option<FieldMapping> {
    let x = fields
        .iter()
        .find(|f| f.is_time_field)
        .or_else(|| fields.iter().find(|f| f.role == FieldRole::Dimension))?;
    let y = fields
        .iter()
        .find(|f| f.role == FieldRole::Measure && f.name != x.name)?;
    let group_by = fields
        .iter()
        .find(|f| {
            f.role == FieldRole::Dimension
                && f.name != x.name
                && f.content_type == ContentType::Categorical
                && (2..=AUTO_GROUP_MAX_CARDINALITY).contains(&f.cardinality)
        })
        .map(|f| f.name.clone());

    Some(FieldMapping {
        x_axis: x.name.clone(),
        y_axis: y.name.clone(),
        group_by,
    })
}

/// Derive time formatting for a mapping whose x-field was analyzed as a time
/// field; `None` when the x-axis is not temporal.
pub fn auto_time_formatting(
    fields: &[FieldInfo],
    mapping: &FieldMapping,
) -> Option<TimeFormatting> {
    fields
        .iter()
        .find(|f| f.name == mapping.x_axis && f.is_time_field)
        .map(|f| TimeFormatting {
            enabled: true,
            source_time_unit: f.time_unit,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::analyze;
    use serde_json::json;

    fn rows_from(value: serde_json::Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    fn line_config(group: Option<&str>) -> ChartConfiguration {
        ChartConfiguration::new(
            "chart",
            ChartKind::Line,
            FieldMapping {
                x_axis: "cat".to_string(),
                y_axis: "v".to_string(),
                group_by: group.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_synthesize_empty_rows_has_no_render_spec() {
        let out = synthesize(&[], &line_config(None), &[]);
        assert!(out.render_spec.is_none());
    }

    #[test]
    fn test_synthesize_populates_render_spec() {
        let rows = rows_from(json!([
            {"cat": "a", "v": 1},
            {"cat": "b", "v": 2},
        ]));
        let out = synthesize(&rows, &line_config(None), &[]);
        let spec = out.render_spec.expect("render spec");
        assert_eq!(spec["xAxis"]["type"], "category");
    }

    #[test]
    fn test_synthesize_grouped_categorical_null_fill() {
        let rows = rows_from(json!([
            {"cat": "a", "g": "x", "v": 1},
            {"cat": "b", "g": "y", "v": 2},
        ]));
        let out = synthesize(&rows, &line_config(Some("g")), &[]);
        let spec = out.render_spec.expect("render spec");
        assert_eq!(spec["xAxis"]["data"], json!(["a", "b"]));
        assert_eq!(spec["series"][0]["data"], json!([1, null]));
        assert_eq!(spec["series"][1]["data"], json!([null, 2]));
    }

    #[test]
    fn test_synthesize_bad_mapping_degrades_to_none() {
        let rows = rows_from(json!([{"other": 1}]));
        let out = synthesize(&rows, &line_config(None), &[]);
        assert!(out.render_spec.is_none());
    }

    #[test]
    fn test_auto_detect_prefers_time_field_and_measure() {
        let rows = rows_from(json!([
            {"__timestamp": 1_700_000_000_i64, "host": "a", "cpu": 0.5},
            {"__timestamp": 1_700_000_060_i64, "host": "b", "cpu": 0.7},
            {"__timestamp": 1_700_000_120_i64, "host": "a", "cpu": 0.6},
            {"__timestamp": 1_700_000_180_i64, "host": "b", "cpu": 0.4},
            {"__timestamp": 1_700_000_240_i64, "host": "a", "cpu": 0.5},
            {"__timestamp": 1_700_000_300_i64, "host": "b", "cpu": 0.8},
        ]));
        let fields = analyze(&rows, &[]);
        let mapping = auto_detect_mapping(&fields).expect("mapping");
        assert_eq!(mapping.x_axis, "__timestamp");
        assert_eq!(mapping.y_axis, "cpu");
        assert_eq!(mapping.group_by.as_deref(), Some("host"));
    }

    #[test]
    fn test_auto_detect_without_measure_is_none() {
        let rows = rows_from(json!([
            {"host": "a"}, {"host": "b"},
        ]));
        let fields = analyze(&rows, &[]);
        assert!(auto_detect_mapping(&fields).is_none());
    }

    #[test]
    fn test_auto_time_formatting_follows_analyzed_unit() {
        let rows = rows_from(json!([
            {"__timestamp": 1_700_000_000_i64, "v": 1},
            {"__timestamp": 1_700_000_060_i64, "v": 2},
        ]));
        let fields = analyze(&rows, &[]);
        let mapping = auto_detect_mapping(&fields).unwrap();
        let formatting = auto_time_formatting(&fields, &mapping).unwrap();
        assert!(formatting.enabled);
        assert_eq!(
            formatting.source_time_unit,
            Some(crate::time::TimeUnit::Seconds)
        );
    }
}
