//! ECharts-flavoured render-spec writer.
//!
//! Converts a chart configuration and result rows into a declarative option
//! object in the shape ECharts consumes: axes, legend, grid, and one series
//! entry per constructed data series.
//!
//! # Mapping Strategy
//!
//! - chart kind -> series `type` (area is a line series with `areaStyle`)
//! - temporal x -> `time` axis with `[x, y]` pair data
//! - categorical x -> `category` axis with explicit labels and aligned values
//! - styling -> `legend.show`, axis `splitLine.show`, `smooth`, `stack`

use serde_json::{json, Value};

use crate::chart::series::{build_bar_series, build_line_series, SeriesSet};
use crate::chart::{ChartConfiguration, ChartKind};
use crate::writer::Writer;
use crate::{Result, Row, TsvizError};

/// Series colors used when the caller supplies no theme.
const DEFAULT_SERIES_COLORS: [&str; 9] = [
    "#5470c6", "#91cc75", "#fac858", "#ee6666", "#73c0de", "#3ba272", "#fc8452", "#9a60b4",
    "#ea7ccc",
];

/// ECharts render-spec writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EChartsWriter;

impl EChartsWriter {
    pub fn new() -> Self {
        Self
    }

    fn build_series_set(&self, rows: &[Row], config: &ChartConfiguration) -> SeriesSet {
        let temporal = config.is_temporal();
        match config.chart_kind {
            ChartKind::Bar => build_bar_series(rows, &config.field_mapping, temporal),
            ChartKind::Line | ChartKind::Area => {
                build_line_series(rows, &config.field_mapping, temporal)
            }
        }
    }

    fn series_entry(&self, config: &ChartConfiguration, set: &SeriesSet, name: &str, points: &[Value]) -> Value {
        let smooth = config.styling.smooth.unwrap_or(false);
        match config.chart_kind {
            ChartKind::Line => {
                let mut entry = json!({
                    "name": name,
                    "type": "line",
                    "data": points,
                    "smooth": smooth,
                });
                if !set.connect_nulls {
                    entry["connectNulls"] = json!(false);
                }
                entry
            }
            ChartKind::Area => {
                let mut entry = json!({
                    "name": name,
                    "type": "line",
                    "data": points,
                    "smooth": smooth,
                    "areaStyle": { "opacity": 0.35 },
                });
                if !set.connect_nulls {
                    entry["connectNulls"] = json!(false);
                }
                if config.styling.stack.unwrap_or(true) {
                    entry["stack"] = json!("total");
                }
                entry
            }
            ChartKind::Bar => {
                let mut entry = json!({
                    "name": name,
                    "type": "bar",
                    "data": points,
                });
                if config.styling.stack == Some(true) {
                    entry["stack"] = json!("total");
                }
                entry
            }
        }
    }
}

impl Writer for EChartsWriter {
    type Output = Value;

    fn write(
        &self,
        rows: &[Row],
        config: &ChartConfiguration,
        theme_colors: &[String],
    ) -> Result<Value> {
        self.validate(config)?;

        let mapping = &config.field_mapping;
        let x_present = rows.iter().any(|row| row.contains_key(&mapping.x_axis));
        let y_present = rows.iter().any(|row| row.contains_key(&mapping.y_axis));
        if !x_present {
            return Err(TsvizError::SynthesisError(format!(
                "x-axis field '{}' not present in result rows",
                mapping.x_axis
            )));
        }
        if !y_present {
            return Err(TsvizError::SynthesisError(format!(
                "y-axis field '{}' not present in result rows",
                mapping.y_axis
            )));
        }

        let set = self.build_series_set(rows, config);
        let grid = config.styling.show_grid;
        let show_legend = mapping.group_by.is_some() && config.styling.show_legend;
        let names: Vec<&str> = set.series.iter().map(|s| s.name.as_str()).collect();

        let x_axis = match &set.categories {
            Some(categories) => json!({
                "type": "category",
                "data": categories,
                "splitLine": { "show": grid },
            }),
            None => json!({
                "type": "time",
                "splitLine": { "show": grid },
            }),
        };

        let series: Vec<Value> = set
            .series
            .iter()
            .map(|s| self.series_entry(config, &set, &s.name, &s.points))
            .collect();

        let colors: Vec<&str> = if theme_colors.is_empty() {
            DEFAULT_SERIES_COLORS.to_vec()
        } else {
            theme_colors.iter().map(String::as_str).collect()
        };

        Ok(json!({
            "title": { "text": config.title },
            "tooltip": { "trigger": "axis" },
            "legend": { "show": show_legend, "data": names },
            "grid": { "containLabel": true },
            "color": colors,
            "xAxis": x_axis,
            "yAxis": { "type": "value", "splitLine": { "show": grid } },
            "series": series,
        }))
    }

    fn validate(&self, config: &ChartConfiguration) -> Result<()> {
        let mapping = &config.field_mapping;
        if mapping.x_axis.is_empty() || mapping.y_axis.is_empty() {
            return Err(TsvizError::SynthesisError(
                "field mapping must name both an x-axis and a y-axis field".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{FieldMapping, TimeFormatting};
    use serde_json::json;

    fn rows_from(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    fn config(kind: ChartKind, group: Option<&str>) -> ChartConfiguration {
        ChartConfiguration::new(
            "test chart",
            kind,
            FieldMapping {
                x_axis: "t".to_string(),
                y_axis: "v".to_string(),
                group_by: group.map(str::to_string),
            },
        )
    }

    fn temporal_config(kind: ChartKind, group: Option<&str>) -> ChartConfiguration {
        config(kind, group).with_time_formatting(Some(TimeFormatting {
            enabled: true,
            source_time_unit: None,
        }))
    }

    #[test]
    fn test_temporal_line_spec_structure() {
        let rows = rows_from(json!([
            {"t": 1_700_000_000_i64, "v": 1},
            {"t": 1_700_000_060_i64, "v": 2},
        ]));
        let writer = EChartsWriter::new();
        let spec = writer
            .write(&rows, &temporal_config(ChartKind::Line, None), &[])
            .unwrap();

        assert_eq!(spec["xAxis"]["type"], "time");
        assert_eq!(spec["yAxis"]["type"], "value");
        assert_eq!(spec["series"][0]["type"], "line");
        assert_eq!(spec["series"][0]["name"], "v");
        assert_eq!(spec["series"][0]["smooth"], false);
        assert_eq!(spec["legend"]["show"], false);
        assert_eq!(spec["title"]["text"], "test chart");
    }

    #[test]
    fn test_categorical_axis_carries_labels() {
        let rows = rows_from(json!([
            {"t": "b", "v": 2},
            {"t": "a", "v": 1},
        ]));
        let writer = EChartsWriter::new();
        let spec = writer.write(&rows, &config(ChartKind::Line, None), &[]).unwrap();

        assert_eq!(spec["xAxis"]["type"], "category");
        assert_eq!(spec["xAxis"]["data"], json!(["a", "b"]));
        assert_eq!(spec["series"][0]["data"], json!([1, 2]));
    }

    #[test]
    fn test_legend_shown_only_when_grouped() {
        let rows = rows_from(json!([
            {"t": "a", "g": "x", "v": 1},
            {"t": "b", "g": "y", "v": 2},
        ]));
        let writer = EChartsWriter::new();
        let spec = writer
            .write(&rows, &config(ChartKind::Line, Some("g")), &[])
            .unwrap();
        assert_eq!(spec["legend"]["show"], true);
        assert_eq!(spec["legend"]["data"], json!(["x", "y"]));
    }

    #[test]
    fn test_grouped_categorical_disables_connect_nulls() {
        let rows = rows_from(json!([
            {"t": "a", "g": "x", "v": 1},
            {"t": "b", "g": "y", "v": 2},
        ]));
        let writer = EChartsWriter::new();
        let spec = writer
            .write(&rows, &config(ChartKind::Line, Some("g")), &[])
            .unwrap();
        assert_eq!(spec["series"][0]["connectNulls"], false);
    }

    #[test]
    fn test_area_adds_fill_and_stacks_by_default() {
        let rows = rows_from(json!([
            {"t": 1_700_000_000_i64, "v": 1},
        ]));
        let writer = EChartsWriter::new();
        let spec = writer
            .write(&rows, &temporal_config(ChartKind::Area, None), &[])
            .unwrap();
        assert_eq!(spec["series"][0]["type"], "line");
        assert!(spec["series"][0]["areaStyle"].is_object());
        assert_eq!(spec["series"][0]["stack"], "total");
    }

    #[test]
    fn test_bar_series_type() {
        let rows = rows_from(json!([
            {"t": "a", "v": 1},
        ]));
        let writer = EChartsWriter::new();
        let spec = writer.write(&rows, &config(ChartKind::Bar, None), &[]).unwrap();
        assert_eq!(spec["series"][0]["type"], "bar");
        assert!(spec["series"][0].get("stack").is_none());
    }

    #[test]
    fn test_grid_setting_controls_split_lines() {
        let rows = rows_from(json!([{"t": "a", "v": 1}]));
        let mut cfg = config(ChartKind::Line, None);
        cfg.styling.show_grid = false;
        let writer = EChartsWriter::new();
        let spec = writer.write(&rows, &cfg, &[]).unwrap();
        assert_eq!(spec["xAxis"]["splitLine"]["show"], false);
        assert_eq!(spec["yAxis"]["splitLine"]["show"], false);
    }

    #[test]
    fn test_theme_colors_override_default_palette() {
        let rows = rows_from(json!([{"t": "a", "v": 1}]));
        let writer = EChartsWriter::new();
        let theme = vec!["#111111".to_string(), "#222222".to_string()];
        let spec = writer.write(&rows, &config(ChartKind::Line, None), &theme).unwrap();
        assert_eq!(spec["color"], json!(["#111111", "#222222"]));
    }

    #[test]
    fn test_missing_mapped_field_is_an_error() {
        let rows = rows_from(json!([{"other": 1}]));
        let writer = EChartsWriter::new();
        assert!(writer.write(&rows, &config(ChartKind::Line, None), &[]).is_err());
    }
}
