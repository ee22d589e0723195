//! Chart configuration types.
//!
//! A [`ChartConfiguration`] is an immutable value: every transformation
//! returns a new configuration with `updated_at` refreshed and the cached
//! `render_spec` cleared, because the render spec is always fully derivable
//! from the other fields plus the current result rows - it is a cache, never
//! authoritative state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::time::TimeUnit;

/// Supported chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Area,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Area => "area",
        };
        write!(f, "{}", name)
    }
}

/// User-declared association of result columns to chart roles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub x_axis: String,
    pub y_axis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

/// Styling options applied at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Styling {
    #[serde(default = "default_true")]
    pub show_legend: bool,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smooth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<bool>,
}

fn default_true() -> bool {
    true
}

impl Default for Styling {
    fn default() -> Self {
        Self {
            show_legend: true,
            show_grid: true,
            smooth: None,
            stack: None,
        }
    }
}

/// Controls coercion of the x-field to a temporal axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeFormatting {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_time_unit: Option<TimeUnit>,
}

/// A complete chart configuration, including the cached render spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfiguration {
    pub id: String,
    pub title: String,
    pub chart_kind: ChartKind,
    pub field_mapping: FieldMapping,
    #[serde(default)]
    pub styling: Styling,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_formatting: Option<TimeFormatting>,
    /// Renderer-consumed declarative spec. `None` means "nothing to draw".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_spec: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChartConfiguration {
    /// Create a configuration with a fresh id and no cached render spec.
    pub fn new(
        title: impl Into<String>,
        chart_kind: ChartKind,
        field_mapping: FieldMapping,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            chart_kind,
            field_mapping,
            styling: Styling::default(),
            time_formatting: None,
            render_spec: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Return a copy with a different field mapping.
    pub fn with_mapping(self, field_mapping: FieldMapping) -> Self {
        Self {
            field_mapping,
            ..self
        }
        .touched()
    }

    /// Return a copy with a different chart kind.
    pub fn with_kind(self, chart_kind: ChartKind) -> Self {
        Self { chart_kind, ..self }.touched()
    }

    /// Return a copy with different styling.
    pub fn with_styling(self, styling: Styling) -> Self {
        Self { styling, ..self }.touched()
    }

    /// Return a copy with different time formatting.
    pub fn with_time_formatting(self, time_formatting: Option<TimeFormatting>) -> Self {
        Self {
            time_formatting,
            ..self
        }
        .touched()
    }

    /// Whether the x-axis is temporal for this configuration.
    pub fn is_temporal(&self) -> bool {
        self.time_formatting.as_ref().is_some_and(|tf| tf.enabled)
    }

    fn touched(mut self) -> Self {
        self.render_spec = None;
        self.updated_at = Utc::now();
        self
    }
}
