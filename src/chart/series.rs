//! Row-to-series transformation: x-value coercion, sorting, grouping, and
//! null-safe series construction.
//!
//! Unsorted input must never reach series construction - line and area
//! rendering assume monotonic x - so every builder here starts from
//! [`sorted_rows`]. Null or uncoercible x-values sort last and are excluded
//! from plotted points.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::{json, Value};

use crate::chart::types::FieldMapping;
use crate::time::range::parse_absolute;
use crate::time::to_epoch_ms;
use crate::Row;

// ============================================================================
// X-Value Coercion
// ============================================================================

/// A coerced x-axis value: epoch milliseconds or numeric for temporal/numeric
/// axes, text for categorical ones.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum XValue {
    Number(f64),
    Text(String),
}

impl XValue {
    /// Category label for this value.
    pub(crate) fn label(&self) -> String {
        match self {
            XValue::Number(n) if n.fract() == 0.0 && n.abs() < 9e15 => format!("{}", *n as i64),
            XValue::Number(n) => format!("{}", n),
            XValue::Text(s) => s.clone(),
        }
    }
}

/// Coerce one raw x-value.
///
/// With `temporal` set, numeric values are rescaled to epoch milliseconds via
/// magnitude classification, numeric-looking strings are parsed then
/// rescaled, and other strings go through a generic date parse. Returns
/// `None` for nulls and uncoercible values.
pub(crate) fn coerce_x(value: &Value, temporal: bool) -> Option<XValue> {
    if temporal {
        if let Some(n) = value.as_f64() {
            return Some(XValue::Number(to_epoch_ms(n)));
        }
        if let Some(s) = value.as_str() {
            if let Ok(n) = s.parse::<f64>() {
                return Some(XValue::Number(to_epoch_ms(n)));
            }
            return parse_absolute(s).map(|dt| XValue::Number(dt.timestamp_millis() as f64));
        }
        return None;
    }
    match value {
        Value::Number(n) => n.as_f64().map(XValue::Number),
        Value::String(s) => Some(XValue::Text(s.clone())),
        Value::Bool(b) => Some(XValue::Text(b.to_string())),
        _ => None,
    }
}

/// Numeric y-value, passing numbers through and parsing numeric-looking
/// strings; anything else becomes a null point.
fn y_value(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Number(n)) => json!(n),
        Some(Value::String(s)) => s.parse::<f64>().map(|n| json!(n)).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

// ============================================================================
// Sorting
// ============================================================================

/// Pair every row with its coerced x-value and sort ascending, nulls last.
///
/// Numeric compare for numeric/temporal x, string compare otherwise. The sort
/// is stable, so equal keys keep input order.
pub(crate) fn sorted_rows<'a>(
    rows: &'a [Row],
    x_field: &str,
    temporal: bool,
) -> Vec<(&'a Row, Option<XValue>)> {
    let mut keyed: Vec<(&Row, Option<XValue>)> = rows
        .iter()
        .map(|row| {
            let x = row.get(x_field).and_then(|value| coerce_x(value, temporal));
            (row, x)
        })
        .collect();
    keyed.sort_by(|(_, a), (_, b)| cmp_x(a, b));
    keyed
}

fn cmp_x(a: &Option<XValue>, b: &Option<XValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(XValue::Number(x)), Some(XValue::Number(y))) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Some(XValue::Text(x)), Some(XValue::Text(y))) => x.cmp(y),
        (Some(XValue::Number(_)), Some(XValue::Text(_))) => Ordering::Less,
        (Some(XValue::Text(_)), Some(XValue::Number(_))) => Ordering::Greater,
    }
}

// ============================================================================
// Series Construction
// ============================================================================

/// One named series of plottable points.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeriesData {
    pub name: String,
    /// `[x, y]` pairs for temporal axes, plain y-values (aligned to
    /// `categories`) otherwise.
    pub points: Vec<Value>,
}

/// Output of series construction for one chart.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SeriesSet {
    pub series: Vec<SeriesData>,
    /// Explicit category labels for categorical axes, `None` for temporal.
    pub categories: Option<Vec<String>>,
    /// Whether a renderer may visually bridge null points. Disabled for
    /// grouped categorical series, where a null marks an absent combination.
    pub connect_nulls: bool,
}

/// Build line/area series, branching on axis type and grouping.
pub(crate) fn build_line_series(
    rows: &[Row],
    mapping: &FieldMapping,
    temporal: bool,
) -> SeriesSet {
    let keyed = sorted_rows(rows, &mapping.x_axis, temporal);

    match (temporal, mapping.group_by.as_deref()) {
        (true, Some(group_field)) => {
            let mut groups: Vec<SeriesData> = Vec::new();
            for (row, x) in &keyed {
                let Some(XValue::Number(x)) = x else { continue };
                let name = group_label(row.get(group_field));
                let point = json!([x, y_value(row.get(&mapping.y_axis))]);
                match groups.iter_mut().find(|g| g.name == name) {
                    Some(series) => series.points.push(point),
                    None => groups.push(SeriesData {
                        name,
                        points: vec![point],
                    }),
                }
            }
            SeriesSet {
                series: groups,
                categories: None,
                connect_nulls: true,
            }
        }
        (true, None) => {
            let points = keyed
                .iter()
                .filter_map(|(row, x)| match x {
                    Some(XValue::Number(x)) => {
                        Some(json!([x, y_value(row.get(&mapping.y_axis))]))
                    }
                    _ => None,
                })
                .collect();
            SeriesSet {
                series: vec![SeriesData {
                    name: mapping.y_axis.clone(),
                    points,
                }],
                categories: None,
                connect_nulls: true,
            }
        }
        (false, Some(group_field)) => {
            let categories = unified_categories(&keyed);
            let mut group_order: Vec<String> = Vec::new();
            let mut cells: HashMap<(String, String), Value> = HashMap::new();
            for (row, x) in &keyed {
                let Some(x) = x else { continue };
                let name = group_label(row.get(group_field));
                if !group_order.contains(&name) {
                    group_order.push(name.clone());
                }
                cells.insert((name, x.label()), y_value(row.get(&mapping.y_axis)));
            }
            let series = group_order
                .into_iter()
                .map(|name| {
                    let points = categories
                        .iter()
                        .map(|category| {
                            cells
                                .get(&(name.clone(), category.clone()))
                                .cloned()
                                .unwrap_or(Value::Null)
                        })
                        .collect();
                    SeriesData { name, points }
                })
                .collect();
            SeriesSet {
                series,
                categories: Some(categories),
                connect_nulls: false,
            }
        }
        (false, None) => {
            let mut categories = Vec::new();
            let mut points = Vec::new();
            for (row, x) in &keyed {
                let Some(x) = x else { continue };
                categories.push(x.label());
                points.push(y_value(row.get(&mapping.y_axis)));
            }
            SeriesSet {
                series: vec![SeriesData {
                    name: mapping.y_axis.clone(),
                    points,
                }],
                categories: Some(categories),
                connect_nulls: true,
            }
        }
    }
}

/// Build bar series: one value per category, summed per group, zero-filled
/// for absent combinations (a bar renders even at zero, unlike a line gap).
pub(crate) fn build_bar_series(rows: &[Row], mapping: &FieldMapping, temporal: bool) -> SeriesSet {
    let keyed = sorted_rows(rows, &mapping.x_axis, temporal);
    let categories = unified_categories(&keyed);

    let mut group_order: Vec<String> = Vec::new();
    let mut sums: HashMap<(String, String), f64> = HashMap::new();
    for (row, x) in &keyed {
        let Some(x) = x else { continue };
        let name = match mapping.group_by.as_deref() {
            Some(group_field) => group_label(row.get(group_field)),
            None => mapping.y_axis.clone(),
        };
        if !group_order.contains(&name) {
            group_order.push(name.clone());
        }
        let y = y_value(row.get(&mapping.y_axis)).as_f64().unwrap_or(0.0);
        *sums.entry((name, x.label())).or_insert(0.0) += y;
    }

    let series = group_order
        .into_iter()
        .map(|name| {
            let points = categories
                .iter()
                .map(|category| {
                    json!(sums
                        .get(&(name.clone(), category.clone()))
                        .copied()
                        .unwrap_or(0.0))
                })
                .collect();
            SeriesData { name, points }
        })
        .collect();

    SeriesSet {
        series,
        categories: Some(categories),
        connect_nulls: true,
    }
}

/// Union of observed x-categories, sorted - numeric compare when every label
/// parses as a number, string compare otherwise.
fn unified_categories(keyed: &[(&Row, Option<XValue>)]) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for (_, x) in keyed {
        let Some(x) = x else { continue };
        let label = x.label();
        if !categories.contains(&label) {
            categories.push(label);
        }
    }
    let all_numeric = categories.iter().all(|c| c.parse::<f64>().is_ok());
    if all_numeric {
        categories.sort_by(|a, b| {
            let a: f64 = a.parse().unwrap_or(f64::MAX);
            let b: f64 = b.parse().unwrap_or(f64::MAX);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
    } else {
        categories.sort();
    }
    categories
}

fn group_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "null".to_string(),
        Some(other) => other.to_string(),
    }
}
