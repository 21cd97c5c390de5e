//! Renderer input: turns a chart configuration plus task records into the
//! rows, series or slices a chart library draws.
//!
//! Every field read goes through [`crate::task::resolve`], so a key missing
//! from a record drops that data point instead of failing the chart.

#[cfg(test)]
#[path = "chart_test.rs"]
mod chart_test;

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::task::{Task, resolve_defined};
use crate::widget::{BarParams, ChartConfig, LineParams, PieParams};

/// Data ready for a chart renderer, tagged by chart type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chartType", rename_all = "lowercase")]
pub enum ChartData {
    Bar {
        #[serde(rename = "indexBy")]
        index_by: String,
        keys: Vec<String>,
        data: Vec<Map<String, Value>>,
    },
    Line {
        data: Vec<LineSeries>,
    },
    Pie {
        data: Vec<PieSlice>,
    },
}

/// One line: the values of a single y column over x.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub id: String,
    pub data: Vec<LinePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    pub x: Value,
    pub y: f64,
}

/// One pie slice: every task sharing an id value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    /// The id value as found in the first task of the group.
    pub id: Value,
    pub label: String,
    pub value: f64,
}

/// Build renderer input, or `None` when the chart cannot draw anything yet
/// (required keys unset, or a pie with no slices).
#[must_use]
pub fn extract(chart: &ChartConfig, tasks: &[Task]) -> Option<ChartData> {
    if !chart.has_required_keys() {
        return None;
    }
    let data = match chart {
        ChartConfig::Bar(p) => ChartData::Bar {
            index_by: p.index_by.clone(),
            keys: p.keys.clone(),
            data: bar_rows(p, tasks),
        },
        ChartConfig::Line(p) => ChartData::Line { data: line_series(p, tasks) },
        ChartConfig::Pie(p) => {
            let slices = pie_slices(p, tasks);
            if slices.is_empty() {
                return None;
            }
            ChartData::Pie { data: slices }
        }
    };
    Some(data)
}

/// One row per task keyed by column path. Tasks without an index value are
/// skipped; value columns a task lacks are left out of its row.
#[must_use]
pub fn bar_rows(params: &BarParams, tasks: &[Task]) -> Vec<Map<String, Value>> {
    tasks
        .iter()
        .filter_map(|task| {
            let index = resolve_defined(task.record(), &params.index_by)?;
            let mut row = Map::new();
            row.insert(params.index_by.clone(), index.clone());
            for key in &params.keys {
                if let Some(value) = resolve_defined(task.record(), key) {
                    row.insert(key.clone(), value.clone());
                }
            }
            Some(row)
        })
        .collect()
}

/// One series per y column, points ordered by x.
///
/// A point exists only where x is defined and y is numeric (a number, a
/// numeric string, or a boolean).
#[must_use]
pub fn line_series(params: &LineParams, tasks: &[Task]) -> Vec<LineSeries> {
    if params.x_key.is_empty() || params.y_keys.is_empty() || tasks.is_empty() {
        return Vec::new();
    }
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by(|a, b| {
        compare_x(
            resolve_defined(a.record(), &params.x_key),
            resolve_defined(b.record(), &params.x_key),
        )
    });

    params
        .y_keys
        .iter()
        .map(|y_key| LineSeries {
            id: y_key.clone(),
            data: ordered
                .iter()
                .filter_map(|task| {
                    let x = resolve_defined(task.record(), &params.x_key)?;
                    let y = resolve_defined(task.record(), y_key).and_then(as_number)?;
                    Some(LinePoint { x: x.clone(), y })
                })
                .collect(),
        })
        .collect()
}

/// Tasks grouped by the stringified id value, in first-seen order.
///
/// With a value column the slice is the sum of its numeric values
/// (non-numeric counts as zero); without one it is the task count.
#[must_use]
pub fn pie_slices(params: &PieParams, tasks: &[Task]) -> Vec<PieSlice> {
    if params.id_key.is_empty() {
        return Vec::new();
    }
    let mut slices: Vec<PieSlice> = Vec::new();
    for task in tasks {
        let Some(id) = resolve_defined(task.record(), &params.id_key) else {
            continue;
        };
        let label = display_string(id);
        let amount = if params.value_key.is_empty() {
            1.0
        } else {
            resolve_defined(task.record(), &params.value_key)
                .and_then(as_number)
                .unwrap_or(0.0)
        };
        match slices.iter_mut().find(|s| s.label == label) {
            Some(slice) => slice.value += amount,
            None => slices.push(PieSlice { id: id.clone(), label, value: amount }),
        }
    }
    slices
}

/// Numeric reading of a field value.
///
/// Numbers as-is, booleans as 0/1, strings when they parse as a number after
/// trimming (blank is 0). Everything else is not numeric.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(0.0);
            }
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Some(n),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Text form of a field value: strings unquoted, everything else as JSON.
#[must_use]
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Total order for x values: numbers ascending, then strings ascending, then
/// everything else (including missing) in input order.
fn compare_x(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            Some(Value::Number(_)) => 0,
            Some(Value::String(_)) => 1,
            _ => 2,
        }
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
