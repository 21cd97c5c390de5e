//! Saved widget configuration: the persisted schema of one chart widget.
//!
//! DESIGN
//! ======
//! A widget names a data source (project), the task columns the user approved,
//! and one chart configuration. The chart configuration is a tagged union
//! (`ChartConfig`), so a bar widget carries bar parameters only; there is no
//! "inactive bag" to ignore.
//!
//! WIRE FORMAT
//! ===========
//! Current records serialize as
//! `{ widgetName, chartType, projectId, projectName, confirmedColumnKeys, params }`.
//! Older records stored every chart type's fields flat (`barChartIndexBy`,
//! `lineChartXKey`, ... plus `confirmedTaskColumnKeys`). Those still load: the
//! fields prefixed for the record's `chartType` become the parameter bag and
//! every other prefixed field is dropped. `null` values, missing fields and
//! fields of the wrong shape (a width typed as `"94%"`) fall back to defaults
//! one field at a time, so one bad field never invalidates a record.

#[cfg(test)]
#[path = "widget_test.rs"]
mod widget_test;

use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::consts::{COLOR_SCHEMES, DEFAULT_COLOR_SCHEME, DEFAULT_WIDGET_HEIGHT, DEFAULT_WIDGET_WIDTH};

// =============================================================================
// ERROR
// =============================================================================

/// Validation failures for a widget configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    #[error("widget name is empty")]
    EmptyName,

    #[error("no project selected")]
    MissingProject,

    /// A chart parameter references a column outside `confirmedColumnKeys`.
    #[error("column `{key}` is not among the confirmed columns")]
    UnconfirmedKey { key: String },

    #[error("unknown color scheme `{0}`")]
    UnknownColorScheme(String),

    #[error("invalid widget record: {0}")]
    InvalidRecord(String),
}

// =============================================================================
// CHART TYPE
// =============================================================================

/// Which chart a widget renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Pie,
}

impl ChartType {
    /// Field-name prefix used by flat legacy records.
    fn legacy_prefix(self) -> &'static str {
        match self {
            Self::Bar => "barChart",
            Self::Line => "lineChart",
            Self::Pie => "pieChart",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
        })
    }
}

impl std::str::FromStr for ChartType {
    type Err = WidgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bar" => Ok(Self::Bar),
            "line" => Ok(Self::Line),
            "pie" => Ok(Self::Pie),
            other => Err(WidgetError::InvalidRecord(format!("unknown chart type `{other}`"))),
        }
    }
}

// =============================================================================
// PARAMETER BAGS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarLayout {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    #[default]
    Stacked,
    Grouped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Curve {
    #[default]
    Linear,
    Cardinal,
    Step,
    MonotoneX,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    /// Categorical x values.
    #[default]
    Point,
    /// Numeric or date x values.
    Linear,
}

/// Bar chart parameters.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BarParams {
    /// Column used as the category axis.
    pub index_by: String,
    /// Columns plotted as bar values.
    pub keys: Vec<String>,
    pub layout: BarLayout,
    pub group_mode: GroupMode,
    pub reverse: bool,
    /// Gap between bars as a fraction of the band, `0.0..=1.0`.
    pub padding: f64,
    pub show_axis_top: bool,
    pub show_axis_right: bool,
    pub show_axis_bottom: bool,
    pub show_axis_left: bool,
    pub enable_grid_x: bool,
    pub enable_grid_y: bool,
    pub enable_label: bool,
    pub label_skip_width: u32,
    pub label_skip_height: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for BarParams {
    fn default() -> Self {
        Self {
            index_by: String::new(),
            keys: Vec::new(),
            layout: BarLayout::Vertical,
            group_mode: GroupMode::Stacked,
            reverse: false,
            padding: 0.3,
            show_axis_top: false,
            show_axis_right: false,
            show_axis_bottom: true,
            show_axis_left: true,
            enable_grid_x: false,
            enable_grid_y: true,
            enable_label: true,
            label_skip_width: 12,
            label_skip_height: 12,
            width: DEFAULT_WIDGET_WIDTH,
            height: DEFAULT_WIDGET_HEIGHT,
        }
    }
}

/// Line chart parameters.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineParams {
    /// Column used for x values; tasks are ordered by it.
    pub x_key: String,
    /// One series per column.
    pub y_keys: Vec<String>,
    pub curve: Curve,
    pub enable_points: bool,
    pub point_size: u32,
    pub enable_area: bool,
    pub line_width: u32,
    pub point_border_width: u32,
    /// `""` (none), `"x"` or `"y"`.
    pub point_label: String,
    pub point_label_y_offset: f64,
    pub use_theme_background_for_point_color: bool,
    pub custom_point_color: String,
    pub area_opacity: f64,
    pub use_mesh: bool,
    pub x_scale_type: ScaleType,
    pub margin_top: u32,
    pub margin_right: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
    pub colors_scheme: String,
    pub enable_grid_x: bool,
    pub enable_grid_y: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            x_key: String::new(),
            y_keys: Vec::new(),
            curve: Curve::Linear,
            enable_points: true,
            point_size: 10,
            enable_area: false,
            line_width: 2,
            point_border_width: 2,
            point_label: String::new(),
            point_label_y_offset: -12.0,
            use_theme_background_for_point_color: true,
            custom_point_color: "#ffffff".into(),
            area_opacity: 0.2,
            use_mesh: true,
            x_scale_type: ScaleType::Point,
            margin_top: 50,
            margin_right: 110,
            margin_bottom: 50,
            margin_left: 60,
            colors_scheme: DEFAULT_COLOR_SCHEME.into(),
            enable_grid_x: true,
            enable_grid_y: true,
            width: DEFAULT_WIDGET_WIDTH,
            height: DEFAULT_WIDGET_HEIGHT,
        }
    }
}

/// Pie chart parameters.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PieParams {
    /// Column whose distinct values become slices.
    pub id_key: String,
    /// Column summed per slice; empty means "count tasks".
    pub value_key: String,
    pub inner_radius: f64,
    pub pad_angle: f64,
    pub corner_radius: f64,
    pub colors_scheme: String,
    pub border_width: u32,
    pub border_color: String,
    pub enable_arc_labels: bool,
    pub arc_label: String,
    pub arc_label_skip_angle: f64,
    pub arc_label_text_color: String,
    pub enable_arc_link_labels: bool,
    pub arc_link_label: String,
    pub arc_link_labels_skip_angle: f64,
    pub arc_link_labels_text_color: String,
    pub start_angle: f64,
    pub end_angle: f64,
    pub sort_by_value: bool,
    pub is_interactive: bool,
    pub role: String,
    pub margin_top: u32,
    pub margin_right: u32,
    pub margin_bottom: u32,
    pub margin_left: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for PieParams {
    fn default() -> Self {
        Self {
            id_key: String::new(),
            value_key: String::new(),
            inner_radius: 0.5,
            pad_angle: 0.7,
            corner_radius: 3.0,
            colors_scheme: DEFAULT_COLOR_SCHEME.into(),
            border_width: 1,
            border_color: "#000000".into(),
            enable_arc_labels: true,
            arc_label: "value".into(),
            arc_label_skip_angle: 10.0,
            arc_label_text_color: "#333333".into(),
            enable_arc_link_labels: true,
            arc_link_label: "id".into(),
            arc_link_labels_skip_angle: 10.0,
            arc_link_labels_text_color: "#333333".into(),
            start_angle: 0.0,
            end_angle: 360.0,
            sort_by_value: false,
            is_interactive: true,
            role: "img".into(),
            margin_top: 40,
            margin_right: 80,
            margin_bottom: 80,
            margin_left: 80,
            width: DEFAULT_WIDGET_WIDTH,
            height: DEFAULT_WIDGET_HEIGHT,
        }
    }
}

// =============================================================================
// CHART CONFIG
// =============================================================================

/// The one active chart configuration of a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartConfig {
    Bar(BarParams),
    Line(LineParams),
    Pie(PieParams),
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self::Bar(BarParams::default())
    }
}

impl ChartConfig {
    /// Default parameters for a chart type.
    #[must_use]
    pub fn for_type(chart_type: ChartType) -> Self {
        match chart_type {
            ChartType::Bar => Self::Bar(BarParams::default()),
            ChartType::Line => Self::Line(LineParams::default()),
            ChartType::Pie => Self::Pie(PieParams::default()),
        }
    }

    #[must_use]
    pub fn chart_type(&self) -> ChartType {
        match self {
            Self::Bar(_) => ChartType::Bar,
            Self::Line(_) => ChartType::Line,
            Self::Pie(_) => ChartType::Pie,
        }
    }

    /// Every column key referenced by the parameters, empty ones excluded.
    #[must_use]
    pub fn column_refs(&self) -> Vec<&str> {
        let refs: Vec<&str> = match self {
            Self::Bar(p) => std::iter::once(p.index_by.as_str())
                .chain(p.keys.iter().map(String::as_str))
                .collect(),
            Self::Line(p) => std::iter::once(p.x_key.as_str())
                .chain(p.y_keys.iter().map(String::as_str))
                .collect(),
            Self::Pie(p) => vec![p.id_key.as_str(), p.value_key.as_str()],
        };
        refs.into_iter().filter(|k| !k.is_empty()).collect()
    }

    /// Drop column references that are not in `allowed`.
    pub fn retain_columns(&mut self, allowed: &BTreeSet<String>) {
        let keep = |key: &mut String| {
            if !allowed.contains(key.as_str()) {
                key.clear();
            }
        };
        match self {
            Self::Bar(p) => {
                keep(&mut p.index_by);
                p.keys.retain(|k| allowed.contains(k));
            }
            Self::Line(p) => {
                keep(&mut p.x_key);
                p.y_keys.retain(|k| allowed.contains(k));
            }
            Self::Pie(p) => {
                keep(&mut p.id_key);
                keep(&mut p.value_key);
            }
        }
    }

    /// Whether enough keys are set for the chart to draw anything.
    #[must_use]
    pub fn has_required_keys(&self) -> bool {
        match self {
            Self::Bar(p) => !p.index_by.is_empty() && !p.keys.is_empty(),
            Self::Line(p) => !p.x_key.is_empty() && !p.y_keys.is_empty(),
            Self::Pie(p) => !p.id_key.is_empty(),
        }
    }

    /// Canvas footprint `(width, height)`; zero dimensions fall back to defaults.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        let (w, h) = match self {
            Self::Bar(p) => (p.width, p.height),
            Self::Line(p) => (p.width, p.height),
            Self::Pie(p) => (p.width, p.height),
        };
        let w = if w == 0 { DEFAULT_WIDGET_WIDTH } else { w };
        let h = if h == 0 { DEFAULT_WIDGET_HEIGHT } else { h };
        (w, h)
    }

    fn colors_scheme(&self) -> Option<&str> {
        match self {
            Self::Bar(_) => None,
            Self::Line(p) => Some(&p.colors_scheme),
            Self::Pie(p) => Some(&p.colors_scheme),
        }
    }

    /// Decode a parameter bag for `chart_type`. Never fails; see [`lenient_params`].
    fn from_bag(chart_type: ChartType, bag: Map<String, Value>) -> Self {
        match chart_type {
            ChartType::Bar => Self::Bar(lenient_params(bag)),
            ChartType::Line => Self::Line(lenient_params(bag)),
            ChartType::Pie => Self::Pie(lenient_params(bag)),
        }
    }
}

/// Merge `bag` over the defaults one field at a time.
///
/// A field whose value does not fit its type (a legacy `"94%"` width, a
/// string where a list belongs) keeps its default. Unknown fields are dropped.
fn lenient_params<P>(bag: Map<String, Value>) -> P
where
    P: Default + Serialize + DeserializeOwned,
{
    let mut merged = match serde_json::to_value(P::default()) {
        Ok(Value::Object(map)) => map,
        _ => return P::default(),
    };
    for (field, value) in bag {
        let Some(slot) = merged.get_mut(&field) else {
            continue;
        };
        let previous = std::mem::replace(slot, value);
        if let Err(e) = serde_json::from_value::<P>(Value::Object(merged.clone())) {
            warn!(%field, error = %e, "chart parameter does not fit; using default");
            merged.insert(field, previous);
        }
    }
    serde_json::from_value(Value::Object(merged)).unwrap_or_default()
}

// =============================================================================
// WIDGET CONFIG
// =============================================================================

/// One saved widget. `widget_name` is its identity within the store.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(try_from = "WireWidget")]
pub struct WidgetConfig {
    pub widget_name: String,
    pub project_id: String,
    pub project_name: String,
    /// Columns approved for charting, in confirmation order, no duplicates.
    pub confirmed_column_keys: Vec<String>,
    pub chart: ChartConfig,
}

impl WidgetConfig {
    #[must_use]
    pub fn chart_type(&self) -> ChartType {
        self.chart.chart_type()
    }

    /// Confirmed columns as a set.
    #[must_use]
    pub fn confirmed_set(&self) -> BTreeSet<String> {
        self.confirmed_column_keys.iter().cloned().collect()
    }

    /// Check the record before it is saved.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: blank name, missing project, a chart
    /// key outside the confirmed columns, or an unknown color scheme.
    pub fn validate(&self) -> Result<(), WidgetError> {
        if self.widget_name.trim().is_empty() {
            return Err(WidgetError::EmptyName);
        }
        if self.project_id.is_empty() {
            return Err(WidgetError::MissingProject);
        }
        if let Some(key) = self
            .chart
            .column_refs()
            .into_iter()
            .find(|k| !self.confirmed_column_keys.iter().any(|c| c == k))
        {
            return Err(WidgetError::UnconfirmedKey { key: key.to_string() });
        }
        if let Some(scheme) = self.chart.colors_scheme() {
            if !COLOR_SCHEMES.contains(&scheme) {
                return Err(WidgetError::UnknownColorScheme(scheme.to_string()));
            }
        }
        Ok(())
    }

    /// Parse one stored record (current or legacy layout).
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::InvalidRecord`] when the value is not a widget.
    pub fn from_value(value: Value) -> Result<Self, WidgetError> {
        serde_json::from_value(value).map_err(|e| WidgetError::InvalidRecord(e.to_string()))
    }
}

// --- Wire format ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredWidget<'a> {
    widget_name: &'a str,
    chart_type: ChartType,
    project_id: &'a str,
    project_name: &'a str,
    confirmed_column_keys: &'a [String],
    params: StoredParams<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum StoredParams<'a> {
    Bar(&'a BarParams),
    Line(&'a LineParams),
    Pie(&'a PieParams),
}

impl Serialize for WidgetConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let params = match &self.chart {
            ChartConfig::Bar(p) => StoredParams::Bar(p),
            ChartConfig::Line(p) => StoredParams::Line(p),
            ChartConfig::Pie(p) => StoredParams::Pie(p),
        };
        StoredWidget {
            widget_name: &self.widget_name,
            chart_type: self.chart_type(),
            project_id: &self.project_id,
            project_name: &self.project_name,
            confirmed_column_keys: &self.confirmed_column_keys,
            params,
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireWidget {
    widget_name: String,
    #[serde(default)]
    chart_type: ChartType,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default, alias = "confirmedTaskColumnKeys")]
    confirmed_column_keys: Option<Vec<String>>,
    #[serde(default)]
    params: Option<Map<String, Value>>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl TryFrom<WireWidget> for WidgetConfig {
    type Error = WidgetError;

    fn try_from(wire: WireWidget) -> Result<Self, Self::Error> {
        let bag = match wire.params {
            Some(params) => params.into_iter().filter(|(_, v)| !v.is_null()).collect(),
            None => legacy_bag(wire.chart_type, &wire.rest),
        };
        let chart = ChartConfig::from_bag(wire.chart_type, bag);

        let mut confirmed: Vec<String> = Vec::new();
        for key in wire.confirmed_column_keys.unwrap_or_default() {
            if !confirmed.contains(&key) {
                confirmed.push(key);
            }
        }

        Ok(Self {
            widget_name: wire.widget_name,
            project_id: wire.project_id.unwrap_or_default(),
            project_name: wire.project_name.unwrap_or_default(),
            confirmed_column_keys: confirmed,
            chart,
        })
    }
}

/// Collect the flat `<prefix>Field` entries of a legacy record as a `field` bag.
fn legacy_bag(chart_type: ChartType, rest: &Map<String, Value>) -> Map<String, Value> {
    let prefix = chart_type.legacy_prefix();
    rest.iter()
        .filter(|(_, v)| !v.is_null())
        .filter_map(|(k, v)| {
            let field = k.strip_prefix(prefix)?;
            Some((lower_first(field), v.clone()))
        })
        .collect()
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
