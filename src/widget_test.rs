#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

fn bar_widget(name: &str) -> WidgetConfig {
    WidgetConfig {
        widget_name: name.into(),
        project_id: "P1".into(),
        project_name: "Apollo".into(),
        confirmed_column_keys: vec!["Name".into(), "Progress.ProgressRate".into()],
        chart: ChartConfig::Bar(BarParams {
            index_by: "Name".into(),
            keys: vec!["Progress.ProgressRate".into()],
            ..BarParams::default()
        }),
    }
}

// =============================================================
// ChartType
// =============================================================

#[test]
fn chart_type_serde_lowercase() {
    assert_eq!(serde_json::to_string(&ChartType::Pie).unwrap(), "\"pie\"");
    let back: ChartType = serde_json::from_str("\"line\"").unwrap();
    assert_eq!(back, ChartType::Line);
}

#[test]
fn chart_type_parses_from_str() {
    assert_eq!("bar".parse::<ChartType>().unwrap(), ChartType::Bar);
    assert!("donut".parse::<ChartType>().is_err());
}

#[test]
fn curve_serde_matches_renderer_names() {
    assert_eq!(serde_json::to_string(&Curve::MonotoneX).unwrap(), "\"monotoneX\"");
    assert_eq!(serde_json::to_string(&Curve::Step).unwrap(), "\"step\"");
}

// =============================================================
// Wire format
// =============================================================

#[test]
fn serializes_only_active_bag() {
    let value = serde_json::to_value(bar_widget("W1")).unwrap();
    assert_eq!(value["widgetName"], "W1");
    assert_eq!(value["chartType"], "bar");
    assert_eq!(value["projectId"], "P1");
    assert_eq!(value["confirmedColumnKeys"], json!(["Name", "Progress.ProgressRate"]));
    assert_eq!(value["params"]["indexBy"], "Name");
    assert_eq!(value["params"]["keys"], json!(["Progress.ProgressRate"]));
    assert!(value["params"].get("xKey").is_none());
    assert!(value["params"].get("idKey").is_none());
}

#[test]
fn roundtrip_preserves_record() {
    let widget = bar_widget("W1");
    let json = serde_json::to_string(&widget).unwrap();
    let back: WidgetConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, widget);
}

#[test]
fn missing_params_fall_back_to_defaults() {
    let widget = WidgetConfig::from_value(json!({
        "widgetName": "Sparse",
        "chartType": "line",
        "params": { "xKey": "StartDate", "curve": "step", "pointSize": null },
    }))
    .unwrap();
    let ChartConfig::Line(params) = &widget.chart else {
        panic!("expected line chart");
    };
    assert_eq!(params.x_key, "StartDate");
    assert_eq!(params.curve, Curve::Step);
    assert_eq!(params.point_size, LineParams::default().point_size);
    assert_eq!(widget.project_id, "");
    assert!(widget.confirmed_column_keys.is_empty());
}

#[test]
fn record_without_name_is_invalid() {
    assert!(WidgetConfig::from_value(json!({ "chartType": "bar" })).is_err());
}

#[test]
fn record_with_unknown_chart_type_is_invalid() {
    let err = WidgetConfig::from_value(json!({ "widgetName": "x", "chartType": "donut" })).unwrap_err();
    assert!(matches!(err, WidgetError::InvalidRecord(_)));
}

#[test]
fn duplicate_confirmed_keys_are_collapsed() {
    let widget = WidgetConfig::from_value(json!({
        "widgetName": "dups",
        "chartType": "pie",
        "confirmedColumnKeys": ["Name", "Name", "Type"],
        "params": {},
    }))
    .unwrap();
    assert_eq!(widget.confirmed_column_keys, vec!["Name", "Type"]);
}

// =============================================================
// Legacy flat records
// =============================================================

#[test]
fn legacy_record_takes_only_active_prefix() {
    let widget = WidgetConfig::from_value(json!({
        "widgetName": "Legacy",
        "chartType": "line",
        "projectId": "P9",
        "projectName": "Old",
        "confirmedTaskColumnKeys": ["StartDate", "Progress.ProgressRate", "Name"],
        "barChartIndexBy": "Name",
        "barChartKeys": ["Progress.ProgressRate"],
        "barChartPadding": 0.8,
        "lineChartXKey": "StartDate",
        "lineChartYKeys": ["Progress.ProgressRate"],
        "lineChartCurve": "monotoneX",
        "lineChartMarginTop": 12,
        "lineChartUseThemeBackgroundForPointColor": false,
        "lineChartColorsScheme": "set2",
        "pieChartIdKey": "Name",
    }))
    .unwrap();

    assert_eq!(widget.chart_type(), ChartType::Line);
    assert_eq!(widget.confirmed_column_keys, vec!["StartDate", "Progress.ProgressRate", "Name"]);
    let ChartConfig::Line(params) = &widget.chart else {
        panic!("expected line chart");
    };
    assert_eq!(params.x_key, "StartDate");
    assert_eq!(params.y_keys, vec!["Progress.ProgressRate"]);
    assert_eq!(params.curve, Curve::MonotoneX);
    assert_eq!(params.margin_top, 12);
    assert!(!params.use_theme_background_for_point_color);
    assert_eq!(params.colors_scheme, "set2");

    let saved = serde_json::to_value(&widget).unwrap();
    assert!(saved.get("barChartIndexBy").is_none());
    assert!(saved["params"].get("indexBy").is_none());
}

#[test]
fn legacy_null_numbers_use_defaults() {
    let widget = WidgetConfig::from_value(json!({
        "widgetName": "NaN heights",
        "chartType": "bar",
        "barChartHeight": null,
        "barChartWidth": 640,
    }))
    .unwrap();
    assert_eq!(widget.chart.size(), (640, DEFAULT_WIDGET_HEIGHT));
}

#[test]
fn legacy_free_text_width_falls_back_per_field() {
    let widget = WidgetConfig::from_value(json!({
        "widgetName": "Legacy",
        "chartType": "bar",
        "projectId": "P1",
        "barChartIndexBy": "Name",
        "barChartKeys": ["Progress.ProgressRate"],
        "barChartWidth": "94%",
        "barChartHeight": 420,
        "barChartPadding": 0.5,
    }))
    .unwrap();
    let ChartConfig::Bar(params) = &widget.chart else {
        panic!("expected bar chart");
    };
    assert_eq!(params.width, DEFAULT_WIDGET_WIDTH);
    assert_eq!(params.height, 420);
    assert_eq!(params.index_by, "Name");
    assert!((params.padding - 0.5).abs() < f64::EPSILON);
}

#[test]
fn mistyped_current_params_keep_other_fields() {
    let widget = WidgetConfig::from_value(json!({
        "widgetName": "Odd",
        "chartType": "line",
        "params": { "xKey": "StartDate", "yKeys": "Progress.ProgressRate", "curve": "zigzag", "pointSize": 6 },
    }))
    .unwrap();
    let ChartConfig::Line(params) = &widget.chart else {
        panic!("expected line chart");
    };
    assert_eq!(params.x_key, "StartDate");
    assert!(params.y_keys.is_empty());
    assert_eq!(params.curve, Curve::Linear);
    assert_eq!(params.point_size, 6);
}

#[test]
fn lower_first_handles_axis_names() {
    assert_eq!(lower_first("XKey"), "xKey");
    assert_eq!(lower_first("IndexBy"), "indexBy");
    assert_eq!(lower_first(""), "");
}

// =============================================================
// ChartConfig
// =============================================================

#[test]
fn switching_type_starts_from_defaults() {
    let line = ChartConfig::for_type(ChartType::Line);
    assert_eq!(line.chart_type(), ChartType::Line);
    assert_eq!(line, ChartConfig::Line(LineParams::default()));
}

#[test]
fn column_refs_skip_empty_keys() {
    let pie = ChartConfig::Pie(PieParams { id_key: "Type".into(), ..PieParams::default() });
    assert_eq!(pie.column_refs(), vec!["Type"]);
    let bar = bar_widget("x").chart;
    assert_eq!(bar.column_refs(), vec!["Name", "Progress.ProgressRate"]);
}

#[test]
fn retain_columns_clears_unknown_refs() {
    let mut chart = ChartConfig::Line(LineParams {
        x_key: "StartDate".into(),
        y_keys: vec!["A".into(), "B".into()],
        ..LineParams::default()
    });
    let allowed: BTreeSet<String> = ["B".to_string()].into_iter().collect();
    chart.retain_columns(&allowed);
    let ChartConfig::Line(params) = chart else {
        panic!("expected line chart");
    };
    assert_eq!(params.x_key, "");
    assert_eq!(params.y_keys, vec!["B"]);
}

#[test]
fn required_keys_per_type() {
    assert!(!ChartConfig::for_type(ChartType::Bar).has_required_keys());
    assert!(bar_widget("x").chart.has_required_keys());
    let pie = ChartConfig::Pie(PieParams { id_key: "Type".into(), ..PieParams::default() });
    assert!(pie.has_required_keys());
}

#[test]
fn size_falls_back_when_zero() {
    let chart = ChartConfig::Pie(PieParams { width: 0, height: 0, ..PieParams::default() });
    assert_eq!(chart.size(), (DEFAULT_WIDGET_WIDTH, DEFAULT_WIDGET_HEIGHT));
}

// =============================================================
// Validation
// =============================================================

#[test]
fn validate_accepts_confirmed_keys() {
    assert_eq!(bar_widget("W1").validate(), Ok(()));
}

#[test]
fn validate_rejects_blank_name() {
    assert_eq!(bar_widget("   ").validate(), Err(WidgetError::EmptyName));
}

#[test]
fn validate_rejects_missing_project() {
    let mut widget = bar_widget("W1");
    widget.project_id.clear();
    assert_eq!(widget.validate(), Err(WidgetError::MissingProject));
}

#[test]
fn validate_rejects_unconfirmed_key() {
    let mut widget = bar_widget("W1");
    widget.confirmed_column_keys = vec!["Name".into()];
    assert_eq!(
        widget.validate(),
        Err(WidgetError::UnconfirmedKey { key: "Progress.ProgressRate".into() })
    );
}

#[test]
fn validate_rejects_unknown_color_scheme() {
    let mut widget = bar_widget("W1");
    widget.chart = ChartConfig::Pie(PieParams { colors_scheme: "rainbow".into(), ..PieParams::default() });
    assert_eq!(widget.validate(), Err(WidgetError::UnknownColorScheme("rainbow".into())));
}
