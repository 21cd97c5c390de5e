//! Shared constants for the widget builder and dashboard.

// ── Storage ─────────────────────────────────────────────────────

/// Key of the single storage slot holding the saved widget list.
pub const SAVED_WIDGETS_KEY: &str = "savedWidgets";

// ── Canvas ──────────────────────────────────────────────────────

/// Drop-target id of the dashboard canvas.
pub const CANVAS_DROP_ID: &str = "dashboard-canvas";

/// Prefix for drag ids of entries in the saved-widget list.
pub const LIST_WIDGET_ID_PREFIX: &str = "list-widget-";

/// Prefix for drag ids of widgets already placed on the canvas.
pub const CANVAS_WIDGET_ID_PREFIX: &str = "canvas-widget-";

/// Canvas footprint width used when a widget has no explicit width.
pub const DEFAULT_WIDGET_WIDTH: u32 = 400;

/// Canvas footprint height used when a widget has no explicit height.
pub const DEFAULT_WIDGET_HEIGHT: u32 = 300;

/// Height of the title strip above each placed chart, in pixels.
pub const WIDGET_TITLE_HEIGHT: u32 = 25;

// ── Chart ───────────────────────────────────────────────────────

/// Color schemes accepted for line and pie charts.
pub const COLOR_SCHEMES: &[&str] = &[
    "nivo",
    "category10",
    "accent",
    "dark2",
    "paired",
    "pastel1",
    "pastel2",
    "set1",
    "set2",
    "set3",
    "brown_blueGreen",
    "purpleRed_green",
    "pink_yellowGreen",
    "purple_orange",
    "red_blue",
    "red_grey",
    "red_yellow_blue",
    "red_yellow_green",
    "spectral",
];

/// Color scheme applied when none is chosen.
pub const DEFAULT_COLOR_SCHEME: &str = "nivo";
