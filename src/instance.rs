//! A saved widget placed on the dashboard canvas.

#[cfg(test)]
#[path = "instance_test.rs"]
mod instance_test;

use uuid::Uuid;

use crate::chart::{self, ChartData};
use crate::consts::WIDGET_TITLE_HEIGHT;
use crate::placement::{CanvasPosition, Rect};
use crate::task::Task;
use crate::widget::WidgetConfig;

/// Hydration state of a placed widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// On the canvas, task data not loaded (yet, or the fetch failed).
    Placed,
    /// Task data loaded.
    Hydrated,
}

/// One placed copy of a saved widget. Several may share a config.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetInstance {
    /// `"{widgetName}-{uuid}"`; never equal to the widget name.
    pub id: String,
    pub config: WidgetConfig,
    pub left: i32,
    pub top: i32,
    pub tasks: Option<Vec<Task>>,
}

impl WidgetInstance {
    #[must_use]
    pub fn new(config: WidgetConfig, position: CanvasPosition) -> Self {
        Self {
            id: new_instance_id(&config.widget_name),
            config,
            left: position.left,
            top: position.top,
            tasks: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> InstanceState {
        if self.tasks.is_some() { InstanceState::Hydrated } else { InstanceState::Placed }
    }

    #[must_use]
    pub fn position(&self) -> CanvasPosition {
        CanvasPosition { left: self.left, top: self.top }
    }

    pub fn move_to(&mut self, position: CanvasPosition) {
        self.left = position.left;
        self.top = position.top;
    }

    pub fn hydrate(&mut self, tasks: Vec<Task>) {
        self.tasks = Some(tasks);
    }

    /// Chart footprint `(width, height)`, 400x300 when the config leaves it unset.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.config.chart.size()
    }

    /// Canvas-relative bounds including the title strip above the chart.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        let (w, h) = self.size();
        Rect::new(
            f64::from(self.left),
            f64::from(self.top),
            f64::from(w),
            f64::from(h.saturating_add(WIDGET_TITLE_HEIGHT)),
        )
    }

    /// Renderer input, or `None` while loading or when the chart cannot draw.
    #[must_use]
    pub fn chart_data(&self) -> Option<ChartData> {
        let tasks = self.tasks.as_deref()?;
        chart::extract(&self.config.chart, tasks)
    }
}

/// Fresh process-local instance id for a widget name.
#[must_use]
pub fn new_instance_id(widget_name: &str) -> String {
    format!("{widget_name}-{}", Uuid::new_v4())
}
