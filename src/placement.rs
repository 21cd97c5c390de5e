//! Canvas placement math: pointer-drag deltas to canvas-relative pixel offsets.
//!
//! All inputs are screen-space rectangles and deltas in CSS pixels, as measured
//! by the host at drag start (`initial`) and at drop (`canvas`). A new widget
//! dropped from the list and an existing widget moved on the canvas go through
//! the same formula, so a reposition and a first placement are
//! indistinguishable to the renderer.

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

/// A screen-space point or displacement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned screen-space rectangle (a DOM bounding rect).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// The same rectangle shifted by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Point) -> Self {
        Self { left: self.left + delta.x, top: self.top + delta.y, ..*self }
    }

    /// Whether the rectangle has a finite origin and size. Empty is allowed.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.top.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Whether the rectangle was actually laid out: finite and non-empty.
    #[must_use]
    pub fn is_measurable(&self) -> bool {
        self.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Area of overlap with `other`; zero when they only touch or are disjoint.
    #[must_use]
    pub fn overlap_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.left.max(other.left);
        let h = self.bottom().min(other.bottom()) - self.top.max(other.top);
        if w > 0.0 && h > 0.0 { w * h } else { 0.0 }
    }
}

/// Integer pixel offset of a widget relative to the canvas origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasPosition {
    pub left: i32,
    pub top: i32,
}

/// Position for a widget dropped from the saved list onto the canvas.
///
/// `initial` is the list entry's rectangle at drag start, `delta` the total
/// pointer displacement of the gesture, `canvas` the canvas rectangle at drop.
/// Returns `None` when the canvas is not measurable or any input is non-finite.
#[must_use]
pub fn place_new(initial: Rect, delta: Point, canvas: Rect) -> Option<CanvasPosition> {
    canvas_offset(initial, delta, canvas)
}

/// Position for a widget already on the canvas after it is dragged.
///
/// Same contract as [`place_new`]; `initial` is the placed widget's rectangle.
#[must_use]
pub fn move_existing(initial: Rect, delta: Point, canvas: Rect) -> Option<CanvasPosition> {
    canvas_offset(initial, delta, canvas)
}

/// Whether a dragged rectangle overlaps the drop target at all.
#[must_use]
pub fn collides(dragged: &Rect, target: &Rect) -> bool {
    dragged.is_finite() && target.is_measurable() && dragged.overlap_area(target) > 0.0
}

fn canvas_offset(initial: Rect, delta: Point, canvas: Rect) -> Option<CanvasPosition> {
    if !canvas.is_measurable() || !initial.is_finite() || !delta.is_finite() {
        return None;
    }
    let left = round_px(initial.left + delta.x - canvas.left)?;
    let top = round_px(initial.top + delta.y - canvas.top)?;
    Some(CanvasPosition { left, top })
}

/// Round half toward positive infinity (`-2.5 -> -2`, `2.5 -> 3`).
#[allow(clippy::cast_possible_truncation)]
fn round_px(v: f64) -> Option<i32> {
    let rounded = (v + 0.5).floor();
    if rounded < f64::from(i32::MIN) || rounded > f64::from(i32::MAX) {
        return None;
    }
    Some(rounded as i32)
}
