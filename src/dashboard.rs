//! Dashboard session: saved-widget list, drag-and-drop onto the canvas,
//! placed instances and their task hydration.
//!
//! DESIGN
//! ======
//! The host owns the DOM and the network. It reports drag events with
//! measured rectangles; the session answers with [`Action`]s. Task fetches
//! are requested as `Action::FetchTasks` carrying a generation ticket, and the
//! result comes back through [`Dashboard::apply_tasks`]. A result whose ticket
//! is no longer the latest for its instance is dropped, so a slow response
//! can never overwrite a newer one.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here is fatal. Drops outside the canvas and unmeasurable geometry
//! are ignored; fetch and store failures become a status message.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::consts::{CANVAS_DROP_ID, CANVAS_WIDGET_ID_PREFIX, LIST_WIDGET_ID_PREFIX};
use crate::context_menu::{ContextMenu, ContextMenuState, MenuAction, MenuOutcome, MouseButton};
use crate::instance::WidgetInstance;
use crate::placement::{self, Point, Rect};
use crate::source::{SourceError, TaskSource};
use crate::store::{KvStorage, StoreError, WidgetStore};
use crate::task::Task;
use crate::widget::WidgetConfig;

/// What is being dragged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    /// An entry of the saved-widget list, by widget name.
    ListWidget { widget_name: String },
    /// A widget already on the canvas, by instance id.
    CanvasWidget { id: String },
}

impl DragSource {
    /// Drag id as seen by the host's drag-and-drop layer.
    ///
    /// Both kinds carry their own prefix, so a widget name that happens to
    /// start with the list prefix still routes as a canvas widget.
    #[must_use]
    pub fn drag_id(&self) -> String {
        match self {
            Self::ListWidget { widget_name } => format!("{LIST_WIDGET_ID_PREFIX}{widget_name}"),
            Self::CanvasWidget { id } => format!("{CANVAS_WIDGET_ID_PREFIX}{id}"),
        }
    }

    /// Inverse of [`DragSource::drag_id`]; `None` for ids it never produces.
    #[must_use]
    pub fn from_drag_id(drag_id: &str) -> Option<Self> {
        if let Some(id) = drag_id.strip_prefix(CANVAS_WIDGET_ID_PREFIX) {
            return Some(Self::CanvasWidget { id: id.to_string() });
        }
        drag_id
            .strip_prefix(LIST_WIDGET_ID_PREFIX)
            .map(|widget_name| Self::ListWidget { widget_name: widget_name.to_string() })
    }
}

/// A drag in progress.
#[derive(Debug, Clone, PartialEq)]
struct DragState {
    source: DragSource,
    /// Screen rectangle of the dragged element at drag start.
    initial: Rect,
}

/// Effects returned to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// A new instance was placed on the canvas.
    InstancePlaced { instance_id: String },
    /// An existing instance moved.
    InstanceMoved { instance_id: String },
    /// Fetch the tasks of `project_id` and report back via `apply_tasks`.
    FetchTasks { instance_id: String, project_id: String, generation: u64 },
}

#[derive(Debug, Default)]
pub struct Dashboard {
    saved: Vec<WidgetConfig>,
    instances: Vec<WidgetInstance>,
    drag: Option<DragState>,
    menu: ContextMenuState,
    /// Latest outstanding fetch ticket per instance.
    pending: HashMap<String, u64>,
    next_generation: u64,
    status: Option<String>,
}

impl Dashboard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Saved list ---

    /// Reload the saved-widget list from the store.
    pub fn load<S: KvStorage>(&mut self, store: &mut WidgetStore<S>) {
        self.saved = store.load_all().to_vec();
        debug!(count = self.saved.len(), "saved widget list loaded");
    }

    #[must_use]
    pub fn saved_widgets(&self) -> &[WidgetConfig] {
        &self.saved
    }

    // --- Queries ---

    #[must_use]
    pub fn instances(&self) -> &[WidgetInstance] {
        &self.instances
    }

    #[must_use]
    pub fn instance(&self, id: &str) -> Option<&WidgetInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// Last user-facing problem (failed fetch, failed delete).
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// The config of whatever is being dragged, for a drag overlay.
    #[must_use]
    pub fn active_widget(&self) -> Option<&WidgetConfig> {
        match &self.drag.as_ref()?.source {
            DragSource::ListWidget { widget_name } => self.saved.iter().find(|w| &w.widget_name == widget_name),
            DragSource::CanvasWidget { id } => self.instance(id).map(|i| &i.config),
        }
    }

    // --- Drag and drop ---

    pub fn drag_start(&mut self, source: DragSource, initial: Rect) {
        debug!(drag_id = %source.drag_id(), "drag start");
        self.drag = Some(DragState { source, initial });
    }

    pub fn drag_cancel(&mut self) {
        self.drag = None;
    }

    /// The drop target under a dragged rectangle, for hosts without their own
    /// collision detection.
    #[must_use]
    pub fn detect_over(dragged: &Rect, canvas: &Rect) -> Option<&'static str> {
        placement::collides(dragged, canvas).then_some(CANVAS_DROP_ID)
    }

    /// Finish the current drag.
    ///
    /// `delta` is the total pointer displacement, `over` the drop target id
    /// (`None` when released over nothing), `canvas` the canvas rectangle now.
    pub fn drag_end(&mut self, delta: Point, over: Option<&str>, canvas: Rect) -> Vec<Action> {
        let Some(drag) = self.drag.take() else {
            return Vec::new();
        };
        if over != Some(CANVAS_DROP_ID) {
            debug!(?over, "drop outside canvas ignored");
            return Vec::new();
        }
        match drag.source {
            DragSource::ListWidget { widget_name } => self.drop_new(&widget_name, drag.initial, delta, canvas),
            DragSource::CanvasWidget { id } => self.drop_existing(&id, drag.initial, delta, canvas),
        }
    }

    fn drop_new(&mut self, widget_name: &str, initial: Rect, delta: Point, canvas: Rect) -> Vec<Action> {
        let Some(config) = self.saved.iter().find(|w| w.widget_name == widget_name).cloned() else {
            warn!(widget_name, "dropped widget is no longer in the saved list");
            return Vec::new();
        };
        let Some(position) = placement::place_new(initial, delta, canvas) else {
            warn!(widget_name, "canvas not measurable; drop skipped");
            return Vec::new();
        };
        let instance = WidgetInstance::new(config, position);
        let instance_id = instance.id.clone();
        let project_id = instance.config.project_id.clone();
        info!(instance_id = %instance_id, left = position.left, top = position.top, "widget placed");
        self.instances.push(instance);

        let fetch = self.issue_fetch(&instance_id, project_id);
        vec![Action::InstancePlaced { instance_id }, fetch]
    }

    fn drop_existing(&mut self, id: &str, initial: Rect, delta: Point, canvas: Rect) -> Vec<Action> {
        let Some(position) = placement::move_existing(initial, delta, canvas) else {
            warn!(instance_id = id, "canvas not measurable; move skipped");
            return Vec::new();
        };
        let Some(instance) = self.instances.iter_mut().find(|i| i.id == id) else {
            debug!(instance_id = id, "moved instance not found");
            return Vec::new();
        };
        instance.move_to(position);
        vec![Action::InstanceMoved { instance_id: id.to_string() }]
    }

    // --- Task hydration ---

    fn issue_fetch(&mut self, instance_id: &str, project_id: String) -> Action {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.pending.insert(instance_id.to_string(), generation);
        Action::FetchTasks { instance_id: instance_id.to_string(), project_id, generation }
    }

    /// Deliver a fetch result. Returns whether the instance was hydrated.
    ///
    /// Results for removed instances or superseded tickets are ignored. A
    /// failure leaves the instance without tasks and sets the status message.
    pub fn apply_tasks(
        &mut self,
        instance_id: &str,
        generation: u64,
        result: Result<Vec<Task>, SourceError>,
    ) -> bool {
        if self.pending.get(instance_id) != Some(&generation) {
            debug!(instance_id, generation, "stale task result ignored");
            return false;
        }
        self.pending.remove(instance_id);
        let Some(instance) = self.instances.iter_mut().find(|i| i.id == instance_id) else {
            return false;
        };
        match result {
            Ok(tasks) => {
                debug!(instance_id, count = tasks.len(), "instance hydrated");
                instance.hydrate(tasks);
                true
            }
            Err(e) => {
                warn!(instance_id, error = %e, "task fetch failed");
                self.status = Some(format!(
                    "failed to load tasks for \"{}\": {e}",
                    instance.config.widget_name
                ));
                false
            }
        }
    }

    /// Re-request tasks for an instance that is still waiting for data.
    ///
    /// `None` when the instance does not exist or is already hydrated.
    pub fn retry_hydration(&mut self, instance_id: &str) -> Option<Action> {
        let instance = self.instance(instance_id)?;
        if instance.tasks.is_some() {
            return None;
        }
        let project_id = instance.config.project_id.clone();
        Some(self.issue_fetch(instance_id, project_id))
    }

    /// Run every `FetchTasks` action against `source` and apply the results.
    pub async fn perform<T: TaskSource + ?Sized>(&mut self, source: &T, actions: Vec<Action>) {
        for action in actions {
            if let Action::FetchTasks { instance_id, project_id, generation } = action {
                let result = source.get_tasks_for_project(&project_id).await;
                self.apply_tasks(&instance_id, generation, result);
            }
        }
    }

    /// Remove every placed instance and forget outstanding fetches.
    pub fn reset(&mut self) {
        self.instances.clear();
        self.pending.clear();
        self.drag = None;
    }

    // --- Context menu ---

    pub fn open_context_menu(&mut self, x: f64, y: f64, widget_name: impl Into<String>) {
        self.menu.open(x, y, widget_name);
    }

    #[must_use]
    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.menu.current()
    }

    pub fn on_mouse_down_outside(&mut self, button: MouseButton) -> bool {
        self.menu.on_mouse_down_outside(button)
    }

    /// Run a context-menu entry and refresh the saved list from the store.
    ///
    /// # Errors
    ///
    /// Returns the store error when a delete cannot be written; the saved
    /// list and the menu are left as they were.
    pub fn choose<S: KvStorage>(
        &mut self,
        action: MenuAction,
        store: &mut WidgetStore<S>,
    ) -> Result<Option<MenuOutcome>, StoreError> {
        match self.menu.choose(action, store) {
            Ok(outcome) => {
                self.saved = store.widgets().to_vec();
                Ok(outcome)
            }
            Err(e) => {
                self.status = Some(format!("failed to delete widget: {e}"));
                Err(e)
            }
        }
    }
}
