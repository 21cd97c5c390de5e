//! Widget configuration wizard: project, columns, chart, save.
//!
//! DESIGN
//! ======
//! The step is an explicit [`WizardStep`]. Any step can be requested at any
//! time (the UI shows all four as menu buttons), but [`Wizard::goto`] checks
//! the entry requirements in [`ENTRY_REQUIREMENTS`] first. Entering
//! `ProjectSelection` is refused while columns are checked, and so is
//! confirming a different project from any step, so a project switch can
//! never silently drop a column selection.
//!
//! Fetches are split into request and apply halves. `request_*` hands out a
//! [`FetchTicket`]; `apply_*` ignores a result whose ticket was superseded, or
//! (for tasks) whose project is no longer the confirmed one. A stale task list
//! still fills the per-project cache.
//!
//! ERROR HANDLING
//! ==============
//! Fetch failures clear the affected list and set a status message. Input
//! that breaks a requirement is rejected with a [`WizardError`] and leaves the
//! wizard unchanged.

#[cfg(test)]
#[path = "wizard_test.rs"]
mod wizard_test;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tracing::{debug, info, warn};

use crate::chart::{self, ChartData};
use crate::source::{SourceError, TaskSource};
use crate::store::{KvStorage, StoreError, Upserted, WidgetStore};
use crate::task::{self, Project, Task};
use crate::widget::{ChartConfig, ChartType, WidgetConfig, WidgetError};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("no project confirmed")]
    NoProject,

    #[error("no project selected")]
    NothingSelected,

    #[error("unknown project `{0}`")]
    UnknownProject(String),

    #[error("no columns confirmed")]
    NoColumns,

    #[error("column `{0}` is not in the task data")]
    UnknownColumn(String),

    #[error("project selection is locked while columns are checked")]
    ColumnsChecked,

    #[error("chart needs its data keys before it can be saved")]
    IncompleteChart,

    #[error(transparent)]
    Widget(#[from] WidgetError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("preview serialization failed: {0}")]
    Preview(#[from] serde_json::Error),
}

// =============================================================================
// STEPS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WizardStep {
    #[default]
    ProjectSelection,
    ColumnSelection,
    ChartConfiguration,
    Save,
}

impl WizardStep {
    pub const ALL: [Self; 4] = [Self::ProjectSelection, Self::ColumnSelection, Self::ChartConfiguration, Self::Save];

    /// The following step, or `None` after `Save`.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::ProjectSelection => Some(Self::ColumnSelection),
            Self::ColumnSelection => Some(Self::ChartConfiguration),
            Self::ChartConfiguration => Some(Self::Save),
            Self::Save => None,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ProjectSelection => "Set Project",
            Self::ColumnSelection => "Set Data",
            Self::ChartConfiguration => "Set Chart",
            Self::Save => "Save Widget",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requirement {
    NoCheckedColumns,
    ConfirmedProject,
    ConfirmedColumns,
    CompleteChart,
}

/// What must hold before each step can be entered, checked in order.
const ENTRY_REQUIREMENTS: [(WizardStep, &[Requirement]); 4] = [
    (WizardStep::ProjectSelection, &[Requirement::NoCheckedColumns]),
    (WizardStep::ColumnSelection, &[Requirement::ConfirmedProject]),
    (WizardStep::ChartConfiguration, &[Requirement::ConfirmedProject, Requirement::ConfirmedColumns]),
    (
        WizardStep::Save,
        &[Requirement::ConfirmedProject, Requirement::ConfirmedColumns, Requirement::CompleteChart],
    ),
];

/// Ticket for one outstanding fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    /// Project whose tasks are requested; `None` for the project list.
    pub project_id: Option<String>,
}

// =============================================================================
// WIZARD
// =============================================================================

#[derive(Debug, Default)]
pub struct Wizard {
    step: WizardStep,
    projects: Vec<Project>,
    selected_project: Option<String>,
    project: Option<Project>,
    task_cache: HashMap<String, Vec<Task>>,
    checked: BTreeSet<String>,
    confirmed: Vec<String>,
    chart: ChartConfig,
    widget_name: String,
    projects_generation: u64,
    tasks_generation: u64,
    status: Option<String>,
}

impl Wizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Navigation ---

    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// Move to `step` if its entry requirements hold.
    ///
    /// # Errors
    ///
    /// Returns the first unmet requirement; the step is unchanged.
    pub fn goto(&mut self, step: WizardStep) -> Result<(), WizardError> {
        self.check_entry(step)?;
        if self.step != step {
            debug!(from = %self.step, to = %step, "wizard step");
        }
        self.step = step;
        Ok(())
    }

    /// Whether `step` could be entered now.
    #[must_use]
    pub fn can_enter(&self, step: WizardStep) -> bool {
        self.check_entry(step).is_ok()
    }

    fn check_entry(&self, step: WizardStep) -> Result<(), WizardError> {
        let requirements = ENTRY_REQUIREMENTS
            .iter()
            .find(|(s, _)| *s == step)
            .map_or(&[][..], |(_, reqs)| *reqs);
        for requirement in requirements {
            match requirement {
                Requirement::NoCheckedColumns if !self.checked.is_empty() => return Err(WizardError::ColumnsChecked),
                Requirement::ConfirmedProject if self.project.is_none() => return Err(WizardError::NoProject),
                Requirement::ConfirmedColumns if self.confirmed.is_empty() => return Err(WizardError::NoColumns),
                Requirement::CompleteChart => self.check_chart()?,
                _ => {}
            }
        }
        Ok(())
    }

    fn check_chart(&self) -> Result<(), WizardError> {
        if !self.chart.has_required_keys() {
            return Err(WizardError::IncompleteChart);
        }
        self.check_keys(&self.chart)
    }

    fn check_keys(&self, chart: &ChartConfig) -> Result<(), WizardError> {
        match chart.column_refs().into_iter().find(|k| !self.confirmed.iter().any(|c| c == k)) {
            Some(key) => Err(WidgetError::UnconfirmedKey { key: key.to_string() }.into()),
            None => Ok(()),
        }
    }

    /// Last fetch problem, if any.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    // --- Step 1: project ---

    /// Start a project-list fetch. Any earlier outstanding one becomes stale.
    pub fn request_projects(&mut self) -> FetchTicket {
        self.projects_generation += 1;
        FetchTicket { generation: self.projects_generation, project_id: None }
    }

    /// Deliver a project-list result. Returns whether it was applied.
    pub fn apply_projects(&mut self, ticket: &FetchTicket, result: Result<Vec<Project>, SourceError>) -> bool {
        if ticket.project_id.is_some() || ticket.generation != self.projects_generation {
            debug!(generation = ticket.generation, "stale project list ignored");
            return false;
        }
        match result {
            Ok(projects) => {
                debug!(count = projects.len(), "projects loaded");
                self.projects = projects;
                self.status = None;
            }
            Err(e) => {
                warn!(error = %e, "project fetch failed");
                self.projects.clear();
                self.status = Some(format!("Error loading projects: {e}"));
            }
        }
        true
    }

    /// Fetch and apply the project list.
    pub async fn load_projects<T: TaskSource + ?Sized>(&mut self, source: &T) {
        let ticket = self.request_projects();
        let result = source.get_projects().await;
        self.apply_projects(&ticket, result);
    }

    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Highlight a project row. Confirming is a separate step.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::UnknownProject`] when the id is not listed.
    pub fn select_project(&mut self, project_id: &str) -> Result<(), WizardError> {
        if !self.projects.iter().any(|p| p.id == project_id) {
            return Err(WizardError::UnknownProject(project_id.to_string()));
        }
        self.selected_project = Some(project_id.to_string());
        Ok(())
    }

    #[must_use]
    pub fn selected_project(&self) -> Option<&str> {
        self.selected_project.as_deref()
    }

    /// Make the selected project the active one. Returns whether it changed.
    ///
    /// Switching to a different project clears the confirmed columns and the
    /// chart's data keys and makes any in-flight task fetch stale. It is
    /// refused while columns are checked. Re-confirming the active project
    /// keeps everything.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::NothingSelected`] without a selection,
    /// [`WizardError::UnknownProject`] if the selection left the list, or
    /// [`WizardError::ColumnsChecked`] when switching would drop checked columns.
    pub fn confirm_project(&mut self) -> Result<bool, WizardError> {
        let selected = self.selected_project.as_deref().ok_or(WizardError::NothingSelected)?;
        let project = self
            .projects
            .iter()
            .find(|p| p.id == selected)
            .cloned()
            .ok_or_else(|| WizardError::UnknownProject(selected.to_string()))?;

        if self.project.as_ref().is_some_and(|p| p.id == project.id) {
            return Ok(false);
        }
        if !self.checked.is_empty() {
            return Err(WizardError::ColumnsChecked);
        }
        info!(project_id = %project.id, "project confirmed");
        self.project = Some(project);
        self.checked.clear();
        self.confirmed.clear();
        self.chart = ChartConfig::for_type(self.chart.chart_type());
        self.tasks_generation += 1;
        Ok(true)
    }

    #[must_use]
    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    // --- Step 2: columns ---

    /// Start a task fetch for the confirmed project.
    ///
    /// `None` when no project is confirmed or its tasks are already cached.
    pub fn request_tasks(&mut self) -> Option<FetchTicket> {
        let project_id = self.project.as_ref()?.id.clone();
        if self.task_cache.contains_key(&project_id) {
            return None;
        }
        self.tasks_generation += 1;
        Some(FetchTicket { generation: self.tasks_generation, project_id: Some(project_id) })
    }

    /// Deliver a task result. Returns whether it became the active task list.
    ///
    /// A successful result always fills the cache for its project. It is
    /// applied only when its ticket is the latest and its project is still the
    /// confirmed one.
    pub fn apply_tasks(&mut self, ticket: &FetchTicket, result: Result<Vec<Task>, SourceError>) -> bool {
        let Some(project_id) = ticket.project_id.as_deref() else {
            return false;
        };
        let current = ticket.generation == self.tasks_generation
            && self.project.as_ref().is_some_and(|p| p.id == project_id);
        match result {
            Ok(tasks) => {
                debug!(project_id, count = tasks.len(), current, "tasks fetched");
                self.task_cache.insert(project_id.to_string(), tasks);
                if current {
                    self.status = None;
                }
            }
            Err(e) => {
                warn!(project_id, error = %e, "task fetch failed");
                if current {
                    self.task_cache.remove(project_id);
                    self.status = Some(format!("Error loading tasks: {e}"));
                }
            }
        }
        current
    }

    /// Fetch and apply tasks for the confirmed project unless cached.
    pub async fn load_tasks<T: TaskSource + ?Sized>(&mut self, source: &T) {
        let Some(ticket) = self.request_tasks() else {
            return;
        };
        let Some(project_id) = ticket.project_id.clone() else {
            return;
        };
        let result = source.get_tasks_for_project(&project_id).await;
        self.apply_tasks(&ticket, result);
    }

    /// Tasks of the confirmed project; empty until fetched.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        self.project
            .as_ref()
            .and_then(|p| self.task_cache.get(&p.id))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Column keys offered for checking.
    #[must_use]
    pub fn column_candidates(&self) -> BTreeSet<String> {
        task::column_keys(self.tasks())
    }

    /// Check or uncheck a column. Returns whether it is now checked.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::NoProject`] before a project is confirmed, or
    /// [`WizardError::UnknownColumn`] for a key the tasks do not have. An
    /// already-checked key can always be unchecked.
    pub fn toggle_column(&mut self, key: &str) -> Result<bool, WizardError> {
        if self.project.is_none() {
            return Err(WizardError::NoProject);
        }
        if self.checked.remove(key) {
            return Ok(false);
        }
        if !self.column_candidates().contains(key) {
            return Err(WizardError::UnknownColumn(key.to_string()));
        }
        self.checked.insert(key.to_string());
        Ok(true)
    }

    #[must_use]
    pub fn checked_columns(&self) -> &BTreeSet<String> {
        &self.checked
    }

    /// Approve the checked columns for charting.
    ///
    /// Chart keys that are no longer confirmed are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::NoColumns`] when nothing is checked.
    pub fn confirm_columns(&mut self) -> Result<(), WizardError> {
        if self.checked.is_empty() {
            return Err(WizardError::NoColumns);
        }
        self.confirmed = self.checked.iter().cloned().collect();
        self.chart.retain_columns(&self.checked);
        info!(count = self.confirmed.len(), "columns confirmed");
        Ok(())
    }

    #[must_use]
    pub fn confirmed_columns(&self) -> &[String] {
        &self.confirmed
    }

    // --- Step 3: chart ---

    /// Switch chart type. A different type starts from its defaults.
    pub fn set_chart_type(&mut self, chart_type: ChartType) {
        if self.chart.chart_type() != chart_type {
            self.chart = ChartConfig::for_type(chart_type);
        }
    }

    /// Replace the chart configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::UnconfirmedKey`] (wrapped) when the config
    /// references a column outside the confirmed set; nothing changes.
    pub fn set_chart(&mut self, chart: ChartConfig) -> Result<(), WizardError> {
        self.check_keys(&chart)?;
        self.chart = chart;
        Ok(())
    }

    #[must_use]
    pub fn chart(&self) -> &ChartConfig {
        &self.chart
    }

    /// Renderer input for the in-progress configuration.
    #[must_use]
    pub fn chart_preview(&self) -> Option<ChartData> {
        chart::extract(&self.chart, self.tasks())
    }

    // --- Step 4: save ---

    pub fn set_widget_name(&mut self, name: impl Into<String>) {
        self.widget_name = name.into();
    }

    /// The record that `save` would write.
    #[must_use]
    pub fn draft(&self) -> WidgetConfig {
        let (project_id, project_name) = self
            .project
            .as_ref()
            .map(|p| (p.id.clone(), p.name.clone()))
            .unwrap_or_default();
        WidgetConfig {
            widget_name: self.widget_name.trim().to_string(),
            project_id,
            project_name,
            confirmed_column_keys: self.confirmed.clone(),
            chart: self.chart.clone(),
        }
    }

    /// Validate the draft and upsert it into `store`.
    ///
    /// # Errors
    ///
    /// Returns the first unmet save requirement, a validation error, or the
    /// store's write error.
    pub fn save<S: KvStorage>(&self, store: &mut WidgetStore<S>) -> Result<Upserted, WizardError> {
        self.check_entry(WizardStep::Save)?;
        let draft = self.draft();
        draft.validate()?;
        let widget_name = draft.widget_name.clone();
        let outcome = store.upsert(draft)?;
        info!(widget_name = %widget_name, ?outcome, "widget saved");
        Ok(outcome)
    }

    /// Pretty JSON of the draft as it would be stored.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::Preview`] if serialization fails.
    pub fn preview_json(&self) -> Result<String, WizardError> {
        Ok(serde_json::to_string_pretty(&self.draft())?)
    }
}
