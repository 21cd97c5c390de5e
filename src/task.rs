//! Task and project records, plus dot-path field resolution.
//!
//! Task records come from the backend as open-ended JSON objects: a handful of
//! well-known top-level fields (`Id`, `Name`, `StartDate`, ...) and nested
//! objects such as `Progress`. Chart code never indexes a record directly; it
//! goes through [`resolve`], which walks a dot-path (`Progress.Status`) and
//! degrades to `None` instead of failing.

#[cfg(test)]
#[path = "task_test.rs"]
mod task_test;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resolve a possibly dotted field path against a task record.
///
/// - empty path: `None`
/// - no `.`: the top-level field
/// - dotted: each segment descends into a nested object (or, for a numeric
///   segment, an array element); `None` as soon as a segment is missing or the
///   current value is a scalar.
///
/// JSON `null` resolves to `Some(Value::Null)`; use [`resolve_defined`] to
/// treat it as absent.
#[must_use]
pub fn resolve<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    if !path.contains('.') {
        return record.as_object()?.get(path);
    }
    path.split('.').try_fold(record, step)
}

/// Like [`resolve`], but JSON `null` counts as absent.
#[must_use]
pub fn resolve_defined<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    resolve(record, path).filter(|v| !v.is_null())
}

fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => match segment.parse::<usize>() {
            Ok(index) => items.get(index),
            Err(_) => None,
        },
        _ => None,
    }
}

/// Candidate column keys for a task set.
///
/// Every top-level field name, plus a dot-path for every field of a nested
/// object (recursively). Arrays are leaves. Sorted and de-duplicated across
/// all records.
#[must_use]
pub fn column_keys(tasks: &[Task]) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for task in tasks {
        if let Some(map) = task.record().as_object() {
            collect_keys(map, "", &mut keys);
        }
    }
    keys
}

fn collect_keys(map: &serde_json::Map<String, Value>, prefix: &str, out: &mut BTreeSet<String>) {
    for (key, value) in map {
        let path = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
        match value {
            Value::Object(nested) if !nested.is_empty() => collect_keys(nested, &path, out),
            _ => {
                out.insert(path);
            }
        }
    }
}

// =============================================================================
// TASK
// =============================================================================

/// One task record as returned by the task-listing backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Task {
    record: Value,
}

impl Task {
    /// Wrap a raw JSON record.
    #[must_use]
    pub fn new(record: Value) -> Self {
        Self { record }
    }

    /// The underlying JSON record.
    #[must_use]
    pub fn record(&self) -> &Value {
        &self.record
    }

    /// Resolve a dot-path against this task. See [`resolve`].
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        resolve(&self.record, path)
    }

    /// Task identifier. Empty string when absent.
    #[must_use]
    pub fn id(&self) -> &str {
        self.str_field("Id")
    }

    /// Task display name. Empty string when absent.
    #[must_use]
    pub fn name(&self) -> &str {
        self.str_field("Name")
    }

    /// Owning project id. Empty string when absent.
    #[must_use]
    pub fn project_id(&self) -> &str {
        self.str_field("ProjectId")
    }

    #[must_use]
    pub fn start_date(&self) -> Option<&str> {
        self.get("StartDate").and_then(Value::as_str)
    }

    #[must_use]
    pub fn end_date(&self) -> Option<&str> {
        self.get("EndDate").and_then(Value::as_str)
    }

    /// `Progress.Status` (e.g. `"NotStart"`, `"OnGoing"`, `"Complete"`).
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.get("Progress.Status").and_then(Value::as_str)
    }

    /// `Progress.ProgressRate`.
    #[must_use]
    pub fn progress_rate(&self) -> Option<f64> {
        self.get("Progress.ProgressRate").and_then(Value::as_f64)
    }

    fn str_field(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_str).unwrap_or("")
    }
}

impl From<Value> for Task {
    fn from(record: Value) -> Self {
        Self::new(record)
    }
}

// =============================================================================
// PROJECT
// =============================================================================

/// A project as listed by the project-listing backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub product_axis_group_attribute: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_manager: Option<ProjectManager>,
}

/// Manager reference embedded in a project listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectManager {
    #[serde(default)]
    pub name: Option<String>,
}

impl Project {
    /// Manager display name, `"N/A"` when unknown.
    #[must_use]
    pub fn manager_name(&self) -> &str {
        self.project_manager
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .filter(|n| !n.is_empty())
            .unwrap_or("N/A")
    }
}
