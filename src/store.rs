//! Saved-widget repository over a single key-value storage slot.
//!
//! DESIGN
//! ======
//! The whole widget list lives in one slot (`savedWidgets`) as a JSON array,
//! the way browser local storage holds it. Every mutation is a full
//! read-modify-write of that array; there are no partial updates.
//!
//! ERROR HANDLING
//! ==============
//! Reads never fail from the caller's point of view: a missing slot, an
//! unreadable slot, or a blob that is not a JSON array all mean "no saved
//! widgets", and individual malformed records are left out of the list with
//! a warning. They stay in the slot: mutations work on the raw records and
//! only touch the one whose `widgetName` matches.
//! Writes do fail, and the cached list is only replaced after the write
//! succeeded, so a quota or permission error leaves memory untouched.
//!
//! Two writers sharing a slot (two open tabs, two processes) are not
//! coordinated: the last write wins.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::consts::SAVED_WIDGETS_KEY;
use crate::widget::WidgetConfig;

// =============================================================================
// ERRORS
// =============================================================================

/// Failure of the underlying key-value slot.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage read failed for `{key}`: {message}")]
    Read { key: String, message: String },

    #[error("storage write failed for `{key}`: {message}")]
    Write { key: String, message: String },
}

/// Failure of a widget store mutation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("widget list serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

// =============================================================================
// KEY-VALUE STORAGE
// =============================================================================

/// A string key-value slot store (browser local storage or a stand-in).
pub trait KvStorage {
    /// Read a slot. `Ok(None)` when the slot was never written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] when the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite a slot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] when the backend rejects the write.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.slot_path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read { key: key.to_string(), message: e.to_string() }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let write_err = |e: std::io::Error| StorageError::Write { key: key.to_string(), message: e.to_string() };
        std::fs::create_dir_all(&self.dir).map_err(write_err)?;

        // Write-then-rename so a crash never leaves a truncated slot.
        let path = self.slot_path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(write_err)?;
        std::fs::rename(&tmp, &path).map_err(write_err)?;
        Ok(())
    }
}

// =============================================================================
// WIDGET STORE
// =============================================================================

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    /// No record had this name; the widget was appended.
    Inserted,
    /// A record with this name was replaced in place.
    Replaced,
}

/// Ordered saved-widget list, unique by `widget_name`.
pub struct WidgetStore<S: KvStorage> {
    storage: S,
    widgets: Vec<WidgetConfig>,
}

impl<S: KvStorage> WidgetStore<S> {
    /// Wrap a storage backend and load the current list.
    pub fn open(storage: S) -> Self {
        let widgets = read_widgets(&storage);
        Self { storage, widgets }
    }

    /// Re-read the slot and return the stored widgets.
    pub fn load_all(&mut self) -> &[WidgetConfig] {
        self.widgets = read_widgets(&self.storage);
        &self.widgets
    }

    /// The list as of the last load or successful write.
    #[must_use]
    pub fn widgets(&self) -> &[WidgetConfig] {
        &self.widgets
    }

    #[must_use]
    pub fn get(&self, widget_name: &str) -> Option<&WidgetConfig> {
        self.widgets.iter().find(|w| w.widget_name == widget_name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.widgets.iter().map(|w| w.widget_name.as_str()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Replace the record named `config.widget_name`, or append it.
    ///
    /// Stored records that do not parse as widgets are written back untouched.
    ///
    /// # Errors
    ///
    /// Returns an error when the list cannot be serialized or written; the
    /// cached list is unchanged in that case.
    pub fn upsert(&mut self, config: WidgetConfig) -> Result<Upserted, StoreError> {
        let mut records = read_records(&self.storage);
        let record = serde_json::to_value(&config)?;
        let outcome = match records.iter().position(|r| record_name(r) == Some(config.widget_name.as_str())) {
            Some(index) => {
                records[index] = record;
                Upserted::Replaced
            }
            None => {
                records.push(record);
                Upserted::Inserted
            }
        };
        self.write(&records)?;
        Ok(outcome)
    }

    /// Remove the record named `widget_name`. Returns whether one was removed.
    ///
    /// A missing name is not an error and leaves the slot untouched.
    ///
    /// # Errors
    ///
    /// Returns an error when the shortened list cannot be written; the cached
    /// list is unchanged in that case.
    pub fn delete(&mut self, widget_name: &str) -> Result<bool, StoreError> {
        let mut records = read_records(&self.storage);
        let before = records.len();
        records.retain(|r| record_name(r) != Some(widget_name));
        if records.len() == before {
            debug!(widget_name, "delete: no such widget");
            self.widgets = widgets_from(records);
            return Ok(false);
        }
        self.write(&records)?;
        Ok(true)
    }

    fn write(&mut self, records: &[Value]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(records)?;
        self.storage.set(SAVED_WIDGETS_KEY, &raw)?;
        info!(count = records.len(), "saved widget list written");
        self.widgets = widgets_from(records.to_vec());
        Ok(())
    }
}

fn read_widgets(storage: &impl KvStorage) -> Vec<WidgetConfig> {
    widgets_from(read_records(storage))
}

/// The stored array as raw records, unparseable ones included.
fn read_records(storage: &impl KvStorage) -> Vec<Value> {
    match storage.get(SAVED_WIDGETS_KEY) {
        Ok(Some(raw)) => parse_records(&raw),
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!(error = %e, "saved widget slot unreadable; treating as empty");
            Vec::new()
        }
    }
}

fn parse_records(raw: &str) -> Vec<Value> {
    match serde_json::from_str(raw) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "saved widget list is not a JSON array; treating as empty");
            Vec::new()
        }
    }
}

/// `widgetName` of a raw record, if it has one.
fn record_name(record: &Value) -> Option<&str> {
    record.get("widgetName").and_then(Value::as_str)
}

fn widgets_from(records: Vec<Value>) -> Vec<WidgetConfig> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match WidgetConfig::from_value(record) {
            Ok(widget) => Some(widget),
            Err(e) => {
                warn!(index, error = %e, "skipping malformed saved widget");
                None
            }
        })
        .collect()
}

/// Parse a stored blob. Anything other than a JSON array yields an empty list;
/// records that are not valid widgets are skipped.
#[must_use]
pub fn parse_widgets(raw: &str) -> Vec<WidgetConfig> {
    widgets_from(parse_records(raw))
}
