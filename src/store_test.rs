use serde_json::json;

use super::*;
use crate::widget::{BarParams, ChartConfig, LineParams};

fn widget(name: &str) -> WidgetConfig {
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

fn raw_slot(storage: &impl KvStorage) -> Option<String> {
    storage.get(SAVED_WIDGETS_KEY).unwrap()
}

/// Storage whose writes can be switched off to simulate quota errors.
#[derive(Default)]
struct FlakyStorage {
    inner: MemoryStorage,
    reject_writes: bool,
}

impl KvStorage for FlakyStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::Write { key: key.into(), message: "quota exceeded".into() });
        }
        self.inner.set(key, value)
    }
}

// =============================================================
// load_all
// =============================================================

#[test]
fn load_all_absent_slot_is_empty() {
    let mut store = WidgetStore::open(MemoryStorage::new());
    assert!(store.load_all().is_empty());
}

#[test]
fn load_all_malformed_blob_is_empty() {
    let mut storage = MemoryStorage::new();
    storage.set(SAVED_WIDGETS_KEY, "{not json").unwrap();
    let mut store = WidgetStore::open(storage);
    assert!(store.load_all().is_empty());
}

#[test]
fn load_all_non_array_blob_is_empty() {
    let mut storage = MemoryStorage::new();
    storage.set(SAVED_WIDGETS_KEY, r#"{"widgetName":"W1"}"#).unwrap();
    let store = WidgetStore::open(storage);
    assert!(store.is_empty());
}

#[test]
fn load_all_skips_malformed_records() {
    let mut storage = MemoryStorage::new();
    let blob = json!([
        serde_json::to_value(widget("good")).unwrap(),
        { "chartType": "bar" },
        42,
        { "widgetName": "legacy", "chartType": "pie", "pieChartIdKey": "Type" },
    ]);
    storage.set(SAVED_WIDGETS_KEY, &blob.to_string()).unwrap();
    let store = WidgetStore::open(storage);
    assert_eq!(store.names(), vec!["good", "legacy"]);
}

#[test]
fn legacy_free_text_width_still_loads() {
    let mut storage = MemoryStorage::new();
    let blob = json!([{ "widgetName": "Legacy", "chartType": "bar", "barChartIndexBy": "Name", "barChartWidth": "94%" }]);
    storage.set(SAVED_WIDGETS_KEY, &blob.to_string()).unwrap();
    let store = WidgetStore::open(storage);
    assert_eq!(store.names(), vec!["Legacy"]);
}

// =============================================================
// upsert
// =============================================================

#[test]
fn upsert_then_reload_returns_record_intact() {
    let mut store = WidgetStore::open(MemoryStorage::new());
    assert_eq!(store.upsert(widget("W1")).unwrap(), Upserted::Inserted);

    let mut reopened = WidgetStore::open(store.storage.clone());
    let loaded = reopened.load_all();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], widget("W1"));
    assert_eq!(loaded[0].confirmed_column_keys, vec!["Name", "Progress.ProgressRate"]);
    let ChartConfig::Bar(params) = &loaded[0].chart else {
        panic!("expected bar chart");
    };
    assert_eq!(params.index_by, "Name");
    assert_eq!(params.keys, vec!["Progress.ProgressRate"]);
}

#[test]
fn upsert_is_idempotent() {
    let mut store = WidgetStore::open(MemoryStorage::new());
    store.upsert(widget("W1")).unwrap();
    assert_eq!(store.upsert(widget("W1")).unwrap(), Upserted::Replaced);
    let loaded = store.load_all();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0], widget("W1"));
}

#[test]
fn upsert_replaces_in_place_and_appends_new() {
    let mut store = WidgetStore::open(MemoryStorage::new());
    store.upsert(widget("A")).unwrap();
    store.upsert(widget("B")).unwrap();
    store.upsert(widget("C")).unwrap();

    let mut changed = widget("B");
    changed.chart = ChartConfig::Line(LineParams::default());
    store.upsert(changed.clone()).unwrap();

    assert_eq!(store.names(), vec!["A", "B", "C"]);
    assert_eq!(store.get("B"), Some(&changed));
}

#[test]
fn upsert_reads_latest_slot_before_writing() {
    let mut store = WidgetStore::open(MemoryStorage::new());
    store.upsert(widget("A")).unwrap();

    // Another writer adds a record behind this store's back.
    let blob = serde_json::to_string(&vec![widget("A"), widget("B")]).unwrap();
    store.storage.set(SAVED_WIDGETS_KEY, &blob).unwrap();
    assert_eq!(store.names(), vec!["A"]);

    store.upsert(widget("C")).unwrap();
    assert_eq!(store.names(), vec!["A", "B", "C"]);
}

#[test]
fn upsert_write_failure_leaves_memory_unchanged() {
    let mut store = WidgetStore::open(FlakyStorage::default());
    store.upsert(widget("A")).unwrap();
    store.storage.reject_writes = true;

    let err = store.upsert(widget("B")).unwrap_err();
    assert!(matches!(err, StoreError::Storage(StorageError::Write { .. })));
    assert!(err.to_string().contains("quota exceeded"));
    assert_eq!(store.names(), vec!["A"]);
    assert_eq!(WidgetStore::open(store.storage.inner.clone()).names(), vec!["A"]);
}

// =============================================================
// delete
// =============================================================

#[test]
fn delete_removes_matching_record() {
    let mut store = WidgetStore::open(MemoryStorage::new());
    store.upsert(widget("A")).unwrap();
    store.upsert(widget("B")).unwrap();
    assert!(store.delete("A").unwrap());
    assert_eq!(store.names(), vec!["B"]);
    assert_eq!(store.load_all().len(), 1);
}

#[test]
fn delete_absent_name_leaves_slot_unchanged() {
    let mut store = WidgetStore::open(MemoryStorage::new());
    store.upsert(widget("A")).unwrap();
    let before = raw_slot(&store.storage);
    assert!(!store.delete("missing").unwrap());
    assert_eq!(raw_slot(&store.storage), before);
}

#[test]
fn delete_on_empty_store_does_not_create_slot() {
    let mut store = WidgetStore::open(MemoryStorage::new());
    assert!(!store.delete("W1").unwrap());
    assert!(raw_slot(&store.storage).is_none());
}

#[test]
fn delete_write_failure_keeps_record() {
    let mut store = WidgetStore::open(FlakyStorage::default());
    store.upsert(widget("A")).unwrap();
    store.storage.reject_writes = true;
    assert!(store.delete("A").is_err());
    assert_eq!(store.names(), vec!["A"]);
}

// =============================================================
// FileStorage
// =============================================================

#[test]
fn file_storage_missing_slot_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("nested"));
    assert!(storage.get(SAVED_WIDGETS_KEY).unwrap().is_none());
}

#[test]
fn file_storage_persists_between_stores() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = WidgetStore::open(FileStorage::new(dir.path()));
    store.upsert(widget("W1")).unwrap();

    assert!(dir.path().join("savedWidgets.json").exists());
    let reopened = WidgetStore::open(FileStorage::new(dir.path()));
    assert_eq!(reopened.widgets(), &[widget("W1")]);
}

#[test]
fn file_storage_write_into_file_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let mut storage = FileStorage::new(&blocker);
    let err = storage.set(SAVED_WIDGETS_KEY, "[]").unwrap_err();
    assert!(matches!(err, StorageError::Write { .. }));
}

// =============================================================
// Unparseable records
// =============================================================

fn store_with_opaque_record() -> WidgetStore<MemoryStorage> {
    let mut storage = MemoryStorage::new();
    let blob = json!([
        { "widgetName": "Opaque", "chartType": "scatter", "params": { "dots": 3 } },
        serde_json::to_value(widget("A")).unwrap(),
    ]);
    storage.set(SAVED_WIDGETS_KEY, &blob.to_string()).unwrap();
    WidgetStore::open(storage)
}

fn slot_names(storage: &impl KvStorage) -> Vec<String> {
    let raw = raw_slot(storage).unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    records.iter().map(|r| r["widgetName"].as_str().unwrap().to_string()).collect()
}

#[test]
fn upsert_keeps_records_it_cannot_parse() {
    let mut store = store_with_opaque_record();
    assert_eq!(store.names(), vec!["A"]);

    assert_eq!(store.upsert(widget("B")).unwrap(), Upserted::Inserted);
    assert_eq!(slot_names(&store.storage), vec!["Opaque", "A", "B"]);
    let raw = raw_slot(&store.storage).unwrap();
    assert!(raw.contains(r#""chartType":"scatter""#));
    assert_eq!(store.names(), vec!["A", "B"]);
}

#[test]
fn delete_keeps_records_it_cannot_parse() {
    let mut store = store_with_opaque_record();
    assert!(store.delete("A").unwrap());
    assert_eq!(slot_names(&store.storage), vec!["Opaque"]);
    assert!(store.is_empty());
}

#[test]
fn upsert_by_name_replaces_an_unparseable_record() {
    let mut store = store_with_opaque_record();
    assert_eq!(store.upsert(widget("Opaque")).unwrap(), Upserted::Replaced);
    assert_eq!(slot_names(&store.storage), vec!["Opaque", "A"]);
    assert_eq!(store.names(), vec!["Opaque", "A"]);
}
