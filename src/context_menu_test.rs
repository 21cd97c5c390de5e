use super::*;
use crate::store::{MemoryStorage, StorageError};
use crate::widget::WidgetConfig;

fn store_with(names: &[&str]) -> WidgetStore<MemoryStorage> {
    let mut store = WidgetStore::open(MemoryStorage::new());
    for name in names {
        store
            .upsert(WidgetConfig { widget_name: (*name).into(), project_id: "P1".into(), ..WidgetConfig::default() })
            .unwrap();
    }
    store
}

struct ReadOnlyStorage(MemoryStorage);

impl KvStorage for ReadOnlyStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get(key)
    }

    fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Write { key: key.into(), message: "read-only".into() })
    }
}

// =============================================================
// Open / close
// =============================================================

#[test]
fn open_records_position_and_widget() {
    let mut menu = ContextMenuState::new();
    menu.open(120.0, 48.0, "W1");
    assert_eq!(menu.current(), Some(&ContextMenu { x: 120.0, y: 48.0, widget_name: "W1".into() }));
}

#[test]
fn reopening_moves_the_single_menu() {
    let mut menu = ContextMenuState::new();
    menu.open(1.0, 1.0, "W1");
    menu.open(5.0, 6.0, "W2");
    assert_eq!(menu.current().unwrap().widget_name, "W2");
}

#[test]
fn outside_secondary_click_keeps_menu_open() {
    let mut menu = ContextMenuState::new();
    menu.open(0.0, 0.0, "W1");
    assert!(!menu.on_mouse_down_outside(MouseButton::Secondary));
    assert!(menu.current().is_some());
}

#[test]
fn outside_primary_or_middle_click_closes() {
    for button in [MouseButton::Primary, MouseButton::Middle] {
        let mut menu = ContextMenuState::new();
        menu.open(0.0, 0.0, "W1");
        assert!(menu.on_mouse_down_outside(button));
        assert!(menu.current().is_none());
    }
}

#[test]
fn outside_click_with_no_menu_is_noop() {
    let mut menu = ContextMenuState::new();
    assert!(!menu.on_mouse_down_outside(MouseButton::Primary));
}

// =============================================================
// choose
// =============================================================

#[test]
fn delete_removes_widget_and_closes() {
    let mut store = store_with(&["W1", "W2"]);
    let mut menu = ContextMenuState::new();
    menu.open(0.0, 0.0, "W1");

    let outcome = menu.choose(MenuAction::Delete, &mut store).unwrap();
    assert_eq!(outcome, Some(MenuOutcome::Deleted { widget_name: "W1".into() }));
    assert_eq!(store.names(), vec!["W2"]);
    assert!(menu.current().is_none());
}

#[test]
fn delete_of_vanished_widget_reports_already_gone() {
    let mut store = store_with(&["W2"]);
    let mut menu = ContextMenuState::new();
    menu.open(0.0, 0.0, "W1");
    let outcome = menu.choose(MenuAction::Delete, &mut store).unwrap();
    assert_eq!(outcome, Some(MenuOutcome::AlreadyGone { widget_name: "W1".into() }));
    assert_eq!(store.names(), vec!["W2"]);
}

#[test]
fn modify_is_unsupported_and_leaves_store_alone() {
    let mut store = store_with(&["W1"]);
    let mut menu = ContextMenuState::new();
    menu.open(0.0, 0.0, "W1");
    let outcome = menu.choose(MenuAction::Modify, &mut store).unwrap();
    assert_eq!(outcome, Some(MenuOutcome::ModifyUnsupported { widget_name: "W1".into() }));
    assert_eq!(store.names(), vec!["W1"]);
    assert!(menu.current().is_none());
}

#[test]
fn choose_without_menu_does_nothing() {
    let mut store = store_with(&["W1"]);
    let mut menu = ContextMenuState::new();
    assert_eq!(menu.choose(MenuAction::Delete, &mut store).unwrap(), None);
    assert_eq!(store.names(), vec!["W1"]);
}

#[test]
fn failed_delete_keeps_menu_open() {
    let seeded = store_with(&["W1"]);
    let raw = seeded.widgets().to_vec();
    let mut storage = MemoryStorage::new();
    storage.set(crate::consts::SAVED_WIDGETS_KEY, &serde_json::to_string(&raw).unwrap()).unwrap();
    let mut store = WidgetStore::open(ReadOnlyStorage(storage));

    let mut menu = ContextMenuState::new();
    menu.open(0.0, 0.0, "W1");
    assert!(menu.choose(MenuAction::Delete, &mut store).is_err());
    assert!(menu.current().is_some());
    assert_eq!(store.names(), vec!["W1"]);
}
