//! Right-click menu on a saved-widget list entry.
//!
//! At most one menu is open. It closes on any mouse-down outside it except a
//! secondary-button press, so the right-click that opens a menu on another
//! entry does not first close the current one.

#[cfg(test)]
#[path = "context_menu_test.rs"]
mod context_menu_test;

use tracing::info;

use crate::store::{KvStorage, StoreError, WidgetStore};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// An open menu: screen position and the widget it acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMenu {
    pub x: f64,
    pub y: f64,
    pub widget_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Delete,
    Modify,
}

/// What choosing a menu entry did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    /// The widget was removed from the store.
    Deleted { widget_name: String },
    /// The store had no widget of that name; nothing was written.
    AlreadyGone { widget_name: String },
    /// Editing a saved widget in place is not offered; the menu just closes.
    ModifyUnsupported { widget_name: String },
}

/// Menu open/closed state.
#[derive(Debug, Clone, Default)]
pub struct ContextMenuState {
    open: Option<ContextMenu>,
}

impl ContextMenuState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or move) the menu for `widget_name` at screen position `(x, y)`.
    pub fn open(&mut self, x: f64, y: f64, widget_name: impl Into<String>) {
        self.open = Some(ContextMenu { x, y, widget_name: widget_name.into() });
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    #[must_use]
    pub fn current(&self) -> Option<&ContextMenu> {
        self.open.as_ref()
    }

    /// A mouse-down landed outside the menu. Returns whether the menu closed.
    pub fn on_mouse_down_outside(&mut self, button: MouseButton) -> bool {
        if button == MouseButton::Secondary || self.open.is_none() {
            return false;
        }
        self.open = None;
        true
    }

    /// Run a menu entry. `Ok(None)` when no menu is open.
    ///
    /// # Errors
    ///
    /// Returns the store error when a delete cannot be written; the menu stays
    /// open so the user can retry.
    pub fn choose<S: KvStorage>(
        &mut self,
        action: MenuAction,
        store: &mut WidgetStore<S>,
    ) -> Result<Option<MenuOutcome>, StoreError> {
        let Some(menu) = &self.open else {
            return Ok(None);
        };
        let widget_name = menu.widget_name.clone();
        let outcome = match action {
            MenuAction::Delete => {
                if store.delete(&widget_name)? {
                    info!(widget_name = %widget_name, "saved widget deleted");
                    MenuOutcome::Deleted { widget_name }
                } else {
                    MenuOutcome::AlreadyGone { widget_name }
                }
            }
            MenuAction::Modify => MenuOutcome::ModifyUnsupported { widget_name },
        };
        self.open = None;
        Ok(Some(outcome))
    }
}
