//! Project-task dashboard: saved chart widgets placed on a free-form canvas.
//!
//! Users build widgets with a four-step wizard (project, data columns, chart
//! settings, name), save them to a key-value slot, and drag them from the
//! saved list onto the canvas. Each placed instance fetches its project's
//! tasks and turns them into renderer-ready chart data. The host (browser
//! glue or the bundled CLI) owns rendering and the network; this crate owns
//! the state and the rules.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`task`] | Task and project records, dot-path field resolution |
//! | [`widget`] | Widget and chart configuration types |
//! | [`store`] | Saved-widget repository over a [`store::KvStorage`] slot |
//! | [`placement`] | Drop geometry: canvas-relative positions |
//! | [`instance`] | Placed widget instances and their hydration state |
//! | [`chart`] | Task-to-chart data extraction |
//! | [`wizard`] | Widget configuration wizard state machine |
//! | [`dashboard`] | Drag-and-drop session and task hydration |
//! | [`context_menu`] | Right-click menu on saved widgets |
//! | [`source`] | [`source::TaskSource`] trait and its error type |
//! | [`api`] | HTTP task source |
//! | [`config`] | Environment-driven configuration |
//! | [`consts`] | Storage keys, drop ids, default sizes and color schemes |

pub mod api;
pub mod chart;
pub mod config;
pub mod consts;
pub mod context_menu;
pub mod dashboard;
pub mod instance;
pub mod placement;
pub mod source;
pub mod store;
pub mod task;
pub mod widget;
pub mod wizard;
