//! TUI Dashboard Module
//!
//! Terminal user interface showing availability per endpoint and the alert timeline.

mod app;
mod state;
mod ui;

pub use app::{App, restore_terminal};
pub use state::{AppState, describe_alert};
