//! TUI (Terminal User Interface) module
//!
//! This module contains the operator console logic separated from the binary
//! so it can be driven and rendered in tests.

pub mod types;
pub mod app;
pub mod ui;

pub use types::{Focus, Palette};
pub use app::App;
