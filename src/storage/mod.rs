//! Local configuration module
//!
//! This module handles the little state the dashboard keeps on disk:
//! - `settings` - Endpoints, timeouts, page sizes and sync tuning
//! - `preferences` - Persisted UI preferences (theme)
//! - `preferences_manager` - Thread-safe preferences access with auto-save
//!
//! Conversation data is never persisted locally; the REST API owns it.

pub mod preferences;
pub mod preferences_manager;
pub mod settings;

pub use preferences::{Preferences, Theme};
pub use preferences_manager::PreferencesManager;
pub use settings::Settings;
