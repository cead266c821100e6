//! Thread-safe preferences manager for concurrent access

use crate::storage::preferences::{Preferences, Theme};
use crate::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared preferences with automatic persistence
///
/// # Example
/// ```rust,no_run
/// use whatsapp_dashboard::storage::PreferencesManager;
///
/// # async fn example() -> whatsapp_dashboard::Result<()> {
/// let manager = PreferencesManager::new("preferences.json").await?;
///
/// // Flip the theme (auto-saves)
/// let theme = manager.toggle_theme().await?;
/// println!("Theme is now {}", theme);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PreferencesManager {
    /// Shared preferences state
    preferences: Arc<RwLock<Preferences>>,
    /// Path to the preferences file for auto-save
    path: Arc<String>,
}

impl PreferencesManager {
    /// Load preferences from `path`, or defaults if the file doesn't exist
    pub async fn new<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let preferences = Preferences::load(&path)?;

        Ok(Self {
            preferences: Arc::new(RwLock::new(preferences)),
            path: Arc::new(path_str),
        })
    }

    /// Current theme
    pub async fn theme(&self) -> Theme {
        self.preferences.read().await.theme
    }

    /// Set the theme and auto-save
    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        let mut preferences = self.preferences.write().await;
        preferences.theme = theme;
        preferences.save(self.path.as_str())
    }

    /// Switch between light and dark, auto-save, and return the new theme
    pub async fn toggle_theme(&self) -> Result<Theme> {
        let mut preferences = self.preferences.write().await;
        preferences.theme = preferences.theme.toggled();
        preferences.save(self.path.as_str())?;
        Ok(preferences.theme)
    }

    /// Get a clone of all preferences
    pub async fn get_all(&self) -> Preferences {
        self.preferences.read().await.clone()
    }

    /// Reload preferences from disk
    pub async fn reload(&self) -> Result<()> {
        let loaded = Preferences::load(self.path.as_str())?;
        *self.preferences.write().await = loaded;
        Ok(())
    }
}
