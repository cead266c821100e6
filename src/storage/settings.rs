//! Dashboard settings and configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding [`Settings::api_url`]
pub const ENV_API_URL: &str = "DASHBOARD_API_URL";
/// Environment variable overriding [`Settings::core_socket_url`]
pub const ENV_CORE_SOCKET_URL: &str = "DASHBOARD_CORE_SOCKET_URL";
/// Environment variable overriding [`Settings::bot_socket_url`]
pub const ENV_BOT_SOCKET_URL: &str = "DASHBOARD_BOT_SOCKET_URL";

/// Dashboard settings
///
/// Stored in JSON format. Missing fields take their default values, so a
/// settings file only needs the keys it wants to change.
///
/// # Example
/// ```rust,no_run
/// use whatsapp_dashboard::storage::Settings;
///
/// let mut settings = Settings::load("dashboard.json").expect("Failed to load");
/// settings.apply_env();
///
/// println!("REST API: {}", settings.api_url);
/// println!("Request timeout: {:?}", settings.request_timeout());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// REST API base URL
    pub api_url: String,
    /// Core API socket base URL
    pub core_socket_url: String,
    /// Bot service socket base URL
    pub bot_socket_url: String,
    /// REST request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Extra attempts for timed-out idempotent GETs
    pub request_retries: u32,
    /// Socket connect timeout in milliseconds
    pub socket_timeout_ms: u64,
    /// Reconnection attempts per link before it is marked down
    pub reconnection_attempts: u32,
    /// Fixed delay between reconnection attempts in milliseconds
    pub reconnection_delay_ms: u64,
    /// Fall back to long-polling when WebSocket is unavailable
    pub allow_polling_fallback: bool,
    /// Conversations per list page
    pub conversations_page_size: u32,
    /// Messages per thread page
    pub messages_page_size: u32,
    /// Conversations per search page
    pub search_page_size: u32,
    /// Match window between pending entries and a fetch, in milliseconds
    pub confirm_tolerance_ms: i64,
    /// Match window between a push and pending entries, in milliseconds
    pub realtime_tolerance_ms: i64,
    /// Delay before refetching messages after a send, in milliseconds
    pub refresh_after_send_ms: u64,
    /// Delay before refetching after a push event, in milliseconds
    pub refresh_after_push_ms: u64,
    /// Stats auto-refresh interval in seconds (0 disables)
    pub stats_interval_secs: u64,
    /// Distance from the bottom still treated as "at the bottom"
    pub near_bottom_threshold: u32,
}

impl Settings {
    /// Load settings from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to the settings file
    ///
    /// # Returns
    /// The loaded settings, or default settings if file doesn't exist
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("Failed to read settings: {}", e)))?;

        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&data)
            .map_err(|e| Error::Storage(format!("Failed to parse settings: {}", e)))
    }

    /// Save settings to a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to save the settings file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create settings directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Storage(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(path, json)
            .map_err(|e| Error::Storage(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Apply endpoint overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply endpoint overrides from `lookup`; empty values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets = [
            (ENV_API_URL, &mut self.api_url),
            (ENV_CORE_SOCKET_URL, &mut self.core_socket_url),
            (ENV_BOT_SOCKET_URL, &mut self.bot_socket_url),
        ];
        for (key, target) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = value.trim().trim_end_matches('/').to_string();
            }
        }
    }

    /// REST request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Delay before refetching messages after a send
    pub fn refresh_after_send(&self) -> Duration {
        Duration::from_millis(self.refresh_after_send_ms)
    }

    /// Delay before refetching after a push event
    pub fn refresh_after_push(&self) -> Duration {
        Duration::from_millis(self.refresh_after_push_ms)
    }

    /// Stats auto-refresh interval, `None` when disabled
    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3009/api".to_string(),
            core_socket_url: "http://localhost:3001".to_string(),
            bot_socket_url: "http://localhost:3008".to_string(),
            request_timeout_ms: 10_000,
            request_retries: 1,
            socket_timeout_ms: 5_000,
            reconnection_attempts: 5,
            reconnection_delay_ms: 1_000,
            allow_polling_fallback: true,
            conversations_page_size: 20,
            messages_page_size: 50,
            search_page_size: 20,
            confirm_tolerance_ms: 2_000,
            realtime_tolerance_ms: 1_000,
            refresh_after_send_ms: 100,
            refresh_after_push_ms: 500,
            stats_interval_secs: 30,
            near_bottom_threshold: 100,
        }
    }
}
