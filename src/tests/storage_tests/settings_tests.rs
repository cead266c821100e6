// Settings Tests - Testing Settings persistence and overrides

use crate::storage::settings::{ENV_API_URL, ENV_BOT_SOCKET_URL, ENV_CORE_SOCKET_URL};
use crate::storage::Settings;
use crate::Error;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_settings_default() {
    let settings = Settings::default();

    assert_eq!(settings.api_url, "http://localhost:3009/api");
    assert_eq!(settings.core_socket_url, "http://localhost:3001");
    assert_eq!(settings.bot_socket_url, "http://localhost:3008");
    assert_eq!(settings.request_timeout_ms, 10_000);
    assert_eq!(settings.reconnection_attempts, 5);
    assert!(settings.allow_polling_fallback);
    assert_eq!(settings.confirm_tolerance_ms, 2_000);
    assert_eq!(settings.realtime_tolerance_ms, 1_000);
    assert_eq!(settings.near_bottom_threshold, 100);
}

#[test]
fn test_settings_durations() {
    let mut settings = Settings::default();

    assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    assert_eq!(settings.refresh_after_send(), Duration::from_millis(100));
    assert_eq!(settings.refresh_after_push(), Duration::from_millis(500));
    assert_eq!(settings.stats_interval(), Some(Duration::from_secs(30)));

    // Zero disables the stats timer
    settings.stats_interval_secs = 0;
    assert_eq!(settings.stats_interval(), None);
}

#[test]
fn test_settings_load_missing_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("missing.json");

    let settings = Settings::load(&path).expect("Failed to load");
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_settings_load_empty_file() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");

    let settings = Settings::load(temp_file.path()).expect("Failed to load");
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_settings_load_partial_file() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    std::fs::write(
        temp_file.path(),
        r#"{ "api_url": "https://dashboard.example/api", "messages_page_size": 100 }"#,
    )
    .expect("Failed to write");

    let settings = Settings::load(temp_file.path()).expect("Failed to load");
    assert_eq!(settings.api_url, "https://dashboard.example/api");
    assert_eq!(settings.messages_page_size, 100);
    // Everything else keeps its default
    assert_eq!(settings.conversations_page_size, 20);
    assert_eq!(settings.core_socket_url, "http://localhost:3001");
}

#[test]
fn test_settings_save_and_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("nested").join("dashboard.json");

    let settings = Settings {
        bot_socket_url: "http://bots.internal:3008".to_string(),
        reconnection_attempts: 9,
        allow_polling_fallback: false,
        ..Settings::default()
    };
    settings.save(&path).expect("Failed to save");

    assert!(path.exists());
    let loaded = Settings::load(&path).expect("Failed to load");
    assert_eq!(loaded, settings);
}

#[test]
fn test_settings_load_invalid_json() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    std::fs::write(temp_file.path(), "{ not json").expect("Failed to write");

    let result = Settings::load(temp_file.path());
    assert!(matches!(result, Err(Error::Storage(_))));
}

#[test]
fn test_settings_apply_overrides() {
    let env: HashMap<&str, &str> = [
        (ENV_API_URL, "  https://api.example/api/  "),
        (ENV_CORE_SOCKET_URL, ""),
        (ENV_BOT_SOCKET_URL, "https://bots.example"),
    ]
    .into_iter()
    .collect();

    let mut settings = Settings::default();
    settings.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.api_url, "https://api.example/api");
    // Empty values are ignored
    assert_eq!(settings.core_socket_url, "http://localhost:3001");
    assert_eq!(settings.bot_socket_url, "https://bots.example");
}

#[test]
fn test_settings_apply_overrides_none() {
    let mut settings = Settings::default();
    settings.apply_overrides(|_| None);

    assert_eq!(settings, Settings::default());
}
