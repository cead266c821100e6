// Preferences Tests - Testing Preferences and PreferencesManager

use crate::storage::{Preferences, PreferencesManager, Theme};
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_theme_toggled() {
    assert_eq!(Theme::default(), Theme::Light);
    assert_eq!(Theme::Light.toggled(), Theme::Dark);
    assert_eq!(Theme::Dark.toggled(), Theme::Light);
    assert_eq!(Theme::Dark.to_string(), "dark");
}

#[test]
fn test_preferences_storage_key() {
    let preferences = Preferences { theme: Theme::Dark };

    let json = serde_json::to_value(&preferences).expect("Failed to serialize");
    assert_eq!(json, serde_json::json!({ "whatsapp-dashboard-theme": "dark" }));
}

#[test]
fn test_preferences_load_missing_and_empty() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let missing = Preferences::load(temp_dir.path().join("prefs.json")).expect("Failed to load");
    assert_eq!(missing, Preferences::default());

    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let empty = Preferences::load(temp_file.path()).expect("Failed to load");
    assert_eq!(empty.theme, Theme::Light);
}

#[test]
fn test_preferences_load_unknown_keys() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    std::fs::write(
        temp_file.path(),
        r#"{ "whatsapp-dashboard-theme": "dark", "sidebar": "collapsed" }"#,
    )
    .expect("Failed to write");

    let preferences = Preferences::load(temp_file.path()).expect("Failed to load");
    assert_eq!(preferences.theme, Theme::Dark);
}

#[test]
fn test_preferences_save_and_load() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("ui").join("prefs.json");

    Preferences { theme: Theme::Dark }
        .save(&path)
        .expect("Failed to save");

    let loaded = Preferences::load(&path).expect("Failed to load");
    assert_eq!(loaded.theme, Theme::Dark);
}

#[tokio::test]
async fn test_preferences_manager_new() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");

    let manager = PreferencesManager::new(temp_file.path())
        .await
        .expect("Failed to create manager");

    assert_eq!(manager.theme().await, Theme::Light);
}

#[tokio::test]
async fn test_preferences_manager_toggle_persists() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp_file.path();

    let manager = PreferencesManager::new(path).await.expect("Failed to create manager");

    let theme = manager.toggle_theme().await.expect("Failed to toggle");
    assert_eq!(theme, Theme::Dark);
    assert_eq!(manager.theme().await, Theme::Dark);

    // Verify persisted
    let loaded = Preferences::load(path).expect("Failed to load");
    assert_eq!(loaded.theme, Theme::Dark);

    let theme = manager.toggle_theme().await.expect("Failed to toggle");
    assert_eq!(theme, Theme::Light);
}

#[tokio::test]
async fn test_preferences_manager_reload() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp_file.path();

    let manager = PreferencesManager::new(path).await.expect("Failed to create manager");
    manager.set_theme(Theme::Light).await.expect("Failed to set");

    // Another front-end writes the file
    Preferences { theme: Theme::Dark }
        .save(path)
        .expect("Failed to save");
    assert_eq!(manager.theme().await, Theme::Light);

    manager.reload().await.expect("Failed to reload");
    assert_eq!(manager.get_all().await.theme, Theme::Dark);
}

#[tokio::test]
async fn test_preferences_manager_concurrent_access() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let manager = PreferencesManager::new(temp_file.path())
        .await
        .expect("Failed to create manager");

    let mut handles = vec![];
    for _ in 0..4 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager.toggle_theme().await.expect("Failed to toggle")
        }));
    }
    for handle in handles {
        handle.await.expect("Task panicked");
    }

    // An even number of toggles returns to the start
    assert_eq!(manager.theme().await, Theme::Light);
}
