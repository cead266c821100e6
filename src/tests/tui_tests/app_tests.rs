// App Tests - Testing App key handling and scroll state

use crate::models::timestamp::to_wire;
use crate::models::ConversationId;
use crate::storage::{Preferences, PreferencesManager, Theme};
use crate::tests::support::{at, dashboard, fast_settings, settle, RecordingTransport, RoomCall};
use crate::tui::app::{MessageScroll, PaneGeometry};
use crate::tui::{App, Focus, Palette};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::json;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OFFLINE_API: &str = "http://127.0.0.1:9/api";

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn offline_app() -> App<RecordingTransport> {
    let (dashboard, _events) = dashboard(OFFLINE_API, fast_settings());
    App::new(dashboard, Theme::Light, None)
}

async fn type_text(app: &mut App<RecordingTransport>, text: &str) {
    for c in text.chars() {
        app.handle_key(key(KeyCode::Char(c))).await;
    }
}

/// App with three conversations loaded from a mock server
async fn loaded_app(server: &MockServer) -> App<RecordingTransport> {
    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [
                { "id": "c1", "updated_at": to_wire(&at(0)) },
                { "id": "c2", "updated_at": to_wire(&at(-60)) },
                { "id": "c3", "updated_at": to_wire(&at(-120)) }
            ]
        })))
        .mount(server)
        .await;

    let (mut dashboard, _events) = dashboard(&format!("{}/api", server.uri()), fast_settings());
    dashboard.load_conversations();
    settle(&mut dashboard, |d| !d.is_list_loading()).await;
    App::new(dashboard, Theme::Light, None)
}

#[test]
fn test_app_new() {
    let app = offline_app();

    assert_eq!(app.focus, Focus::Conversations);
    assert_eq!(app.selected_index, 0);
    assert!(!app.should_quit);
    assert!(app.status_message.is_none());
    assert_eq!(app.scroll(), MessageScroll::Follow);
    assert_eq!(app.palette(), Palette::for_theme(Theme::Light));
    assert!(app.highlighted().is_none());
}

#[tokio::test]
async fn test_quit_from_list() {
    let mut app = offline_app();

    app.handle_key(key(KeyCode::Char('q'))).await;
    assert!(app.should_quit);
}

#[tokio::test]
async fn test_tab_cycles_focus() {
    let mut app = offline_app();

    app.handle_key(key(KeyCode::Tab)).await;
    assert_eq!(app.focus, Focus::Messages);
    app.handle_key(key(KeyCode::Tab)).await;
    assert_eq!(app.focus, Focus::Compose);
    app.handle_key(key(KeyCode::Tab)).await;
    assert_eq!(app.focus, Focus::Conversations);
}

#[tokio::test]
async fn test_search_escape_restores_query() {
    let mut app = offline_app();

    app.handle_key(key(KeyCode::Char('/'))).await;
    assert_eq!(app.focus, Focus::Search);

    type_text(&mut app, "abc").await;
    app.handle_key(key(KeyCode::Backspace)).await;
    assert_eq!(app.search_input, "ab");

    app.handle_key(key(KeyCode::Esc)).await;
    assert_eq!(app.focus, Focus::Conversations);
    assert_eq!(app.search_input, "");
    assert!(!app.should_quit);
    assert_eq!(app.dashboard.search_query(), "");
}

#[tokio::test]
async fn test_search_enter_runs_search() {
    let mut app = offline_app();
    app.selected_index = 2;

    app.handle_key(key(KeyCode::Char('/'))).await;
    type_text(&mut app, "cita").await;
    app.handle_key(key(KeyCode::Enter)).await;

    assert_eq!(app.focus, Focus::Conversations);
    assert_eq!(app.selected_index, 0);
    assert_eq!(app.dashboard.search_query(), "cita");
    assert!(app.dashboard.is_list_loading());
}

#[tokio::test]
async fn test_compose_typing() {
    let mut app = offline_app();
    app.focus = Focus::Compose;

    // 'q' is text here, not quit
    type_text(&mut app, "aquí").await;
    app.handle_key(key(KeyCode::Backspace)).await;
    assert_eq!(app.dashboard.compose(), "aqu");
    assert!(!app.should_quit);

    // Nothing open: Enter sends nothing and keeps the text
    app.handle_key(key(KeyCode::Enter)).await;
    assert_eq!(app.dashboard.compose(), "aqu");

    app.handle_key(key(KeyCode::Esc)).await;
    assert_eq!(app.focus, Focus::Conversations);
}

#[tokio::test]
async fn test_compose_enter_sends_to_open_conversation() {
    let mut app = offline_app();
    app.dashboard.select_conversation(&ConversationId::from("c1"));
    app.focus = Focus::Compose;

    type_text(&mut app, "hola").await;
    app.handle_key(key(KeyCode::Enter)).await;

    assert_eq!(app.dashboard.compose(), "");
    assert_eq!(app.dashboard.messages().len(), 1);
    assert_eq!(app.scroll(), MessageScroll::Follow);
}

#[tokio::test]
async fn test_theme_toggle_without_preferences() {
    let mut app = offline_app();

    app.handle_key(key(KeyCode::F(6))).await;
    assert_eq!(app.theme, Theme::Dark);
    assert_eq!(app.palette(), Palette::for_theme(Theme::Dark));
    assert!(app.status_message.is_none());
}

#[tokio::test]
async fn test_theme_toggle_persists() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let manager = PreferencesManager::new(temp_file.path())
        .await
        .expect("Failed to create manager");
    let (dashboard, _events) = dashboard(OFFLINE_API, fast_settings());
    let mut app = App::new(dashboard, Theme::Light, Some(manager));

    app.handle_key(key(KeyCode::F(6))).await;

    assert_eq!(app.theme, Theme::Dark);
    assert_eq!(app.status_message.as_deref(), Some("Theme: dark"));
    let saved = Preferences::load(temp_file.path()).expect("Failed to load");
    assert_eq!(saved.theme, Theme::Dark);
}

#[test]
fn test_move_selection_empty_list() {
    let mut app = offline_app();

    app.move_selection(3);
    assert_eq!(app.selected_index, 0);
    app.move_selection(-1);
    assert_eq!(app.selected_index, 0);
}

#[tokio::test]
async fn test_move_selection_clamps() {
    let server = MockServer::start().await;
    let mut app = loaded_app(&server).await;

    app.handle_key(key(KeyCode::Down)).await;
    assert_eq!(app.selected_index, 1);
    app.move_selection(10);
    assert_eq!(app.selected_index, 2);
    app.handle_key(key(KeyCode::Char('k'))).await;
    assert_eq!(app.selected_index, 1);
    app.move_selection(-10);
    assert_eq!(app.selected_index, 0);
}

#[tokio::test]
async fn test_enter_opens_highlighted_conversation() {
    let server = MockServer::start().await;
    let mut app = loaded_app(&server).await;

    app.move_selection(1);
    app.handle_key(key(KeyCode::Enter)).await;

    assert_eq!(app.dashboard.selected(), Some(&ConversationId::from("c2")));
    assert_eq!(app.dashboard.transport().joins("c2"), 1);
}

#[tokio::test]
async fn test_sync_follows_unread_divider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/c1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                { "id": "m1", "sender": "user", "content": "hola", "created_at": to_wire(&at(-10)) },
                { "id": "m2", "sender": "user", "content": "¿hay alguien?", "created_at": to_wire(&at(10)) }
            ],
            "conversation": { "id": "c1", "last_read_at": to_wire(&at(0)) }
        })))
        .mount(&server)
        .await;

    let (dashboard, _events) = dashboard(&format!("{}/api", server.uri()), fast_settings());
    let mut app = App::new(dashboard, Theme::Light, None);
    app.dashboard.select_conversation(&ConversationId::from("c1"));
    settle(&mut app.dashboard, |d| d.messages().len() == 2).await;

    app.sync();
    assert_eq!(app.scroll(), MessageScroll::Anchored(1));

    // The target is consumed once
    app.sync();
    assert_eq!(app.scroll(), MessageScroll::Anchored(1));
}

#[tokio::test]
async fn test_sync_clamps_selection_to_list() {
    let server = MockServer::start().await;
    let mut app = loaded_app(&server).await;
    app.selected_index = 7;

    app.sync();
    assert_eq!(app.selected_index, 2);
}

#[tokio::test]
async fn test_message_scroll_keys() {
    let mut app = offline_app();
    app.focus = Focus::Messages;
    app.record_geometry(PaneGeometry {
        offset: 15,
        height: 5,
        content: 20,
    });

    app.handle_key(key(KeyCode::Up)).await;
    assert_eq!(app.scroll(), MessageScroll::Manual(14));

    app.handle_key(key(KeyCode::PageUp)).await;
    assert_eq!(app.scroll(), MessageScroll::Manual(10));

    app.handle_key(key(KeyCode::End)).await;
    assert_eq!(app.scroll(), MessageScroll::Follow);

    // Scrolling down onto the last row follows again
    app.record_geometry(PaneGeometry {
        offset: 14,
        height: 5,
        content: 20,
    });
    app.handle_key(key(KeyCode::Down)).await;
    assert_eq!(app.scroll(), MessageScroll::Follow);
}

#[tokio::test]
async fn test_refresh_key_reconnects_transport() {
    let mut app = offline_app();

    app.handle_key(key(KeyCode::F(5))).await;

    assert_eq!(app.dashboard.transport().calls(), vec![RoomCall::Connect]);
    assert!(app.dashboard.is_list_loading());
    assert!(app.dashboard.is_stats_loading());
}
