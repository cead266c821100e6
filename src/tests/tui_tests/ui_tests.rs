// UI Tests - Testing UI helper functions and frame rendering

use crate::models::timestamp::to_wire;
use crate::models::ConversationId;
use crate::storage::Theme;
use crate::tests::support::{at, dashboard, fast_settings, settle, RecordingTransport};
use crate::transport::ConnectionStatus;
use crate::tui::app::MessageScroll;
use crate::tui::ui::{connection_dot, resolve_offset, ui};
use crate::tui::App;
use ratatui::{backend::TestBackend, Terminal};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Draw one frame and return the screen as text, one line per row
fn render(app: &App<RecordingTransport>, width: u16, height: u16) -> String {
    let mut terminal =
        Terminal::new(TestBackend::new(width, height)).expect("Failed to create terminal");
    terminal.draw(|f| ui(f, app)).expect("Failed to draw");

    terminal
        .backend()
        .buffer()
        .content
        .chunks(width as usize)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_connection_dot() {
    assert_eq!(connection_dot(true), "●");
    assert_eq!(connection_dot(false), "○");
}

#[test]
fn test_resolve_offset_follow() {
    assert_eq!(resolve_offset(MessageScroll::Follow, None, 100, 10), 90);
    // Content shorter than the pane
    assert_eq!(resolve_offset(MessageScroll::Follow, None, 4, 10), 0);
}

#[test]
fn test_resolve_offset_anchored() {
    // Anchor row lands in the middle of the pane
    assert_eq!(resolve_offset(MessageScroll::Anchored(3), Some(30), 100, 10), 25);
    assert_eq!(resolve_offset(MessageScroll::Anchored(0), Some(2), 100, 10), 0);
    // Never past the last page
    assert_eq!(resolve_offset(MessageScroll::Anchored(9), Some(98), 100, 10), 90);
    // Anchor not rendered: fall back to the bottom
    assert_eq!(resolve_offset(MessageScroll::Anchored(9), None, 100, 10), 90);
}

#[test]
fn test_resolve_offset_manual() {
    assert_eq!(resolve_offset(MessageScroll::Manual(3), None, 100, 10), 3);
    assert_eq!(resolve_offset(MessageScroll::Manual(500), None, 100, 10), 90);
}

#[test]
fn test_render_empty_dashboard() {
    let (dashboard, _events) = dashboard("http://127.0.0.1:9/api", fast_settings());
    let app = App::new(dashboard, Theme::Light, None);

    let screen = render(&app, 120, 30);

    assert!(screen.contains("WhatsApp Dashboard"));
    assert!(screen.contains("offline"));
    assert!(screen.contains("loading stats"));
    assert!(screen.contains("No conversations"));
    assert!(screen.contains("Select a conversation and press Enter"));
    assert!(screen.contains("Enter: Open"));
}

#[test]
fn test_render_connected_hides_offline() {
    let (dashboard, _events) = dashboard("http://127.0.0.1:9/api", fast_settings());
    dashboard.transport().set_status(ConnectionStatus {
        core_api: true,
        bot_service: false,
    });
    let app = App::new(dashboard, Theme::Dark, None);

    let screen = render(&app, 120, 30);
    assert!(!screen.contains("offline"));
}

#[test]
fn test_render_status_message_in_footer() {
    let (dashboard, _events) = dashboard("http://127.0.0.1:9/api", fast_settings());
    let mut app = App::new(dashboard, Theme::Light, None);
    app.status_message = Some("Theme: dark".to_string());

    let screen = render(&app, 120, 30);
    assert!(screen.contains("Theme: dark"));
}

#[tokio::test]
async fn test_render_list_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db down" })))
        .mount(&server)
        .await;

    let (mut dashboard, _events) = dashboard(&format!("{}/api", server.uri()), fast_settings());
    dashboard.load_conversations();
    settle(&mut dashboard, |d| !d.is_list_loading()).await;
    let app = App::new(dashboard, Theme::Light, None);

    let screen = render(&app, 200, 30);
    assert!(screen.contains("Could not load"));
}

#[tokio::test]
async fn test_render_open_conversation_with_divider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/c1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                { "id": "m1", "sender": "user", "content": "hola", "created_at": to_wire(&at(-10)) },
                { "id": "m2", "sender": "bot", "content": "buenos días", "created_at": to_wire(&at(-5)) },
                { "id": "m3", "sender": "user", "content": "una cita", "created_at": to_wire(&at(5)) }
            ],
            "conversation": {
                "id": "c1",
                "requires_human": true,
                "last_read_at": to_wire(&at(0)),
                "User": { "name": "Ana", "phone": "+34600000000" }
            }
        })))
        .mount(&server)
        .await;

    let (dashboard, _events) = dashboard(&format!("{}/api", server.uri()), fast_settings());
    let mut app = App::new(dashboard, Theme::Light, None);
    app.dashboard.select_conversation(&ConversationId::from("c1"));
    settle(&mut app.dashboard, |d| d.messages().len() == 3).await;
    app.sync();

    let screen = render(&app, 120, 30);

    assert!(screen.contains("Ana"));
    assert!(screen.contains("needs human"));
    assert!(screen.contains("unread messages"));
    assert!(screen.contains("User: hola"));
    assert!(screen.contains("Bot: buenos días"));
    assert!(screen.contains("User: una cita"));
    assert!(screen.contains("Reply as operator"));

    // Three messages plus the divider
    assert_eq!(app.geometry().content, 4);
}
