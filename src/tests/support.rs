// Shared test fixtures

use crate::api::ApiClient;
use crate::dashboard::Dashboard;
use crate::models::{ConversationId, Message, Sender};
use crate::storage::Settings;
use crate::transport::{ConnectionStatus, RoomTransport, SourcedEvent};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Room operation observed by [`RecordingTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomCall {
    Connect,
    Disconnect,
    Join(ConversationId),
    Leave(ConversationId),
}

/// Transport double that records every call
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<RoomCall>>,
    status: Mutex<ConnectionStatus>,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<RoomCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn joins(&self, id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == RoomCall::Join(ConversationId::from(id)))
            .count()
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        *self.status.lock().expect("status lock") = status;
    }

    fn record(&self, call: RoomCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

impl RoomTransport for RecordingTransport {
    fn connect(&self) {
        self.record(RoomCall::Connect);
    }

    fn disconnect(&self) {
        self.record(RoomCall::Disconnect);
    }

    fn join_room(&self, conversation_id: &ConversationId) {
        self.record(RoomCall::Join(conversation_id.clone()));
    }

    fn leave_room(&self, conversation_id: &ConversationId) {
        self.record(RoomCall::Leave(conversation_id.clone()));
    }

    fn status(&self) -> ConnectionStatus {
        *self.status.lock().expect("status lock")
    }
}

/// Fixed reference instant plus `secs` seconds
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
}

/// Plain message fixture
pub fn message(id: &str, sender: Sender, content: &str, created_at: DateTime<Utc>) -> Message {
    Message::new(id, sender, content, created_at)
}

/// Settings with short refresh delays and no stats timer
pub fn fast_settings() -> Settings {
    Settings {
        refresh_after_send_ms: 20,
        refresh_after_push_ms: 20,
        stats_interval_secs: 0,
        ..Settings::default()
    }
}

/// Session against `base_url` over a recording transport
///
/// # Returns
/// The session and the sender that feeds its push event stream
pub fn dashboard(
    base_url: &str,
    settings: Settings,
) -> (Dashboard<RecordingTransport>, mpsc::UnboundedSender<SourcedEvent>) {
    let api = ApiClient::new(base_url, std::time::Duration::from_secs(2))
        .expect("Failed to create API client")
        .with_max_retries(0);
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Dashboard::new(api, RecordingTransport::default(), rx, settings),
        tx,
    )
}

/// Step the session until `done` holds, failing after five seconds
pub async fn settle<F>(dashboard: &mut Dashboard<RecordingTransport>, done: F)
where
    F: Fn(&Dashboard<RecordingTransport>) -> bool,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while !done(dashboard) {
            dashboard.step().await;
        }
    })
    .await
    .expect("Dashboard did not reach the expected state");
}
