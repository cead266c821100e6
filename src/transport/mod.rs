//! Push transport module
//!
//! This module keeps the dashboard subscribed to both backend push services:
//! - `socket` - one Socket.IO link with its own reconnection loop
//! - `polling` - Engine.IO long-polling, the degraded fallback transport
//! - `dual` - the pair of links (core API + bot service) behind one event stream
//!
//! Connection failures never surface as errors to callers. They are logged
//! and reflected in [`LinkState`] / [`ConnectionStatus`].

pub mod dual;
pub mod polling;
pub mod socket;

pub use dual::DualTransport;
pub use socket::SocketClient;

use crate::models::ConversationId;
use crate::protocol::PushEvent;
use crate::storage::Settings;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;

/// Which backend service an event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    /// The core REST API's socket server
    CoreApi,
    /// The bot service's socket server
    BotService,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::CoreApi => f.write_str("core-api"),
            EventSource::BotService => f.write_str("bot-service"),
        }
    }
}

/// Underlying transport of an established link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Full-duplex WebSocket
    WebSocket,
    /// HTTP long-polling fallback
    Polling,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkMode::WebSocket => f.write_str("websocket"),
            LinkMode::Polling => f.write_str("polling"),
        }
    }
}

/// Lifecycle state of one link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Never connected, or explicitly disconnected
    Disconnected,
    /// First connection attempt in progress
    Connecting,
    /// Connection lost or refused; retrying
    Reconnecting {
        /// Retry number, starting at 1
        attempt: u32,
    },
    /// Link is up
    Connected(LinkMode),
    /// Retries exhausted; stays down until the next explicit connect
    Down,
}

impl LinkState {
    /// Whether events can currently flow
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected(_))
    }
}

/// Connection flags for both push services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    /// Core API link is up
    pub core_api: bool,
    /// Bot service link is up
    pub bot_service: bool,
}

impl ConnectionStatus {
    /// At least one link is up
    pub fn is_usable(&self) -> bool {
        self.core_api || self.bot_service
    }
}

/// A push event tagged with the service that delivered it
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedEvent {
    /// Delivering service
    pub source: EventSource,
    /// The event
    pub event: PushEvent,
}

/// Receiving end of the merged push event stream
pub type EventStream = mpsc::UnboundedReceiver<SourcedEvent>;

/// Reconnection and fallback behaviour of a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Retries after the first failed attempt before the link is marked down
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub delay: Duration,
    /// Deadline for connecting and joining the namespace
    pub connect_timeout: Duration,
    /// Fall back to long-polling when WebSocket is unavailable
    pub allow_polling: bool,
}

impl ReconnectPolicy {
    /// Build the policy from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.reconnection_attempts,
            delay: Duration::from_millis(settings.reconnection_delay_ms),
            connect_timeout: Duration::from_millis(settings.socket_timeout_ms),
            allow_polling: settings.allow_polling_fallback,
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(1000),
            connect_timeout: Duration::from_millis(5000),
            allow_polling: true,
        }
    }
}

/// Room-aware push transport as seen by the dashboard session
///
/// Implementations must never fail: connection problems are reported
/// through [`RoomTransport::status`] only.
pub trait RoomTransport {
    /// Start all links; no-op for links already running
    fn connect(&self);

    /// Stop all links; safe when never connected
    fn disconnect(&self);

    /// Subscribe to a conversation's room on every link
    fn join_room(&self, conversation_id: &ConversationId);

    /// Unsubscribe from a conversation's room on every link
    fn leave_room(&self, conversation_id: &ConversationId);

    /// Current connection flags
    fn status(&self) -> ConnectionStatus;
}
