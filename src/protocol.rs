//! Push protocol module
//!
//! This module defines the wire format spoken with both push services:
//! - Engine.IO v4 packet framing (open, ping/pong, close, payload batching)
//! - Socket.IO v5 packets on the default namespace (connect, event, error)
//! - Typed push events (`new-message`, `bot-status-change`, `conversation-updated`)
//! - Room commands (`join-conversation`, `leave-conversation`)

use crate::models::{
    timestamp, BotStatus, ConversationId, Message, MessageId, MessageMetadata, Sender,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Engine.IO protocol revision requested in the connection URL
pub const ENGINE_IO_VERSION: u8 = 4;

/// Separator between packets in a long-polling payload
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Path the Socket.IO server is mounted on
pub const SOCKET_IO_PATH: &str = "/socket.io/";

/// Session parameters announced by the server in the open packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine.IO session id
    pub sid: String,
    /// Transports the session may upgrade to
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings
    #[serde(default = "Handshake::default_ping_interval")]
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong
    #[serde(default = "Handshake::default_ping_timeout")]
    pub ping_timeout: u64,
    /// Largest payload the server accepts
    #[serde(default)]
    pub max_payload: u64,
}

impl Handshake {
    fn default_ping_interval() -> u64 {
        25_000
    }

    fn default_ping_timeout() -> u64 {
        20_000
    }

    /// How long the link may stay silent before the peer is presumed dead
    pub fn liveness_window(&self) -> Duration {
        Duration::from_millis(self.ping_interval + self.ping_timeout)
    }
}

/// A single Engine.IO packet, with Socket.IO packets decoded in place
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// `0` - session open
    Open(Handshake),
    /// `1` - transport close
    Close,
    /// `2` - heartbeat from the server
    Ping,
    /// `3` - heartbeat reply
    Pong,
    /// `5` - transport upgrade
    Upgrade,
    /// `6` - no-op (used to end a pending poll)
    Noop,
    /// `40` - namespace connect (request or acknowledgement)
    Connect,
    /// `41` - namespace disconnect
    Disconnect,
    /// `42` - named event with JSON arguments
    Event {
        /// Event name
        name: String,
        /// Event arguments
        args: Vec<Value>,
    },
    /// `44` - namespace connection refused
    ConnectError(String),
    /// Socket.IO packet types this client does not use (acks, binary)
    Unsupported(char),
}

impl Packet {
    /// Build an event packet
    pub fn event(name: impl Into<String>, args: Vec<Value>) -> Self {
        Packet::Event {
            name: name.into(),
            args,
        }
    }

    /// Decode a single packet from its text form
    pub fn decode(raw: &str) -> Result<Self> {
        let mut chars = raw.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty packet".to_string()))?;
        let rest = chars.as_str();

        match kind {
            '0' => {
                let handshake: Handshake = serde_json::from_str(rest)
                    .map_err(|e| Error::Protocol(format!("invalid open packet: {}", e)))?;
                Ok(Packet::Open(handshake))
            }
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => Self::decode_socket(rest),
            '5' => Ok(Packet::Upgrade),
            '6' => Ok(Packet::Noop),
            'b' => Err(Error::Protocol("binary packets are not supported".to_string())),
            other => Err(Error::Protocol(format!("unknown packet type '{}'", other))),
        }
    }

    fn decode_socket(raw: &str) -> Result<Self> {
        let mut chars = raw.chars();
        let kind = chars
            .next()
            .ok_or_else(|| Error::Protocol("empty socket packet".to_string()))?;
        let mut body = chars.as_str();

        // "/nsp," prefix; only the default namespace is joined
        if body.starts_with('/') {
            body = body.split_once(',').map(|(_, b)| b).unwrap_or("");
        }

        match kind {
            '0' => Ok(Packet::Connect),
            '1' => Ok(Packet::Disconnect),
            '2' => {
                let json = body.trim_start_matches(|c: char| c.is_ascii_digit());
                let items: Vec<Value> = serde_json::from_str(json)
                    .map_err(|e| Error::Protocol(format!("invalid event payload: {}", e)))?;
                let mut items = items.into_iter();
                let name = match items.next() {
                    Some(Value::String(name)) => name,
                    _ => return Err(Error::Protocol("event without a name".to_string())),
                };
                Ok(Packet::Event {
                    name,
                    args: items.collect(),
                })
            }
            '4' => {
                let message = serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_else(|| body.to_string());
                Ok(Packet::ConnectError(message))
            }
            other => Ok(Packet::Unsupported(other)),
        }
    }

    /// Encode the packet into its text form
    pub fn encode(&self) -> String {
        match self {
            Packet::Open(handshake) => format!(
                "0{}",
                serde_json::to_value(handshake).unwrap_or(Value::Null)
            ),
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => "3".to_string(),
            Packet::Upgrade => "5".to_string(),
            Packet::Noop => "6".to_string(),
            Packet::Connect => "40".to_string(),
            Packet::Disconnect => "41".to_string(),
            Packet::Event { name, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                format!("42{}", Value::Array(items))
            }
            Packet::ConnectError(message) => {
                format!("44{}", serde_json::json!({ "message": message }))
            }
            Packet::Unsupported(kind) => format!("4{}", kind),
        }
    }
}

/// Split a long-polling payload into packets
pub fn decode_payload(body: &str) -> Result<Vec<Packet>> {
    body.split(RECORD_SEPARATOR)
        .filter(|raw| !raw.is_empty())
        .map(Packet::decode)
        .collect()
}

/// Join packets into a long-polling payload
pub fn encode_payload(packets: &[Packet]) -> String {
    packets
        .iter()
        .map(Packet::encode)
        .collect::<Vec<_>>()
        .join(&RECORD_SEPARATOR.to_string())
}

/// Message body of a `new-message` event
///
/// Producers disagree on field names, so every known spelling is accepted
/// and resolved by the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IncomingMessage {
    /// Server id, absent for some bot-service events
    #[serde(default)]
    pub id: Option<MessageId>,
    /// Owning conversation (nested shape)
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    /// Text content
    #[serde(default)]
    pub content: Option<String>,
    /// Alternate spelling of `content`
    #[serde(default)]
    pub message_content: Option<String>,
    /// `user` / `bot`
    #[serde(default)]
    pub sender: Option<String>,
    /// `user` / `assistant`
    #[serde(default)]
    pub role: Option<String>,
    /// Alternate sender flag
    #[serde(default)]
    pub from_user: Option<bool>,
    /// Preferred timestamp field
    #[serde(default, with = "timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Alternate timestamp field
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    /// Metadata flags
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
}

impl IncomingMessage {
    /// Text content, from whichever field carries it
    pub fn text(&self) -> &str {
        self.content
            .as_deref()
            .or(self.message_content.as_deref())
            .unwrap_or("")
    }

    /// Originating side
    pub fn sender(&self) -> Sender {
        match (&self.sender, self.from_user) {
            (Some(sender), _) => Sender::from(sender.clone()),
            (None, Some(true)) => Sender::User,
            _ => Sender::Bot,
        }
    }

    /// Model role
    pub fn role(&self) -> String {
        match (&self.role, self.from_user) {
            (Some(role), _) => role.clone(),
            (None, Some(true)) => "user".to_string(),
            _ => "assistant".to_string(),
        }
    }

    /// Event time, or `now` when the payload has none
    pub fn sent_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.timestamp.or(self.created_at).unwrap_or(now)
    }

    /// Convert into a message for `conversation_id`
    ///
    /// Payloads without a server id get a synthesized `realtime-` id.
    pub fn into_message(self, conversation_id: &ConversationId, now: DateTime<Utc>) -> Message {
        let id = self
            .id
            .clone()
            .unwrap_or_else(|| MessageId::new(format!("realtime-{}", Uuid::new_v4())));
        let mut message = Message::new(id, self.sender(), self.text(), self.sent_at(now));
        message.conversation_id = Some(conversation_id.clone());
        message.role = Some(self.role());
        message.metadata = self.metadata.unwrap_or_default();
        message
    }
}

/// `new-message` push event
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewMessageEvent {
    /// Target conversation (top-level shape)
    #[serde(default, rename = "conversationId", alias = "conversation_id")]
    pub conversation_id: Option<ConversationId>,
    /// The message itself
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

impl NewMessageEvent {
    /// Whether the event belongs to `conversation`, by either payload shape
    pub fn targets(&self, conversation: &ConversationId) -> bool {
        self.conversation_id.as_ref() == Some(conversation)
            || self
                .message
                .as_ref()
                .and_then(|m| m.conversation_id.as_ref())
                == Some(conversation)
    }

    /// The conversation the event names, preferring the top-level field
    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation_id
            .as_ref()
            .or_else(|| self.message.as_ref().and_then(|m| m.conversation_id.as_ref()))
    }
}

/// `bot-status-change` push event
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BotStatusChangeEvent {
    /// Affected conversation
    #[serde(default, rename = "conversationId", alias = "conversation_id")]
    pub conversation_id: Option<ConversationId>,
    /// New status, if the producer included it
    #[serde(default, alias = "botStatus", alias = "bot_status", alias = "newStatus")]
    pub status: Option<BotStatus>,
}

/// `conversation-updated` push event
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConversationUpdatedEvent {
    /// Affected conversation
    #[serde(default, rename = "conversationId", alias = "conversation_id")]
    pub conversation_id: Option<ConversationId>,
}

/// A typed push event
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// A message was written in some conversation
    NewMessage(NewMessageEvent),
    /// The bot status of a conversation changed
    BotStatusChange(BotStatusChangeEvent),
    /// Conversation metadata changed
    ConversationUpdated(ConversationUpdatedEvent),
    /// Any event this client does not consume
    Other(String),
}

impl PushEvent {
    /// Event name for `new-message`
    pub const NEW_MESSAGE: &'static str = "new-message";
    /// Event name for `bot-status-change`
    pub const BOT_STATUS_CHANGE: &'static str = "bot-status-change";
    /// Event name for `conversation-updated`
    pub const CONVERSATION_UPDATED: &'static str = "conversation-updated";

    /// Decode an event from its name and Socket.IO arguments
    pub fn decode(name: &str, args: &[Value]) -> Result<Self> {
        let data = args.first().cloned().unwrap_or(Value::Null);
        let invalid = |e: serde_json::Error| Error::Protocol(format!("invalid {} payload: {}", name, e));

        match name {
            Self::NEW_MESSAGE => serde_json::from_value(data)
                .map(PushEvent::NewMessage)
                .map_err(invalid),
            Self::BOT_STATUS_CHANGE => serde_json::from_value(data)
                .map(PushEvent::BotStatusChange)
                .map_err(invalid),
            Self::CONVERSATION_UPDATED => serde_json::from_value(data)
                .map(PushEvent::ConversationUpdated)
                .map_err(invalid),
            other => Ok(PushEvent::Other(other.to_string())),
        }
    }

    /// Event name
    pub fn name(&self) -> &str {
        match self {
            PushEvent::NewMessage(_) => Self::NEW_MESSAGE,
            PushEvent::BotStatusChange(_) => Self::BOT_STATUS_CHANGE,
            PushEvent::ConversationUpdated(_) => Self::CONVERSATION_UPDATED,
            PushEvent::Other(name) => name,
        }
    }
}

/// Room command sent to a push service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Subscribe to a conversation's room
    JoinConversation(ConversationId),
    /// Unsubscribe from a conversation's room
    LeaveConversation(ConversationId),
}

impl Command {
    /// Event name on the wire
    pub fn event_name(&self) -> &'static str {
        match self {
            Command::JoinConversation(_) => "join-conversation",
            Command::LeaveConversation(_) => "leave-conversation",
        }
    }

    /// Conversation the command refers to
    pub fn conversation_id(&self) -> &ConversationId {
        match self {
            Command::JoinConversation(id) | Command::LeaveConversation(id) => id,
        }
    }

    /// Encode as a Socket.IO event packet
    pub fn to_packet(&self) -> Packet {
        Packet::event(
            self.event_name(),
            vec![Value::String(self.conversation_id().to_string())],
        )
    }
}
