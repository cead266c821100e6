//! Chat message structures

use crate::models::{null_as_default, timestamp, ConversationId, MessageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the conversation produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Sender {
    /// The WhatsApp end user
    User,
    /// The chatbot, or a human operator speaking for it
    #[default]
    Bot,
}

impl From<String> for Sender {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "user" => Sender::User,
            _ => Sender::Bot,
        }
    }
}

/// Message metadata
///
/// Only the flags this crate acts on are typed; everything else the backend
/// attaches is preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Written by a human operator rather than the bot
    #[serde(default, deserialize_with = "null_as_default")]
    pub sent_by_human: bool,
    /// Locally created entry awaiting server confirmation
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "std::ops::Not::not")]
    pub optimistic: bool,
    /// Any other backend-defined keys
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message ID
    pub id: MessageId,
    /// Owning conversation, when the payload carries it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    /// Originating side
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender: Sender,
    /// Model role (`user`, `assistant`, ...) when the backend provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text content
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Ordering key
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Metadata flags
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: MessageMetadata,
    /// Edited by an operator after it was sent
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_edited: bool,
}

impl Message {
    /// Create a message with empty metadata
    pub fn new(
        id: impl Into<MessageId>,
        sender: Sender,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id: None,
            sender,
            role: None,
            content: content.into(),
            created_at,
            metadata: MessageMetadata::default(),
            is_edited: false,
        }
    }

    /// Whether the WhatsApp user wrote this message
    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Whether a human operator wrote this message
    pub fn is_from_human_operator(&self) -> bool {
        self.metadata.sent_by_human
    }

    /// Whether this is an unconfirmed local entry
    pub fn is_optimistic(&self) -> bool {
        self.metadata.optimistic
    }

    /// Only bot-authored messages may be edited by the operator
    pub fn is_editable(&self) -> bool {
        self.sender == Sender::Bot && !self.metadata.optimistic
    }
}
