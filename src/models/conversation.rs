//! Conversation structures and search-hit re-mapping

use crate::models::{null_as_default, timestamp, ConversationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the automated agent answers in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum BotStatus {
    /// Bot replies automatically
    #[default]
    Active,
    /// Bot is paused; nobody replies automatically
    Paused,
    /// A human operator has taken over
    HumanTakeover,
}

impl BotStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            BotStatus::Active => "active",
            BotStatus::Paused => "paused",
            BotStatus::HumanTakeover => "human_takeover",
        }
    }

    /// Short badge shown next to a conversation
    pub fn badge(&self) -> &'static str {
        match self {
            BotStatus::Active => "AUTO",
            BotStatus::Paused => "STOP",
            BotStatus::HumanTakeover => "HUMAN",
        }
    }
}

impl From<String> for BotStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "paused" => BotStatus::Paused,
            "human_takeover" => BotStatus::HumanTakeover,
            _ => BotStatus::Active,
        }
    }
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The WhatsApp user behind a conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatUser {
    /// Profile name
    #[serde(default)]
    pub name: Option<String>,
    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,
}

/// Most recent message summary carried by list rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePreview {
    /// Text content
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// When it was written
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A conversation between the bot and one WhatsApp user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation ID
    pub id: ConversationId,
    /// Associated user
    #[serde(default, alias = "User")]
    pub user: Option<ChatUser>,
    /// Bot control state
    #[serde(default, deserialize_with = "null_as_default")]
    pub bot_status: BotStatus,
    /// Flagged for operator attention
    #[serde(default, deserialize_with = "null_as_default")]
    pub requires_human: bool,
    /// Messages the operator has not read yet
    #[serde(default, deserialize_with = "null_as_default")]
    pub unread_count: u32,
    /// When the operator last read the conversation
    #[serde(default, with = "timestamp::option")]
    pub last_read_at: Option<DateTime<Utc>>,
    /// Latest message first (the backend sends at most one)
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<MessagePreview>,
    /// Last server-side update
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Creation time
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Create a bare conversation with default state
    pub fn new(id: impl Into<ConversationId>) -> Self {
        Self {
            id: id.into(),
            user: None,
            bot_status: BotStatus::Active,
            requires_human: false,
            unread_count: 0,
            last_read_at: None,
            messages: Vec::new(),
            updated_at: None,
            created_at: None,
        }
    }

    /// Name to show for the conversation: user name, then phone
    pub fn display_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.name.as_deref().filter(|n| !n.is_empty()).or(u.phone.as_deref()))
            .unwrap_or("Unknown user")
    }

    /// User phone number, if known
    pub fn phone(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.phone.as_deref())
    }

    /// Latest message summary
    pub fn last_message(&self) -> Option<&MessagePreview> {
        self.messages.first()
    }

    /// Most recent activity, used to order the list
    ///
    /// Latest message time, then `updated_at`, then `created_at`, then epoch.
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.last_message()
            .and_then(|m| m.created_at)
            .or(self.updated_at)
            .or(self.created_at)
            .unwrap_or_default()
    }
}

/// Conversation reference nested in a search hit
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchConversation {
    /// Conversation ID
    #[serde(default)]
    pub id: Option<ConversationId>,
    /// Associated user
    #[serde(default, rename = "User", alias = "user")]
    pub user: Option<ChatUser>,
}

/// A message matching a search query
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    /// Matched message content
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Matched message time
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    /// Conversation the message belongs to
    #[serde(default, rename = "Conversation", alias = "conversation")]
    pub conversation: Option<SearchConversation>,
}

impl SearchHit {
    /// Re-map the hit into a conversation-shaped list row
    ///
    /// Hits without a conversation id cannot be opened and map to `None`.
    pub fn into_row(self) -> Option<Conversation> {
        let conversation = self.conversation?;
        let mut row = Conversation::new(conversation.id?);
        row.user = conversation.user;
        row.messages = vec![MessagePreview {
            content: self.content,
            created_at: self.created_at,
        }];
        row.updated_at = self.created_at;
        Some(row)
    }
}
