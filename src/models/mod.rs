//! Data model consumed from the chatbot backend
//!
//! The backend owns these shapes; the types here are deliberately lenient
//! about what they accept (string or numeric ids, `null` where a default
//! makes sense, several timestamp spellings) and strict about what the rest
//! of the crate sees.
//!
//! - `conversation` - conversations, their users and search hits
//! - `message` - chat messages and their metadata
//! - `admin` - stats, businesses, prompt templates
//! - `timestamp` - lenient timestamp (de)serialization

pub mod admin;
pub mod conversation;
pub mod message;
pub mod timestamp;

pub use admin::{Business, PromptDraft, PromptTemplate, Stats, WhatsappConfig};
pub use conversation::{BotStatus, ChatUser, Conversation, MessagePreview, SearchHit};
pub use message::{Message, MessageMetadata, Sender};

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Raw identifier as it appears on the wire: either a string or a number
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

macro_rules! wire_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an id from anything string-like
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the id as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
            }
        }
    };
}

wire_id!(
    /// Conversation identifier
    ConversationId
);
wire_id!(
    /// Message identifier (server-issued or locally synthesized)
    MessageId
);
wire_id!(
    /// Business (tenant) identifier
    BusinessId
);
wire_id!(
    /// Prompt template identifier
    PromptId
);

/// Deserialize `null` as the type's default value
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
