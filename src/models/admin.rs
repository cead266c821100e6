//! Dashboard statistics, business credentials and prompt templates

use crate::models::{null_as_default, BusinessId, PromptId};
use serde::{Deserialize, Serialize};

/// Aggregate counters shown on the stats cards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Distinct WhatsApp users
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_users: u64,
    /// Conversations ever started
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_conversations: u64,
    /// Messages exchanged
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_messages: u64,
    /// Messages exchanged today
    #[serde(default, deserialize_with = "null_as_default")]
    pub today_messages: u64,
}

/// WhatsApp Cloud API credentials for a business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsappConfig {
    /// Access token
    #[serde(default)]
    pub jwt_token: String,
    /// Phone number ID
    #[serde(default)]
    pub number_id: String,
    /// Webhook verify token
    #[serde(default)]
    pub verify_token: String,
    /// Graph API version
    #[serde(default = "WhatsappConfig::default_version")]
    pub version: String,
}

impl WhatsappConfig {
    fn default_version() -> String {
        "v24.0".to_string()
    }

    /// Mask a secret for display, keeping only its last four characters
    pub fn mask(secret: &str) -> String {
        let chars: Vec<char> = secret.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            jwt_token: String::new(),
            number_id: String::new(),
            verify_token: String::new(),
            version: Self::default_version(),
        }
    }
}

/// A tenant of the chatbot platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    /// Business ID
    pub id: BusinessId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// URL slug
    #[serde(default)]
    pub slug: String,
    /// Configured credentials, if any
    #[serde(default)]
    pub whatsapp_config: Option<WhatsappConfig>,
    /// Server-side flag: credentials stored
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_credentials: bool,
}

/// Fields of a prompt template that the operator edits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDraft {
    /// Prompt category (system, greeting, ...)
    #[serde(rename = "type")]
    pub prompt_type: String,
    /// Display name
    pub name: String,
    /// Prompt text
    pub content: String,
    /// Whether the bot uses it
    #[serde(default)]
    pub is_active: bool,
}

/// A stored prompt template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    /// Prompt ID
    pub id: PromptId,
    /// Prompt category
    #[serde(rename = "type", default)]
    pub prompt_type: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Prompt text
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    /// Whether the bot uses it
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,
}

impl PromptTemplate {
    /// Editable copy of this template
    pub fn to_draft(&self) -> PromptDraft {
        PromptDraft {
            prompt_type: self.prompt_type.clone(),
            name: self.name.clone(),
            content: self.content.clone(),
            is_active: self.is_active,
        }
    }
}
