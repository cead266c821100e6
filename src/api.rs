//! REST client module
//!
//! Typed access to the dashboard REST API:
//! - conversation list, message search and message pages
//! - bot control (status, requires-human, human messages, edits, mark-read)
//! - stats, business credentials and prompt templates
//!
//! Responses may be bare JSON or wrapped as `{success, data}`; both are
//! accepted. Idempotent GETs are retried when they time out.

use crate::models::{
    BotStatus, Business, BusinessId, Conversation, ConversationId, Message, MessageId, PromptDraft,
    PromptId, PromptTemplate, SearchHit, Stats, WhatsappConfig,
};
use crate::storage::Settings;
use crate::{Error, Result};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// One page of list results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Page number, 1-based
    pub page: u32,
    /// Total number of pages, at least 1
    pub total_pages: u32,
}

/// One page of a conversation's messages
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePage {
    /// Messages on this page, in server order
    pub messages: Vec<Message>,
    /// Conversation header, when the server includes it
    pub conversation: Option<Conversation>,
    /// Page number, 1-based
    pub page: u32,
    /// Total number of pages, at least 1
    pub total_pages: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default, alias = "total_pages")]
    total_pages: Option<u32>,
}

impl PageInfo {
    /// Page numbers with fallbacks to the requested page and a single page
    fn resolve(&self, requested: u32) -> (u32, u32) {
        let page = self.page.filter(|p| *p > 0).unwrap_or(requested);
        let total_pages = self.total_pages.filter(|t| *t > 0).unwrap_or(1);
        (page, total_pages)
    }
}

#[derive(Debug, Deserialize)]
struct RawConversationPage {
    #[serde(default, deserialize_with = "lenient_items")]
    conversations: Vec<Conversation>,
    #[serde(flatten)]
    info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct RawSearchPage {
    #[serde(default, deserialize_with = "lenient_items")]
    messages: Vec<SearchHit>,
    #[serde(flatten)]
    info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct RawMessagePage {
    #[serde(default, deserialize_with = "lenient_items")]
    messages: Vec<Message>,
    #[serde(default)]
    conversation: Option<Conversation>,
    #[serde(flatten)]
    info: PageInfo,
}

/// Decode list rows one at a time, skipping rows that do not fit `T`
///
/// A single malformed row (bad timestamp, wrong type) must not hide the
/// rest of the page. `null` reads as an empty list.
fn lenient_items<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let rows = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed row: {}", e);
                None
            }
        })
        .collect())
}

/// List payloads arrive bare or nested under a named key
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Prompts { prompts: Vec<T> },
    Businesses { businesses: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Prompts { prompts } => prompts,
            Listing::Businesses { businesses } => businesses,
        }
    }
}

#[derive(Debug, Serialize)]
struct ContentBody<'a> {
    content: &'a str,
}

/// Client for the dashboard REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl ApiClient {
    /// Create a client for `base_url` with a per-request `timeout`
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `http://localhost:3009/api`
    /// * `timeout` - Deadline applied to every request
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    /// Create a client from settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.api_url.clone(), settings.request_timeout())?
            .with_max_retries(settings.request_retries))
    }

    /// Override how many times a timed-out GET is retried
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// API root this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of conversations
    pub async fn list_conversations(&self, page: u32, limit: u32) -> Result<Page<Conversation>> {
        let raw: RawConversationPage = self
            .get("/conversations", &[("page", page.to_string()), ("limit", limit.to_string())])
            .await?;
        let (page, total_pages) = raw.info.resolve(page);
        Ok(Page {
            items: raw.conversations,
            page,
            total_pages,
        })
    }

    /// Search messages and re-map the hits into conversation rows
    ///
    /// Hits without a conversation id are skipped.
    pub async fn search_messages(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<Page<Conversation>> {
        let raw: RawSearchPage = self
            .get(
                "/search",
                &[
                    ("q", query.to_string()),
                    ("page", page.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        let (page, total_pages) = raw.info.resolve(page);
        Ok(Page {
            items: raw.messages.into_iter().filter_map(SearchHit::into_row).collect(),
            page,
            total_pages,
        })
    }

    /// Fetch one page of a conversation's messages
    pub async fn get_messages(
        &self,
        conversation_id: &ConversationId,
        page: u32,
        limit: u32,
    ) -> Result<MessagePage> {
        let raw: RawMessagePage = self
            .get(
                &format!("/conversations/{}/messages", conversation_id),
                &[("page", page.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        let (page, total_pages) = raw.info.resolve(page);
        Ok(MessagePage {
            messages: raw.messages,
            conversation: raw.conversation,
            page,
            total_pages,
        })
    }

    /// Fetch aggregate counters
    pub async fn get_stats(&self) -> Result<Stats> {
        self.get("/stats", &[]).await
    }

    /// Change who answers a conversation
    pub async fn change_bot_status(
        &self,
        conversation_id: &ConversationId,
        status: BotStatus,
    ) -> Result<()> {
        let _: Value = self
            .send(
                Method::PUT,
                &format!("/conversations/{}/bot-status", conversation_id),
                Some(&json!({ "status": status.as_str() })),
            )
            .await?;
        Ok(())
    }

    /// Replace the content of a bot message
    pub async fn edit_message(&self, message_id: &MessageId, content: &str) -> Result<()> {
        let _: Value = self
            .send(
                Method::PUT,
                &format!("/messages/{}", message_id),
                Some(&ContentBody { content }),
            )
            .await?;
        Ok(())
    }

    /// Send a message as the human operator
    ///
    /// # Returns
    /// The stored message when the server echoes it back
    pub async fn send_human_message(
        &self,
        conversation_id: &ConversationId,
        content: &str,
    ) -> Result<Option<Message>> {
        let body: Value = self
            .send(
                Method::POST,
                &format!("/conversations/{}/human-message", conversation_id),
                Some(&ContentBody { content }),
            )
            .await?;

        let stored = body
            .get("message")
            .cloned()
            .and_then(|message| serde_json::from_value::<Message>(message).ok());
        if stored.is_none() {
            debug!("Send to {} returned no durable message", conversation_id);
        }
        Ok(stored)
    }

    /// Set or clear the requires-human flag
    pub async fn set_requires_human(
        &self,
        conversation_id: &ConversationId,
        requires_human: bool,
    ) -> Result<()> {
        let _: Value = self
            .send(
                Method::PUT,
                &format!("/conversations/{}/require-human", conversation_id),
                Some(&json!({ "requires_human": requires_human })),
            )
            .await?;
        Ok(())
    }

    /// Mark a conversation as read
    pub async fn mark_read(&self, conversation_id: &ConversationId) -> Result<()> {
        let _: Value = self
            .send::<Value, _>(
                Method::POST,
                &format!("/conversations/{}/read", conversation_id),
                None,
            )
            .await?;
        Ok(())
    }

    /// List businesses
    pub async fn list_businesses(&self) -> Result<Vec<Business>> {
        let listing: Listing<Business> = self.get("/businesses", &[]).await?;
        Ok(listing.into_vec())
    }

    /// Store WhatsApp credentials for a business
    pub async fn update_credentials(
        &self,
        business_id: &BusinessId,
        config: &WhatsappConfig,
    ) -> Result<()> {
        let _: Value = self
            .send(
                Method::PUT,
                &format!("/businesses/{}/credentials", business_id),
                Some(&json!({ "whatsappConfig": config })),
            )
            .await?;
        Ok(())
    }

    /// List a business's prompt templates
    pub async fn list_prompts(&self, business_id: &BusinessId) -> Result<Vec<PromptTemplate>> {
        let listing: Listing<PromptTemplate> = self
            .get(&format!("/businesses/{}/prompts", business_id), &[])
            .await?;
        Ok(listing.into_vec())
    }

    /// Create a prompt template
    pub async fn create_prompt(
        &self,
        business_id: &BusinessId,
        draft: &PromptDraft,
    ) -> Result<Option<PromptTemplate>> {
        let body: Value = self
            .send(
                Method::POST,
                &format!("/businesses/{}/prompts", business_id),
                Some(draft),
            )
            .await?;
        let created = body.get("prompt").cloned().unwrap_or(body);
        Ok(serde_json::from_value(created).ok())
    }

    /// Update a prompt template
    pub async fn update_prompt(
        &self,
        business_id: &BusinessId,
        prompt_id: &PromptId,
        draft: &PromptDraft,
    ) -> Result<()> {
        let _: Value = self
            .send(
                Method::PUT,
                &format!("/businesses/{}/prompts/{}", business_id, prompt_id),
                Some(draft),
            )
            .await?;
        Ok(())
    }

    /// Delete a prompt template
    pub async fn delete_prompt(&self, business_id: &BusinessId, prompt_id: &PromptId) -> Result<()> {
        let _: Value = self
            .send::<Value, _>(
                Method::DELETE,
                &format!("/businesses/{}/prompts/{}", business_id, prompt_id),
                None,
            )
            .await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with retry on timeout
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        let mut attempt = 0;

        loop {
            debug!("GET {} (attempt {})", url, attempt + 1);
            match self.client.get(&url).query(query).send().await {
                Ok(response) => return read_body(response).await,
                Err(e) if e.is_timeout() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("GET {} timed out, retrying", url);
                }
                Err(e) if e.is_timeout() => {
                    return Err(Error::Timeout(format!("GET {}", url)));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Non-idempotent request, never retried
    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        match request.send().await {
            Ok(response) => read_body(response).await,
            Err(e) if e.is_timeout() => Err(Error::Timeout(format!("{} {}", method, url))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Check the status, strip the `{success, data}` envelope and decode
async fn read_body<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: error_message(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string()),
        });
    }

    let value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text)?
    };
    Ok(serde_json::from_value(unwrap_envelope(value, status.as_u16())?)?)
}

fn unwrap_envelope(value: Value, status: u16) -> Result<Value> {
    match value {
        Value::Object(mut map) if map.contains_key("success") => {
            if map.get("success") == Some(&Value::Bool(false)) {
                let message = error_message(&Value::Object(map).to_string())
                    .unwrap_or_else(|| "request rejected".to_string());
                return Err(Error::Api { status, message });
            }
            Ok(map.remove("data").unwrap_or(Value::Object(map)))
        }
        other => Ok(other),
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
