//! Message reconciliation module
//!
//! One conversation's messages arrive from three places: paginated fetches
//! (authoritative), push events and optimistic local sends. The
//! [`Reconciler`] merges them into a single ordered sequence in which each
//! logical message appears exactly once.
//!
//! Two entries are the same logical message when their ids are equal, or
//! when their contents are equal and their timestamps are closer than a
//! tolerance window.

use crate::models::{ConversationId, Message, MessageId, Sender};
use crate::storage::Settings;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// Prefix of locally synthesized optimistic ids
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Match windows used by the merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tolerance {
    /// Pending entry vs. fetched message, in milliseconds
    pub confirm_ms: i64,
    /// Pushed message vs. entries already shown, in milliseconds
    pub realtime_ms: i64,
}

impl Tolerance {
    /// Read both windows from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            confirm_ms: settings.confirm_tolerance_ms,
            realtime_ms: settings.realtime_tolerance_ms,
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            confirm_ms: 2_000,
            realtime_ms: 1_000,
        }
    }
}

/// Same-message predicate
///
/// True for identical ids, or identical content with timestamps strictly
/// less than `window_ms` apart.
pub fn is_same_message(a: &Message, b: &Message, window_ms: i64) -> bool {
    if a.id == b.id {
        return true;
    }
    a.content == b.content
        && (a.created_at - b.created_at).num_milliseconds().abs() < window_ms
}

/// Where a merged entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Present in the last fetch
    Confirmed,
    /// Received by push, not yet seen in a fetch
    Realtime,
    /// Created locally, awaiting the server
    Optimistic,
}

/// A message with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The message
    pub message: Message,
    /// Its source
    pub origin: Origin,
}

impl Entry {
    /// Stable render key: local id until confirmed, server id after
    pub fn key(&self) -> &str {
        self.message.id.as_str()
    }
}

/// Merge state for the open conversation
#[derive(Debug, Clone)]
pub struct Reconciler {
    conversation_id: ConversationId,
    tolerance: Tolerance,
    confirmed: Vec<Message>,
    pending: Vec<Entry>,
}

impl Reconciler {
    /// Empty state for `conversation_id`
    pub fn new(conversation_id: ConversationId, tolerance: Tolerance) -> Self {
        Self {
            conversation_id,
            tolerance,
            confirmed: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Conversation this state belongs to
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Messages from the last fetch
    pub fn confirmed(&self) -> &[Message] {
        &self.confirmed
    }

    /// Optimistic and realtime entries not yet superseded
    pub fn pending(&self) -> &[Entry] {
        &self.pending
    }

    /// Replace the confirmed set with a fetch result
    ///
    /// Pending entries matching any fetched message are dropped.
    pub fn apply_fetch(&mut self, messages: Vec<Message>) {
        let window = self.tolerance.confirm_ms;
        let before = self.pending.len();
        self.pending
            .retain(|entry| !messages.iter().any(|m| is_same_message(&entry.message, m, window)));
        debug!(
            "Fetch for {}: {} confirmed, {} pending superseded",
            self.conversation_id,
            messages.len(),
            before - self.pending.len()
        );
        self.confirmed = messages;
    }

    /// Add a pushed message unless it is already shown
    ///
    /// # Returns
    /// `true` if the message was added
    pub fn apply_push(&mut self, message: Message) -> bool {
        let window = self.tolerance.realtime_ms;
        let known = self
            .confirmed
            .iter()
            .chain(self.pending.iter().map(|entry| &entry.message))
            .any(|m| is_same_message(m, &message, window));
        if known {
            debug!("Push {} already shown in {}", message.id, self.conversation_id);
            return false;
        }

        self.pending.push(Entry {
            message,
            origin: Origin::Realtime,
        });
        true
    }

    /// Create and track an optimistic operator message
    ///
    /// # Returns
    /// The entry as rendered; its id is the local id used to confirm or roll back
    pub fn add_optimistic(&mut self, content: impl Into<String>, now: DateTime<Utc>) -> Message {
        let id = MessageId::new(format!("{}{}", LOCAL_ID_PREFIX, Uuid::new_v4()));
        let mut message = Message::new(id, Sender::Bot, content, now);
        message.conversation_id = Some(self.conversation_id.clone());
        message.role = Some("assistant".to_string());
        message.metadata.optimistic = true;
        message.metadata.sent_by_human = true;

        self.pending.push(Entry {
            message: message.clone(),
            origin: Origin::Optimistic,
        });
        message
    }

    /// Settle an optimistic entry after a successful send
    ///
    /// With a durable message the entry is swapped for it; without one the
    /// entry stays until a fetch supersedes it.
    pub fn confirm_optimistic(&mut self, local_id: &MessageId, durable: Option<Message>) {
        let Some(durable) = durable else {
            return;
        };

        let already_shown = self
            .confirmed
            .iter()
            .any(|m| m.id == durable.id);
        let position = self.pending.iter().position(|e| &e.message.id == local_id);

        match (position, already_shown) {
            (Some(index), true) => {
                self.pending.remove(index);
            }
            (Some(index), false) => {
                self.pending[index] = Entry {
                    message: durable,
                    origin: Origin::Realtime,
                };
            }
            (None, _) => {}
        }
    }

    /// Remove an optimistic entry after a failed send
    ///
    /// # Returns
    /// The removed message, so its content can be restored to the compose box
    pub fn rollback(&mut self, local_id: &MessageId) -> Option<Message> {
        let index = self.pending.iter().position(|e| &e.message.id == local_id)?;
        Some(self.pending.remove(index).message)
    }

    /// Apply an edit locally, wherever the message currently lives
    pub fn update_content(&mut self, message_id: &MessageId, content: &str) -> bool {
        let target = self
            .confirmed
            .iter_mut()
            .chain(self.pending.iter_mut().map(|entry| &mut entry.message))
            .find(|m| &m.id == message_id);
        match target {
            Some(message) => {
                message.content = content.to_string();
                message.is_edited = true;
                true
            }
            None => false,
        }
    }

    /// Merged, de-duplicated view ordered by `created_at`
    ///
    /// Confirmed messages are always kept. Ties keep confirmed order first,
    /// then pending arrival order.
    pub fn view(&self) -> Vec<Entry> {
        let window = self.tolerance.confirm_ms;
        let mut merged: Vec<Entry> = self
            .confirmed
            .iter()
            .map(|message| Entry {
                message: message.clone(),
                origin: Origin::Confirmed,
            })
            .collect();

        for entry in &self.pending {
            if !merged
                .iter()
                .any(|kept| is_same_message(&kept.message, &entry.message, window))
            {
                merged.push(entry.clone());
            }
        }

        merged.sort_by_key(|entry| entry.message.created_at);
        merged
    }

    /// Merged messages without origins
    pub fn messages(&self) -> Vec<Message> {
        self.view().into_iter().map(|entry| entry.message).collect()
    }

    /// Whether nothing has been fetched, pushed or sent yet
    pub fn is_empty(&self) -> bool {
        self.confirmed.is_empty() && self.pending.is_empty()
    }
}
