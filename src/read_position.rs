//! Read position and unread divider
//!
//! Decides where the "unread messages" divider goes in an opened
//! conversation, where to scroll when it opens, and whether a later
//! arrival should pull the view to the bottom.

use crate::models::{ConversationId, Message};
use chrono::{DateTime, Utc};

/// Index of the first message written after `last_read_at`
///
/// `None` when the conversation was never read or nothing is newer.
pub fn unread_divider_index(
    messages: &[Message],
    last_read_at: Option<DateTime<Utc>>,
) -> Option<usize> {
    let last_read_at = last_read_at?;
    messages.iter().position(|m| m.created_at > last_read_at)
}

/// Where the message view should scroll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    /// Center the message at `index` (the unread divider)
    CenterOn {
        /// Message index
        index: usize,
        /// Animate the scroll
        smooth: bool,
    },
    /// Scroll to the latest message
    Bottom {
        /// Animate the scroll
        smooth: bool,
    },
}

/// Scroll geometry of the message view, in rows or pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Distance from the top of the content to the top of the view
    pub scroll_offset: u32,
    /// Visible height
    pub viewport_height: u32,
    /// Total content height
    pub content_height: u32,
}

impl Viewport {
    /// Distance between the bottom of the view and the end of the content
    pub fn distance_from_bottom(&self) -> u32 {
        self.content_height
            .saturating_sub(self.scroll_offset)
            .saturating_sub(self.viewport_height)
    }

    /// Whether the view is within `threshold` of the bottom
    pub fn is_near_bottom(&self, threshold: u32) -> bool {
        self.distance_from_bottom() < threshold
    }
}

/// Scroll decisions for one conversation-open lifecycle
#[derive(Debug, Clone)]
pub struct ScrollPlanner {
    conversation: Option<ConversationId>,
    positioned: bool,
    threshold: u32,
}

impl ScrollPlanner {
    /// Planner with the given near-bottom threshold
    pub fn new(threshold: u32) -> Self {
        Self {
            conversation: None,
            positioned: false,
            threshold,
        }
    }

    /// Start a new lifecycle when the open conversation changes
    pub fn reset(&mut self, conversation: Option<ConversationId>) {
        if self.conversation != conversation {
            self.conversation = conversation;
            self.positioned = false;
        }
    }

    /// Whether the initial scroll already happened
    pub fn is_positioned(&self) -> bool {
        self.positioned
    }

    /// Initial scroll for the opened conversation, at most once per lifecycle
    ///
    /// Returns `None` until there are messages to position on.
    pub fn initial_target(
        &mut self,
        messages: &[Message],
        last_read_at: Option<DateTime<Utc>>,
    ) -> Option<ScrollTarget> {
        if self.positioned || self.conversation.is_none() || messages.is_empty() {
            return None;
        }
        self.positioned = true;

        Some(match unread_divider_index(messages, last_read_at) {
            Some(index) => ScrollTarget::CenterOn {
                index,
                smooth: true,
            },
            None => ScrollTarget::Bottom { smooth: false },
        })
    }

    /// Scroll for a message that arrived after the initial positioning
    ///
    /// Follows the conversation only when the viewport was near the bottom.
    pub fn on_arrival(&self, viewport: Viewport) -> Option<ScrollTarget> {
        (self.positioned && viewport.is_near_bottom(self.threshold))
            .then_some(ScrollTarget::Bottom { smooth: true })
    }
}
