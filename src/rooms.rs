//! Room membership tracking
//!
//! Viewing a conversation means being subscribed to its room on both push
//! transports. Switching conversations leaves the old room before joining
//! the new one.

use crate::models::ConversationId;
use crate::transport::RoomTransport;
use tracing::debug;

/// Room commands produced by a selection change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomChange {
    /// Room to leave first
    pub leave: Option<ConversationId>,
    /// Room to join afterwards
    pub join: Option<ConversationId>,
}

impl RoomChange {
    /// Whether the change does nothing
    pub fn is_empty(&self) -> bool {
        self.leave.is_none() && self.join.is_none()
    }

    /// Issue the leave, then the join, on `transport`
    pub fn apply<T: RoomTransport + ?Sized>(&self, transport: &T) {
        if let Some(id) = &self.leave {
            transport.leave_room(id);
        }
        if let Some(id) = &self.join {
            transport.join_room(id);
        }
    }
}

/// The room the dashboard is currently subscribed to
#[derive(Debug, Clone, Default)]
pub struct RoomTracker {
    current: Option<ConversationId>,
}

impl RoomTracker {
    /// Tracker with no room
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently joined room
    pub fn current(&self) -> Option<&ConversationId> {
        self.current.as_ref()
    }

    /// Move to `id`'s room
    ///
    /// Re-selecting the current room yields an empty change.
    pub fn switch_to(&mut self, id: &ConversationId) -> RoomChange {
        if self.current.as_ref() == Some(id) {
            debug!("Already in room {}", id);
            return RoomChange::default();
        }
        RoomChange {
            leave: self.current.replace(id.clone()),
            join: Some(id.clone()),
        }
    }

    /// Leave the current room, if any
    pub fn leave_current(&mut self) -> RoomChange {
        RoomChange {
            leave: self.current.take(),
            join: None,
        }
    }
}
