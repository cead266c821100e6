//! Dual push transport
//!
//! Bot replies can be emitted by either service, so the dashboard keeps
//! one link to each and merges their events into a single stream.

use super::{
    ConnectionStatus, EventSource, EventStream, LinkState, ReconnectPolicy, RoomTransport,
    SocketClient,
};
use crate::models::ConversationId;
use crate::protocol::Command;
use crate::storage::Settings;
use tokio::sync::mpsc;
use tracing::info;

/// Links to the core API and the bot service
pub struct DualTransport {
    core: SocketClient,
    bot: SocketClient,
}

impl DualTransport {
    /// Create both links sharing one event stream
    ///
    /// # Arguments
    /// * `core_url` - Socket base URL of the core API
    /// * `bot_url` - Socket base URL of the bot service
    /// * `policy` - Reconnection behaviour applied to both links
    ///
    /// # Returns
    /// The transport and the receiving end of the merged event stream
    pub fn new(
        core_url: impl Into<String>,
        bot_url: impl Into<String>,
        policy: ReconnectPolicy,
    ) -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let core = SocketClient::new(EventSource::CoreApi, core_url, policy.clone(), tx.clone());
        let bot = SocketClient::new(EventSource::BotService, bot_url, policy, tx);
        (Self { core, bot }, rx)
    }

    /// Create both links from settings
    pub fn from_settings(settings: &Settings) -> (Self, EventStream) {
        Self::new(
            settings.core_socket_url.clone(),
            settings.bot_socket_url.clone(),
            ReconnectPolicy::from_settings(settings),
        )
    }

    /// The link for `source`
    pub fn link(&self, source: EventSource) -> &SocketClient {
        match source {
            EventSource::CoreApi => &self.core,
            EventSource::BotService => &self.bot,
        }
    }

    /// Lifecycle state of the link for `source`
    pub fn link_state(&self, source: EventSource) -> LinkState {
        self.link(source).state()
    }

    fn broadcast(&self, command: Command) {
        self.core.send(command.clone());
        self.bot.send(command);
    }
}

impl RoomTransport for DualTransport {
    fn connect(&self) {
        self.core.connect();
        self.bot.connect();
    }

    fn disconnect(&self) {
        self.core.disconnect();
        self.bot.disconnect();
    }

    fn join_room(&self, conversation_id: &ConversationId) {
        info!("Joining conversation room {}", conversation_id);
        self.broadcast(Command::JoinConversation(conversation_id.clone()));
    }

    fn leave_room(&self, conversation_id: &ConversationId) {
        info!("Leaving conversation room {}", conversation_id);
        self.broadcast(Command::LeaveConversation(conversation_id.clone()));
    }

    fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            core_api: self.core.is_connected(),
            bot_service: self.bot.is_connected(),
        }
    }
}
