//! Dashboard session module
//!
//! This module ties the live-sync pieces together behind one owner:
//! - conversation list with paging and search
//! - the open conversation's merged message view, read position and scroll
//! - bot control actions and human operator sends with optimistic rendering
//! - stats with periodic refresh
//!
//! All state is mutated through `&mut self`. Network calls run on spawned
//! tasks whose results come back as updates; push events arrive on the
//! transport's event stream. [`Dashboard::step`] waits for and applies the
//! next of either, plus any refresh that fell due.

use crate::api::{ApiClient, MessagePage, Page};
use crate::models::{BotStatus, Conversation, ConversationId, Message, MessageId, Stats};
use crate::pagination::{ConversationPager, ListSource, Pager};
use crate::protocol::PushEvent;
use crate::read_position::{unread_divider_index, ScrollPlanner, ScrollTarget, Viewport};
use crate::reconcile::{Entry, Reconciler, Tolerance};
use crate::refresh::{Invalidator, Resource};
use crate::rooms::RoomTracker;
use crate::storage::Settings;
use crate::transport::{ConnectionStatus, EventStream, RoomTransport, SourcedEvent};
use crate::Result;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Severity of a user-visible alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    /// Confirmation of a completed action
    Info,
    /// A non-fatal failure
    Error,
}

/// A message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Severity
    pub level: AlertLevel,
    /// Text
    pub text: String,
}

/// Operator action on a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Change the bot status
    BotStatus(BotStatus),
    /// Set or clear the requires-human flag
    RequiresHuman(bool),
    /// Replace the content of a bot message
    Edit {
        /// Edited message
        message_id: MessageId,
        /// New content
        content: String,
    },
}

impl Action {
    fn describe(&self) -> String {
        match self {
            Action::BotStatus(status) => format!("set bot status to {}", status),
            Action::RequiresHuman(true) => "flag for human intervention".to_string(),
            Action::RequiresHuman(false) => "clear human intervention flag".to_string(),
            Action::Edit { message_id, .. } => format!("edit message {}", message_id),
        }
    }
}

/// Result of background work, applied by the owner
enum Update {
    ConversationsLoaded {
        seq: u64,
        result: Result<Page<Conversation>>,
    },
    MessagesLoaded {
        seq: u64,
        conversation_id: ConversationId,
        result: Result<MessagePage>,
    },
    StatsLoaded(Result<Stats>),
    MessageSent {
        conversation_id: ConversationId,
        local_id: MessageId,
        content: String,
        result: Result<Option<Message>>,
    },
    ActionCompleted {
        conversation_id: ConversationId,
        action: Action,
        result: Result<()>,
    },
    MarkedRead {
        conversation_id: ConversationId,
        result: Result<()>,
    },
}

#[derive(Debug, Default)]
struct ListState {
    pager: ConversationPager,
    rows: Vec<Conversation>,
    loading: bool,
    error: Option<String>,
    latest_seq: u64,
}

#[derive(Debug)]
struct ThreadState {
    conversation_id: ConversationId,
    conversation: Option<Conversation>,
    pager: Pager,
    reconciler: Reconciler,
    loading: bool,
    error: Option<String>,
    latest_seq: u64,
    first_page_applied: bool,
    /// `last_read_at` as it was before this open marked the conversation read
    divider_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct StatsState {
    stats: Option<Stats>,
    loading: bool,
    error: Option<String>,
}

/// The operator's live view of the chatbot
pub struct Dashboard<T: RoomTransport> {
    api: ApiClient,
    transport: T,
    events: EventStream,
    settings: Settings,
    tolerance: Tolerance,
    rooms: RoomTracker,
    list: ListState,
    thread: Option<ThreadState>,
    scroll: ScrollPlanner,
    viewport: Viewport,
    scroll_target: Option<ScrollTarget>,
    stats: StatsState,
    compose: String,
    alerts: Vec<Alert>,
    invalidator: Invalidator,
    updates_tx: mpsc::UnboundedSender<Update>,
    updates_rx: mpsc::UnboundedReceiver<Update>,
    next_seq: u64,
}

impl<T: RoomTransport> Dashboard<T> {
    /// Create a session over an injected transport and its event stream
    ///
    /// # Arguments
    /// * `api` - REST client
    /// * `transport` - Push transport (rooms and connection status)
    /// * `events` - Event stream fed by `transport`
    /// * `settings` - Page sizes, refresh delays and tolerances
    pub fn new(api: ApiClient, transport: T, events: EventStream, settings: Settings) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            api,
            transport,
            events,
            tolerance: Tolerance::from_settings(&settings),
            scroll: ScrollPlanner::new(settings.near_bottom_threshold),
            settings,
            rooms: RoomTracker::new(),
            list: ListState::default(),
            thread: None,
            viewport: Viewport::default(),
            scroll_target: None,
            stats: StatsState::default(),
            compose: String::new(),
            alerts: Vec::new(),
            invalidator: Invalidator::new(),
            updates_tx,
            updates_rx,
            next_seq: 0,
        }
    }

    /// Connect the transports and load the list and stats
    pub fn start(&mut self) {
        info!("Starting dashboard session against {}", self.api.base_url());
        self.transport.connect();
        self.load_conversations();
        self.refresh_stats();
    }

    /// Leave the open room and disconnect the transports
    pub fn shutdown(&mut self) {
        self.rooms.leave_current().apply(&self.transport);
        self.transport.disconnect();
        self.invalidator.clear();
        info!("Dashboard session stopped");
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Settings in effect
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The injected transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Per-transport connection flags
    pub fn connection_status(&self) -> ConnectionStatus {
        self.transport.status()
    }

    /// Conversation rows of the current list page
    pub fn conversations(&self) -> &[Conversation] {
        &self.list.rows
    }

    /// Conversation list cursor
    pub fn list_pager(&self) -> &Pager {
        self.list.pager.pager()
    }

    /// Current search query
    pub fn search_query(&self) -> &str {
        self.list.pager.query()
    }

    /// Whether a list fetch is in flight
    pub fn is_list_loading(&self) -> bool {
        self.list.loading
    }

    /// Last list fetch error
    pub fn list_error(&self) -> Option<&str> {
        self.list.error.as_deref()
    }

    /// Id of the open conversation
    pub fn selected(&self) -> Option<&ConversationId> {
        self.thread.as_ref().map(|t| &t.conversation_id)
    }

    /// Header of the open conversation, from its message page or its list row
    pub fn open_conversation(&self) -> Option<&Conversation> {
        let thread = self.thread.as_ref()?;
        thread.conversation.as_ref().or_else(|| {
            self.list
                .rows
                .iter()
                .find(|row| row.id == thread.conversation_id)
        })
    }

    /// Merged messages of the open conversation
    pub fn messages(&self) -> Vec<Entry> {
        self.thread
            .as_ref()
            .map(|t| t.reconciler.view())
            .unwrap_or_default()
    }

    /// Message page cursor of the open conversation
    pub fn message_pager(&self) -> Option<&Pager> {
        self.thread.as_ref().map(|t| &t.pager)
    }

    /// Whether a message fetch is in flight
    pub fn is_thread_loading(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| t.loading)
    }

    /// Last message fetch error
    pub fn thread_error(&self) -> Option<&str> {
        self.thread.as_ref().and_then(|t| t.error.as_deref())
    }

    /// Index of the first unread message in [`Dashboard::messages`]
    pub fn unread_divider(&self) -> Option<usize> {
        let thread = self.thread.as_ref()?;
        unread_divider_index(&thread.reconciler.messages(), thread.divider_at)
    }

    /// Latest stats
    pub fn stats(&self) -> Option<&Stats> {
        self.stats.stats.as_ref()
    }

    /// Last stats fetch error
    pub fn stats_error(&self) -> Option<&str> {
        self.stats.error.as_deref()
    }

    /// Whether a stats fetch is in flight
    pub fn is_stats_loading(&self) -> bool {
        self.stats.loading
    }

    /// Compose box content
    pub fn compose(&self) -> &str {
        &self.compose
    }

    /// Replace the compose box content
    pub fn set_compose(&mut self, text: impl Into<String>) {
        self.compose = text.into();
    }

    /// Mutable compose box, for in-place editing
    pub fn compose_mut(&mut self) -> &mut String {
        &mut self.compose
    }

    /// Alerts not yet dismissed, oldest first
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Clear all alerts
    pub fn dismiss_alerts(&mut self) {
        self.alerts.clear();
    }

    /// Report the message view geometry
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Take the pending scroll request, if any
    pub fn take_scroll_target(&mut self) -> Option<ScrollTarget> {
        self.scroll_target.take()
    }

    /// Earliest scheduled refresh
    pub fn next_refresh(&self) -> Option<Instant> {
        self.invalidator.next_deadline()
    }

    // ------------------------------------------------------------------
    // Conversation list
    // ------------------------------------------------------------------

    /// Fetch the current list page from the current source
    pub fn load_conversations(&mut self) {
        let seq = self.bump_seq();
        self.list.latest_seq = seq;
        self.list.loading = true;
        self.list.error = None;
        self.invalidator.cancel(Resource::ConversationList);

        let api = self.api.clone();
        let page = self.list.pager.pager().page();
        let source = self.list.pager.source();
        let conversations_limit = self.settings.conversations_page_size;
        let search_limit = self.settings.search_page_size;
        debug!("Loading conversations page {} from {:?}", page, source);

        self.spawn(async move {
            let result = match source {
                ListSource::Conversations => api.list_conversations(page, conversations_limit).await,
                ListSource::Search(query) => api.search_messages(&query, page, search_limit).await,
            };
            Update::ConversationsLoaded { seq, result }
        });
    }

    /// Refetch the current list page
    pub fn refresh_conversations(&mut self) {
        self.load_conversations();
    }

    /// Move the list to page `page` (clamped) and fetch it
    pub fn go_to_conversation_page(&mut self, page: u32) {
        self.list.pager.pager_mut().go_to(page);
        self.load_conversations();
    }

    /// Next list page, if any
    pub fn next_conversation_page(&mut self) {
        if self.list.pager.pager().has_next() {
            self.list.pager.pager_mut().next();
            self.load_conversations();
        }
    }

    /// Previous list page, if any
    pub fn previous_conversation_page(&mut self) {
        if self.list.pager.pager().has_previous() {
            self.list.pager.pager_mut().previous();
            self.load_conversations();
        }
    }

    /// Set the search query, return to page 1 and refetch
    ///
    /// The open conversation stays open.
    pub fn search(&mut self, query: impl Into<String>) {
        self.list.pager.set_query(query);
        self.load_conversations();
    }

    fn apply_conversations(&mut self, seq: u64, result: Result<Page<Conversation>>) {
        if seq != self.list.latest_seq {
            debug!("Discarding superseded conversation list response {}", seq);
            return;
        }
        self.list.loading = false;

        match result {
            Ok(page) => {
                let mut rows = page.items;
                if self.list.pager.source() == ListSource::Conversations {
                    rows.sort_by_key(|row| std::cmp::Reverse(row.activity_at()));
                }
                self.list.pager.pager_mut().apply_response(page.page, page.total_pages);
                self.list.rows = rows;
                self.list.error = None;
            }
            Err(e) => {
                warn!("Failed to load conversations: {}", e);
                self.list.error = Some(e.to_string());
            }
        }
    }

    fn update_rows<F>(&mut self, conversation_id: &ConversationId, mut f: F)
    where
        F: FnMut(&mut Conversation),
    {
        for row in self.list.rows.iter_mut().filter(|r| &r.id == conversation_id) {
            f(row);
        }
        if let Some(header) = self
            .thread
            .as_mut()
            .filter(|t| &t.conversation_id == conversation_id)
            .and_then(|t| t.conversation.as_mut())
        {
            f(header);
        }
    }

    // ------------------------------------------------------------------
    // Open conversation
    // ------------------------------------------------------------------

    /// Open `conversation_id`
    ///
    /// Leaves the previous room, joins the new one and fetches page 1.
    /// Selecting the conversation that is already open does nothing.
    pub fn select_conversation(&mut self, conversation_id: &ConversationId) {
        if self.selected() == Some(conversation_id) {
            debug!("Conversation {} already open", conversation_id);
            return;
        }

        info!("Opening conversation {}", conversation_id);
        self.rooms.switch_to(conversation_id).apply(&self.transport);

        let header = self
            .list
            .rows
            .iter()
            .find(|row| &row.id == conversation_id)
            .cloned();
        self.thread = Some(ThreadState {
            conversation_id: conversation_id.clone(),
            divider_at: header.as_ref().and_then(|c| c.last_read_at),
            conversation: None,
            pager: Pager::new(),
            reconciler: Reconciler::new(conversation_id.clone(), self.tolerance),
            loading: false,
            error: None,
            latest_seq: 0,
            first_page_applied: false,
        });
        self.scroll.reset(Some(conversation_id.clone()));
        self.scroll_target = None;
        self.compose.clear();
        self.invalidator.cancel(Resource::Messages);
        self.load_messages();
    }

    /// Close the open conversation and leave its room
    pub fn close_conversation(&mut self) {
        if let Some(thread) = self.thread.take() {
            info!("Closing conversation {}", thread.conversation_id);
        }
        self.rooms.leave_current().apply(&self.transport);
        self.scroll.reset(None);
        self.scroll_target = None;
        self.invalidator.cancel(Resource::Messages);
    }

    /// Fetch the current message page of the open conversation
    pub fn load_messages(&mut self) {
        let seq = self.bump_seq();
        let limit = self.settings.messages_page_size;
        let Some(thread) = self.thread.as_mut() else {
            return;
        };
        thread.latest_seq = seq;
        thread.loading = true;
        thread.error = None;
        self.invalidator.cancel(Resource::Messages);

        let api = self.api.clone();
        let conversation_id = thread.conversation_id.clone();
        let page = thread.pager.page();
        debug!("Loading messages page {} of {}", page, conversation_id);

        self.spawn(async move {
            let result = api.get_messages(&conversation_id, page, limit).await;
            Update::MessagesLoaded {
                seq,
                conversation_id,
                result,
            }
        });
    }

    /// Refetch the current message page
    pub fn refresh_messages(&mut self) {
        self.load_messages();
    }

    /// Move the message view to page `page` (clamped) and fetch it
    pub fn go_to_message_page(&mut self, page: u32) {
        if let Some(thread) = self.thread.as_mut() {
            thread.pager.go_to(page);
            self.load_messages();
        }
    }

    fn apply_messages(
        &mut self,
        seq: u64,
        conversation_id: ConversationId,
        result: Result<MessagePage>,
    ) {
        let Some(thread) = self
            .thread
            .as_mut()
            .filter(|t| t.conversation_id == conversation_id && t.latest_seq == seq)
        else {
            debug!("Discarding stale message page for {}", conversation_id);
            return;
        };
        thread.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("Failed to load messages for {}: {}", conversation_id, e);
                thread.error = Some(e.to_string());
                return;
            }
        };

        thread.error = None;
        thread.pager.apply_response(page.page, page.total_pages);
        if let Some(conversation) = page.conversation {
            if !thread.first_page_applied {
                thread.divider_at = conversation.last_read_at;
            }
            thread.conversation = Some(conversation);
        }
        thread.reconciler.apply_fetch(page.messages);

        let first_page = !thread.first_page_applied;
        thread.first_page_applied = true;
        let merged = thread.reconciler.messages();
        let divider_at = thread.divider_at;

        if let Some(target) = self.scroll.initial_target(&merged, divider_at) {
            self.scroll_target = Some(target);
        }
        if first_page {
            self.mark_read(&conversation_id);
        }
    }

    /// Best-effort mark-as-read; failures are only logged
    fn mark_read(&mut self, conversation_id: &ConversationId) {
        self.update_rows(conversation_id, |row| row.unread_count = 0);

        let api = self.api.clone();
        let conversation_id = conversation_id.clone();
        self.spawn(async move {
            let result = api.mark_read(&conversation_id).await;
            Update::MarkedRead {
                conversation_id,
                result,
            }
        });
    }

    // ------------------------------------------------------------------
    // Operator actions
    // ------------------------------------------------------------------

    /// Send the compose box content as the human operator
    ///
    /// The message shows immediately as an optimistic entry and the compose
    /// box is cleared. On failure the entry is removed, the text returns to
    /// the compose box and an alert is raised.
    ///
    /// # Returns
    /// The local id of the optimistic entry, or `None` if there was nothing to send
    pub fn send_human_message(&mut self) -> Option<MessageId> {
        let content = self.compose.trim().to_string();
        if content.is_empty() {
            return None;
        }
        let thread = self.thread.as_mut()?;

        let optimistic = thread.reconciler.add_optimistic(content.clone(), Utc::now());
        let local_id = optimistic.id.clone();
        let conversation_id = thread.conversation_id.clone();
        self.compose.clear();
        self.scroll_target = Some(ScrollTarget::Bottom { smooth: true });
        debug!("Sending {} to {}", local_id, conversation_id);

        let api = self.api.clone();
        let task_local_id = local_id.clone();
        self.spawn(async move {
            let result = api.send_human_message(&conversation_id, &content).await;
            Update::MessageSent {
                conversation_id,
                local_id: task_local_id,
                content,
                result,
            }
        });
        Some(local_id)
    }

    fn apply_sent(
        &mut self,
        conversation_id: ConversationId,
        local_id: MessageId,
        content: String,
        result: Result<Option<Message>>,
    ) {
        let thread = self
            .thread
            .as_mut()
            .filter(|t| t.conversation_id == conversation_id);

        match (thread, result) {
            (Some(thread), Ok(durable)) => {
                thread.reconciler.confirm_optimistic(&local_id, durable);
                let delay = self.settings.refresh_after_send();
                self.invalidate(Resource::Messages, delay);
                self.invalidate(Resource::ConversationList, delay);
            }
            (Some(thread), Err(e)) => {
                warn!("Send to {} failed: {}", conversation_id, e);
                thread.reconciler.rollback(&local_id);
                if self.compose.is_empty() {
                    self.compose = content;
                }
                self.alert(AlertLevel::Error, format!("Message not sent: {}", e));
            }
            (None, Ok(_)) => {
                debug!("Send to {} confirmed after it was closed", conversation_id);
                self.invalidate(Resource::ConversationList, self.settings.refresh_after_send());
            }
            (None, Err(e)) => {
                warn!("Send to {} failed after it was closed: {}", conversation_id, e);
                self.alert(AlertLevel::Error, format!("Message not sent: {}", e));
            }
        }
    }

    /// Change the bot status of the open conversation
    pub fn change_bot_status(&mut self, status: BotStatus) {
        self.run_action(Action::BotStatus(status));
    }

    /// Pause an active bot, or hand control back to it otherwise
    pub fn toggle_pause(&mut self) {
        let next = match self.open_conversation().map(|c| c.bot_status) {
            Some(BotStatus::Active) => BotStatus::Paused,
            Some(_) => BotStatus::Active,
            None => return,
        };
        self.change_bot_status(next);
    }

    /// Set or clear the requires-human flag of the open conversation
    pub fn set_requires_human(&mut self, requires_human: bool) {
        self.run_action(Action::RequiresHuman(requires_human));
    }

    /// Edit a bot message of the open conversation
    ///
    /// User messages and unconfirmed entries cannot be edited.
    pub fn edit_message(&mut self, message_id: &MessageId, content: impl Into<String>) -> bool {
        let editable = self
            .thread
            .as_ref()
            .map(|t| t.reconciler.messages())
            .unwrap_or_default()
            .iter()
            .any(|m| &m.id == message_id && m.is_editable());
        if !editable {
            return false;
        }
        self.run_action(Action::Edit {
            message_id: message_id.clone(),
            content: content.into(),
        });
        true
    }

    fn run_action(&mut self, action: Action) {
        let Some(conversation_id) = self.selected().cloned() else {
            return;
        };
        debug!("Requesting {} on {}", action.describe(), conversation_id);

        let api = self.api.clone();
        self.spawn(async move {
            let result = match &action {
                Action::BotStatus(status) => api.change_bot_status(&conversation_id, *status).await,
                Action::RequiresHuman(flag) => api.set_requires_human(&conversation_id, *flag).await,
                Action::Edit {
                    message_id,
                    content,
                } => api.edit_message(message_id, content).await,
            };
            Update::ActionCompleted {
                conversation_id,
                action,
                result,
            }
        });
    }

    fn apply_action(&mut self, conversation_id: ConversationId, action: Action, result: Result<()>) {
        if let Err(e) = result {
            warn!("Failed to {} on {}: {}", action.describe(), conversation_id, e);
            self.alert(
                AlertLevel::Error,
                format!("Could not {}: {}", action.describe(), e),
            );
            return;
        }

        match &action {
            Action::BotStatus(status) => {
                let status = *status;
                self.update_rows(&conversation_id, |row| row.bot_status = status);
            }
            Action::RequiresHuman(flag) => {
                let flag = *flag;
                self.update_rows(&conversation_id, |row| row.requires_human = flag);
            }
            Action::Edit {
                message_id,
                content,
            } => {
                if let Some(thread) = self
                    .thread
                    .as_mut()
                    .filter(|t| t.conversation_id == conversation_id)
                {
                    thread.reconciler.update_content(message_id, content);
                }
            }
        }

        info!("Completed: {} on {}", action.describe(), conversation_id);
        self.alert(AlertLevel::Info, format!("Done: {}", action.describe()));
        let delay = self.settings.refresh_after_send();
        self.invalidate(Resource::ConversationList, delay);
        if self.selected() == Some(&conversation_id) {
            self.invalidate(Resource::Messages, delay);
        }
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    /// Fetch the aggregate stats
    pub fn refresh_stats(&mut self) {
        self.stats.loading = true;
        self.invalidator.cancel(Resource::Stats);
        let api = self.api.clone();
        self.spawn(async move { Update::StatsLoaded(api.get_stats().await) });
    }

    fn apply_stats(&mut self, result: Result<Stats>) {
        self.stats.loading = false;
        match result {
            Ok(stats) => {
                self.stats.stats = Some(stats);
                self.stats.error = None;
            }
            Err(e) => {
                warn!("Failed to load stats: {}", e);
                self.stats.error = Some(e.to_string());
            }
        }
        if let Some(interval) = self.settings.stats_interval() {
            self.invalidate(Resource::Stats, interval);
        }
    }

    // ------------------------------------------------------------------
    // Push events
    // ------------------------------------------------------------------

    /// Apply one push event
    pub fn handle_push(&mut self, sourced: SourcedEvent) {
        let delay = self.settings.refresh_after_push();
        let open = self.selected().cloned();

        match sourced.event {
            PushEvent::NewMessage(event) => {
                let Some(open) = open.filter(|id| event.targets(id)) else {
                    debug!(
                        "new-message for {:?} from {}, refreshing list",
                        event.conversation(),
                        sourced.source
                    );
                    self.invalidate(Resource::ConversationList, delay);
                    return;
                };

                match event.message {
                    Some(incoming) => {
                        let message = incoming.into_message(&open, Utc::now());
                        self.apply_realtime(message);
                    }
                    None => self.invalidate(Resource::Messages, delay),
                }
                self.invalidate(Resource::ConversationList, delay);
            }
            PushEvent::BotStatusChange(event) => {
                if let (Some(id), Some(status)) = (&event.conversation_id, event.status) {
                    self.update_rows(id, |row| row.bot_status = status);
                }
                self.invalidate(Resource::ConversationList, delay);
                if open.is_some() && open == event.conversation_id {
                    self.invalidate(Resource::Messages, delay);
                }
            }
            PushEvent::ConversationUpdated(event) => {
                self.invalidate(Resource::ConversationList, delay);
                if open.is_some() && open == event.conversation_id {
                    self.invalidate(Resource::Messages, delay);
                }
            }
            PushEvent::Other(name) => {
                debug!("Ignoring {} event from {}", name, sourced.source);
            }
        }
    }

    fn apply_realtime(&mut self, message: Message) {
        let Some(thread) = self.thread.as_mut() else {
            return;
        };
        if !thread.reconciler.apply_push(message) {
            return;
        }

        if self.scroll.is_positioned() {
            if let Some(target) = self.scroll.on_arrival(self.viewport) {
                self.scroll_target = Some(target);
            }
        } else if thread.first_page_applied {
            let merged = thread.reconciler.messages();
            if let Some(target) = self.scroll.initial_target(&merged, thread.divider_at) {
                self.scroll_target = Some(target);
            }
        }
    }

    // ------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------

    /// Wait for the next push event, finished request or due refresh and apply it
    pub async fn step(&mut self) {
        let deadline = self.invalidator.next_deadline();
        let due = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            Some(event) = self.events.recv() => self.handle_push(event),
            Some(update) = self.updates_rx.recv() => self.apply_update(update),
            _ = due => {}
        }
        self.run_due(Instant::now());
    }

    /// Apply everything already available without waiting
    ///
    /// # Returns
    /// The number of events and updates applied
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle_push(event);
            applied += 1;
        }
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply_update(update);
            applied += 1;
        }
        self.run_due(Instant::now());
        applied
    }

    /// Start every refresh due at `now`
    pub fn run_due(&mut self, now: Instant) {
        for resource in self.invalidator.take_due(now) {
            debug!("Refresh due: {:?}", resource);
            match resource {
                Resource::ConversationList => self.load_conversations(),
                Resource::Messages => self.load_messages(),
                Resource::Stats => self.refresh_stats(),
            }
        }
    }

    fn apply_update(&mut self, update: Update) {
        match update {
            Update::ConversationsLoaded { seq, result } => self.apply_conversations(seq, result),
            Update::MessagesLoaded {
                seq,
                conversation_id,
                result,
            } => self.apply_messages(seq, conversation_id, result),
            Update::StatsLoaded(result) => self.apply_stats(result),
            Update::MessageSent {
                conversation_id,
                local_id,
                content,
                result,
            } => self.apply_sent(conversation_id, local_id, content, result),
            Update::ActionCompleted {
                conversation_id,
                action,
                result,
            } => self.apply_action(conversation_id, action, result),
            Update::MarkedRead {
                conversation_id,
                result,
            } => match result {
                Ok(()) => debug!("Marked {} as read", conversation_id),
                Err(e) => debug!("Mark-as-read for {} failed: {}", conversation_id, e),
            },
        }
    }

    fn invalidate(&mut self, resource: Resource, delay: Duration) {
        self.invalidator.invalidate(resource, delay, Instant::now());
    }

    fn alert(&mut self, level: AlertLevel, text: String) {
        self.alerts.push(Alert { level, text });
    }

    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Update> + Send + 'static,
    {
        let updates = self.updates_tx.clone();
        tokio::spawn(async move {
            let _ = updates.send(task.await);
        });
    }
}
