//! Main TUI application state and key handling

use crate::dashboard::Dashboard;
use crate::models::{BotStatus, Conversation};
use crate::read_position::{ScrollTarget, Viewport};
use crate::storage::{PreferencesManager, Theme};
use crate::transport::RoomTransport;
use crate::tui::types::{Focus, Palette};
use crossterm::event::{KeyCode, KeyEvent};
use std::cell::Cell;
use tracing::warn;

/// Terminal rows are reported to the scroll planner as this many pixels
pub const ROW_HEIGHT_PX: u32 = 20;

/// How the message pane picks its scroll offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageScroll {
    /// Stick to the latest message
    Follow,
    /// Keep the message at this index centered
    Anchored(usize),
    /// Operator-chosen offset, in rows from the top
    Manual(u32),
}

/// Rendered geometry of the message pane, in rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaneGeometry {
    /// First visible row
    pub offset: u32,
    /// Visible rows
    pub height: u32,
    /// Total rows of content
    pub content: u32,
}

/// Application state
pub struct App<T: RoomTransport> {
    /// The live dashboard session
    pub dashboard: Dashboard<T>,
    /// Pane receiving keys
    pub focus: Focus,
    /// Highlighted conversation row
    pub selected_index: usize,
    /// Search line being edited
    pub search_input: String,
    /// Active theme
    pub theme: Theme,
    /// Should quit
    pub should_quit: bool,
    /// Transient status line (theme saved, errors outside the dashboard)
    pub status_message: Option<String>,
    scroll: MessageScroll,
    geometry: Cell<PaneGeometry>,
    preferences: Option<PreferencesManager>,
}

impl<T: RoomTransport> App<T> {
    /// Create the application around a dashboard session
    ///
    /// # Arguments
    /// * `dashboard` - Session to drive
    /// * `theme` - Initial theme
    /// * `preferences` - Where theme changes are persisted, if anywhere
    pub fn new(dashboard: Dashboard<T>, theme: Theme, preferences: Option<PreferencesManager>) -> Self {
        Self {
            dashboard,
            focus: Focus::Conversations,
            selected_index: 0,
            search_input: String::new(),
            theme,
            should_quit: false,
            status_message: None,
            scroll: MessageScroll::Follow,
            geometry: Cell::new(PaneGeometry::default()),
            preferences,
        }
    }

    /// Colours for the active theme
    pub fn palette(&self) -> Palette {
        Palette::for_theme(self.theme)
    }

    /// Current scroll mode of the message pane
    pub fn scroll(&self) -> MessageScroll {
        self.scroll
    }

    /// Called by the renderer with the geometry it just drew
    pub fn record_geometry(&self, geometry: PaneGeometry) {
        self.geometry.set(geometry);
    }

    /// Last rendered geometry of the message pane
    pub fn geometry(&self) -> PaneGeometry {
        self.geometry.get()
    }

    /// Highlighted conversation row
    pub fn highlighted(&self) -> Option<&Conversation> {
        self.dashboard.conversations().get(self.selected_index)
    }

    /// Exchange scroll state with the dashboard; call once per frame
    pub fn sync(&mut self) {
        let geometry = self.geometry.get();
        self.dashboard.set_viewport(Viewport {
            scroll_offset: geometry.offset * ROW_HEIGHT_PX,
            viewport_height: geometry.height * ROW_HEIGHT_PX,
            content_height: geometry.content * ROW_HEIGHT_PX,
        });

        if let Some(target) = self.dashboard.take_scroll_target() {
            self.scroll = match target {
                ScrollTarget::CenterOn { index, .. } => MessageScroll::Anchored(index),
                ScrollTarget::Bottom { .. } => MessageScroll::Follow,
            };
        }

        let rows = self.dashboard.conversations().len();
        if rows > 0 && self.selected_index >= rows {
            self.selected_index = rows - 1;
        }
    }

    /// Handle one key press
    pub async fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::F(2) => return self.dashboard.toggle_pause(),
            KeyCode::F(3) => return self.dashboard.change_bot_status(BotStatus::HumanTakeover),
            KeyCode::F(4) => {
                if let Some(flag) = self.dashboard.open_conversation().map(|c| !c.requires_human) {
                    self.dashboard.set_requires_human(flag);
                }
                return;
            }
            KeyCode::F(5) => {
                // Restarts links that gave up; running links are left alone
                self.dashboard.transport().connect();
                self.dashboard.refresh_conversations();
                self.dashboard.refresh_messages();
                self.dashboard.refresh_stats();
                return;
            }
            KeyCode::F(6) => return self.toggle_theme().await,
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Conversations => self.handle_list_key(key),
            Focus::Messages => self.handle_messages_key(key),
            Focus::Compose => self.handle_compose_key(key),
            Focus::Search => self.handle_search_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Enter => self.open_highlighted(),
            KeyCode::Char('/') => self.start_search(),
            KeyCode::Char('[') => self.dashboard.previous_conversation_page(),
            KeyCode::Char(']') => self.dashboard.next_conversation_page(),
            _ => {}
        }
    }

    fn handle_messages_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
            KeyCode::PageDown => self.scroll_by(self.page_rows()),
            KeyCode::PageUp => self.scroll_by(-self.page_rows()),
            KeyCode::End => self.scroll = MessageScroll::Follow,
            KeyCode::Char('/') => self.start_search(),
            KeyCode::Char('[') => {
                if let Some(page) = self.dashboard.message_pager().map(|p| p.page()) {
                    self.dashboard.go_to_message_page(page.saturating_sub(1));
                }
            }
            KeyCode::Char(']') => {
                if let Some(page) = self.dashboard.message_pager().map(|p| p.page()) {
                    self.dashboard.go_to_message_page(page + 1);
                }
            }
            _ => {}
        }
    }

    fn handle_compose_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.focus = Focus::Conversations,
            KeyCode::Enter => {
                if self.dashboard.send_human_message().is_some() {
                    self.scroll = MessageScroll::Follow;
                }
            }
            KeyCode::Backspace => {
                self.dashboard.compose_mut().pop();
            }
            KeyCode::Char(c) => self.dashboard.compose_mut().push(c),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.search_input = self.dashboard.search_query().to_string();
                self.focus = Focus::Conversations;
            }
            KeyCode::Enter => {
                self.dashboard.search(self.search_input.clone());
                self.selected_index = 0;
                self.focus = Focus::Conversations;
            }
            KeyCode::Backspace => {
                self.search_input.pop();
            }
            KeyCode::Char(c) => self.search_input.push(c),
            _ => {}
        }
    }

    fn start_search(&mut self) {
        self.search_input = self.dashboard.search_query().to_string();
        self.focus = Focus::Search;
    }

    /// Move the highlight by `delta` rows, clamped to the list
    pub fn move_selection(&mut self, delta: i32) {
        let rows = self.dashboard.conversations().len();
        if rows == 0 {
            self.selected_index = 0;
            return;
        }
        let next = (self.selected_index as i64 + delta as i64).clamp(0, rows as i64 - 1);
        self.selected_index = next as usize;
    }

    /// Open the highlighted conversation
    pub fn open_highlighted(&mut self) {
        let Some(id) = self.highlighted().map(|c| c.id.clone()) else {
            return;
        };
        self.dashboard.select_conversation(&id);
        self.scroll = MessageScroll::Follow;
    }

    fn page_rows(&self) -> i32 {
        self.geometry.get().height.max(1) as i32
    }

    fn scroll_by(&mut self, delta: i32) {
        let geometry = self.geometry.get();
        let max_offset = geometry.content.saturating_sub(geometry.height);
        let next = (geometry.offset as i64 + delta as i64).clamp(0, max_offset as i64) as u32;
        self.scroll = if next >= max_offset {
            MessageScroll::Follow
        } else {
            MessageScroll::Manual(next)
        };
    }

    async fn toggle_theme(&mut self) {
        let Some(preferences) = &self.preferences else {
            self.theme = self.theme.toggled();
            return;
        };
        match preferences.toggle_theme().await {
            Ok(theme) => {
                self.theme = theme;
                self.status_message = Some(format!("Theme: {}", theme));
            }
            Err(e) => {
                warn!("Failed to save theme: {}", e);
                self.theme = self.theme.toggled();
                self.status_message = Some(format!("Theme not saved: {}", e));
            }
        }
    }
}
