//! UI rendering module - pane-specific rendering functions
//!
//! The screen is a status bar, the conversation list beside the open
//! conversation, and a footer with alerts or key help.

mod conversation_list;
mod helpers;
mod message_view;
mod status_bar;

use crate::transport::RoomTransport;
use crate::tui::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub use conversation_list::render_conversation_list;
pub use helpers::{connection_dot, resolve_offset};
pub use message_view::render_message_view;
pub use status_bar::{render_footer, render_status_bar};

/// Main UI rendering function
pub fn ui<T: RoomTransport>(f: &mut Frame, app: &App<T>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Status bar
            Constraint::Min(5),    // Panes
            Constraint::Length(1), // Footer
        ])
        .split(f.size());

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[1]);

    render_status_bar(f, app, rows[0]);
    render_conversation_list(f, app, panes[0]);
    render_message_view(f, app, panes[1]);
    render_footer(f, app, rows[2]);
}
