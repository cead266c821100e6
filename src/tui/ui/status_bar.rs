//! Status bar and footer rendering

use crate::dashboard::AlertLevel;
use crate::transport::RoomTransport;
use crate::tui::app::App;
use crate::tui::types::Focus;
use crate::tui::ui::helpers::connection_dot;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Renders the top status bar
pub fn render_status_bar<T: RoomTransport>(f: &mut Frame, app: &App<T>, area: Rect) {
    let palette = app.palette();
    let status = app.dashboard.connection_status();
    let link = |connected: bool| {
        Style::default().fg(if connected { palette.bot } else { palette.error })
    };

    let mut spans = vec![
        Span::styled(
            "WhatsApp Dashboard ",
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ core "),
        Span::styled(connection_dot(status.core_api), link(status.core_api)),
        Span::raw(" bot "),
        Span::styled(connection_dot(status.bot_service), link(status.bot_service)),
        Span::raw(" │ "),
    ];

    match (app.dashboard.stats(), app.dashboard.stats_error()) {
        (Some(stats), _) => spans.push(Span::styled(
            format!(
                "users {} · conversations {} · messages {} · today {}",
                stats.total_users, stats.total_conversations, stats.total_messages, stats.today_messages
            ),
            Style::default().fg(palette.text),
        )),
        (None, Some(error)) => spans.push(Span::styled(
            format!("stats unavailable: {}", error),
            Style::default().fg(palette.error),
        )),
        (None, None) => spans.push(Span::styled("loading stats…", Style::default().fg(palette.muted))),
    }

    if !status.is_usable() {
        spans.push(Span::styled(
            "  │ offline",
            Style::default().fg(palette.error).add_modifier(Modifier::BOLD),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Renders the footer: latest alert, status message, or key help
pub fn render_footer<T: RoomTransport>(f: &mut Frame, app: &App<T>, area: Rect) {
    let palette = app.palette();

    let line = if let Some(alert) = app.dashboard.alerts().last() {
        let color = match alert.level {
            AlertLevel::Info => palette.bot,
            AlertLevel::Error => palette.error,
        };
        Line::from(Span::styled(alert.text.clone(), Style::default().fg(color)))
    } else if let Some(message) = &app.status_message {
        Line::from(Span::styled(message.clone(), Style::default().fg(palette.muted)))
    } else {
        let help = match app.focus {
            Focus::Conversations => "↑/↓: Move | Enter: Open | /: Search | [ ]: Page | Tab: Focus | F2 Pause/Resume | F3 Take over | F4 Needs human | F5 Refresh | F6 Theme | q: Quit",
            Focus::Messages => "↑/↓ PgUp/PgDn: Scroll | End: Latest | [ ]: Page | Tab: Focus | F2-F6: Actions | q: Quit",
            Focus::Compose => "Enter: Send as operator | Esc: Back | Tab: Focus",
            Focus::Search => "Enter: Search | Esc: Cancel",
        };
        Line::from(Span::styled(help, Style::default().fg(palette.muted)))
    };

    f.render_widget(Paragraph::new(line), area);
}
