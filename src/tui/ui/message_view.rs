//! Open conversation pane rendering

use crate::format::{format_clock, parse_system_notice};
use crate::reconcile::{Entry, Origin};
use crate::transport::RoomTransport;
use crate::tui::app::{App, MessageScroll, PaneGeometry};
use crate::tui::types::{Focus, Palette};
use crate::tui::ui::helpers::resolve_offset;
use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Renders the conversation header, message history and compose line
pub fn render_message_view<T: RoomTransport>(f: &mut Frame, app: &App<T>, area: Rect) {
    let palette = app.palette();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(3),    // Messages
            Constraint::Length(3), // Compose
        ])
        .split(area);

    let Some(conversation) = app.dashboard.open_conversation().cloned().or_else(|| {
        app.dashboard
            .selected()
            .map(|id| crate::models::Conversation::new(id.clone()))
    }) else {
        let hint = Paragraph::new("Select a conversation and press Enter")
            .style(Style::default().fg(palette.muted))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Messages"));
        f.render_widget(hint, area);
        return;
    };

    // Header
    let mut header = vec![
        Span::styled(
            conversation.display_name().to_string(),
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", conversation.phone().unwrap_or("")),
            Style::default().fg(palette.muted),
        ),
        Span::styled(
            format!("  [{}]", conversation.bot_status.badge()),
            Style::default().fg(palette.highlight),
        ),
    ];
    if conversation.requires_human {
        header.push(Span::styled(
            "  needs human",
            Style::default().fg(palette.error).add_modifier(Modifier::BOLD),
        ));
    }
    f.render_widget(
        Paragraph::new(Line::from(header)).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    // Messages
    let entries = app.dashboard.messages();
    let divider = app.dashboard.unread_divider();
    let (lines, anchor_row) = message_lines(&entries, divider, app.scroll(), palette);

    let height = chunks[1].height.saturating_sub(2) as u32;
    let content = lines.len() as u32;
    let offset = resolve_offset(app.scroll(), anchor_row, content, height);
    app.record_geometry(PaneGeometry {
        offset,
        height,
        content,
    });

    let mut title = match app.dashboard.message_pager() {
        Some(pager) => format!("Messages {}/{}", pager.page(), pager.total_pages()),
        None => "Messages".to_string(),
    };
    if app.dashboard.is_thread_loading() {
        title.push_str(" …");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(app.focus == Focus::Messages, palette))
        .title(title);

    let body = if let Some(error) = app.dashboard.thread_error() {
        Paragraph::new(format!("Could not load messages: {}\nF5 to retry", error))
            .style(Style::default().fg(palette.error))
            .alignment(Alignment::Center)
    } else if lines.is_empty() {
        Paragraph::new(if app.dashboard.is_thread_loading() {
            "Loading…"
        } else {
            "No messages yet"
        })
        .style(Style::default().fg(palette.muted))
        .alignment(Alignment::Center)
    } else {
        Paragraph::new(lines).scroll((offset.min(u16::MAX as u32) as u16, 0))
    };
    f.render_widget(body.block(block), chunks[1]);

    // Compose
    let composing = app.focus == Focus::Compose;
    let text = if composing {
        format!("{}▏", app.dashboard.compose())
    } else {
        app.dashboard.compose().to_string()
    };
    let compose = Paragraph::new(text)
        .style(Style::default().fg(palette.text))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(composing, palette))
                .title("Reply as operator"),
        );
    f.render_widget(compose, chunks[2]);
}

/// One line per message, plus the unread divider
///
/// Returns the lines and the row of the anchored message, if any.
fn message_lines(
    entries: &[Entry],
    divider: Option<usize>,
    scroll: MessageScroll,
    palette: Palette,
) -> (Vec<Line<'static>>, Option<u32>) {
    let mut lines = Vec::with_capacity(entries.len() + 1);
    let mut anchor_row = None;

    for (index, entry) in entries.iter().enumerate() {
        if divider == Some(index) {
            lines.push(
                Line::from(Span::styled(
                    "──── unread messages ────",
                    Style::default().fg(palette.highlight).add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Center),
            );
        }
        if scroll == MessageScroll::Anchored(index) {
            anchor_row = Some(lines.len() as u32);
        }
        lines.push(message_line(entry, palette));
    }

    (lines, anchor_row)
}

fn message_line(entry: &Entry, palette: Palette) -> Line<'static> {
    let message = &entry.message;
    let clock = format_clock(&message.created_at, &Local);

    if let Some(notice) = parse_system_notice(&message.content) {
        return Line::from(Span::styled(
            format!("· {} · {}", notice.label(), clock),
            Style::default().fg(palette.muted).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center);
    }

    let (label, color) = if message.is_from_user() {
        ("User", palette.user)
    } else if message.is_from_human_operator() {
        ("Operator", palette.human)
    } else {
        ("Bot", palette.bot)
    };

    let mut spans = vec![
        Span::styled(format!("[{}] ", clock), Style::default().fg(palette.muted)),
        Span::styled(
            format!("{}: ", label),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(message.content.clone(), Style::default().fg(palette.text)),
    ];
    if message.is_edited {
        spans.push(Span::styled(" (edited)", Style::default().fg(palette.muted)));
    }
    match entry.origin {
        Origin::Optimistic => {
            spans.push(Span::styled(" (sending…)", Style::default().fg(palette.muted)));
        }
        Origin::Realtime | Origin::Confirmed => {}
    }

    Line::from(spans)
}

fn focus_style(focused: bool, palette: Palette) -> Style {
    Style::default().fg(if focused { palette.accent } else { palette.muted })
}
