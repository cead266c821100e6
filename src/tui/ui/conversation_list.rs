//! Conversation list pane rendering

use crate::format::{preview, relative_label, unread_badge, PREVIEW_LEN};
use crate::models::{BotStatus, Conversation};
use crate::transport::RoomTransport;
use crate::tui::app::App;
use crate::tui::types::{Focus, Palette};
use chrono::{DateTime, Local};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Renders the search line and the conversation list
pub fn render_conversation_list<T: RoomTransport>(f: &mut Frame, app: &App<T>, area: Rect) {
    let palette = app.palette();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let searching = app.focus == Focus::Search;
    let query = if searching {
        format!("{}▏", app.search_input)
    } else {
        app.dashboard.search_query().to_string()
    };
    let search = Paragraph::new(query)
        .style(Style::default().fg(palette.text))
        .block(bordered("Search (/)", searching, palette));
    f.render_widget(search, chunks[0]);

    let pager = app.dashboard.list_pager();
    let mut title = format!("Conversations {}/{}", pager.page(), pager.total_pages());
    if app.dashboard.is_list_loading() {
        title.push_str(" …");
    }
    let block = bordered(&title, app.focus == Focus::Conversations, palette);

    if let Some(error) = app.dashboard.list_error() {
        let message = Paragraph::new(format!("Could not load conversations: {}\nF5 to retry", error))
            .style(Style::default().fg(palette.error))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(message, chunks[1]);
        return;
    }

    let rows = app.dashboard.conversations();
    if rows.is_empty() {
        let empty = if app.dashboard.is_list_loading() {
            "Loading…"
        } else {
            "No conversations"
        };
        let message = Paragraph::new(empty)
            .style(Style::default().fg(palette.muted))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(message, chunks[1]);
        return;
    }

    let now = Local::now();
    let open = app.dashboard.selected();
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| conversation_item(row, open == Some(&row.id), &now, palette))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    state.select(Some(app.selected_index.min(rows.len() - 1)));
    f.render_stateful_widget(list, chunks[1], &mut state);
}

fn conversation_item<'a>(
    row: &'a Conversation,
    is_open: bool,
    now: &DateTime<Local>,
    palette: Palette,
) -> ListItem<'a> {
    let badge_color = match row.bot_status {
        BotStatus::Active => palette.bot,
        BotStatus::Paused => palette.highlight,
        BotStatus::HumanTakeover => palette.human,
    };

    let mut title = vec![
        Span::styled(
            format!("[{}] ", row.bot_status.badge()),
            Style::default().fg(badge_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            row.display_name(),
            Style::default().fg(palette.text).add_modifier(if is_open {
                Modifier::BOLD | Modifier::UNDERLINED
            } else {
                Modifier::BOLD
            }),
        ),
    ];
    if row.requires_human {
        title.push(Span::styled(" ⚠", Style::default().fg(palette.error)));
    }
    let unread = unread_badge(row.unread_count);
    if !unread.is_empty() {
        title.push(Span::styled(
            format!(" ({})", unread),
            Style::default().fg(palette.highlight).add_modifier(Modifier::BOLD),
        ));
    }

    let last = row.last_message();
    let when = relative_label(&row.activity_at(), now);
    let detail = Line::from(vec![
        Span::styled(
            format!("  {}", preview(last.map(|m| m.content.as_str()).unwrap_or(""), PREVIEW_LEN)),
            Style::default().fg(palette.muted),
        ),
        Span::styled(format!("  {}", when), Style::default().fg(palette.muted)),
    ]);

    ListItem::new(vec![Line::from(title), detail])
}

fn bordered(title: &str, focused: bool, palette: Palette) -> Block<'static> {
    let border = if focused {
        Style::default().fg(palette.accent)
    } else {
        Style::default().fg(palette.muted)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title.to_string())
}
