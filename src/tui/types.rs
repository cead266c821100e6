//! Core types for TUI focus handling and colours

use crate::storage::Theme;
use ratatui::style::Color;

/// Pane that receives key input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Conversation list
    Conversations,
    /// Message history of the open conversation
    Messages,
    /// Compose line
    Compose,
    /// Search line above the conversation list
    Search,
}

impl Focus {
    /// Next pane in Tab order (the search line is reached with `/` only)
    pub fn next(self) -> Self {
        match self {
            Focus::Conversations => Focus::Messages,
            Focus::Messages => Focus::Compose,
            Focus::Compose | Focus::Search => Focus::Conversations,
        }
    }

    /// Whether typed characters go into a text field
    pub fn is_text_entry(self) -> bool {
        matches!(self, Focus::Compose | Focus::Search)
    }
}

/// Colours used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Regular text
    pub text: Color,
    /// Secondary text (timestamps, previews)
    pub muted: Color,
    /// Titles and focused borders
    pub accent: Color,
    /// WhatsApp user messages
    pub user: Color,
    /// Bot messages
    pub bot: Color,
    /// Human operator messages
    pub human: Color,
    /// Warnings and failures
    pub error: Color,
    /// Unread divider and badges
    pub highlight: Color,
}

impl Palette {
    /// Colours for `theme`
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                text: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                user: Color::Blue,
                bot: Color::Green,
                human: Color::Magenta,
                error: Color::Red,
                highlight: Color::Yellow,
            },
            Theme::Dark => Self {
                text: Color::White,
                muted: Color::Gray,
                accent: Color::Cyan,
                user: Color::LightBlue,
                bot: Color::LightGreen,
                human: Color::LightMagenta,
                error: Color::LightRed,
                highlight: Color::Yellow,
            },
        }
    }
}
