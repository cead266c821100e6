//! UI helper functions

use crate::tui::app::MessageScroll;

/// `●` when connected, `○` otherwise
pub fn connection_dot(connected: bool) -> &'static str {
    if connected {
        "●"
    } else {
        "○"
    }
}

/// First visible row of the message pane
///
/// # Arguments
/// * `scroll` - Scroll mode chosen by the app
/// * `anchor_row` - Row of the anchored message, when anchored
/// * `content` - Total content rows
/// * `height` - Visible rows
pub fn resolve_offset(scroll: MessageScroll, anchor_row: Option<u32>, content: u32, height: u32) -> u32 {
    let max_offset = content.saturating_sub(height);
    match scroll {
        MessageScroll::Follow => max_offset,
        MessageScroll::Anchored(_) => anchor_row
            .map(|row| row.saturating_sub(height / 2))
            .unwrap_or(max_offset)
            .min(max_offset),
        MessageScroll::Manual(offset) => offset.min(max_offset),
    }
}
