// Types Tests - Testing Focus and Palette

use crate::storage::Theme;
use crate::tui::{Focus, Palette};

#[test]
fn test_focus_next_cycles_panes() {
    assert_eq!(Focus::Conversations.next(), Focus::Messages);
    assert_eq!(Focus::Messages.next(), Focus::Compose);
    assert_eq!(Focus::Compose.next(), Focus::Conversations);
    // The search line is left by Tab, never entered by it
    assert_eq!(Focus::Search.next(), Focus::Conversations);
}

#[test]
fn test_focus_text_entry() {
    assert!(Focus::Compose.is_text_entry());
    assert!(Focus::Search.is_text_entry());
    assert!(!Focus::Conversations.is_text_entry());
    assert!(!Focus::Messages.is_text_entry());
}

#[test]
fn test_palette_per_theme() {
    let light = Palette::for_theme(Theme::Light);
    let dark = Palette::for_theme(Theme::Dark);

    assert_ne!(light, dark);
    assert_ne!(light.text, dark.text);
    assert_ne!(light.user, light.bot);
    assert_ne!(dark.bot, dark.human);
}
