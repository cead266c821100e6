// Format Tests - Testing presentation helpers

use crate::format::*;
use crate::tests::support::at;
use chrono::{FixedOffset, TimeZone, Utc};

#[test]
fn test_format_clock_in_timezone() {
    let madrid = FixedOffset::east_opt(2 * 3600).expect("valid offset");
    assert_eq!(format_clock(&at(0), &Utc), "12:00");
    assert_eq!(format_clock(&at(0), &madrid), "14:00");
}

#[test]
fn test_relative_label() {
    // 2024-05-01 is a Wednesday
    let now = at(0);

    assert_eq!(relative_label(&at(-3600), &now), "11:00");
    assert_eq!(
        relative_label(&Utc.with_ymd_and_hms(2024, 4, 30, 23, 0, 0).unwrap(), &now),
        "yesterday"
    );
    assert_eq!(
        relative_label(&Utc.with_ymd_and_hms(2024, 4, 27, 9, 0, 0).unwrap(), &now),
        "Sat"
    );
    assert_eq!(
        relative_label(&Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap(), &now),
        "15/03"
    );
    assert_eq!(
        relative_label(&Utc.with_ymd_and_hms(2023, 12, 31, 9, 0, 0).unwrap(), &now),
        "31/12/23"
    );
}

#[test]
fn test_format_relative_never_fails() {
    let now = at(0);
    assert_eq!(format_relative("2024-05-01T10:30:00Z", &now), "10:30");
    assert_eq!(format_relative("not a date", &now), "");
    assert_eq!(format_relative("", &now), "");
}

#[test]
fn test_preview_truncates_by_characters() {
    assert_eq!(preview("hola", 10), "hola");
    assert_eq!(preview("¿Dónde está mi pedido?", 5), "¿Dónd...");
    assert_eq!(preview(&"a".repeat(PREVIEW_LEN), PREVIEW_LEN).len(), PREVIEW_LEN);
}

#[test]
fn test_unread_badge() {
    assert_eq!(unread_badge(0), "");
    assert_eq!(unread_badge(7), "7");
    assert_eq!(unread_badge(99), "99");
    assert_eq!(unread_badge(100), "99+");
}

#[test]
fn test_status_label() {
    assert_eq!(status_label("active"), "Active");
    assert_eq!(status_label("human_takeover"), "Human takeover");
    assert_eq!(status_label("archived"), "archived");
}

#[test]
fn test_parse_status_change_notices() {
    assert_eq!(
        parse_system_notice("Bot status changed from active to paused"),
        Some(SystemNotice::BotStatusChange {
            from: "active".to_string(),
            to: "paused".to_string(),
        })
    );
    assert_eq!(
        parse_system_notice("Estado del bot cambiado de \"paused\" a \"human_takeover\""),
        Some(SystemNotice::BotStatusChange {
            from: "paused".to_string(),
            to: "human_takeover".to_string(),
        })
    );
    assert_eq!(
        parse_system_notice("✅ Bot reactivado por el operador"),
        Some(SystemNotice::BotStatusChange {
            from: "paused".to_string(),
            to: "active".to_string(),
        })
    );
}

#[test]
fn test_parse_human_intervention_notice() {
    let notice = parse_system_notice("La conversación requiere intervención humana")
        .expect("notice");
    assert_eq!(notice, SystemNotice::HumanIntervention);
    assert_eq!(notice.label(), "Human intervention requested");
}

#[test]
fn test_regular_messages_are_not_notices() {
    assert!(parse_system_notice("Hola, quiero cambiar mi pedido").is_none());
    assert!(parse_system_notice("Bot status changed from").is_none());
}

#[test]
fn test_notice_label() {
    let notice = SystemNotice::BotStatusChange {
        from: "active".to_string(),
        to: "paused".to_string(),
    };
    assert_eq!(notice.label(), "Active → Paused");
}
