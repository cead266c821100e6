// Models Tests - Testing lenient decoding of backend payloads

use crate::models::timestamp;
use crate::models::*;
use crate::tests::support::at;
use serde_json::json;

#[test]
fn test_ids_accept_strings_and_numbers() {
    let from_number: ConversationId = serde_json::from_value(json!(42)).expect("Failed to decode");
    let from_string: ConversationId =
        serde_json::from_value(json!("42")).expect("Failed to decode");

    assert_eq!(from_number, from_string);
    assert_eq!(from_number.as_str(), "42");
    assert_eq!(serde_json::to_value(&from_number).expect("Failed to encode"), json!("42"));
}

#[test]
fn test_timestamp_spellings() {
    let rfc = timestamp::parse("2024-05-01T12:00:00.000Z").expect("rfc3339");
    let sql = timestamp::parse("2024-05-01 12:00:00").expect("sql");
    let millis = timestamp::parse("1714564800000").expect("millis");

    assert_eq!(rfc, at(0));
    assert_eq!(sql, at(0));
    assert_eq!(millis, at(0));
    assert!(timestamp::parse("").is_none());
    assert!(timestamp::parse("not a date").is_none());
    assert_eq!(timestamp::to_wire(&at(0)), "2024-05-01T12:00:00.000Z");
}

#[test]
fn test_message_decoding_with_nulls() {
    let message: Message = serde_json::from_value(json!({
        "id": 7,
        "sender": "USER",
        "content": null,
        "created_at": "2024-05-01T12:00:00Z",
        "metadata": null,
        "is_edited": null
    }))
    .expect("Failed to decode message");

    assert_eq!(message.id.as_str(), "7");
    assert!(message.is_from_user());
    assert_eq!(message.content, "");
    assert!(!message.is_edited);
    assert!(!message.is_from_human_operator());
}

#[test]
fn test_message_metadata_keeps_unknown_keys() {
    let message: Message = serde_json::from_value(json!({
        "id": "m1",
        "sender": "bot",
        "content": "hola",
        "created_at": "2024-05-01T12:00:00Z",
        "metadata": { "sent_by_human": true, "operator": "ana" }
    }))
    .expect("Failed to decode message");

    assert!(message.is_from_human_operator());
    assert_eq!(message.metadata.extra.get("operator"), Some(&json!("ana")));
}

#[test]
fn test_only_confirmed_bot_messages_are_editable() {
    let bot = Message::new("m1", Sender::Bot, "hola", at(0));
    let user = Message::new("m2", Sender::User, "hola", at(0));
    let mut pending = Message::new("local-1", Sender::Bot, "hola", at(0));
    pending.metadata.optimistic = true;

    assert!(bot.is_editable());
    assert!(!user.is_editable());
    assert!(!pending.is_editable());
}

#[test]
fn test_bot_status_wire_names() {
    let paused: BotStatus = serde_json::from_value(json!("paused")).expect("Failed to decode");
    let unknown: BotStatus = serde_json::from_value(json!("inactive")).expect("Failed to decode");

    assert_eq!(paused, BotStatus::Paused);
    assert_eq!(unknown, BotStatus::Active);
    assert_eq!(BotStatus::HumanTakeover.as_str(), "human_takeover");
    assert_eq!(BotStatus::HumanTakeover.badge(), "HUMAN");
}

#[test]
fn test_conversation_display_name_fallbacks() {
    let mut conversation = Conversation::new("c1");
    assert_eq!(conversation.display_name(), "Unknown user");

    conversation.user = Some(ChatUser {
        name: Some(String::new()),
        phone: Some("+34600000000".to_string()),
    });
    assert_eq!(conversation.display_name(), "+34600000000");

    conversation.user = Some(ChatUser {
        name: Some("Lucía".to_string()),
        phone: Some("+34600000000".to_string()),
    });
    assert_eq!(conversation.display_name(), "Lucía");
}

#[test]
fn test_conversation_accepts_capitalized_user_key() {
    let conversation: Conversation = serde_json::from_value(json!({
        "id": "c1",
        "User": { "name": "Pablo", "phone": "+34611111111" },
        "bot_status": "human_takeover",
        "unread_count": 3,
        "last_read_at": "2024-05-01T12:00:00Z",
        "messages": [{ "content": "hola", "created_at": "2024-05-01T12:05:00Z" }]
    }))
    .expect("Failed to decode conversation");

    assert_eq!(conversation.display_name(), "Pablo");
    assert_eq!(conversation.bot_status, BotStatus::HumanTakeover);
    assert_eq!(conversation.unread_count, 3);
    assert_eq!(conversation.last_read_at, Some(at(0)));
    assert_eq!(conversation.activity_at(), at(300));
}

#[test]
fn test_activity_falls_back_to_updated_then_created() {
    let mut conversation = Conversation::new("c1");
    assert_eq!(conversation.activity_at().timestamp(), 0);

    conversation.created_at = Some(at(10));
    assert_eq!(conversation.activity_at(), at(10));

    conversation.updated_at = Some(at(20));
    assert_eq!(conversation.activity_at(), at(20));
}

#[test]
fn test_search_hit_into_row() {
    let hit: SearchHit = serde_json::from_value(json!({
        "content": "quiero una cita",
        "created_at": "2024-05-01T12:00:00Z",
        "Conversation": { "id": 9, "User": { "name": "Marta" } }
    }))
    .expect("Failed to decode hit");

    let row = hit.into_row().expect("hit with id maps to a row");
    assert_eq!(row.id.as_str(), "9");
    assert_eq!(row.display_name(), "Marta");
    assert_eq!(row.last_message().map(|m| m.content.as_str()), Some("quiero una cita"));
    assert_eq!(row.activity_at(), at(0));
}

#[test]
fn test_search_hit_without_conversation_id_is_dropped() {
    let hit: SearchHit = serde_json::from_value(json!({
        "content": "huérfano",
        "Conversation": { "User": { "name": "Nadie" } }
    }))
    .expect("Failed to decode hit");

    assert!(hit.into_row().is_none());
}

#[test]
fn test_whatsapp_config_mask() {
    assert_eq!(WhatsappConfig::mask(""), "");
    assert_eq!(WhatsappConfig::mask("abc"), "***");
    assert_eq!(WhatsappConfig::mask("secret-token"), "********oken");
    assert_eq!(WhatsappConfig::default().version, "v24.0");
}

#[test]
fn test_prompt_template_to_draft() {
    let template: PromptTemplate = serde_json::from_value(json!({
        "id": 3,
        "type": "system",
        "name": "Base",
        "content": "Eres un asistente",
        "isActive": true
    }))
    .expect("Failed to decode prompt");

    let draft = template.to_draft();
    assert_eq!(draft.prompt_type, "system");
    assert!(draft.is_active);
    assert_eq!(
        serde_json::to_value(&draft).expect("Failed to encode")["type"],
        json!("system")
    );
}
