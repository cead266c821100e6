//! Presentation helpers
//!
//! Formatting never fails: unparseable input renders as an empty string.

use crate::models::timestamp;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

/// Longest last-message preview, in characters
pub const PREVIEW_LEN: usize = 50;

/// `HH:MM` in the timezone of `tz`
pub fn format_clock<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz).format("%H:%M").to_string()
}

/// List-row label for `ts`, relative to `now`
///
/// Today shows the time, yesterday shows `yesterday`, the last week shows
/// the weekday, older dates show `dd/mm` or `dd/mm/yy` outside this year.
pub fn relative_label<Tz: TimeZone>(ts: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let local = ts.with_timezone(&now.timezone());
    let day = local.date_naive();
    let today = now.date_naive();

    if day == today {
        return local.format("%H:%M").to_string();
    }
    if Some(day) == today.pred_opt() {
        return "yesterday".to_string();
    }
    if day >= today - Duration::days(7) {
        return local.format("%a").to_string();
    }
    if local.year() == now.year() {
        return local.format("%d/%m").to_string();
    }
    local.format("%d/%m/%y").to_string()
}

/// [`relative_label`] for a raw wire timestamp; empty when unparseable
pub fn format_relative<Tz: TimeZone>(raw: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    timestamp::parse(raw)
        .map(|ts| relative_label(&ts, now))
        .unwrap_or_default()
}

/// Truncate `content` to `max` characters, appending `...` when cut
pub fn preview(content: &str, max: usize) -> String {
    if content.chars().count() <= max {
        return content.to_string();
    }
    let head: String = content.chars().take(max).collect();
    format!("{}...", head)
}

/// Unread badge text; empty for zero
pub fn unread_badge(count: u32) -> String {
    match count {
        0 => String::new(),
        1..=99 => count.to_string(),
        _ => "99+".to_string(),
    }
}

/// Human label for a raw bot status string
pub fn status_label(raw: &str) -> &str {
    match raw {
        "active" => "Active",
        "paused" => "Paused",
        "human_takeover" => "Human takeover",
        "inactive" => "Inactive",
        other => other,
    }
}

/// System message recognized in a conversation's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemNotice {
    /// The bot status changed
    BotStatusChange {
        /// Previous status, as written
        from: String,
        /// New status, as written
        to: String,
    },
    /// The conversation was flagged for a human operator
    HumanIntervention,
}

impl SystemNotice {
    /// One-line divider text
    pub fn label(&self) -> String {
        match self {
            SystemNotice::BotStatusChange { from, to } => {
                format!("{} → {}", status_label(from), status_label(to))
            }
            SystemNotice::HumanIntervention => "Human intervention requested".to_string(),
        }
    }
}

/// Recognize status-change system messages
pub fn parse_system_notice(content: &str) -> Option<SystemNotice> {
    if let Some((from, to)) = parse_status_change(content) {
        return Some(SystemNotice::BotStatusChange { from, to });
    }
    if let Some((from, to)) = parse_quoted_status_change(content) {
        return Some(SystemNotice::BotStatusChange { from, to });
    }
    if content.contains("Bot reactivado") {
        return Some(SystemNotice::BotStatusChange {
            from: "paused".to_string(),
            to: "active".to_string(),
        });
    }
    if content.contains("Bot pausado") {
        return Some(SystemNotice::BotStatusChange {
            from: "active".to_string(),
            to: "paused".to_string(),
        });
    }
    if content.contains("requires human intervention")
        || content.contains("requiere intervención humana")
    {
        return Some(SystemNotice::HumanIntervention);
    }
    None
}

/// `Bot status changed from <word> to <word>`
fn parse_status_change(content: &str) -> Option<(String, String)> {
    let (_, rest) = content.split_once("Bot status changed from ")?;
    let (from, rest) = take_word(rest)?;
    let rest = rest.strip_prefix(" to ")?;
    let (to, _) = take_word(rest)?;
    Some((from.to_string(), to.to_string()))
}

/// `Estado del bot cambiado de "<x>" a "<y>"`
fn parse_quoted_status_change(content: &str) -> Option<(String, String)> {
    let (_, rest) = content.split_once("Estado del bot cambiado de \"")?;
    let (from, rest) = rest.split_once('"')?;
    let rest = rest.strip_prefix(" a \"")?;
    let (to, _) = rest.split_once('"')?;
    Some((from.to_string(), to.to_string()))
}

fn take_word(input: &str) -> Option<(&str, &str)> {
    let end = input
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(input.len());
    (end > 0).then(|| input.split_at(end))
}
