//! Telegram HTML helpers.

use std::time::Duration;

use crate::domain::UserId;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Inline mention that pings the user even without a username.
pub fn mention_html(user_id: UserId, display_name: &str) -> String {
    let name = if display_name.trim().is_empty() {
        "user".to_string()
    } else {
        escape_html(display_name)
    };
    format!("<a href=\"tg://user?id={}\">{}</a>", user_id.0, name)
}

/// Compact duration such as `3s`, `2m 5s` or `1h 0m 0s`.
pub fn format_duration(d: Duration) -> String {
    let seconds = d.as_secs();
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        return format!("{hours}h {mins}m {secs}s");
    }
    if mins > 0 {
        return format!("{mins}m {secs}s");
    }
    format!("{secs}s")
}
