use teloxide::types::Message;
use tracing::warn;

use linkguard_core::{
    config::{Config, Policy},
    domain::{BotRights, ChatId},
    formatting::{escape_html, format_duration},
    Result,
};

use crate::router::AppState;

struct ParsedCommand {
    name: String,
    /// `botname` in `/cmd@botname`, if present.
    target: Option<String>,
}

fn parse_command(text: &str) -> ParsedCommand {
    // Telegram may send `/cmd@botname arg1 ...`
    let first = text.split_whitespace().next().unwrap_or("");
    let mut parts = first.trim_start_matches('/').splitn(2, '@');
    let name = parts.next().unwrap_or("").to_lowercase();
    let target = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    ParsedCommand { name, target }
}

/// Answer a known command. Returns false when the message is not one of ours,
/// so the caller moderates it like any other message.
pub async fn handle_command(msg: &Message, text: &str, state: &AppState) -> bool {
    let cmd = parse_command(text);
    if let Some(target) = &cmd.target {
        if !target.eq_ignore_ascii_case(&state.bot_username) {
            return false;
        }
    }

    let chat_id = ChatId(msg.chat.id.0);
    let body = match cmd.name.as_str() {
        "start" | "help" => help_html(&state.cfg),
        "whitelist" => whitelist_html(state.pipeline.policy()),
        "status" => {
            if msg.chat.is_private() {
                "ℹ️ Use /status inside a group to check my moderation rights there.".to_string()
            } else {
                let rights = state.gateway.bot_rights(chat_id).await;
                if let Err(e) = &rights {
                    warn!(chat_id = chat_id.0, op = "bot_rights", "status lookup failed: {e}");
                }
                status_html(rights)
            }
        }
        _ => return false,
    };

    if let Err(e) = state.gateway.send_html(chat_id, &body).await {
        warn!(
            chat_id = chat_id.0,
            command = %cmd.name,
            op = "send_message",
            "failed to answer command: {e}"
        );
    }
    true
}

fn help_html(cfg: &Config) -> String {
    let restrict = format_duration(cfg.policy.restriction_duration);
    let lifetime = format_duration(cfg.policy.warning_lifetime);
    let channel = escape_html(&cfg.creator_channel);

    format!(
        "🤖 <b>Link Guard Bot</b>\n\n\
I delete links posted by group members who are not admins, mute the sender for {restrict} \
and leave a warning that disappears after {lifetime}.\n\n\
<b>📋 Commands:</b>\n\
/start - Show this help message\n\
/help - Show this help message\n\
/status - Check my permissions in this group\n\
/whitelist - Show domains that are always allowed\n\n\
<b>💡 Setup:</b>\n\
Add me to a group as admin with <i>Delete messages</i> and <i>Ban users</i> rights.\n\n\
Creator: {channel}"
    )
}

fn whitelist_html(policy: &Policy) -> String {
    if policy.whitelisted_domains.is_empty() {
        return "📭 No whitelisted domains. Every link from non-admins is removed.".to_string();
    }

    let mut lines = vec![format!(
        "✅ <b>Whitelisted domains ({})</b>",
        policy.whitelisted_domains.len()
    )];
    for d in &policy.whitelisted_domains {
        lines.push(format!("• <code>{}</code>", escape_html(d)));
    }
    lines.join("\n")
}

fn status_html(rights: Result<BotRights>) -> String {
    let rights = match rights {
        Ok(r) => r,
        Err(e) => {
            return format!(
                "❌ Could not read my permissions in this chat.\n<code>{}</code>",
                escape_html(&e.to_string())
            )
        }
    };

    let mark = |ok: bool| if ok { "✅" } else { "❌" };
    let mut lines = vec![
        "📊 <b>Bot status</b>\n".to_string(),
        format!("Admin: {}", mark(rights.is_admin)),
        format!("Delete messages: {}", mark(rights.can_delete_messages)),
        format!("Restrict members: {}", mark(rights.can_restrict_members)),
    ];

    match rights.ensure_moderation() {
        Ok(()) => lines.push("\n🛡 Link moderation is active.".to_string()),
        Err(e) => lines.push(format!(
            "\n⚠️ Link moderation is limited: {}",
            escape_html(&e.to_string())
        )),
    }
    lines.join("\n")
}
