use teloxide::types::Message;

use linkguard_core::domain::{ChatId, ChatKind, MessageEvent, MessageId, UserId};

use crate::router::AppState;

/// Build a core event from a Telegram message. Messages without a human or
/// bot sender (channel posts, service messages) yield `None`.
fn event_from_message(msg: &Message) -> Option<MessageEvent> {
    let user = msg.from()?;
    let chat_kind = if msg.chat.is_private() {
        ChatKind::Private
    } else {
        ChatKind::Group
    };

    Some(MessageEvent {
        chat_id: ChatId(msg.chat.id.0),
        chat_kind,
        message_id: MessageId(msg.id.0),
        sender_id: UserId(user.id.0 as i64),
        sender_is_bot: user.is_bot,
        sender_display_name: user.full_name(),
        text: msg.text().or_else(|| msg.caption()).map(str::to_string),
    })
}

pub async fn moderate(msg: &Message, state: &AppState) {
    let Some(event) = event_from_message(msg) else {
        return;
    };
    if event.text.is_none() {
        return;
    }

    state.pipeline.handle(&event).await;
}
