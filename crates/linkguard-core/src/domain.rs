use crate::{errors::Error, Result};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
}

/// Snapshot of one inbound message, built by the transport adapter.
///
/// `text` carries the message body, or the caption for media messages.
#[derive(Clone, Debug)]
pub struct MessageEvent {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub message_id: MessageId,
    pub sender_id: UserId,
    pub sender_is_bot: bool,
    pub sender_display_name: String,
    pub text: Option<String>,
}

impl MessageEvent {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat_id,
            message_id: self.message_id,
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Role of a chat member as reported by the platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRole {
    Regular,
    Administrator,
    Creator,
}

impl MemberRole {
    pub fn is_privileged(self) -> bool {
        matches!(self, MemberRole::Administrator | MemberRole::Creator)
    }
}

/// Capabilities removed from a member while restricted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Restriction {
    pub no_send: bool,
    pub no_media: bool,
    pub no_other_messages: bool,
    pub no_link_preview: bool,
}

impl Restriction {
    /// Mute everything a link could travel through.
    pub fn mute_all() -> Self {
        Self {
            no_send: true,
            no_media: true,
            no_other_messages: true,
            no_link_preview: true,
        }
    }
}

/// Moderation rights the bot itself holds in a chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BotRights {
    pub is_admin: bool,
    pub can_delete_messages: bool,
    pub can_restrict_members: bool,
}

impl BotRights {
    /// Ok when the bot can both delete messages and restrict members.
    pub fn ensure_moderation(&self) -> Result<()> {
        let mut missing = Vec::new();
        if !self.can_delete_messages {
            missing.push("delete messages");
        }
        if !self.can_restrict_members {
            missing.push("restrict members");
        }
        if missing.is_empty() {
            return Ok(());
        }
        Err(Error::Permission(missing.join(", ")))
    }
}
