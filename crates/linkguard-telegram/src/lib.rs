//! Telegram adapter (teloxide).
//!
//! This crate implements the `linkguard-core` ChatGateway over the Telegram Bot API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use teloxide::{
    prelude::*,
    types::{ChatPermissions, ParseMode},
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use linkguard_core::{
    domain::{BotRights, ChatId, MemberRole, MessageId, MessageRef, Restriction, UserId},
    errors::Error,
    gateway::ChatGateway,
    Result,
};

#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
    bot_user_id: teloxide::types::UserId,
}

impl TelegramGateway {
    pub fn new(bot: Bot, bot_user_id: teloxide::types::UserId) -> Self {
        Self { bot, bot_user_id }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn tg_user(user_id: UserId) -> Result<teloxide::types::UserId> {
        u64::try_from(user_id.0)
            .map(teloxide::types::UserId)
            .map_err(|_| Error::Transport(format!("invalid telegram user id: {}", user_id.0)))
    }

    fn map_err(op: &str, e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram {op} failed: {e}"))
    }

    async fn with_retry<T, Fut>(&self, op: &str, mut call: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match call().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(op, other)),
                },
            }
        }
    }
}

/// Permission set that keeps only what `restriction` does not take away.
///
/// teloxide's flags carry the rights they depend on: media implies text,
/// while stickers/games and link previews both imply media. A flag is only
/// granted when everything it implies is granted too.
pub fn permissions_for(restriction: Restriction) -> ChatPermissions {
    let send = !restriction.no_send;
    let media = send && !restriction.no_media;

    let mut perms = ChatPermissions::empty();
    if send {
        perms.insert(ChatPermissions::SEND_MESSAGES);
    }
    if media {
        perms.insert(ChatPermissions::SEND_MEDIA_MESSAGES);
    }
    if media && !restriction.no_other_messages {
        perms.insert(ChatPermissions::SEND_OTHER_MESSAGES);
    }
    if media && !restriction.no_link_preview {
        perms.insert(ChatPermissions::ADD_WEB_PAGE_PREVIEWS);
    }
    perms
}

#[async_trait]
impl ChatGateway for TelegramGateway {
    async fn member_role(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberRole> {
        let user = Self::tg_user(user_id)?;
        let member = self
            .with_retry("get_chat_member", || {
                self.bot.get_chat_member(Self::tg_chat(chat_id), user)
            })
            .await?;

        let role = if member.kind.is_owner() {
            MemberRole::Creator
        } else if member.kind.is_administrator() {
            MemberRole::Administrator
        } else {
            MemberRole::Regular
        };
        Ok(role)
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.with_retry("delete_message", || {
            self.bot
                .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
        })
        .await?;
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        restriction: Restriction,
        until: DateTime<Utc>,
    ) -> Result<()> {
        let user = Self::tg_user(user_id)?;
        let perms = permissions_for(restriction);
        self.with_retry("restrict_chat_member", || {
            self.bot
                .restrict_chat_member(Self::tg_chat(chat_id), user, perms)
                .until_date(until)
        })
        .await?;
        Ok(())
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry("send_message", || {
                self.bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn bot_rights(&self, chat_id: ChatId) -> Result<BotRights> {
        let me = self
            .with_retry("get_chat_member", || {
                self.bot
                    .get_chat_member(Self::tg_chat(chat_id), self.bot_user_id)
            })
            .await?;

        Ok(BotRights {
            is_admin: me.kind.is_privileged(),
            can_delete_messages: me.kind.can_delete_messages(),
            can_restrict_members: me.kind.can_restrict_members(),
        })
    }
}
