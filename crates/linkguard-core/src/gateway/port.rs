use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::{BotRights, ChatId, MemberRole, MessageRef, Restriction, UserId},
    Result,
};

/// Chat platform port.
///
/// Every call is network I/O and may fail or stall; callers in the moderation
/// path treat failures as non-fatal.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn member_role(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberRole>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        restriction: Restriction,
        until: DateTime<Utc>,
    ) -> Result<()>;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;

    /// Rights the bot account holds in `chat_id`.
    async fn bot_rights(&self, chat_id: ChatId) -> Result<BotRights>;
}
