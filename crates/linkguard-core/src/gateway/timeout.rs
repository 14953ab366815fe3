use std::{future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};

use crate::{
    domain::{BotRights, ChatId, MemberRole, MessageRef, Restriction, UserId},
    errors::Error,
    gateway::port::ChatGateway,
    Result,
};

/// ChatGateway decorator that bounds every outbound call.
///
/// A call that does not finish within `limit` resolves to [`Error::Timeout`].
/// The inner future is dropped at that point, so the platform may still have
/// applied the action.
pub struct TimeoutGateway {
    inner: Arc<dyn ChatGateway>,
    limit: Duration,
}

impl TimeoutGateway {
    pub fn new(inner: Arc<dyn ChatGateway>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(res) => res,
            Err(_) => Err(Error::Timeout(self.limit)),
        }
    }
}

#[async_trait::async_trait]
impl ChatGateway for TimeoutGateway {
    async fn member_role(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberRole> {
        self.bounded(self.inner.member_role(chat_id, user_id)).await
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.bounded(self.inner.delete_message(msg)).await
    }

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        restriction: Restriction,
        until: DateTime<Utc>,
    ) -> Result<()> {
        self.bounded(
            self.inner
                .restrict_member(chat_id, user_id, restriction, until),
        )
        .await
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.bounded(self.inner.send_html(chat_id, html)).await
    }

    async fn bot_rights(&self, chat_id: ChatId) -> Result<BotRights> {
        self.bounded(self.inner.bot_rights(chat_id)).await
    }
}
