//! In-memory ChatGateway used by unit tests.

use std::{collections::HashSet, sync::Mutex, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::{
    domain::{BotRights, ChatId, MemberRole, MessageId, MessageRef, Restriction, UserId},
    errors::Error,
    gateway::ChatGateway,
    Result,
};

pub struct FakeGateway {
    pub next_id: Mutex<i32>,
    pub role: Mutex<Option<MemberRole>>,
    pub rights: Mutex<Option<BotRights>>,
    pub fail_deletes: Mutex<HashSet<MessageRef>>,
    pub fail_restrict: Mutex<bool>,
    pub fail_send: Mutex<bool>,
    /// Latency added to every delete, restrict and send.
    pub delay: Mutex<Duration>,

    pub role_lookups: Mutex<Vec<(ChatId, UserId)>>,
    pub deletes: Mutex<Vec<(MessageRef, Instant)>>,
    pub restricts: Mutex<Vec<(ChatId, UserId, Restriction, DateTime<Utc>)>>,
    pub sends: Mutex<Vec<(ChatId, String)>>,
    /// When each successful send returned.
    pub sent_at: Mutex<Vec<Instant>>,
}

impl FakeGateway {
    /// Sent messages get ids starting at `first_id`; members are regular.
    pub fn new(first_id: i32) -> Self {
        Self {
            next_id: Mutex::new(first_id),
            role: Mutex::new(Some(MemberRole::Regular)),
            rights: Mutex::new(Some(BotRights::default())),
            fail_deletes: Mutex::new(HashSet::new()),
            fail_restrict: Mutex::new(false),
            fail_send: Mutex::new(false),
            delay: Mutex::new(Duration::ZERO),
            role_lookups: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            restricts: Mutex::new(Vec::new()),
            sends: Mutex::new(Vec::new()),
            sent_at: Mutex::new(Vec::new()),
        }
    }

    pub fn deleted(&self) -> Vec<MessageRef> {
        self.deletes.lock().unwrap().iter().map(|(m, _)| *m).collect()
    }

    async fn lag(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ChatGateway for FakeGateway {
    async fn member_role(&self, chat_id: ChatId, user_id: UserId) -> Result<MemberRole> {
        self.role_lookups.lock().unwrap().push((chat_id, user_id));
        let role = *self.role.lock().unwrap();
        role.ok_or_else(|| Error::Transport("getChatMember failed".to_string()))
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.deletes.lock().unwrap().push((msg, Instant::now()));
        self.lag().await;
        if self.fail_deletes.lock().unwrap().contains(&msg) {
            return Err(Error::Transport("message to delete not found".to_string()));
        }
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        restriction: Restriction,
        until: DateTime<Utc>,
    ) -> Result<()> {
        self.restricts
            .lock()
            .unwrap()
            .push((chat_id, user_id, restriction, until));
        self.lag().await;
        if *self.fail_restrict.lock().unwrap() {
            return Err(Error::Transport("not enough rights".to_string()));
        }
        Ok(())
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.sends.lock().unwrap().push((chat_id, html.to_string()));
        self.lag().await;
        if *self.fail_send.lock().unwrap() {
            return Err(Error::Transport("chat not found".to_string()));
        }
        let id = {
            let mut guard = self.next_id.lock().unwrap();
            let id = *guard;
            *guard += 1;
            id
        };
        self.sent_at.lock().unwrap().push(Instant::now());
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(id),
        })
    }

    async fn bot_rights(&self, _chat_id: ChatId) -> Result<BotRights> {
        let rights = *self.rights.lock().unwrap();
        rights.ok_or_else(|| Error::Transport("getChatMember failed".to_string()))
    }
}
