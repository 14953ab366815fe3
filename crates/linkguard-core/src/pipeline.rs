//! Moderation pipeline: decide, then delete, restrict and warn.
//!
//! Remediation steps are independent. A failed step is logged with its chat,
//! message and operation and the next step still runs. Nothing is rolled back.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    cleanup::{CleanupScheduler, PendingCleanup},
    config::Policy,
    domain::{MessageEvent, MessageRef, Restriction},
    formatting::{format_duration, mention_html},
    gateway::ChatGateway,
    policy::{ModerationDecision, PolicyResolver},
};

/// What happened while handling one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemediationReport {
    pub decision: ModerationDecision,
    pub deleted: bool,
    pub restricted: bool,
    pub warning: Option<MessageRef>,
    pub cleanup_scheduled: bool,
}

impl RemediationReport {
    fn new(decision: ModerationDecision) -> Self {
        Self {
            decision,
            deleted: false,
            restricted: false,
            warning: None,
            cleanup_scheduled: false,
        }
    }
}

pub struct ModerationPipeline {
    resolver: PolicyResolver,
    gateway: Arc<dyn ChatGateway>,
    cleanup: CleanupScheduler,
}

impl ModerationPipeline {
    pub fn new(
        policy: Arc<Policy>,
        gateway: Arc<dyn ChatGateway>,
        cleanup: CleanupScheduler,
    ) -> Self {
        Self {
            resolver: PolicyResolver::new(policy, gateway.clone()),
            gateway,
            cleanup,
        }
    }

    pub fn policy(&self) -> &Policy {
        self.resolver.policy()
    }

    pub fn cleanup(&self) -> &CleanupScheduler {
        &self.cleanup
    }

    /// Restriction expiry and warning lifetime are measured from the moment
    /// each step actually runs, so slow platform calls never shorten them.
    pub async fn handle(&self, event: &MessageEvent) -> RemediationReport {
        let decision = self.resolver.decide(event).await;
        if let ModerationDecision::Exempt(reason) = decision {
            debug!(
                chat_id = event.chat_id.0,
                message_id = event.message_id.0,
                ?reason,
                "message exempt"
            );
            return RemediationReport::new(decision);
        }

        info!(
            chat_id = event.chat_id.0,
            message_id = event.message_id.0,
            user_id = event.sender_id.0,
            "link from non-privileged member, remediating"
        );

        let policy = self.resolver.policy();
        let mut report = RemediationReport::new(decision);

        report.deleted = match self.gateway.delete_message(event.message_ref()).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    chat_id = event.chat_id.0,
                    message_id = event.message_id.0,
                    op = "delete_message",
                    "failed to delete offending message: {e}"
                );
                false
            }
        };

        let until = expiry(Utc::now(), policy.restriction_duration);
        report.restricted = match self
            .gateway
            .restrict_member(
                event.chat_id,
                event.sender_id,
                Restriction::mute_all(),
                until,
            )
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    chat_id = event.chat_id.0,
                    message_id = event.message_id.0,
                    user_id = event.sender_id.0,
                    op = "restrict_member",
                    "failed to restrict sender: {e}"
                );
                false
            }
        };

        let html = warning_html(event, policy.restriction_duration);
        let warning = match self.gateway.send_html(event.chat_id, &html).await {
            Ok(msg) => msg,
            Err(e) => {
                warn!(
                    chat_id = event.chat_id.0,
                    message_id = event.message_id.0,
                    op = "send_warning",
                    "failed to send warning: {e}"
                );
                return report;
            }
        };
        let fire_at = Instant::now() + policy.warning_lifetime;
        report.warning = Some(warning);

        self.cleanup
            .schedule(PendingCleanup { warning, fire_at })
            .await;
        report.cleanup_scheduled = true;

        report
    }
}

fn expiry(now: DateTime<Utc>, after: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(after)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn warning_html(event: &MessageEvent, restriction: Duration) -> String {
    format!(
        "⚠️ {}, URLs are not allowed! (Restricted for {})",
        mention_html(event.sender_id, &event.sender_display_name),
        format_duration(restriction)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, ChatKind, MessageId, UserId};
    use crate::policy::ExemptReason;
    use crate::testing::FakeGateway;

    const CHAT: ChatId = ChatId(-100_123);

    fn spam(text: &str) -> MessageEvent {
        MessageEvent {
            chat_id: CHAT,
            chat_kind: ChatKind::Group,
            message_id: MessageId(5),
            sender_id: UserId(777),
            sender_is_bot: false,
            sender_display_name: "Mallory".to_string(),
            text: Some(text.to_string()),
        }
    }

    fn policy(restrict_secs: u64, warning_lifetime: Duration) -> Arc<Policy> {
        let mut p = Policy::new(UserId(1));
        p.whitelisted_domains = vec!["github.com".to_string()];
        p.restriction_duration = Duration::from_secs(restrict_secs);
        p.warning_lifetime = warning_lifetime;
        Arc::new(p)
    }

    fn pipeline(gw: &Arc<FakeGateway>, p: Arc<Policy>) -> ModerationPipeline {
        ModerationPipeline::new(p, gw.clone(), CleanupScheduler::new(gw.clone()))
    }

    fn original() -> MessageRef {
        MessageRef {
            chat_id: CHAT,
            message_id: MessageId(5),
        }
    }

    #[tokio::test]
    async fn violating_message_runs_full_remediation() {
        let gw = Arc::new(FakeGateway::new(42));
        let pl = pipeline(&gw, policy(3, Duration::from_secs(30)));
        let wall_before = Utc::now();
        let before = Instant::now();

        let report = pl.handle(&spam("buy now https://evil.com/x")).await;

        let wall_after = Utc::now();
        let after = Instant::now();

        assert_eq!(report.decision, ModerationDecision::Violating);
        assert!(report.deleted && report.restricted && report.cleanup_scheduled);

        assert_eq!(gw.deleted(), vec![original()]);

        let restricts = gw.restricts.lock().unwrap().clone();
        assert_eq!(restricts.len(), 1);
        let (chat, user, restriction, until) = restricts[0];
        assert_eq!((chat, user), (CHAT, UserId(777)));
        assert_eq!(restriction, Restriction::mute_all());
        assert!(until >= wall_before + chrono::Duration::seconds(3));
        assert!(until <= wall_after + chrono::Duration::seconds(3));

        let sends = gw.sends.lock().unwrap().clone();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, CHAT);
        assert!(sends[0].1.contains("tg://user?id=777"));
        assert!(sends[0].1.contains("URLs are not allowed"));
        assert!(sends[0].1.contains("Restricted for 3s"));

        let warning = MessageRef {
            chat_id: CHAT,
            message_id: MessageId(42),
        };
        assert_eq!(report.warning, Some(warning));
        let pending = pl.cleanup().pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].warning, warning);
        assert!(pending[0].fire_at >= before + Duration::from_secs(30));
        assert!(pending[0].fire_at <= after + Duration::from_secs(30));
    }

    #[tokio::test]
    async fn slow_calls_do_not_shorten_restriction_or_warning() {
        let gw = Arc::new(FakeGateway::new(42));
        *gw.delay.lock().unwrap() = Duration::from_millis(60);
        let pl = pipeline(&gw, policy(3, Duration::from_millis(100)));
        let wall_before = Utc::now();

        pl.handle(&spam("https://evil.com")).await;

        // The delete ran first and took 60ms, so the expiry starts after it.
        let (_, _, _, until) = gw.restricts.lock().unwrap()[0];
        assert!(until >= wall_before + chrono::Duration::milliseconds(3_060));

        let sent_at = gw.sent_at.lock().unwrap()[0];
        let pending = pl.cleanup().pending().await;
        assert!(pending[0].fire_at >= sent_at + Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(400)).await;

        let deletes = gw.deletes.lock().unwrap().clone();
        assert_eq!(deletes.len(), 2);
        let (removed, removed_at) = deletes[1];
        assert_eq!(removed.message_id, MessageId(42));
        assert!(removed_at >= sent_at + Duration::from_millis(100));
    }

    #[tokio::test]
    async fn exempt_messages_touch_nothing() {
        let gw = Arc::new(FakeGateway::new(42));
        let pl = pipeline(&gw, policy(3, Duration::from_secs(30)));

        let report = pl.handle(&spam("see https://github.com/rust-lang")).await;
        assert_eq!(
            report.decision,
            ModerationDecision::Exempt(ExemptReason::WhitelistedDomain)
        );

        let report = pl.handle(&spam("just chatting")).await;
        assert_eq!(report.decision, ModerationDecision::Exempt(ExemptReason::NoUrl));

        assert!(gw.deletes.lock().unwrap().is_empty());
        assert!(gw.restricts.lock().unwrap().is_empty());
        assert!(gw.sends.lock().unwrap().is_empty());
        assert!(pl.cleanup().is_empty().await);
    }

    #[tokio::test]
    async fn failed_delete_does_not_stop_restrict_or_warning() {
        let gw = Arc::new(FakeGateway::new(42));
        gw.fail_deletes.lock().unwrap().insert(original());
        let pl = pipeline(&gw, policy(3, Duration::from_secs(30)));

        let report = pl.handle(&spam("www.spam.example")).await;

        assert!(!report.deleted);
        assert!(report.restricted);
        assert!(report.cleanup_scheduled);
        assert_eq!(gw.restricts.lock().unwrap().len(), 1);
        assert_eq!(gw.sends.lock().unwrap().len(), 1);
        assert_eq!(pl.cleanup().len().await, 1);
    }

    #[tokio::test]
    async fn failed_restrict_still_warns() {
        let gw = Arc::new(FakeGateway::new(42));
        *gw.fail_restrict.lock().unwrap() = true;
        let pl = pipeline(&gw, policy(3, Duration::from_secs(30)));

        let report = pl.handle(&spam("cheap.xyz")).await;

        assert!(report.deleted);
        assert!(!report.restricted);
        assert!(report.cleanup_scheduled);
        assert_eq!(pl.cleanup().len().await, 1);
    }

    #[tokio::test]
    async fn failed_warning_schedules_no_cleanup() {
        let gw = Arc::new(FakeGateway::new(42));
        *gw.fail_send.lock().unwrap() = true;
        let pl = pipeline(&gw, policy(3, Duration::from_secs(30)));

        let report = pl.handle(&spam("https://evil.com")).await;

        assert!(report.deleted && report.restricted);
        assert_eq!(report.warning, None);
        assert!(!report.cleanup_scheduled);
        assert!(pl.cleanup().is_empty().await);
    }

    #[tokio::test]
    async fn warning_is_removed_after_its_lifetime() {
        let gw = Arc::new(FakeGateway::new(42));
        let pl = pipeline(&gw, policy(3, Duration::from_millis(40)));

        pl.handle(&spam("https://evil.com")).await;
        tokio::time::sleep(Duration::from_millis(200)).await;

        let warning = MessageRef {
            chat_id: CHAT,
            message_id: MessageId(42),
        };
        assert_eq!(gw.deleted(), vec![original(), warning]);
        assert!(pl.cleanup().is_empty().await);
    }
}
