use std::sync::Arc;

use tracing::warn;

use crate::{
    config::{AdminMode, Policy, RoleLookupFallback},
    domain::{ChatKind, MessageEvent},
    gateway::ChatGateway,
    url_matcher,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExemptReason {
    PrivateChat,
    BotSender,
    PrivilegedSender,
    NoUrl,
    WhitelistedDomain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationDecision {
    Exempt(ExemptReason),
    Violating,
}

impl ModerationDecision {
    pub fn is_violating(self) -> bool {
        matches!(self, ModerationDecision::Violating)
    }
}

/// Decide from the event and policy alone. First matching exemption wins.
pub fn resolve(event: &MessageEvent, policy: &Policy) -> ModerationDecision {
    if event.chat_kind == ChatKind::Private {
        return ModerationDecision::Exempt(ExemptReason::PrivateChat);
    }
    if policy.exempt_bot_senders && event.sender_is_bot {
        return ModerationDecision::Exempt(ExemptReason::BotSender);
    }
    if event.sender_id == policy.admin_id {
        return ModerationDecision::Exempt(ExemptReason::PrivilegedSender);
    }
    if !url_matcher::contains_url(event.text.as_deref()) {
        return ModerationDecision::Exempt(ExemptReason::NoUrl);
    }
    if mentions_whitelisted_domain(event.text(), &policy.whitelisted_domains) {
        return ModerationDecision::Exempt(ExemptReason::WhitelistedDomain);
    }
    ModerationDecision::Violating
}

fn mentions_whitelisted_domain(text: &str, domains: &[String]) -> bool {
    let haystack = text.to_lowercase();
    domains
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .any(|d| haystack.contains(&d.to_lowercase()))
}

/// Policy resolution including the optional live admin lookup.
pub struct PolicyResolver {
    policy: Arc<Policy>,
    gateway: Arc<dyn ChatGateway>,
}

impl PolicyResolver {
    pub fn new(policy: Arc<Policy>, gateway: Arc<dyn ChatGateway>) -> Self {
        Self { policy, gateway }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub async fn decide(&self, event: &MessageEvent) -> ModerationDecision {
        let decision = resolve(event, &self.policy);
        if !decision.is_violating() || self.policy.admin_mode == AdminMode::Single {
            return decision;
        }

        match self
            .gateway
            .member_role(event.chat_id, event.sender_id)
            .await
        {
            Ok(role) if role.is_privileged() => {
                ModerationDecision::Exempt(ExemptReason::PrivilegedSender)
            }
            Ok(_) => ModerationDecision::Violating,
            Err(e) => {
                warn!(
                    chat_id = event.chat_id.0,
                    user_id = event.sender_id.0,
                    fallback = ?self.policy.role_lookup_fallback,
                    "member role lookup failed: {e}"
                );
                match self.policy.role_lookup_fallback {
                    RoleLookupFallback::FailClosed => ModerationDecision::Violating,
                    RoleLookupFallback::FailOpen => {
                        ModerationDecision::Exempt(ExemptReason::PrivilegedSender)
                    }
                }
            }
        }
    }
}
