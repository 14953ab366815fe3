use std::{env, fs, path::Path, time::Duration};

use crate::{domain::UserId, errors::Error, Result};

const DEFAULT_RESTRICT_SECONDS: u64 = 3;
const DEFAULT_WARNING_LIFETIME_SECONDS: u64 = 5;
const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CREATOR_CHANNEL: &str = "https://t.me/Termux_Team_BD";

/// How privileged senders are recognized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminMode {
    /// Only the configured `admin_id` bypasses moderation.
    Single,
    /// `admin_id` plus a live member-role lookup for every would-be violation.
    Live,
}

/// What a failed role lookup means in [`AdminMode::Live`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleLookupFallback {
    /// Treat the sender as a regular member and moderate.
    FailClosed,
    /// Treat the sender as privileged and let the message through.
    FailOpen,
}

/// Moderation policy. Built once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Policy {
    pub admin_id: UserId,
    /// Lowercased, trimmed, non-empty domain fragments.
    pub whitelisted_domains: Vec<String>,
    pub restriction_duration: Duration,
    pub warning_lifetime: Duration,
    pub admin_mode: AdminMode,
    pub exempt_bot_senders: bool,
    pub role_lookup_fallback: RoleLookupFallback,
}

impl Policy {
    /// Policy with the stock durations and no whitelist.
    pub fn new(admin_id: UserId) -> Self {
        Self {
            admin_id,
            whitelisted_domains: Vec::new(),
            restriction_duration: Duration::from_secs(DEFAULT_RESTRICT_SECONDS),
            warning_lifetime: Duration::from_secs(DEFAULT_WARNING_LIFETIME_SECONDS),
            admin_mode: AdminMode::Single,
            exempt_bot_senders: true,
            role_lookup_fallback: RoleLookupFallback::FailClosed,
        }
    }
}

/// Typed process configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub policy: Policy,
    pub gateway_timeout: Duration,
    pub creator_channel: String,
}

impl Config {
    /// Load from the process environment, after merging a local `.env` file.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("BOT_TOKEN").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_TOKEN environment variable is required".to_string())
        })?;

        let admin_raw = lookup("ADMIN_ID").and_then(non_empty).ok_or_else(|| {
            Error::Config("ADMIN_ID environment variable is required".to_string())
        })?;
        let admin_id = admin_raw
            .trim()
            .parse::<i64>()
            .map(UserId)
            .map_err(|_| {
                Error::Config(format!("ADMIN_ID must be a numeric user id: {admin_raw}"))
            })?;

        let whitelisted_domains = parse_csv_lower(lookup("WHITELIST"));

        let restriction_duration = Duration::from_secs(
            parse_opt::<u64>(&lookup, "RESTRICT_SECONDS")?.unwrap_or(DEFAULT_RESTRICT_SECONDS),
        );
        let warning_lifetime = Duration::from_secs(
            parse_opt::<u64>(&lookup, "WARNING_LIFETIME_SECONDS")?
                .unwrap_or(DEFAULT_WARNING_LIFETIME_SECONDS),
        );
        let gateway_timeout = Duration::from_millis(
            parse_opt::<u64>(&lookup, "GATEWAY_TIMEOUT_MS")?.unwrap_or(DEFAULT_GATEWAY_TIMEOUT_MS),
        );
        if gateway_timeout.is_zero() {
            return Err(Error::Config("GATEWAY_TIMEOUT_MS must be > 0".to_string()));
        }

        let admin_mode = match lookup("ADMIN_MODE")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("single") => AdminMode::Single,
            Some("live") => AdminMode::Live,
            Some(other) => {
                return Err(Error::Config(format!(
                    "ADMIN_MODE must be 'single' or 'live', got '{other}'"
                )))
            }
        };

        let role_lookup_fallback = match lookup("ROLE_LOOKUP_FALLBACK")
            .map(|s| s.trim().to_lowercase())
            .as_deref()
        {
            None | Some("") | Some("fail_closed") => RoleLookupFallback::FailClosed,
            Some("fail_open") => RoleLookupFallback::FailOpen,
            Some(other) => {
                return Err(Error::Config(format!(
                    "ROLE_LOOKUP_FALLBACK must be 'fail_closed' or 'fail_open', got '{other}'"
                )))
            }
        };

        let exempt_bot_senders = lookup("EXEMPT_BOT_SENDERS")
            .map(|s| parse_bool(&s))
            .unwrap_or(true);

        let creator_channel = lookup("CREATOR_CHANNEL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_CREATOR_CHANNEL.to_string());

        Ok(Self {
            bot_token,
            policy: Policy {
                admin_id,
                whitelisted_domains,
                restriction_duration,
                warning_lifetime,
                admin_mode,
                exempt_bot_senders,
                role_lookup_fallback,
            },
            gateway_timeout,
            creator_channel,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn parse_opt<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} is not a valid number: {raw}")))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_csv_lower(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
