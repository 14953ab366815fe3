use std::time::Duration;

/// Core error type.
///
/// Adapter crates map their transport errors into this type so the moderation
/// pipeline can treat every failed platform call the same way.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("gateway call timed out after {0:?}")]
    Timeout(Duration),

    #[error("missing permission: {0}")]
    Permission(String),
}

pub type Result<T> = std::result::Result<T, Error>;
