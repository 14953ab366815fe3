//! Telegram update handlers.
//!
//! Known commands are answered directly; every other message that carries
//! text or a caption goes through the moderation pipeline.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;
mod moderation;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        if text.starts_with('/') && commands::handle_command(&msg, text, &state).await {
            return Ok(());
        }
    }

    moderation::moderate(&msg, &state).await;
    Ok(())
}
