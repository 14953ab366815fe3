use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::info;

use linkguard_core::{
    cleanup::CleanupScheduler,
    config::{AdminMode, Config},
    gateway::{ChatGateway, TimeoutGateway},
    pipeline::ModerationPipeline,
};

use crate::handlers;
use crate::TelegramGateway;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub gateway: Arc<dyn ChatGateway>,
    pub pipeline: Arc<ModerationPipeline>,
    pub bot_username: String,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    let me = bot.get_me().await?;
    let bot_username = me.username().to_string();
    info!("linkguard started: @{bot_username}");
    info!(
        admin_id = cfg.policy.admin_id.0,
        whitelisted = cfg.policy.whitelisted_domains.len(),
        live_admin_lookup = cfg.policy.admin_mode == AdminMode::Live,
        "moderation policy loaded"
    );

    // Every platform call in the moderation path is bounded; the adapter itself
    // only retries once on flood control.
    let raw_gateway: Arc<dyn ChatGateway> =
        Arc::new(TelegramGateway::new(bot.clone(), me.user.id));
    let gateway: Arc<dyn ChatGateway> =
        Arc::new(TimeoutGateway::new(raw_gateway, cfg.gateway_timeout));

    let cleanup = CleanupScheduler::new(gateway.clone());
    let policy = Arc::new(cfg.policy.clone());
    let pipeline = Arc::new(ModerationPipeline::new(
        policy,
        gateway.clone(),
        cleanup.clone(),
    ));

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        gateway,
        pipeline,
        bot_username,
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    cleanup.shutdown().await;
    info!("linkguard stopped");

    Ok(())
}
