use std::sync::Arc;

use linkguard_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), linkguard_core::Error> {
    linkguard_core::logging::init("linkguard")?;

    let cfg = Arc::new(Config::load()?);

    linkguard_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| linkguard_core::Error::Transport(format!("telegram bot failed: {e}")))?;

    Ok(())
}
