use joinwatch::alert::{AlertDispatcher, TelegramChannel};
use joinwatch::chain::WsBlockSource;
use joinwatch::config::Config;
use joinwatch::profile::{KosettoProfileApi, ProfileResolver, TwitterSocialApi};
use joinwatch::pump::BlockPump;
use joinwatch::supervisor::ConnectionSupervisor;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage.
    // Both the chain WebSocket and the HTTP clients need this.
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("failed to install rustls crypto provider");

    // Load .env if present
    let _ = dotenvy::dotenv();

    // Load config
    let config = if Path::new("joinwatch.toml").exists() {
        Config::load(Path::new("joinwatch.toml"))?
    } else {
        Config::from_env()
    };
    config.validate()?;

    // Initialize logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .init();
    }

    info!("joinwatch v{} starting", env!("CARGO_PKG_VERSION"));

    let internal_transfer = config.internal_transfer_address()?;
    info!(
        contract = %internal_transfer,
        threshold = config.alerts.follower_threshold,
        dry_run = config.alerts.dry_run,
        "watching for joins"
    );

    let source = Arc::new(WsBlockSource::connect(&config.chain.ws_url).await?);

    let resolver = ProfileResolver::new(
        Arc::new(KosettoProfileApi::new(config.profile.base_url.clone())),
        Arc::new(TwitterSocialApi::new(
            config.social.api_url.clone(),
            config.social.bearer_token.clone(),
        )),
        config.alerts.follower_threshold,
    );
    let dispatcher = AlertDispatcher::new(
        Arc::new(TelegramChannel::new(
            config.telegram.bot_token.clone(),
            config.telegram.chat_id.clone(),
        )),
        config.alerts.dry_run,
    );

    let pump = BlockPump::new(source.clone(), resolver, dispatcher, internal_transfer);
    let mut supervisor = ConnectionSupervisor::new(source, pump);

    // Only returns on the fatal liveness path; the non-zero exit hands
    // recovery to the external process supervisor.
    supervisor.run().await?;
    Ok(())
}
