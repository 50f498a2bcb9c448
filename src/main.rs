mod commands;
mod config;
mod filter;
mod forwarder;
mod gotify;
mod names;
mod platform;
mod template;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::forwarder::Forwarder;
use crate::gotify::GotifyClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gotify_forwarder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Gotify server: {}", config.server());
    info!("  Monitored users: {:?}", config.monitored_users);
    info!("  Keyword filter: {}", config.filter_keywords.enable_filter);

    // One HTTP client for the whole process
    let client = Arc::new(GotifyClient::from_config(&config));
    let bot_token = config.telegram.bot_token.clone();
    let forwarder = Arc::new(Forwarder::new(config, client));

    info!("Bot is starting...");
    let result = platform::telegram::run(forwarder.clone(), &bot_token).await;

    forwarder.shutdown().await;
    result
}
