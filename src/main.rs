use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use cinesky::routes::AppState;
use cinesky::{CineSkyConfig, cache, refresh, web};

fn init_tracing(config: &CineSkyConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = CineSkyConfig::load().context("Failed to load configuration")?;

    init_tracing(&config);
    tracing::info!("CineSky {} starting", cinesky::VERSION);

    let cache_dir = config.cache_dir();
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
    cache::init(&cache_dir).context("Failed to open cache database")?;

    let state = AppState::new(config)?;

    refresh::spawn(state.api.clone(), state.config.clone());

    web::run(state).await
}
