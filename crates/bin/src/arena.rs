//! Iron Arena - authoritative vehicular combat server.

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Iron Arena Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = server::Config::load()?;
    info!("Loaded configuration");
    info!("  Bind: {}:{}", config.server.bind, config.server.port);
    info!("  World: +/-{} (cell size {})", config.world.half_size, config.world.cell_size);
    info!("  Tick rate: {} Hz", config.server.tick_rate);
    info!("  Max bots: {}", config.bots.max_bots);

    // Start the game server
    server::run(config).await?;

    Ok(())
}
