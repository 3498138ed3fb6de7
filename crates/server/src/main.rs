//! blobd — authoritative blob game server.

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

    info!("blobd v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration. World state is in-memory only; a restart
    // starts from an empty world by design.
    let config = server::Config::load()?;
    info!("Loaded configuration");
    info!("  Port: {}", config.server.port);
    info!("  World: {}x{}", config.world.width, config.world.height);
    info!("  Tick interval: {}ms", config.server.tick_interval_ms);

    server::run(config).await?;

    Ok(())
}
