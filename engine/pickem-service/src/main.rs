//! Pickem service entry point

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pickem_service::{
    build_service, create_routes, initialize_logging_with_config, load_config, Cli,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli).context("Failed to load configuration")?;
    initialize_logging_with_config(&config.logging.level, &config.logging.format)?;

    info!("Starting Pickem Service v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Season {} (current week {}, revealed week {}, final week {})",
        config.season.current_season,
        config.season.current_week,
        config.season.revealed_week,
        config.season.final_week
    );

    let service = build_service(&config).await?;
    let routes = create_routes(service);

    let addr = config.server.socket_addr()?;
    let (bound, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(addr, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received. Initiating graceful shutdown...");
        })
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Pickem Service listening on {}", bound);
    server.await;

    info!("Pickem Service shutdown complete");
    Ok(())
}
