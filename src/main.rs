//! # Rehab Center Backend
//!
//! Application entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database pool, Redis, object storage and the messaging bot
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use rehab_center::config::Settings;
use rehab_center::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    rehab_center::telemetry::init_tracing();

    info!("Starting rehab center backend...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
