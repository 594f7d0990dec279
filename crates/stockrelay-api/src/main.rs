//! Stock Relay service entry point.

use std::error::Error;

use stockrelay_api::{app, config, logging};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _log_guard = logging::init(&config::log_dir_from_env())?;

    tracing::info!("Starting Stock Relay service");

    let config = config::AppConfig::from_env()
        .inspect_err(|e| tracing::error!(error = %e, "Failed to load config"))?;

    app::run(config)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Stock Relay service failed"))?;

    Ok(())
}
