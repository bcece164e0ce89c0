//! # CloudQuest
//!
//! Entry point for the headless CloudQuest runner.
//!
//! Usage: `cloudquest [CONFIG_PATH]`. Without a path the platform config
//! directory is used; a missing file means defaults.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use cloudquest_engine::EngineConfig;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };

    // Initialize tracing
    let json = config.log_json.then(|| fmt::layer().json());
    let plain = (!config.log_json).then(fmt::layer);
    tracing_subscriber::registry()
        .with(json)
        .with(plain)
        .with(EnvFilter::from_default_env().add_directive("cloudquest=info".parse()?))
        .init();

    info!("CloudQuest starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let summary = cloudquest_engine::run(&config)?;
    info!("Summary: {}", serde_json::to_string(&summary)?);

    info!("CloudQuest shutdown complete");
    Ok(())
}
