//! Application setup and initialization

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use hlsgate_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_json())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = config.environment(),
        production = config.is_production(),
        "Configuration loaded and validated successfully"
    );

    tokio::fs::create_dir_all(config.uploads_dir())
        .await
        .with_context(|| {
            format!(
                "Failed to create uploads directory {}",
                config.uploads_dir().display()
            )
        })?;

    let state = Arc::new(AppState::new(config.clone()));
    if !state.transcoder.ffmpeg_available() {
        tracing::warn!(
            ffmpeg_path = state.transcoder.ffmpeg_path(),
            "ffmpeg not found; uploads will fail until it is installed"
        );
    }

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
