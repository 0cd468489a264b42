//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::{Context, Result};
use helloworld_core::HelloworldConfig;
use std::sync::Arc;

/// Validate the configuration, wire every collaborator and build the router.
pub async fn initialize_app(config: HelloworldConfig) -> Result<(Arc<AppState>, axum::Router)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    tracing::info!(
        environment = %config.environment,
        database = config.database_url.is_some(),
        "Configuration loaded and validated successfully"
    );

    let state = services::initialize_services(config).await?;
    let router = routes::setup_routes(state.clone());

    Ok((state, router))
}
