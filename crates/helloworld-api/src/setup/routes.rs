//! Route configuration and setup

use crate::constants::{CANCEL_PATH, FORM_PATH, HEALTH_PATH, SUBMIT_PATH, TOKEN_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Multipart framing and text fields on top of the file part
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn setup_routes(state: Arc<AppState>) -> Router {
    let body_limit = state
        .config
        .upload_max_bytes
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route(SUBMIT_PATH, post(handlers::submission::submit))
        .route(FORM_PATH, get(handlers::submission::form_state))
        .route(TOKEN_PATH, get(handlers::submission::issue_token))
        .route(CANCEL_PATH, post(handlers::submission::cancel))
        .route(HEALTH_PATH, get(handlers::health::health_check))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
}
