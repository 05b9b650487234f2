//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application: the
//! client page, the static asset mount, and the WebSocket relay endpoint.

use crate::{handlers, state::AppState, ws::ws_handler};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let static_dir = app_state.config.static_dir.clone();
    Router::new()
        .route("/", get(handlers::index))
        .route("/ws", get(ws_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(app_state)
}
