//! HTTP Handlers
//!
//! The only HTTP surface besides the WebSocket is the client page; the rest
//! of the client assets are served directly from the static mount.

use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

/// Serves the client page from the configured static directory.
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let path = state.config.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page).into_response(),
        Err(err) => {
            error!(path = %path.display(), error = %err, "Failed to read client page");
            (StatusCode::NOT_FOUND, "client page not found").into_response()
        }
    }
}
