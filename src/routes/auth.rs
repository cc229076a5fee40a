// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! OAuth authorization callback on the main service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::services::callback::{handle_callback, CallbackParams};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/oauth2callback", get(oauth_callback))
}

/// Complete the administrator's Drive authorization.
async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<String>) {
    if state.drive_auth.is_ready() {
        tracing::info!("Ignoring authorization callback: already authorized");
        return (
            StatusCode::CONFLICT,
            Html("Google Drive is already connected.".to_string()),
        );
    }

    handle_callback(&state.drive_auth, params).await
}
