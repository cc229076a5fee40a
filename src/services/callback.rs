// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Receiving the OAuth authorization callback.
//!
//! Two receivers share one contract: accept a single authorization code,
//! hand it to [`DriveAuth::complete_authorization`], then stop receiving.
//! - [`LoopbackReceiver`] binds a transient listener on a fixed local port
//!   and tears it down after exactly one callback.
//! - [`RouteReceiver`] relies on the `/oauth2callback` route of the main
//!   service and returns once that route has made the bootstrapper ready.

use crate::error::AppError;
use crate::services::drive_auth::{AuthPhase, DriveAuth};
use axum::{
    extract::Query,
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

const SUCCESS_PAGE: &str = "<h1>Authorization complete</h1>\
     <p>Google Drive is connected. You can close this window and return to the site.</p>";

/// Validate one callback and run the code exchange.
///
/// Rejected callbacks answer with a freshly signed authorization link, so an
/// expired or mistyped link never leaves the server unauthorizable.
pub async fn handle_callback(
    auth: &DriveAuth,
    params: CallbackParams,
) -> (StatusCode, Html<String>) {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Authorization denied by Google");
        return (
            StatusCode::BAD_REQUEST,
            restart_page(auth, "Authorization was not granted."),
        );
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            restart_page(auth, "Authorization code not found."),
        );
    };

    if !params
        .state
        .as_deref()
        .is_some_and(|state| auth.oauth().verify_state(state))
    {
        tracing::warn!("Authorization callback with invalid state parameter");
        return (
            StatusCode::BAD_REQUEST,
            restart_page(auth, "Authorization link is invalid or expired."),
        );
    }

    match auth.complete_authorization(&code).await {
        Ok(()) => (StatusCode::OK, Html(SUCCESS_PAGE.to_string())),
        Err(e) => {
            tracing::error!(error = %e, "Token exchange failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                restart_page(auth, "An error occurred during authorization."),
            )
        }
    }
}

fn restart_page(auth: &DriveAuth, message: &str) -> Html<String> {
    match auth.log_authorization_url() {
        Some(url) => Html(format!(
            "<p>{}</p><p><a href=\"{}\">Start the authorization again</a></p>",
            message,
            url.replace('&', "&amp;")
        )),
        None => Html(format!("<p>{}</p>", message)),
    }
}

/// A mechanism that delivers one authorization callback.
#[async_trait::async_trait]
pub trait CallbackReceiver: Send + Sync {
    /// Receive a single callback for `auth`, then stop receiving.
    ///
    /// Returns `Ok` once a callback was handled, whatever its outcome;
    /// `auth.phase()` tells whether it succeeded.
    async fn receive_once(&self, auth: Arc<DriveAuth>) -> Result<(), AppError>;
}

/// Transient listener on a fixed local port.
pub struct LoopbackReceiver {
    port: u16,
}

impl LoopbackReceiver {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait::async_trait]
impl CallbackReceiver for LoopbackReceiver {
    async fn receive_once(&self, auth: Arc<DriveAuth>) -> Result<(), AppError> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to bind callback listener on {}: {}", addr, e))
        })?;

        let path = callback_path(&auth.oauth().credentials().redirect_uri);
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let done = Arc::new(std::sync::Mutex::new(Some(done_tx)));

        let app = Router::new().route(
            &path,
            get(move |Query(params): Query<CallbackParams>| {
                let auth = auth.clone();
                let done = done.clone();
                async move {
                    let response = handle_callback(&auth, params).await;
                    if let Some(tx) = done.lock().ok().and_then(|mut slot| slot.take()) {
                        let _ = tx.send(());
                    }
                    response
                }
            }),
        );

        tracing::info!(address = %addr, path = %path, "Waiting for authorization callback");

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                done_rx.await.ok();
            })
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Callback listener failed: {}", e)))?;

        tracing::info!(address = %addr, "Authorization callback listener closed");
        Ok(())
    }
}

/// Callback delivered to `/oauth2callback` on the main service.
pub struct RouteReceiver;

#[async_trait::async_trait]
impl CallbackReceiver for RouteReceiver {
    async fn receive_once(&self, auth: Arc<DriveAuth>) -> Result<(), AppError> {
        let mut phase = auth.subscribe();
        phase
            .wait_for(|p| *p == AuthPhase::Ready)
            .await
            .map(|_| ())
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Authorization state closed")))
    }
}

/// Path component of a redirect URI (`/` if it has none).
pub fn callback_path(redirect_uri: &str) -> String {
    reqwest::Url::parse(redirect_uri)
        .ok()
        .filter(|url| !url.cannot_be_a_base() && !url.path().is_empty())
        .map_or_else(|| "/".to_string(), |url| url.path().to_string())
}
