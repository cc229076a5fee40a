// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Classroom gallery server.
//!
//! Aborts at startup if the Google app credentials are missing or malformed.
//! Without a cached token the server still starts, logs the authorization
//! URL and refuses uploads until the administrator completes the flow.

use classroom_gallery::{
    config::{CallbackMode, Config},
    services::{CallbackReceiver, DriveAuth, DriveClient, LoopbackReceiver, RouteReceiver},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        classes = ?config.folders.classes().collect::<Vec<_>>(),
        "Starting classroom gallery"
    );

    let receiver: Arc<dyn CallbackReceiver> = match config.callback_mode {
        CallbackMode::Route => Arc::new(RouteReceiver),
        CallbackMode::Loopback { port } => Arc::new(LoopbackReceiver::new(port)),
    };

    let drive_auth = DriveAuth::bootstrap(
        &config.data_dir,
        config.oauth_state_key.clone(),
        receiver,
    )
    .await
    .inspect_err(|e| tracing::error!(error = %e, "Drive authorization bootstrap failed"))?;

    // Build shared state
    let state = Arc::new(AppState::new(
        config.clone(),
        drive_auth,
        Arc::new(DriveClient::new()),
    ));

    // Build router
    let app = classroom_gallery::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("classroom_gallery=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
