// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Drive authorization lifecycle.
//!
//! `DriveAuth` owns the single Drive token of the process:
//! - Loads app credentials at startup (fatal if missing or malformed)
//! - Loads the cached token, or waits for the operator to authorize
//! - Exchanges authorization codes delivered by a [`CallbackReceiver`]
//! - Refreshes the access token shortly before it expires
//! - Falls back to re-authorization when Google rejects the refresh token

use crate::db::{documents, JsonDocument, StoreError};
use crate::error::AppError;
use crate::models::{AppCredentials, StoredToken};
use crate::services::callback::CallbackReceiver;
use crate::services::google_oauth::GoogleOAuthClient;
use chrono::{Duration, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Pause between attempts when a receiver fails to start (e.g. port in use).
const RECEIVER_RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(5);

/// Where the bootstrapper is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// No usable token; uploads are refused.
    AwaitingAuthorization,
    /// A token is available.
    Ready,
}

/// Startup failures. All of them abort the process.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Cannot read app credentials {path}: {source}")]
    CredentialsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed app credentials {path}: {source}")]
    CredentialsMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load `oauth_credentials.json`.
pub async fn load_app_credentials(path: &Path) -> Result<AppCredentials, BootstrapError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BootstrapError::CredentialsUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

    AppCredentials::from_json(&raw).map_err(|source| BootstrapError::CredentialsMalformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Owner of the process-wide Drive token.
pub struct DriveAuth {
    oauth: GoogleOAuthClient,
    token_doc: JsonDocument<StoredToken>,
    token: RwLock<Option<StoredToken>>,
    /// Serializes refreshes so concurrent requests trigger at most one.
    refresh_lock: Mutex<()>,
    phase: watch::Sender<AuthPhase>,
    receiver: Arc<dyn CallbackReceiver>,
    receiving: AtomicBool,
}

impl DriveAuth {
    /// Create an unauthorized instance. Call [`DriveAuth::load_token`] next.
    pub fn new(
        oauth: GoogleOAuthClient,
        token_path: impl Into<PathBuf>,
        receiver: Arc<dyn CallbackReceiver>,
    ) -> Arc<Self> {
        let (phase, _) = watch::channel(AuthPhase::AwaitingAuthorization);
        Arc::new(Self {
            oauth,
            token_doc: JsonDocument::new(token_path),
            token: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            phase,
            receiver,
            receiving: AtomicBool::new(false),
        })
    }

    /// Load credentials and any cached token from `data_dir`.
    ///
    /// If no token could be loaded the authorization flow is started.
    pub async fn bootstrap(
        data_dir: &Path,
        state_key: Vec<u8>,
        receiver: Arc<dyn CallbackReceiver>,
    ) -> Result<Arc<Self>, BootstrapError> {
        let credentials =
            load_app_credentials(&data_dir.join(documents::APP_CREDENTIALS)).await?;
        tracing::info!(client_id = %credentials.client_id, "Loaded Google app credentials");

        let auth = Self::new(
            GoogleOAuthClient::new(credentials, state_key),
            data_dir.join(documents::TOKEN),
            receiver,
        );

        if !auth.load_token().await {
            auth.begin_authorization();
        }
        Ok(auth)
    }

    /// Load the cached token. Returns whether the instance is now ready.
    pub async fn load_token(&self) -> bool {
        match self.token_doc.read().await {
            Ok(token) => {
                tracing::info!(
                    path = %self.token_doc.path().display(),
                    "Loaded cached Drive token"
                );
                self.set_token(token).await;
                true
            }
            Err(StoreError::Missing { .. }) => {
                tracing::info!("No cached Drive token; administrator authorization required");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cached Drive token unusable; administrator authorization required");
                false
            }
        }
    }

    pub fn phase(&self) -> AuthPhase {
        *self.phase.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == AuthPhase::Ready
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<AuthPhase> {
        self.phase.subscribe()
    }

    pub fn oauth(&self) -> &GoogleOAuthClient {
        &self.oauth
    }

    /// Log the authorization URL and start receiving a callback, unless a
    /// receiver is already running.
    pub fn begin_authorization(self: &Arc<Self>) {
        self.log_authorization_url();

        if self.receiving.swap(true, Ordering::SeqCst) {
            return;
        }

        let auth = self.clone();
        tokio::spawn(async move {
            loop {
                while !auth.is_ready() {
                    if let Err(e) = auth.receiver.receive_once(auth.clone()).await {
                        tracing::warn!(error = %e, "Authorization callback receiver failed, retrying");
                        tokio::time::sleep(RECEIVER_RETRY_DELAY).await;
                    }
                }
                auth.receiving.store(false, Ordering::SeqCst);

                // A re-authorization that ran before the flag was cleared saw
                // this loop as still running; keep receiving on its behalf.
                if auth.is_ready() || auth.receiving.swap(true, Ordering::SeqCst) {
                    break;
                }
            }
        });
    }

    /// Sign a fresh authorization URL and log it for the administrator.
    pub fn log_authorization_url(&self) -> Option<String> {
        match self.oauth.authorization_url() {
            Ok(url) => {
                tracing::warn!(
                    url = %url,
                    "Drive is not authorized. Open this URL in a browser to authorize the server"
                );
                Some(url)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build authorization URL");
                None
            }
        }
    }

    /// Exchange an authorization code, persist the token and become ready.
    ///
    /// On failure the phase is left unchanged.
    pub async fn complete_authorization(&self, code: &str) -> Result<(), AppError> {
        tracing::info!("Exchanging authorization code for Drive token");
        let token = self.oauth.exchange_code(code).await?;

        if token.refresh_token.is_none() {
            tracing::warn!("Google returned no refresh token; re-authorization will be needed when it expires");
        }

        self.token_doc.write(&token).await?;
        self.set_token(token).await;
        tracing::info!("Drive token stored, uploads enabled");
        Ok(())
    }

    /// Get a valid access token, refreshing it first if it is about to expire.
    pub async fn access_token(self: &Arc<Self>) -> Result<String, AppError> {
        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);

        // Fast path: cached token still valid
        if let Some(token) = self.current_valid(margin).await? {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we were waiting
        if let Some(token) = self.current_valid(margin).await? {
            return Ok(token);
        }

        let refresh_token = {
            let current = self.token.read().await;
            current.as_ref().and_then(|t| t.refresh_token.clone())
        };
        let Some(refresh_token) = refresh_token else {
            tracing::warn!("Drive access token expired and no refresh token is stored");
            self.reauthorize().await;
            return Err(not_ready());
        };

        tracing::info!("Drive access token expiring, refreshing");
        let refreshed = match self.oauth.refresh(&refresh_token).await {
            Ok(token) => token,
            Err(e) if e.is_invalid_grant() => {
                tracing::warn!(error = %e, "Refresh token rejected, re-authorization required");
                self.reauthorize().await;
                return Err(not_ready());
            }
            Err(e) => return Err(e),
        };

        self.token_doc.write(&refreshed).await?;
        let access_token = refreshed.access_token.clone();
        *self.token.write().await = Some(refreshed);

        tracing::info!("Drive token refreshed and stored");
        Ok(access_token)
    }

    /// Cached access token if ready and not within `margin` of expiry.
    async fn current_valid(&self, margin: Duration) -> Result<Option<String>, AppError> {
        let current = self.token.read().await;
        let token = current.as_ref().ok_or_else(not_ready)?;
        match token.expires_at() {
            Some(expires_at) if Utc::now() + margin >= expires_at => Ok(None),
            // Unknown expiry: use it until the provider says otherwise
            _ => Ok(Some(token.access_token.clone())),
        }
    }

    async fn set_token(&self, token: StoredToken) {
        *self.token.write().await = Some(token);
        self.phase.send_replace(AuthPhase::Ready);
    }

    /// Drop the token and go back to waiting for the operator.
    async fn revoke(&self) {
        *self.token.write().await = None;
        self.phase.send_replace(AuthPhase::AwaitingAuthorization);
        if let Err(e) = self.token_doc.remove().await {
            tracing::warn!(error = %e, "Failed to remove stale token document");
        }
    }

    /// Drop the token and restart the authorization flow.
    async fn reauthorize(self: &Arc<Self>) {
        self.revoke().await;
        self.begin_authorization();
    }
}

fn not_ready() -> AppError {
    AppError::ServiceUnavailable(
        "Server is not connected to Google Drive yet. Please try again later.".to_string(),
    )
}
