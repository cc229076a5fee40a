// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Google OAuth2 client for the administrator's Drive authorization.
//!
//! Handles:
//! - Authorization URL construction (offline access, Drive scope)
//! - Signed `state` parameter for the callback
//! - Authorization code exchange
//! - Access token refresh

use crate::error::AppError;
use crate::models::{AppCredentials, StoredToken};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Full read/write access to the administrator's Drive.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// How long an authorization URL's `state` stays acceptable.
const STATE_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// Google OAuth client bound to one set of app credentials.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    credentials: AppCredentials,
    auth_endpoint: String,
    token_endpoint: String,
    state_key: Vec<u8>,
}

impl GoogleOAuthClient {
    pub fn new(credentials: AppCredentials, state_key: Vec<u8>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            auth_endpoint: AUTH_ENDPOINT.to_string(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            state_key,
        }
    }

    /// Point the client at a different token endpoint (local fakes in tests).
    pub fn with_token_endpoint(mut self, token_endpoint: impl Into<String>) -> Self {
        self.token_endpoint = token_endpoint.into();
        self
    }

    pub fn credentials(&self) -> &AppCredentials {
        &self.credentials
    }

    /// Build the URL the operator opens to grant Drive access.
    pub fn authorization_url(&self) -> Result<String, AppError> {
        let state = sign_state(Utc::now(), &self.state_key)?;

        Ok(format!(
            "{}?\
             access_type=offline&\
             prompt=consent&\
             response_type=code&\
             scope={}&\
             client_id={}&\
             redirect_uri={}&\
             state={}",
            self.auth_endpoint,
            urlencoding::encode(DRIVE_SCOPE),
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&self.credentials.redirect_uri),
            state
        ))
    }

    /// Check a `state` value returned on the callback.
    pub fn verify_state(&self, state: &str) -> bool {
        verify_state(state, &self.state_key, Utc::now())
    }

    /// Exchange an authorization code for a token.
    pub async fn exchange_code(&self, code: &str) -> Result<StoredToken, AppError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("code", code),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Drive(format!("Token exchange request failed: {}", e)))?;

        let token: TokenResponse = check_token_response(response).await?;
        Ok(token.into_stored(None, Utc::now()))
    }

    /// Refresh an access token. Google usually omits a new refresh token,
    /// in which case the current one is kept.
    pub async fn refresh(&self, refresh_token: &str) -> Result<StoredToken, AppError> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("refresh_token", refresh_token),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Drive(format!("Token refresh request failed: {}", e)))?;

        let token: TokenResponse = check_token_response(response).await?;
        Ok(token.into_stored(Some(refresh_token), Utc::now()))
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_stored(self, previous_refresh: Option<&str>, now: DateTime<Utc>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            scope: self.scope,
            token_type: self.token_type,
            expiry_date: self
                .expires_in
                .map(|secs| (now + chrono::Duration::seconds(secs)).timestamp_millis()),
        }
    }
}

/// Error body from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

async fn check_token_response(response: reqwest::Response) -> Result<TokenResponse, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<TokenErrorResponse>(&body)
            .map(|e| match e.error_description {
                Some(desc) => format!("{}: {}", e.error, desc),
                None => e.error,
            })
            .unwrap_or(body);
        tracing::error!(status = %status, reason = %reason, "Google token endpoint rejected request");
        return Err(AppError::Drive(format!("HTTP {}: {}", status, reason)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Drive(format!("Failed to parse token response: {}", e)))
}

/// Encode `timestamp_hex|signature_hex` as URL-safe base64.
fn sign_state(now: DateTime<Utc>, key: &[u8]) -> Result<String, AppError> {
    let payload = format!("{:x}", now.timestamp());

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

fn verify_state(state: &str, key: &[u8], now: DateTime<Utc>) -> bool {
    let Some(state_str) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    let Some((payload, signature_hex)) = state_str.split_once('|') else {
        return false;
    };
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(payload.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    match i64::from_str_radix(payload, 16) {
        Ok(issued) => (0..=STATE_MAX_AGE_SECS).contains(&(now.timestamp() - issued)),
        Err(_) => false,
    }
}
