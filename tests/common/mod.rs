// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Form, Json, Router};
use bytes::Bytes;
use classroom_gallery::config::Config;
use classroom_gallery::db::documents;
use classroom_gallery::error::AppError;
use classroom_gallery::models::{AppCredentials, Student, StoredToken};
use classroom_gallery::routes::create_router;
use classroom_gallery::services::drive::{NewRemoteFile, RemoteFile, RemoteStorage};
use classroom_gallery::services::{DriveAuth, GoogleOAuthClient, RouteReceiver};
use classroom_gallery::AppState;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Remote storage double that records every call.
#[derive(Default)]
pub struct FakeStorage {
    pub creates: AtomicUsize,
    pub grants: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_grant: AtomicBool,
    pub created: Mutex<Vec<NewRemoteFile>>,
    /// Access tokens seen by `create`
    pub tokens: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeStorage {
    pub fn calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst) + self.grants.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStorage for FakeStorage {
    async fn create(
        &self,
        access_token: &str,
        metadata: &NewRemoteFile,
        _body: Bytes,
    ) -> Result<RemoteFile, AppError> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        self.tokens.lock().unwrap().push(access_token.to_string());
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::Drive("HTTP 500: backend error".to_string()));
        }
        self.created.lock().unwrap().push(metadata.clone());
        Ok(RemoteFile {
            id: format!("file-{}", n),
            name: metadata.name.clone(),
            thumbnail_link: Some(format!("https://lh3.googleusercontent.com/d/file-{}=s220", n)),
            web_view_link: None,
        })
    }

    async fn grant_public_read(&self, _access_token: &str, _file_id: &str) -> Result<(), AppError> {
        self.grants.fetch_add(1, Ordering::SeqCst);
        if self.fail_grant.load(Ordering::SeqCst) {
            return Err(AppError::Drive("HTTP 403 Forbidden: insufficientFilePermissions".to_string()));
        }
        Ok(())
    }
}

#[allow(dead_code)]
pub fn test_credentials(redirect_uri: &str) -> AppCredentials {
    AppCredentials {
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        redirect_uri: redirect_uri.to_string(),
    }
}

/// OAuth client signing state with the test config's key.
#[allow(dead_code)]
pub fn test_oauth(config: &Config) -> GoogleOAuthClient {
    GoogleOAuthClient::new(
        test_credentials("http://localhost:3000/oauth2callback"),
        config.oauth_state_key.clone(),
    )
}

#[allow(dead_code)]
pub fn write_token(dir: &Path, token: &StoredToken) {
    std::fs::write(
        dir.join(documents::TOKEN),
        serde_json::to_string_pretty(token).unwrap(),
    )
    .unwrap();
}

#[allow(dead_code)]
pub fn long_lived_token() -> StoredToken {
    StoredToken {
        access_token: "access-valid".to_string(),
        refresh_token: Some("refresh-1".to_string()),
        scope: Some("https://www.googleapis.com/auth/drive".to_string()),
        token_type: Some("Bearer".to_string()),
        expiry_date: Some(chrono::Utc::now().timestamp_millis() + 3_600_000),
    }
}

#[allow(dead_code)]
pub fn write_roster(dir: &Path, students: &[(&str, &str, &str)]) {
    let students: Vec<Student> = students
        .iter()
        .map(|(id, name, password)| Student {
            id: id.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            extra: Default::default(),
        })
        .collect();
    std::fs::write(
        dir.join(documents::STUDENTS),
        serde_json::to_string_pretty(&students).unwrap(),
    )
    .unwrap();
}

/// Test app over a temporary data directory.
#[allow(dead_code)]
pub struct TestApp {
    pub dir: TempDir,
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub storage: Arc<FakeStorage>,
}

/// App whose Drive authorization is either complete or still pending.
#[allow(dead_code)]
pub async fn create_test_app(ready: bool) -> TestApp {
    create_test_app_with(ready, None).await
}

/// Like [`create_test_app`], with the OAuth client talking to `token_endpoint`.
#[allow(dead_code)]
pub async fn create_test_app_with(ready: bool, token_endpoint: Option<String>) -> TestApp {
    let dir = TempDir::new().unwrap();
    let config = Config::test_default(dir.path());

    if ready {
        write_token(dir.path(), &long_lived_token());
    }

    let mut oauth = test_oauth(&config);
    if let Some(endpoint) = token_endpoint {
        oauth = oauth.with_token_endpoint(endpoint);
    }

    let auth = DriveAuth::new(
        oauth,
        dir.path().join(documents::TOKEN),
        Arc::new(RouteReceiver),
    );
    assert_eq!(auth.load_token().await, ready);

    let storage = Arc::new(FakeStorage::default());
    let state = Arc::new(AppState::new(config, auth, storage.clone()));

    TestApp {
        router: create_router(state.clone()),
        dir,
        state,
        storage,
    }
}

#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Session token as issued at login.
#[allow(dead_code)]
pub fn session_token(state: &AppState, id: &str, name: &str, admin: bool) -> String {
    classroom_gallery::middleware::auth::create_jwt(id, name, admin, &state.config.jwt_signing_key)
        .unwrap()
}

/// Scripted Google token endpoint.
#[derive(Default)]
pub struct FakeTokenEndpoint {
    pub exchanges: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub reject_refresh: AtomicBool,
}

/// Serve a fake token endpoint on an ephemeral port. Returns its URL.
#[allow(dead_code)]
pub async fn spawn_token_endpoint(endpoint: Arc<FakeTokenEndpoint>) -> String {
    async fn token(
        State(endpoint): State<Arc<FakeTokenEndpoint>>,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        match form.get("grant_type").map(String::as_str) {
            Some("authorization_code") if form.get("code").map(String::as_str) == Some("good-code") => {
                endpoint.exchanges.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::OK,
                    Json(serde_json::json!({
                        "access_token": "access-from-code",
                        "refresh_token": "refresh-from-code",
                        "expires_in": 3599,
                        "scope": "https://www.googleapis.com/auth/drive",
                        "token_type": "Bearer"
                    })),
                )
            }
            Some("refresh_token") => {
                endpoint.refreshes.fetch_add(1, Ordering::SeqCst);
                if endpoint.reject_refresh.load(Ordering::SeqCst) {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({
                            "error": "invalid_grant",
                            "error_description": "Token has been expired or revoked."
                        })),
                    );
                }
                (
                    StatusCode::OK,
                    Json(serde_json::json!({
                        "access_token": "access-refreshed",
                        "expires_in": 3599,
                        "token_type": "Bearer"
                    })),
                )
            }
            _ => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "invalid_request" })),
            ),
        }
    }

    let app = Router::new()
        .route("/token", post(token))
        .with_state(endpoint);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/token", addr)
}

/// `state` query value of an authorization URL.
#[allow(dead_code)]
pub fn state_param(authorization_url: &str) -> String {
    authorization_url
        .split(['?', '&'])
        .find_map(|pair| pair.strip_prefix("state="))
        .unwrap()
        .to_string()
}
