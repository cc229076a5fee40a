// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Transient loopback listener for the authorization callback.

mod common;

use classroom_gallery::config::Config;
use classroom_gallery::db::documents;
use classroom_gallery::services::{AuthPhase, DriveAuth, GoogleOAuthClient, LoopbackReceiver};
use common::FakeTokenEndpoint;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn loopback_auth(dir: &TempDir, port: u16) -> (Arc<DriveAuth>, Arc<FakeTokenEndpoint>) {
    let endpoint = Arc::new(FakeTokenEndpoint::default());
    let url = common::spawn_token_endpoint(endpoint.clone()).await;
    let config = Config::test_default(dir.path());

    let oauth = GoogleOAuthClient::new(
        common::test_credentials(&format!("http://127.0.0.1:{}/oauth2callback", port)),
        config.oauth_state_key.clone(),
    )
    .with_token_endpoint(url);

    let auth = DriveAuth::new(
        oauth,
        dir.path().join(documents::TOKEN),
        Arc::new(LoopbackReceiver::new(port)),
    );
    (auth, endpoint)
}

/// GET the callback URL, retrying until the listener is up.
async fn deliver(port: u16, query: &str) -> reqwest::StatusCode {
    let url = format!("http://127.0.0.1:{}/oauth2callback?{}", port, query);
    for _ in 0..50 {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .unwrap();
        match client.get(&url).send().await {
            Ok(response) => return response.status(),
            Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
    panic!("callback listener never came up on port {}", port);
}

async fn port_released(port: u16) -> bool {
    for _ in 0..50 {
        if tokio::net::TcpListener::bind(("127.0.0.1", port)).await.is_ok() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

#[tokio::test]
async fn test_single_callback_authorizes_and_releases_port() {
    let dir = TempDir::new().unwrap();
    let port = free_port();
    let (auth, endpoint) = loopback_auth(&dir, port).await;
    let state = common::state_param(&auth.oauth().authorization_url().unwrap());

    auth.begin_authorization();
    let status = deliver(port, &format!("code=good-code&state={}", state)).await;

    assert_eq!(status, reqwest::StatusCode::OK);
    tokio::time::timeout(
        Duration::from_secs(5),
        auth.subscribe().wait_for(|p| *p == AuthPhase::Ready),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(endpoint.exchanges.load(Ordering::SeqCst), 1);
    assert!(dir.path().join(documents::TOKEN).exists());
    assert!(port_released(port).await);
}

#[tokio::test]
async fn test_rejected_callback_reopens_listener() {
    let dir = TempDir::new().unwrap();
    let port = free_port();
    let (auth, endpoint) = loopback_auth(&dir, port).await;
    let state = common::state_param(&auth.oauth().authorization_url().unwrap());

    auth.begin_authorization();

    let status = deliver(port, "code=good-code&state=forged").await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert!(!auth.is_ready());

    let status = deliver(port, &format!("code=good-code&state={}", state)).await;
    assert_eq!(status, reqwest::StatusCode::OK);
    assert!(auth.is_ready());
    assert_eq!(endpoint.exchanges.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_listener_returns_after_refresh_token_revoked() {
    let dir = TempDir::new().unwrap();
    let port = free_port();
    let (auth, endpoint) = loopback_auth(&dir, port).await;

    auth.begin_authorization();
    let state = common::state_param(&auth.oauth().authorization_url().unwrap());
    assert_eq!(
        deliver(port, &format!("code=good-code&state={}", state)).await,
        reqwest::StatusCode::OK
    );
    assert!(auth.is_ready());

    // Token about to expire, and Google no longer honours the refresh token
    common::write_token(
        dir.path(),
        &classroom_gallery::models::StoredToken {
            access_token: "access-stale".to_string(),
            refresh_token: Some("refresh-from-code".to_string()),
            scope: None,
            token_type: Some("Bearer".to_string()),
            expiry_date: Some(chrono::Utc::now().timestamp_millis() + 60_000),
        },
    );
    assert!(auth.load_token().await);
    endpoint.reject_refresh.store(true, Ordering::SeqCst);
    assert!(auth.access_token().await.is_err());
    assert_eq!(auth.phase(), AuthPhase::AwaitingAuthorization);

    let state = common::state_param(&auth.oauth().authorization_url().unwrap());
    assert_eq!(
        deliver(port, &format!("code=good-code&state={}", state)).await,
        reqwest::StatusCode::OK
    );
    assert!(auth.is_ready());
    assert_eq!(endpoint.exchanges.load(Ordering::SeqCst), 2);
}
