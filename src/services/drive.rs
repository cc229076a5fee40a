// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Google Drive v3 client.
//!
//! Only the two calls the upload pipeline needs:
//! - `files.create` as a multipart upload into a folder
//! - `permissions.create` granting anyone-with-link read access

use crate::error::AppError;
use bytes::Bytes;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};

/// Fields requested from `files.create`.
const CREATE_FIELDS: &str = "id,name,webViewLink,thumbnailLink";

/// Metadata of an object to create.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRemoteFile {
    pub name: String,
    pub parents: Vec<String>,
    pub mime_type: String,
}

/// What Drive returns for a created file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub thumbnail_link: Option<String>,
    #[serde(default)]
    pub web_view_link: Option<String>,
}

/// Remote object storage used by the upload pipeline.
#[async_trait::async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Create an object with `body` as its content.
    async fn create(
        &self,
        access_token: &str,
        metadata: &NewRemoteFile,
        body: Bytes,
    ) -> Result<RemoteFile, AppError>;

    /// Let anyone with the link view the object.
    async fn grant_public_read(&self, access_token: &str, file_id: &str) -> Result<(), AppError>;
}

/// Drive REST client.
#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    api_url: String,
    upload_url: String,
}

impl Default for DriveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveClient {
    pub fn new() -> Self {
        Self::with_base_urls(
            "https://www.googleapis.com/drive/v3",
            "https://www.googleapis.com/upload/drive/v3",
        )
    }

    pub fn with_base_urls(api_url: impl Into<String>, upload_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            upload_url: upload_url.into(),
        }
    }

    /// Check response status and return error if not successful.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Drive(format!("HTTP {}: {}", status, body)))
    }
}

#[async_trait::async_trait]
impl RemoteStorage for DriveClient {
    async fn create(
        &self,
        access_token: &str,
        metadata: &NewRemoteFile,
        body: Bytes,
    ) -> Result<RemoteFile, AppError> {
        let boundary = format!("gallery-{:016x}", OsRng.next_u64());
        let payload = multipart_related_body(&boundary, metadata, &body)?;

        let response = self
            .http
            .post(format!("{}/files", self.upload_url))
            .bearer_auth(access_token)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", CREATE_FIELDS),
                ("supportsAllDrives", "true"),
            ])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(payload)
            .send()
            .await
            .map_err(|e| AppError::Drive(format!("File create request failed: {}", e)))?;

        Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Drive(format!("JSON parse error: {}", e)))
    }

    async fn grant_public_read(&self, access_token: &str, file_id: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!(
                "{}/files/{}/permissions",
                self.api_url,
                urlencoding::encode(file_id)
            ))
            .bearer_auth(access_token)
            .query(&[("supportsAllDrives", "true")])
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| AppError::Drive(format!("Permission request failed: {}", e)))?;

        Self::check_response(response).await?;
        Ok(())
    }
}

/// Build a `multipart/related` body: JSON metadata part, then the media part.
fn multipart_related_body(
    boundary: &str,
    metadata: &NewRemoteFile,
    body: &[u8],
) -> Result<Vec<u8>, AppError> {
    let metadata_json = serde_json::to_string(metadata)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode metadata: {}", e)))?;

    let mut payload = Vec::with_capacity(body.len() + metadata_json.len() + 256);
    payload.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n\
             --{b}\r\nContent-Type: {t}\r\n\r\n",
            b = boundary,
            m = metadata_json,
            t = metadata.mime_type
        )
        .as_bytes(),
    );
    payload.extend_from_slice(body);
    payload.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    Ok(payload)
}
