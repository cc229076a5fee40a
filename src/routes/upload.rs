// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Image upload endpoint.

use crate::error::{AppError, Result};
use crate::models::UploadRecord;
use crate::services::{UploadSubmission, UploadedFile};
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Multipart field carrying the file.
const FILE_FIELD: &str = "image";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/upload", post(upload))
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub upload: UploadRecord,
}

/// Accept one image and forward it to the class folder on Drive.
async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    // Refuse before reading the body.
    state.upload_service.ensure_ready()?;

    let submission = read_submission(multipart).await?;
    let upload = state.upload_service.submit(submission).await?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        upload,
    }))
}

async fn read_submission(mut multipart: Multipart) -> Result<UploadSubmission> {
    let mut submission = UploadSubmission::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            FILE_FIELD => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
                let data = field.bytes().await.map_err(malformed)?;
                submission.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            "studentId" => submission.student_id = Some(field.text().await.map_err(malformed)?),
            "studentName" => {
                submission.student_name = Some(field.text().await.map_err(malformed)?)
            }
            "classNumber" => {
                submission.class_number = Some(field.text().await.map_err(malformed)?)
            }
            other => tracing::debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    Ok(submission)
}

fn malformed(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", err.body_text()))
}
