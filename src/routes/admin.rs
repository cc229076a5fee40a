// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Administrator routes. `require_admin` is applied in routes/mod.rs.

use crate::error::{AppError, Result};
use crate::models::{StudentSummary, UploadRecord};
use crate::routes::api::MessageResponse;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/students", get(list_students))
        .route("/api/admin/reset-password", post(reset_password))
        .route("/api/admin/all-images", get(all_images))
}

async fn list_students(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StudentSummary>>> {
    Ok(Json(state.roster_service.list_students().await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub student_id: Option<String>,
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let student_id = req
        .student_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("studentId is required".to_string()))?;

    state.roster_service.reset_password(&student_id).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: format!("Password of {} reset to default", student_id),
    }))
}

async fn all_images(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UploadRecord>>> {
    Ok(Json(state.gallery_service.all().await?))
}
