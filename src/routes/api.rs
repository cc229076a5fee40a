// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Student-facing API routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE};
use crate::models::{StudentSummary, UploadRecord};
use crate::services::LoginOutcome;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Routes open to anyone.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/images/{class_number}", get(class_images))
}

/// Routes that need a session; the middleware is applied in routes/mod.rs.
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/change-password", post(change_password))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "public/generated/")
)]
pub struct AdminProfile {
    pub name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "public/generated/")
)]
pub struct LoginResponse {
    pub success: bool,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_password_change: Option<bool>,
    /// Session token, also set as the `gallery_token` cookie
    pub token: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let outcome = state
        .roster_service
        .login(&req.student_id, &req.student_name, &req.password)
        .await?;

    let response = match outcome {
        LoginOutcome::Admin { id, name } => LoginResponse {
            success: true,
            is_admin: true,
            token: create_jwt(&id, &name, true, &state.config.jwt_signing_key)?,
            admin: Some(AdminProfile { name }),
            student: None,
            requires_password_change: None,
        },
        LoginOutcome::Student {
            student,
            requires_password_change,
        } => LoginResponse {
            success: true,
            is_admin: false,
            token: create_jwt(
                &student.id,
                &student.name,
                false,
                &state.config.jwt_signing_key,
            )?,
            admin: None,
            student: Some(student),
            requires_password_change: Some(requires_password_change),
        },
    };

    let cookie = Cookie::build((SESSION_COOKIE, response.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((jar.add(cookie), Json(response)))
}

// ─── Password change ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub student_id: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    if !user.admin && user.id != req.student_id {
        tracing::warn!(user_id = %user.id, target = %req.student_id, "Password change for another student");
        return Err(AppError::Forbidden);
    }

    state
        .roster_service
        .change_password(&req.student_id, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Password changed".to_string(),
    }))
}

// ─── Gallery ─────────────────────────────────────────────────

/// Uploads of one class, newest first.
async fn class_images(
    State(state): State<Arc<AppState>>,
    Path(class_number): Path<String>,
) -> Result<Json<Vec<UploadRecord>>> {
    Ok(Json(state.gallery_service.for_class(&class_number).await?))
}
