// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Middleware modules (sessions, security headers).

pub mod auth;
pub mod security;

pub use auth::{require_admin, require_session, AuthUser};
