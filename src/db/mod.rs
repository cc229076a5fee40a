// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Flat-file persistence (whole JSON documents).

pub mod document;
pub mod roster;
pub mod upload_log;

pub use document::{JsonDocument, StoreError};
pub use roster::RosterStore;
pub use upload_log::UploadLog;

/// Document file names inside the data directory.
pub mod documents {
    pub const APP_CREDENTIALS: &str = "oauth_credentials.json";
    pub const TOKEN: &str = "token.json";
    pub const UPLOAD_LOG: &str = "db.json";
    pub const STUDENTS: &str = "students.json";
}
