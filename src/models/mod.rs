// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Data models for the application.

pub mod credentials;
pub mod student;
pub mod upload;

pub use credentials::{AppCredentials, StoredToken};
pub use student::{Student, StudentSummary};
pub use upload::{UploadLogDocument, UploadRecord};
