// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Upload log model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted submission. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    /// Drive file id
    #[serde(rename = "id")]
    pub remote_file_id: String,
    /// Name of the object as created in Drive
    pub file_name: String,
    pub student_name: String,
    pub class_number: String,
    /// Publicly resolvable image URL
    #[serde(rename = "url")]
    pub public_url: String,
    pub timestamp: DateTime<Utc>,
}

/// The `db.json` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadLogDocument {
    #[serde(default)]
    pub uploads: Vec<UploadRecord>,
}
