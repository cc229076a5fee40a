// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Append-only upload log (`db.json`).

use super::{JsonDocument, StoreError};
use crate::models::{UploadLogDocument, UploadRecord};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Fields of a record known before it is appended.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub remote_file_id: String,
    pub file_name: String,
    pub student_name: String,
    pub class_number: String,
    pub public_url: String,
}

/// Upload log with atomic append.
pub struct UploadLog {
    doc: JsonDocument<UploadLogDocument>,
}

impl UploadLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path),
        }
    }

    /// Append a record, stamping it with the current time.
    ///
    /// Timestamps never go backwards relative to the last stored record.
    pub async fn append(&self, upload: NewUpload) -> Result<UploadRecord, StoreError> {
        self.append_at(upload, Utc::now()).await
    }

    async fn append_at(
        &self,
        upload: NewUpload,
        now: DateTime<Utc>,
    ) -> Result<UploadRecord, StoreError> {
        self.doc
            .update(|log| {
                let timestamp = log
                    .uploads
                    .last()
                    .map_or(now, |last| last.timestamp.max(now));
                let record = UploadRecord {
                    remote_file_id: upload.remote_file_id,
                    file_name: upload.file_name,
                    student_name: upload.student_name,
                    class_number: upload.class_number,
                    public_url: upload.public_url,
                    timestamp,
                };
                log.uploads.push(record.clone());
                Ok(record)
            })
            .await
    }

    /// Every record in insertion order.
    pub async fn all(&self) -> Result<Vec<UploadRecord>, StoreError> {
        Ok(self.doc.read_or_default().await?.uploads)
    }
}
