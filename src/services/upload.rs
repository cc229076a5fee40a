// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Upload pipeline: one submission in, one public Drive file and one log
//! record out.
//!
//! Preconditions are checked before any remote call, in this order:
//! Drive authorized, all fields present, class folder configured.
//! Remote and log-write failures are reported to the caller as one generic
//! error; nothing is rolled back.

use crate::config::FolderDirectory;
use crate::db::upload_log::NewUpload;
use crate::db::UploadLog;
use crate::error::AppError;
use crate::models::UploadRecord;
use crate::services::drive::{NewRemoteFile, RemoteFile, RemoteStorage};
use crate::services::drive_auth::DriveAuth;
use bytes::Bytes;
use std::sync::Arc;

/// Size parameter forced onto thumbnail links.
const THUMBNAIL_SIZE: &str = "s1000";

/// The file part of a submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// A submission as received; every field may be missing.
#[derive(Debug, Clone, Default)]
pub struct UploadSubmission {
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub class_number: Option<String>,
    pub file: Option<UploadedFile>,
}

struct CompleteSubmission {
    student_id: String,
    student_name: String,
    class_number: String,
    file: UploadedFile,
}

impl UploadSubmission {
    fn require_all(self) -> Result<CompleteSubmission, AppError> {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (
            present(self.student_id),
            present(self.student_name),
            present(self.class_number),
            self.file,
        ) {
            (Some(student_id), Some(student_name), Some(class_number), Some(file)) => {
                Ok(CompleteSubmission {
                    student_id,
                    student_name,
                    class_number,
                    file,
                })
            }
            _ => Err(AppError::BadRequest(
                "Missing fields: image, studentId, studentName and classNumber are required"
                    .to_string(),
            )),
        }
    }
}

/// Accepts submissions and forwards them to Drive.
pub struct UploadService {
    auth: Arc<DriveAuth>,
    storage: Arc<dyn RemoteStorage>,
    folders: FolderDirectory,
    log: Arc<UploadLog>,
}

impl UploadService {
    pub fn new(
        auth: Arc<DriveAuth>,
        storage: Arc<dyn RemoteStorage>,
        folders: FolderDirectory,
        log: Arc<UploadLog>,
    ) -> Self {
        Self {
            auth,
            storage,
            folders,
            log,
        }
    }

    /// Fail with `ServiceUnavailable` while Drive is not authorized.
    pub fn ensure_ready(&self) -> Result<(), AppError> {
        if self.auth.is_ready() {
            Ok(())
        } else {
            Err(AppError::ServiceUnavailable(
                "Server is not connected to Google Drive yet. Please try again later."
                    .to_string(),
            ))
        }
    }

    /// Run one submission through the pipeline.
    pub async fn submit(&self, submission: UploadSubmission) -> Result<UploadRecord, AppError> {
        self.ensure_ready()?;
        let submission = submission.require_all()?;
        let folder_id = self
            .folders
            .resolve(&submission.class_number)
            .ok_or_else(|| {
                AppError::Misconfigured(format!(
                    "No Drive folder configured for class {}",
                    submission.class_number
                ))
            })?;

        let access_token = self.auth.access_token().await.map_err(|e| match e {
            AppError::ServiceUnavailable(_) => e,
            other => upload_failed("token", other),
        })?;

        let metadata = NewRemoteFile {
            name: remote_object_name(
                &submission.student_id,
                &submission.student_name,
                &submission.file.file_name,
            ),
            parents: vec![folder_id.to_string()],
            mime_type: submission.file.content_type,
        };

        let created = self
            .storage
            .create(&access_token, &metadata, submission.file.data)
            .await
            .map_err(|e| upload_failed("create", e))?;

        if let Err(e) = self
            .storage
            .grant_public_read(&access_token, &created.id)
            .await
        {
            tracing::warn!(file_id = %created.id, "Drive file left without public permission");
            return Err(upload_failed("permission", e));
        }

        let record = self
            .log
            .append(NewUpload {
                public_url: public_url(&created),
                remote_file_id: created.id,
                file_name: created.name,
                student_name: submission.student_name,
                class_number: submission.class_number,
            })
            .await
            .map_err(|e| upload_failed("log", e.into()))?;

        tracing::info!(
            file_id = %record.remote_file_id,
            class_number = %record.class_number,
            "Upload stored"
        );
        Ok(record)
    }
}

fn upload_failed(stage: &'static str, err: AppError) -> AppError {
    tracing::error!(stage, error = %err, "Upload pipeline step failed");
    AppError::UploadFailed(format!("{} step failed: {}", stage, err))
}

/// `{studentId}_{studentName}_{originalFileName}`
pub fn remote_object_name(student_id: &str, student_name: &str, file_name: &str) -> String {
    format!("{}_{}_{}", student_id, student_name, file_name)
}

/// Public display URL for a created file.
///
/// Prefers the thumbnail link with its size normalized; falls back to the
/// generic export-view link.
pub fn public_url(file: &RemoteFile) -> String {
    match file.thumbnail_link.as_deref() {
        Some(link) if !link.is_empty() => normalize_thumbnail_size(link),
        _ => format!("https://drive.google.com/uc?export=view&id={}", file.id),
    }
}

fn normalize_thumbnail_size(link: &str) -> String {
    if let Some((base, size)) = link.rsplit_once('=') {
        let is_size = size.len() > 1
            && size.starts_with('s')
            && size[1..].bytes().all(|b| b.is_ascii_digit());
        if is_size {
            return format!("{}={}", base, THUMBNAIL_SIZE);
        }
    }
    format!("{}={}", link, THUMBNAIL_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(thumbnail: Option<&str>) -> RemoteFile {
        RemoteFile {
            id: "file123".to_string(),
            name: "n".to_string(),
            thumbnail_link: thumbnail.map(str::to_string),
            web_view_link: Some("https://drive.google.com/file/d/file123/view".to_string()),
        }
    }

    #[test]
    fn test_remote_object_name() {
        assert_eq!(
            remote_object_name("10101", "Kim", "cat.png"),
            "10101_Kim_cat.png"
        );
    }

    #[test]
    fn test_public_url_normalizes_thumbnail_size() {
        let url = public_url(&remote(Some("https://lh3.googleusercontent.com/drive-storage/abc=s220")));
        assert_eq!(url, "https://lh3.googleusercontent.com/drive-storage/abc=s1000");
    }

    #[test]
    fn test_public_url_appends_size_when_absent() {
        let url = public_url(&remote(Some("https://lh3.googleusercontent.com/drive-storage/abc")));
        assert_eq!(url, "https://lh3.googleusercontent.com/drive-storage/abc=s1000");
    }

    #[test]
    fn test_public_url_falls_back_to_view_link() {
        assert_eq!(
            public_url(&remote(None)),
            "https://drive.google.com/uc?export=view&id=file123"
        );
        assert_eq!(
            public_url(&remote(Some(""))),
            "https://drive.google.com/uc?export=view&id=file123"
        );
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        let submission = UploadSubmission {
            student_id: Some("10101".to_string()),
            student_name: Some("   ".to_string()),
            class_number: Some("1".to_string()),
            file: Some(UploadedFile {
                file_name: "a.png".to_string(),
                content_type: "image/png".to_string(),
                data: Bytes::from_static(b"x"),
            }),
        };
        assert!(matches!(
            submission.require_all(),
            Err(AppError::BadRequest(_))
        ));
    }
}
