// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Read-only queries over the upload log.

use crate::db::UploadLog;
use crate::error::AppError;
use crate::models::UploadRecord;
use std::sync::Arc;

pub struct GalleryService {
    log: Arc<UploadLog>,
}

impl GalleryService {
    pub fn new(log: Arc<UploadLog>) -> Self {
        Self { log }
    }

    /// Records of one class, newest first.
    pub async fn for_class(&self, class_number: &str) -> Result<Vec<UploadRecord>, AppError> {
        Ok(select_class(self.log.all().await?, class_number))
    }

    /// Every record in insertion order.
    pub async fn all(&self) -> Result<Vec<UploadRecord>, AppError> {
        Ok(self.log.all().await?)
    }
}

fn select_class(records: Vec<UploadRecord>, class_number: &str) -> Vec<UploadRecord> {
    let mut selected: Vec<UploadRecord> = records
        .into_iter()
        .filter(|r| r.class_number == class_number)
        .collect();
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected
}
