// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Classroom gallery: students upload images into per-class Google Drive
//! folders and browse their class gallery.
//!
//! The service authorizes against Drive once with the administrator's
//! account, then forwards each upload into the class folder, makes it
//! publicly readable and records it in a local JSON log.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::{DriveAuth, GalleryService, RosterService, UploadService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub drive_auth: Arc<DriveAuth>,
    pub upload_service: UploadService,
    pub roster_service: RosterService,
    pub gallery_service: GalleryService,
}

impl AppState {
    /// Wire the services over the documents in `config.data_dir`.
    pub fn new(
        config: Config,
        drive_auth: Arc<DriveAuth>,
        storage: Arc<dyn services::RemoteStorage>,
    ) -> Self {
        use db::{documents, RosterStore, UploadLog};

        let upload_log = Arc::new(UploadLog::new(
            config.data_dir.join(documents::UPLOAD_LOG),
        ));
        let roster = RosterStore::new(config.data_dir.join(documents::STUDENTS));

        Self {
            upload_service: UploadService::new(
                drive_auth.clone(),
                storage,
                config.folders.clone(),
                upload_log.clone(),
            ),
            roster_service: RosterService::new(roster, config.admin.clone()),
            gallery_service: GalleryService::new(upload_log),
            drive_auth,
            config,
        }
    }
}
