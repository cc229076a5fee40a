// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Services module - business logic layer.

pub mod callback;
pub mod drive;
pub mod drive_auth;
pub mod gallery;
pub mod google_oauth;
pub mod roster;
pub mod upload;

pub use callback::{CallbackReceiver, LoopbackReceiver, RouteReceiver};
pub use drive::{DriveClient, RemoteStorage};
pub use drive_auth::{AuthPhase, DriveAuth};
pub use gallery::GalleryService;
pub use google_oauth::GoogleOAuthClient;
pub use roster::{LoginOutcome, RosterService};
pub use upload::{UploadService, UploadSubmission, UploadedFile};
