// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Application configuration loaded from environment variables.
//!
//! The Google app credentials and the cached OAuth token are not part of
//! this struct; they live in JSON documents under `data_dir` and are owned
//! by the auth bootstrapper.

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

/// Default password assigned to new students and on administrative reset.
pub const DEFAULT_STUDENT_PASSWORD: &str = "1111";

/// Minimum accepted length for the JWT signing key.
const MIN_SIGNING_KEY_LEN: usize = 32;

/// Class folders of the original deployment.
const DEFAULT_DRIVE_FOLDERS: &[(&str, &str)] = &[
    ("1", "1fuD3yjwBWK1G6KRcXoITumaxl5cvI60j"),
    ("2", "1lghipVknF8WAd8yNVFX-t4qVEQGqEfOi"),
    ("3", "1O-Et4QxEDH0IgT6zO-xyfIwvRKuE_jrs"),
    ("4", "1Wi1fCZcVUbBVv_IBYzNDBB2bBDqwvg68"),
];

/// How the OAuth authorization callback is received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackMode {
    /// `/oauth2callback` on the main service.
    Route,
    /// A transient listener on a fixed local port.
    Loopback { port: u16 },
}

/// The administrator identity that bypasses the roster.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub id: String,
    pub name: String,
    pub password: String,
}

/// Static mapping from class number to Drive folder id.
#[derive(Debug, Clone, Default)]
pub struct FolderDirectory {
    folders: BTreeMap<String, String>,
}

impl FolderDirectory {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            folders: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse `"1=<folder>,2=<folder>"`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut folders = BTreeMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (class, folder) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::Invalid("DRIVE_FOLDER_IDS", entry.to_string()))?;
            folders.insert(class.trim().to_string(), folder.trim().to_string());
        }
        Ok(Self { folders })
    }

    /// Folder for a class. Empty entries and `_ID` placeholders count as unmapped.
    pub fn resolve(&self, class_number: &str) -> Option<&str> {
        self.folders
            .get(class_number)
            .map(String::as_str)
            .filter(|id| !id.is_empty() && !id.contains("_ID"))
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.folders.keys().map(String::as_str)
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Directory holding the credential, token, roster and upload log documents
    pub data_dir: PathBuf,
    /// Directory of the static front-end
    pub static_dir: PathBuf,
    /// Frontend origin allowed by CORS
    pub frontend_url: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
    pub callback_mode: CallbackMode,
    /// Upper bound for an upload request body
    pub max_upload_bytes: usize,
    pub folders: FolderDirectory,
    pub admin: AdminIdentity,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .into_bytes();
        if jwt_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid(
                "JWT_SIGNING_KEY",
                format!("must be at least {} bytes", MIN_SIGNING_KEY_LEN),
            ));
        }

        let oauth_state_key = env::var("OAUTH_STATE_KEY")
            .map(String::into_bytes)
            .unwrap_or_else(|_| jwt_signing_key.clone());

        let callback_mode = match env::var("AUTH_CALLBACK_MODE")
            .unwrap_or_else(|_| "route".to_string())
            .trim()
        {
            "route" => CallbackMode::Route,
            "loopback" => CallbackMode::Loopback {
                port: parse_var("AUTH_LOOPBACK_PORT", 8085)?,
            },
            other => {
                return Err(ConfigError::Invalid(
                    "AUTH_CALLBACK_MODE",
                    other.to_string(),
                ))
            }
        };

        let folders = match env::var("DRIVE_FOLDER_IDS") {
            Ok(raw) => FolderDirectory::parse(&raw)?,
            Err(_) => FolderDirectory::new(DEFAULT_DRIVE_FOLDERS.iter().copied()),
        };

        Ok(Self {
            port: parse_var("PORT", 3000)?,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            jwt_signing_key,
            oauth_state_key,
            callback_mode,
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            folders,
            admin: AdminIdentity {
                id: env::var("ADMIN_ID").unwrap_or_else(|_| "00000".to_string()),
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "최현종".to_string()),
                password: env::var("ADMIN_PASSWORD")
                    .map(|v| v.trim().to_string())
                    .unwrap_or_else(|_| "donggwangedu".to_string()),
            },
        })
    }

    /// Config for tests, rooted at `data_dir`.
    pub fn test_default(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            port: 3000,
            data_dir: data_dir.into(),
            static_dir: PathBuf::from("public"),
            frontend_url: "http://localhost:3000".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            oauth_state_key: b"test_state_key".to_vec(),
            callback_mode: CallbackMode::Route,
            max_upload_bytes: 1024 * 1024,
            folders: FolderDirectory::new([("1", "folder-one"), ("2", "folder-two")]),
            admin: AdminIdentity {
                id: "00000".to_string(),
                name: "Admin".to_string(),
                password: "admin-pass".to_string(),
            },
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
