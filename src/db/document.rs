// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! A JSON document on disk with whole-document read/replace semantics.
//!
//! Writes go to a sibling temporary file which is then renamed over the
//! document, so readers never observe a half-written file. Mutations made
//! through [`JsonDocument::update`] are serialized by an async mutex.

use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Errors from reading or writing a document.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document {path} not found")]
    Missing { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StoreError> for crate::error::AppError {
    fn from(err: StoreError) -> Self {
        crate::error::AppError::Storage(err.to_string())
    }
}

/// Typed handle to one JSON document.
pub struct JsonDocument<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, failing with [`StoreError::Missing`] if absent.
    pub async fn read(&self) -> Result<T, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::Missing {
                    path: self.path.clone(),
                })
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&raw).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the document.
    pub async fn write(&self, doc: &T) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_unlocked(doc).await
    }

    /// Remove the document. Absence is not an error.
    pub async fn remove(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    async fn write_unlocked(&self, doc: &T) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(doc).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Read the document, returning `T::default()` if it does not exist yet.
    pub async fn read_or_default(&self) -> Result<T, StoreError> {
        match self.read().await {
            Err(StoreError::Missing { .. }) => Ok(T::default()),
            other => other,
        }
    }

    /// Read-modify-write under the document lock.
    ///
    /// The document is only written back when `mutate` returns `Ok`.
    pub async fn update<R, E>(&self, mutate: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.read_or_default().await?;
        let out = mutate(&mut doc)?;
        self.write_unlocked(&doc).await?;
        Ok(out)
    }
}
