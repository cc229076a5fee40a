// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Student roster document (`students.json`).

use super::{JsonDocument, StoreError};
use crate::models::Student;
use std::path::PathBuf;

/// Roster persisted as a single JSON array of students.
pub struct RosterStore {
    doc: JsonDocument<Vec<Student>>,
}

impl RosterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path),
        }
    }

    /// All students. A missing roster is an empty one.
    pub async fn all(&self) -> Result<Vec<Student>, StoreError> {
        self.doc.read_or_default().await
    }

    /// Look up by the (id, name) pair.
    pub async fn find(&self, id: &str, name: &str) -> Result<Option<Student>, StoreError> {
        Ok(self
            .all()
            .await?
            .into_iter()
            .find(|s| s.id == id && s.name == name))
    }

    /// Overwrite the stored password of the student with `id`.
    ///
    /// Returns the updated student, or `None` when no student has that id.
    pub async fn set_password(
        &self,
        id: &str,
        password: String,
    ) -> Result<Option<Student>, StoreError> {
        self.doc
            .update(|students| {
                Ok(students.iter_mut().find(|s| s.id == id).map(|student| {
                    student.password = password;
                    student.clone()
                }))
            })
            .await
    }

    /// Overwrite the stored password of the entry matching both `id` and `name`.
    pub async fn set_password_for(
        &self,
        id: &str,
        name: &str,
        password: String,
    ) -> Result<Option<Student>, StoreError> {
        self.doc
            .update(|students| {
                Ok(students
                    .iter_mut()
                    .find(|s| s.id == id && s.name == name)
                    .map(|student| {
                        student.password = password;
                        student.clone()
                    }))
            })
            .await
    }

    /// Replace the whole roster.
    pub async fn replace(&self, students: &[Student]) -> Result<(), StoreError> {
        self.doc.write(&students.to_vec()).await
    }
}
