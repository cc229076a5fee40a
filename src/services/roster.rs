// SPDX-License-Identifier: MIT
// Copyright 2026 The classroom-gallery authors

//! Login and password management against the student roster.

use crate::config::{AdminIdentity, DEFAULT_STUDENT_PASSWORD};
use crate::db::RosterStore;
use crate::error::AppError;
use crate::models::{Student, StudentSummary};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;
use subtle::ConstantTimeEq;

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Admin {
        id: String,
        name: String,
    },
    Student {
        student: StudentSummary,
        requires_password_change: bool,
    },
}

pub struct RosterService {
    store: RosterStore,
    admin: AdminIdentity,
}

impl RosterService {
    pub fn new(store: RosterStore, admin: AdminIdentity) -> Self {
        Self { store, admin }
    }

    /// Authenticate by (id, name, password).
    ///
    /// The administrator identity is checked first and never touches the
    /// roster. Students still on the default password are flagged so the
    /// client can force a change.
    pub async fn login(
        &self,
        id: &str,
        name: &str,
        password: &str,
    ) -> Result<LoginOutcome, AppError> {
        if self.is_admin(id, name, password) {
            tracing::info!("Administrator logged in");
            return Ok(LoginOutcome::Admin {
                id: self.admin.id.clone(),
                name: self.admin.name.clone(),
            });
        }

        let student = self
            .store
            .find(id, name)
            .await?
            .ok_or_else(|| AppError::NotFound("Student".to_string()))?;

        match check_password(&student.password, password) {
            PasswordCheck::Mismatch => return Err(AppError::InvalidCredentials),
            PasswordCheck::Matched => {}
            PasswordCheck::MatchedLegacy => {
                // Plain-text entries from a hand-written roster are replaced on first use.
                let hashed = hash_password(password)?;
                self.store
                    .set_password_for(&student.id, &student.name, hashed)
                    .await?;
                tracing::info!(student_id = %student.id, "Upgraded legacy password entry");
            }
        }

        Ok(LoginOutcome::Student {
            student: student.summary(),
            requires_password_change: password == DEFAULT_STUDENT_PASSWORD,
        })
    }

    /// Set a new password for the student with `id`.
    pub async fn change_password(&self, id: &str, new_password: &str) -> Result<(), AppError> {
        if new_password.is_empty() {
            return Err(AppError::BadRequest("New password must not be empty".to_string()));
        }
        self.store_password(id, new_password).await?;
        tracing::info!(student_id = %id, "Password changed");
        Ok(())
    }

    /// Restore the default password for the student with `id`.
    pub async fn reset_password(&self, id: &str) -> Result<(), AppError> {
        self.store_password(id, DEFAULT_STUDENT_PASSWORD).await?;
        tracing::info!(student_id = %id, "Password reset to default");
        Ok(())
    }

    /// Every student, without passwords.
    pub async fn list_students(&self) -> Result<Vec<StudentSummary>, AppError> {
        Ok(self
            .store
            .all()
            .await?
            .iter()
            .map(Student::summary)
            .collect())
    }

    async fn store_password(&self, id: &str, password: &str) -> Result<(), AppError> {
        let hashed = hash_password(password)?;
        self.store
            .set_password(id, hashed)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Student".to_string()))
    }

    fn is_admin(&self, id: &str, name: &str, password: &str) -> bool {
        let id_ok = id.as_bytes().ct_eq(self.admin.id.as_bytes());
        let name_ok = name.as_bytes().ct_eq(self.admin.name.as_bytes());
        let password_ok = password.as_bytes().ct_eq(self.admin.password.as_bytes());
        bool::from(id_ok & name_ok & password_ok)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PasswordCheck {
    Matched,
    MatchedLegacy,
    Mismatch,
}

fn check_password(stored: &str, candidate: &str) -> PasswordCheck {
    match PasswordHash::new(stored) {
        Ok(parsed) => {
            if Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok()
            {
                PasswordCheck::Matched
            } else {
                PasswordCheck::Mismatch
            }
        }
        Err(_) => {
            if bool::from(stored.as_bytes().ct_eq(candidate.as_bytes())) {
                PasswordCheck::MatchedLegacy
            } else {
                PasswordCheck::Mismatch
            }
        }
    }
}

/// Hash a password as an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
}
