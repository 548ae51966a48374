// ABOUTME: User records and the credential repository abstraction
// ABOUTME: In-memory DashMap repository with atomic insert-if-absent registration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use metrically_core::errors::AppResult;
use serde::{Deserialize, Serialize};

/// Stored user, including the password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Normalized email, unique key
    pub email: String,
    /// Display name
    pub full_name: Option<String>,
    /// One-way bcrypt hash
    pub password_hash: String,
    /// Disabled users never authenticate
    pub disabled: bool,
}

/// User as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    /// Email
    pub email: String,
    /// Display name
    pub full_name: Option<String>,
    /// Disabled flag
    pub disabled: bool,
}

impl From<UserRecord> for PublicUser {
    fn from(user: UserRecord) -> Self {
        Self {
            email: user.email,
            full_name: user.full_name,
            disabled: user.disabled,
        }
    }
}

/// Canonical form of an email used as the repository key
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Credential store
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by normalized email
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Insert `user` unless its email is taken; `false` when it already existed
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails
    async fn insert_if_absent(&self, user: UserRecord) -> AppResult<bool>;
}

/// Process-local repository; contents are lost on restart
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: DashMap<String, UserRecord>,
}

impl InMemoryUserRepository {
    /// Empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// True when no user is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .get(&normalize_email(email))
            .map(|entry| entry.value().clone()))
    }

    async fn insert_if_absent(&self, mut user: UserRecord) -> AppResult<bool> {
        user.email = normalize_email(&user.email);
        // The entry guard holds the shard lock, so check and insert are one step
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(true)
            }
        }
    }
}
