// ABOUTME: Account registration, login, and current-user route handlers
// ABOUTME: AuthService owns password hashing and credential checks over the user repository
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! Authentication routes
//!
//! `POST /auth/token` follows the OAuth2 password-grant form shape
//! (`username`, `password`) and answers `{access_token, token_type}`.
//! Passwords are hashed with bcrypt on the blocking pool.

use std::sync::{Arc, OnceLock};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrically_core::constants::{demo_user, messages};
use metrically_core::errors::{AppError, AppResult};
use serde::Deserialize;
use tracing::{info, warn};

use super::extract::{ApiForm, ApiJson};
use crate::auth::{AccessToken, AuthManager};
use crate::middleware::AuthenticatedUser;
use crate::resources::ServerResources;
use crate::users::{normalize_email, PublicUser, UserRecord, UserRepository};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

const DUMMY_PASSWORD: &str = "metrically-timing-equalizer";

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Account email
    pub email: String,
    /// Plaintext password, hashed before storage
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub full_name: Option<String>,
}

/// OAuth2 password-grant form
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    /// Account email
    pub username: String,
    /// Plaintext password
    pub password: String,
}

/// Registration, credential checks, and token issuance
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    auth_manager: Arc<AuthManager>,
    hash_cost: u32,
    /// Checked when the user does not exist so both failure paths cost one verification
    dummy_hash: Arc<OnceLock<String>>,
}

impl AuthService {
    /// Create the service with the default bcrypt cost
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, auth_manager: Arc<AuthManager>) -> Self {
        Self {
            users,
            auth_manager,
            hash_cost: bcrypt::DEFAULT_COST,
            dummy_hash: Arc::new(OnceLock::new()),
        }
    }

    /// Override the bcrypt work factor
    #[must_use]
    pub fn with_hash_cost(mut self, hash_cost: u32) -> Self {
        self.hash_cost = hash_cost;
        self.dummy_hash = Arc::new(OnceLock::new());
        self
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for a malformed email or short password and
    /// `RESOURCE_ALREADY_EXISTS` when the email is taken
    #[tracing::instrument(skip(self, request), fields(route = "register"))]
    pub async fn register(&self, request: RegisterRequest) -> AppResult<PublicUser> {
        let email = normalize_email(&request.email);
        if !Self::is_valid_email(&email) {
            return Err(AppError::invalid_input("Invalid email format"));
        }
        if !Self::is_valid_password(&request.password) {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }

        // Skip the hashing cost for an obvious duplicate; insert_if_absent stays authoritative
        if self.users.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::already_exists(messages::EMAIL_ALREADY_REGISTERED));
        }

        let password_hash = hash_password(request.password, self.hash_cost).await?;
        let record = UserRecord {
            email,
            full_name: request
                .full_name
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty()),
            password_hash,
            disabled: false,
        };

        if !self.users.insert_if_absent(record.clone()).await? {
            return Err(AppError::already_exists(messages::EMAIL_ALREADY_REGISTERED));
        }

        info!("User registered: {}", record.email);
        Ok(record.into())
    }

    /// Check credentials
    ///
    /// A missing user, a wrong password and a disabled account all yield
    /// `None`, and all cost one bcrypt verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository or the hashing task fails
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<Option<UserRecord>> {
        let user = self.users.get_user_by_email(&normalize_email(email)).await?;
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let matches = verify_password(
            password.to_owned(),
            stored_hash,
            Arc::clone(&self.dummy_hash),
            self.hash_cost,
        )
        .await?;

        Ok(user.filter(|u| matches && !u.disabled))
    }

    /// Authenticate and issue a bearer token
    ///
    /// # Errors
    ///
    /// Returns `AUTH_INVALID` "Incorrect email or password" for any credential failure
    #[tracing::instrument(skip(self, password), fields(route = "login"))]
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AccessToken> {
        let Some(user) = self.authenticate(email, password).await? else {
            warn!("Login failed: credentials rejected");
            return Err(AppError::auth_invalid(messages::INCORRECT_CREDENTIALS));
        };

        let token = self.auth_manager.issue_token(&user.email)?;
        info!("User logged in: {}", user.email);
        Ok(token)
    }

    /// Look up the authenticated user
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` when the token outlived the account
    pub async fn current_user(&self, email: &str) -> AppResult<PublicUser> {
        self.users
            .get_user_by_email(email)
            .await?
            .map(PublicUser::from)
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Seed the demo account; `false` when it already existed
    ///
    /// # Errors
    ///
    /// Returns an error if hashing or the repository fails
    pub async fn seed_demo_user(&self) -> AppResult<bool> {
        let record = UserRecord {
            email: demo_user::EMAIL.to_owned(),
            full_name: Some(demo_user::FULL_NAME.to_owned()),
            password_hash: hash_password(demo_user::PASSWORD.to_owned(), self.hash_cost).await?,
            disabled: false,
        };
        let inserted = self.users.insert_if_absent(record).await?;
        if inserted {
            info!("Seeded demo user {}", demo_user::EMAIL);
        }
        Ok(inserted)
    }

    /// Validate email format
    #[must_use]
    pub fn is_valid_email(email: &str) -> bool {
        if email.len() <= 5 || email.chars().any(char::is_whitespace) {
            return false;
        }
        let Some(at_pos) = email.find('@') else {
            return false;
        };
        if at_pos == 0 || at_pos == email.len() - 1 {
            return false;
        }
        let domain_part = &email[at_pos + 1..];
        !domain_part.contains('@')
            && domain_part.contains('.')
            && !domain_part.starts_with('.')
            && !domain_part.ends_with('.')
    }

    /// Validate password strength
    #[must_use]
    pub fn is_valid_password(password: &str) -> bool {
        password.chars().count() >= MIN_PASSWORD_LENGTH
    }
}

async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
}

async fn verify_password(
    password: String,
    stored_hash: Option<String>,
    dummy_hash: Arc<OnceLock<String>>,
    cost: u32,
) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || {
        let hash = match stored_hash {
            Some(hash) => hash,
            None => dummy_hash
                .get_or_init(|| bcrypt::hash(DUMMY_PASSWORD, cost).unwrap_or_default())
                .clone(),
        };
        // A malformed stored hash is a mismatch, never a server error
        bcrypt::verify(password, &hash).unwrap_or(false)
    })
    .await
    .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create `/auth/*` routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth/token", post(Self::handle_login))
            .route("/auth/register", post(Self::handle_register))
            .route("/auth/me", get(Self::handle_me))
            .with_state(resources)
    }

    /// Handle POST /auth/token
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        ApiForm(form): ApiForm<LoginForm>,
    ) -> Result<Response, AppError> {
        let token = resources
            .auth_service()
            .login(&form.username, &form.password)
            .await?;
        Ok((StatusCode::OK, Json(token)).into_response())
    }

    /// Handle POST /auth/register
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        ApiJson(request): ApiJson<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let user = resources.auth_service().register(request).await?;
        Ok((StatusCode::OK, Json(user)).into_response())
    }

    /// Handle GET /auth/me
    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        auth: AuthenticatedUser,
    ) -> Result<Response, AppError> {
        let user = resources.auth_service().current_user(&auth.email).await?;
        Ok((StatusCode::OK, Json(user)).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::InMemoryUserRepository;
    use metrically_core::errors::ErrorCode;

    const TEST_COST: u32 = 4;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(AuthManager::new(b"auth-service-test-secret", 30)),
        )
        .with_hash_cost(TEST_COST)
    }

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_owned(),
            password: password.to_owned(),
            full_name: Some("Alice".to_owned()),
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(AuthService::is_valid_email("alice@example.com"));
        assert!(!AuthService::is_valid_email("alice"));
        assert!(!AuthService::is_valid_email("@example.com"));
        assert!(!AuthService::is_valid_email("alice@"));
        assert!(!AuthService::is_valid_email("alice@localhost"));
        assert!(!AuthService::is_valid_email("al ice@example.com"));
    }

    #[tokio::test]
    async fn test_register_twice_is_duplicate() {
        let auth = service();
        let user = auth
            .register(register_request("Alice@Example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.disabled);

        let error = auth
            .register(register_request("alice@example.com", "password456"))
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::ResourceAlreadyExists);
        assert_eq!(error.message, "Email already registered");
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let error = service()
            .register(register_request("alice@example.com", "short"))
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_identical() {
        let auth = service();
        auth.register(register_request("alice@example.com", "password123"))
            .await
            .unwrap();

        assert!(auth
            .authenticate("alice@example.com", "wrong-password")
            .await
            .unwrap()
            .is_none());
        assert!(auth
            .authenticate("nobody@example.com", "password123")
            .await
            .unwrap()
            .is_none());

        let wrong = auth.login("alice@example.com", "wrong-password").await.unwrap_err();
        let unknown = auth.login("nobody@example.com", "password123").await.unwrap_err();
        assert_eq!(wrong.code, unknown.code);
        assert_eq!(wrong.message, unknown.message);
        assert_eq!(wrong.message, "Incorrect email or password");
    }

    #[tokio::test]
    async fn test_disabled_user_never_authenticates() {
        let repo = Arc::new(InMemoryUserRepository::new());
        let hash = hash_password("password123".to_owned(), TEST_COST).await.unwrap();
        repo.insert_if_absent(UserRecord {
            email: "off@example.com".to_owned(),
            full_name: None,
            password_hash: hash,
            disabled: true,
        })
        .await
        .unwrap();
        let auth = AuthService::new(repo, Arc::new(AuthManager::new(b"secret", 30)))
            .with_hash_cost(TEST_COST);

        assert!(auth
            .authenticate("off@example.com", "password123")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_login_issues_token_for_user() {
        let auth = service();
        auth.register(register_request("alice@example.com", "password123"))
            .await
            .unwrap();
        let token = auth.login(" ALICE@example.com ", "password123").await.unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(
            auth.auth_manager.validate_token(&token.access_token).unwrap(),
            "alice@example.com"
        );
    }

    #[tokio::test]
    async fn test_seed_demo_user_is_idempotent() {
        let auth = service();
        assert!(auth.seed_demo_user().await.unwrap());
        assert!(!auth.seed_demo_user().await.unwrap());
        let user = auth.current_user("demo@metrically.ai").await.unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Demo User"));
    }

    #[tokio::test]
    async fn test_current_user_missing_is_not_found() {
        let error = service().current_user("ghost@example.com").await.unwrap_err();
        assert_eq!(error.code, ErrorCode::ResourceNotFound);
        assert_eq!(error.message, "User not found");
    }
}
