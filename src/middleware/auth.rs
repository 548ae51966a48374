// ABOUTME: Bearer token authentication for protected HTTP endpoints
// ABOUTME: Resolves the Authorization header to an authenticated user or a uniform 401
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use metrically_core::constants::messages;
use metrically_core::errors::{AppError, AppResult};

use crate::auth::{AuthManager, TokenError};
use crate::resources::ServerResources;

/// Identity established from a valid bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Subject email from the token
    pub email: String,
}

/// Authenticates requests carrying `Authorization: Bearer <token>`
#[derive(Clone)]
pub struct BearerAuthMiddleware {
    auth_manager: Arc<AuthManager>,
}

impl BearerAuthMiddleware {
    /// Create middleware backed by `auth_manager`
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>) -> Self {
        Self { auth_manager }
    }

    /// Authenticate a request from its headers
    ///
    /// # Errors
    ///
    /// Returns `AUTH_INVALID` with the same message for a missing header, a
    /// malformed header, an invalid token and an expired token
    #[tracing::instrument(
        skip(self, headers),
        fields(auth_method = "JWT_TOKEN", user = tracing::field::Empty, success = tracing::field::Empty)
    )]
    pub fn authenticate_request(&self, headers: &HeaderMap) -> AppResult<AuthenticatedUser> {
        let auth_header = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok());

        // Security: never log the header value
        let Some(auth_str) = auth_header else {
            tracing::Span::current().record("success", false);
            tracing::warn!("Authentication failed: Missing authorization header");
            return Err(Self::rejection());
        };

        let Some(token) = strip_bearer(auth_str) else {
            tracing::Span::current().record("success", false);
            tracing::warn!("Authentication failed: authorization header is not a bearer token");
            return Err(Self::rejection());
        };

        match self.auth_manager.validate_token(token) {
            Ok(email) => {
                tracing::Span::current()
                    .record("user", email.as_str())
                    .record("success", true);
                tracing::debug!("JWT authentication successful for user: {email}");
                Ok(AuthenticatedUser { email })
            }
            Err(TokenError::Expired { expired_at }) => {
                tracing::Span::current().record("success", false);
                tracing::warn!("JWT authentication failed: token expired at {expired_at}");
                Err(Self::rejection())
            }
            Err(TokenError::Invalid(reason)) => {
                tracing::Span::current().record("success", false);
                tracing::warn!("JWT authentication failed: {reason}");
                Err(Self::rejection())
            }
        }
    }

    fn rejection() -> AppError {
        AppError::auth_invalid(messages::INVALID_CREDENTIALS)
    }
}

/// Protected handlers take this first so the bearer check runs before any
/// body or query extractor
#[async_trait]
impl FromRequestParts<Arc<ServerResources>> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        resources: &Arc<ServerResources>,
    ) -> Result<Self, Self::Rejection> {
        resources
            .auth_middleware
            .authenticate_request(&parts.headers)
    }
}

/// Token part of a `Bearer` header; the scheme is case-insensitive
fn strip_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
