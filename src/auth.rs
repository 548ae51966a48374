// ABOUTME: JWT-based bearer token issuance and validation
// ABOUTME: HS256 signing with explicit expiry checking so expired tokens are reported distinctly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! # Bearer Tokens
//!
//! Tokens are stateless: nothing is stored server-side. A token encodes the
//! subject email plus issue and expiry timestamps and is signed with the
//! configured secret, so tampering is detected on validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use metrically_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Token type reported to clients
pub const BEARER_TOKEN_TYPE: &str = "bearer";

/// Why a token was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature, format, or claims are invalid
    #[error("token is invalid: {0}")]
    Invalid(String),
    /// Token lifetime has elapsed
    #[error("token expired at {}", expired_at.format("%Y-%m-%d %H:%M:%S UTC"))]
    Expired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
}

/// `JWT` claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject email
    pub sub: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
}

/// Issued bearer token
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    /// Signed token
    pub access_token: String,
    /// Always `bearer`
    pub token_type: &'static str,
    /// Expiry instant
    #[serde(skip)]
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256 bearer tokens
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime: Duration,
}

impl AuthManager {
    /// Create a manager signing with `secret`
    #[must_use]
    pub fn new(secret: &[u8], token_expiry_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_lifetime: Duration::minutes(token_expiry_minutes),
        }
    }

    /// Configured token lifetime
    #[must_use]
    pub const fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    /// Issue a token for `email` expiring after the configured lifetime
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails
    pub fn issue_token(&self, email: &str) -> AppResult<AccessToken> {
        self.issue_token_with_expiry(email, Utc::now() + self.token_lifetime)
    }

    /// Issue a token with an explicit expiry
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails
    pub fn issue_token_with_expiry(
        &self,
        email: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<AccessToken> {
        let claims = Claims {
            sub: email.to_owned(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign access token: {e}")))?;

        Ok(AccessToken {
            access_token: token,
            token_type: BEARER_TOKEN_TYPE,
            expires_at,
        })
    }

    /// Validate a token and return its subject email
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] for an elapsed lifetime and
    /// [`TokenError::Invalid`] for everything else
    pub fn validate_token(&self, token: &str) -> Result<String, TokenError> {
        // Expiry is checked below with zero leeway so it can be reported distinctly
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))?;

        let now = Utc::now();
        if now.timestamp() > claims.exp {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or(now);
            debug!(
                "Token expired {} minutes ago",
                now.signed_duration_since(expired_at).num_minutes()
            );
            return Err(TokenError::Expired { expired_at });
        }

        if claims.sub.trim().is_empty() {
            return Err(TokenError::Invalid("token has no subject".to_owned()));
        }

        Ok(claims.sub)
    }

    fn convert_jwt_error(e: &JwtError) -> TokenError {
        warn!("JWT token validation failed: {:?}", e.kind());
        match e.kind() {
            ErrorKind::InvalidSignature => {
                TokenError::Invalid("Token signature verification failed".into())
            }
            ErrorKind::InvalidToken => TokenError::Invalid("Token format is invalid".into()),
            ErrorKind::Base64(err) => {
                TokenError::Invalid(format!("Token contains invalid base64: {err}"))
            }
            ErrorKind::Json(err) => {
                TokenError::Invalid(format!("Token contains invalid JSON: {err}"))
            }
            ErrorKind::Utf8(err) => {
                TokenError::Invalid(format!("Token contains invalid UTF-8: {err}"))
            }
            _ => TokenError::Invalid(format!("Token validation failed: {e}")),
        }
    }
}
