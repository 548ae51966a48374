// ABOUTME: HTTP middleware for request tracing, authentication, and CORS
// ABOUTME: Provides request ID generation, bearer token checks, and cross-origin configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

pub mod auth;
pub mod cors;
pub mod tracing;

// Authentication middleware
pub use auth::{AuthenticatedUser, BearerAuthMiddleware};

// CORS configuration
pub use cors::setup_cors;

// Request tracing
pub use self::tracing::{create_request_span, request_id_middleware, RequestId, REQUEST_ID_HEADER};
