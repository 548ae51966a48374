// ABOUTME: Main library entry point for the Metrically KPI generation API
// ABOUTME: AI-generated KPI systems, SQL, and dashboards behind bearer-token authentication
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

#![deny(unsafe_code)]

//! # Metrically
//!
//! An HTTP API that turns a startup's business profile into a KPI system:
//! metrics with formulas, SQL tailored to the data stack, visualization and
//! benchmark suggestions, and dashboard groupings. Generation is delegated to
//! an Azure OpenAI deployment; accounts are email/password with stateless
//! bearer tokens.
//!
//! ## Architecture
//!
//! - **`llm`**: provider trait, the Azure OpenAI client, and the completion adapter
//! - **`kpi`**: prompts, response shaping, and the orchestration service
//! - **`auth`** / **`users`**: token issuance and the credential repository
//! - **`routes`** / **`server`**: the axum surface and its middleware stack
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use metrically_server::config::ServerConfig;
//! use metrically_server::resources::ServerResources;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let resources = Arc::new(ServerResources::from_config(config)?);
//!     metrically_server::server::run(resources).await
//! }
//! ```

/// JWT bearer token issuance and validation
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// KPI generation domain
pub mod kpi;

/// Completion provider abstraction and Azure OpenAI client
pub mod llm;

/// Structured logging setup
pub mod logging;

/// HTTP middleware for authentication, CORS, and request tracing
pub mod middleware;

/// Shared server resources
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Router assembly and server lifecycle
pub mod server;

/// User records and the credential repository
pub mod users;

pub use metrically_core::{constants, errors};
