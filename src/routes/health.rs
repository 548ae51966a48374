// ABOUTME: Health check and configuration status route handlers
// ABOUTME: Public endpoints that never call the completion provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! Health check routes for service monitoring

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use metrically_core::constants::service_names;
use serde::Serialize;

use crate::resources::ServerResources;

/// Provider configuration status
#[derive(Debug, Clone, Serialize)]
pub struct ApiStatus {
    /// True iff key and endpoint are configured
    pub configured: bool,
    /// Same value under its historical name
    pub azure_openai_configured: bool,
    /// Deployment name when configured
    pub deployment: Option<String>,
}

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create `/`, `/health` and `/api-status`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        async fn root_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({ "message": service_names::WELCOME_MESSAGE }))
        }

        async fn health_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "healthy",
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
        }

        async fn api_status_handler(
            State(resources): State<Arc<ServerResources>>,
        ) -> Json<ApiStatus> {
            let service = &resources.kpi_service;
            Json(ApiStatus {
                configured: service.is_available(),
                azure_openai_configured: service.is_available(),
                deployment: service.deployment().map(ToOwned::to_owned),
            })
        }

        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/api-status", get(api_status_handler))
            .with_state(resources)
    }
}
