// ABOUTME: Single-profile KPI route handlers kept for existing clients
// ABOUTME: Annotated free-text KPI generation, always-answering SQL generation, and fixed examples
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! KPI routes
//!
//! These endpoints predate `/ai/*`. `/kpi/generate` answers the raw model
//! text with keyword heuristics and `/kpi/generate-sql` always answers
//! `{sql}`, substituting a SQL comment when generation fails.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrically_core::errors::AppError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::extract::ApiJson;
use crate::kpi::{example_systems, sql_failure_comment, BusinessProfile, ExampleSystem};
use crate::llm::CompletionError;
use crate::middleware::AuthenticatedUser;
use crate::resources::ServerResources;

/// SQL generation payload, shared with `/ai/generate-sql`
#[derive(Debug, Clone, Deserialize)]
pub struct SqlRequest {
    /// Metric name
    pub metric_name: String,
    /// Metric calculation or description
    pub metric_calculation: String,
    /// Data stack the SQL targets
    pub tech_stack: String,
}

/// Body of `/kpi/generate-sql`
#[derive(Debug, Clone, Serialize)]
pub struct SqlResponse {
    /// SQL text, or a comment describing the failure
    pub sql: String,
}

/// KPI routes handler
pub struct KpiRoutes;

impl KpiRoutes {
    /// Create `/kpi/*` routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/kpi/generate", post(Self::handle_generate))
            .route("/kpi/generate-sql", post(Self::handle_generate_sql))
            .route("/kpi/example-systems", get(Self::handle_example_systems))
            .with_state(resources)
    }

    /// Handle POST /kpi/generate
    async fn handle_generate(
        State(resources): State<Arc<ServerResources>>,
        _user: AuthenticatedUser,
        ApiJson(profile): ApiJson<BusinessProfile>,
    ) -> Result<Response, AppError> {
        profile.validate()?;

        let report = resources
            .kpi_service
            .generate_kpi_report(&profile)
            .await
            .map_err(|e| e.into_app_error("Failed to generate KPI system"))?;

        Ok((StatusCode::OK, Json(report)).into_response())
    }

    /// Handle POST /kpi/generate-sql
    async fn handle_generate_sql(
        State(resources): State<Arc<ServerResources>>,
        _user: AuthenticatedUser,
        ApiJson(request): ApiJson<SqlRequest>,
    ) -> Result<Response, AppError> {
        let sql = match resources
            .kpi_service
            .generate_sql_for_metric(
                &request.metric_name,
                &request.metric_calculation,
                &request.tech_stack,
            )
            .await
        {
            Ok(generation) => generation.sql,
            Err(CompletionError::InvalidRequest { code, message }) => {
                return Err(AppError::new(code, message));
            }
            Err(e) => {
                warn!("SQL generation failed: {e}");
                sql_failure_comment(&e).to_owned()
            }
        };

        Ok((StatusCode::OK, Json(SqlResponse { sql })).into_response())
    }

    /// Handle GET /kpi/example-systems
    async fn handle_example_systems() -> Json<&'static [ExampleSystem]> {
        Json(example_systems())
    }
}
