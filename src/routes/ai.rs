// ABOUTME: AI generation route handlers for KPI systems, SQL, and free-form completions
// ABOUTME: Maps completion failures to 400/500/503 and wraps successes as {success, content, usage}
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrically_core::constants::{generation, service_names};
use metrically_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::extract::{ApiJson, ApiQuery};
use super::kpi::SqlRequest;
use crate::kpi::prompts::DEFAULT_SYSTEM_MESSAGE;
use crate::kpi::{BusinessProfile, OutputFormat};
use crate::llm::{CompletionRequest, TokenUsage};
use crate::middleware::AuthenticatedUser;
use crate::resources::ServerResources;

/// Provider availability as reported by `/ai/status`
#[derive(Debug, Clone, Serialize)]
pub struct AiStatus {
    /// Provider display name
    pub service: &'static str,
    /// True iff credentials are configured
    pub available: bool,
    /// Deployment name when available
    pub deployment: Option<String>,
}

/// Query string of `/ai/generate-kpi`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GenerateKpiQuery {
    /// `structured` (default) or `markdown`
    #[serde(default)]
    pub output_format: OutputFormat,
}

/// Free-form completion payload
#[derive(Debug, Clone, Deserialize)]
pub struct AiPromptRequest {
    /// User prompt
    pub prompt: String,
    /// System message; a general assistant persona when absent
    #[serde(default)]
    pub system_message: Option<String>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Token budget
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Request a JSON document instead of text
    #[serde(default)]
    pub structured_output: Option<bool>,
    /// Schema for structured output, required when `structured_output` is set
    #[serde(default)]
    pub output_schema: Option<Value>,
}

impl AiPromptRequest {
    /// Convert into a completion request with defaults applied
    ///
    /// # Errors
    ///
    /// Returns `MISSING_REQUIRED_FIELD` when structured output is requested without a schema
    pub fn into_completion_request(self) -> AppResult<CompletionRequest> {
        let system_message = self
            .system_message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_owned());

        let request = CompletionRequest::text(system_message, self.prompt)
            .with_temperature(
                self.temperature
                    .unwrap_or(generation::DEFAULT_TEMPERATURE),
            )
            .with_max_tokens(self.max_tokens.unwrap_or(generation::DEFAULT_MAX_TOKENS));

        if !self.structured_output.unwrap_or(false) {
            return Ok(request);
        }
        let Some(schema) = self.output_schema else {
            return Err(AppError::missing_field(
                "output_schema is required when structured_output is true",
            ));
        };
        Ok(request.structured(schema))
    }
}

/// Successful generation body
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResponse<T> {
    /// Always `true`; failures use the error body
    pub success: bool,
    /// Generated content
    pub content: T,
    /// Token accounting when reported by the provider
    pub usage: Option<TokenUsage>,
}

impl<T: Serialize> GenerationResponse<T> {
    fn ok(content: T, usage: Option<TokenUsage>) -> Response {
        let body = Self {
            success: true,
            content,
            usage,
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

/// AI routes handler
pub struct AiRoutes;

impl AiRoutes {
    /// Create `/ai/*` routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/ai/status", get(Self::handle_status))
            .route("/ai/generate-kpi", post(Self::handle_generate_kpi))
            .route("/ai/generate-sql", post(Self::handle_generate_sql))
            .route("/ai/completion", post(Self::handle_completion))
            .with_state(resources)
    }

    /// Handle GET /ai/status
    async fn handle_status(State(resources): State<Arc<ServerResources>>) -> Json<AiStatus> {
        let service = &resources.kpi_service;
        Json(AiStatus {
            service: service_names::AZURE_OPENAI,
            available: service.is_available(),
            deployment: service.deployment().map(ToOwned::to_owned),
        })
    }

    /// Handle POST /ai/generate-kpi
    async fn handle_generate_kpi(
        State(resources): State<Arc<ServerResources>>,
        _user: AuthenticatedUser,
        ApiQuery(query): ApiQuery<GenerateKpiQuery>,
        ApiJson(profile): ApiJson<BusinessProfile>,
    ) -> Result<Response, AppError> {
        let generation = resources
            .kpi_service
            .generate_kpi_system(&profile, query.output_format)
            .await
            .map_err(|e| e.into_app_error("Failed to generate KPI system"))?;

        Ok(GenerationResponse::ok(generation.content, generation.usage))
    }

    /// Handle POST /ai/generate-sql
    async fn handle_generate_sql(
        State(resources): State<Arc<ServerResources>>,
        _user: AuthenticatedUser,
        ApiJson(request): ApiJson<SqlRequest>,
    ) -> Result<Response, AppError> {
        let generation = resources
            .kpi_service
            .generate_sql_for_metric(
                &request.metric_name,
                &request.metric_calculation,
                &request.tech_stack,
            )
            .await
            .map_err(|e| e.into_app_error("Failed to generate SQL"))?;

        Ok(GenerationResponse::ok(generation.sql, generation.usage))
    }

    /// Handle POST /ai/completion
    async fn handle_completion(
        State(resources): State<Arc<ServerResources>>,
        _user: AuthenticatedUser,
        ApiJson(request): ApiJson<AiPromptRequest>,
    ) -> Result<Response, AppError> {
        let request = request.into_completion_request()?;
        let completion = resources
            .kpi_service
            .complete(&request)
            .await
            .map_err(|e| e.into_app_error("Failed to generate completion"))?;

        Ok(GenerationResponse::ok(completion.content, completion.usage))
    }
}
