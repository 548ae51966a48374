// ABOUTME: Azure OpenAI chat-completions provider over reqwest
// ABOUTME: Builds deployment URLs, sends api-key authenticated requests, and maps API errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! # Azure `OpenAI` Provider
//!
//! Talks to `{endpoint}/openai/deployments/{deployment}/chat/completions`
//! with the `api-key` header. Connect and request timeouts are set on the
//! client; a request timeout surfaces as `EXTERNAL_TIMEOUT`.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};

use super::{
    ChatMessage, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider, ResponseFormat,
    TokenUsage,
};
use crate::config::AzureOpenAiConfig;
use metrically_core::constants::service_names;
use metrically_core::errors::{AppError, ErrorCode};

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AzureRequest<'a> {
    messages: Vec<AzureMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<AzureResponseFormat>,
}

#[derive(Debug, Serialize)]
struct AzureMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for AzureMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.role.as_str(),
            content: &msg.content,
        }
    }
}

#[derive(Debug, Serialize)]
struct AzureResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct AzureResponse {
    choices: Vec<AzureChoice>,
    #[serde(default)]
    usage: Option<AzureUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AzureChoice {
    message: AzureResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AzureResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AzureUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AzureErrorResponse {
    error: AzureErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AzureErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Azure `OpenAI` chat-completions provider
pub struct AzureOpenAiProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
    capabilities: LlmCapabilities,
    request_timeout_secs: u64,
}

impl AzureOpenAiProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if key or endpoint is missing, or the HTTP client
    /// cannot be created.
    pub fn new(config: &AzureOpenAiConfig) -> Result<Self, AppError> {
        let (Some(api_key), Some(endpoint)) = (&config.api_key, &config.endpoint) else {
            return Err(AppError::new(
                ErrorCode::ConfigMissing,
                "Azure OpenAI API key or endpoint not configured",
            ));
        };

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        let mut capabilities = LlmCapabilities::text_only();
        if config.json_mode {
            capabilities |= LlmCapabilities::JSON_MODE;
        }

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            api_key: api_key.expose().to_owned(),
            api_version: config.api_version.clone(),
            deployment: config.deployment.clone(),
            capabilities,
            request_timeout_secs: config.request_timeout_secs,
        })
    }

    /// Build the chat-completions URL for a deployment
    fn api_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{deployment}/chat/completions?api-version={}",
            self.endpoint, self.api_version
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("api-key", &self.api_key)
    }

    /// Parse error response from API
    fn parse_error_response(status: StatusCode, body: &str) -> AppError {
        let service = service_names::AZURE_OPENAI;
        if let Ok(error_response) = serde_json::from_str::<AzureErrorResponse>(body) {
            let message = error_response.error.message;
            match status.as_u16() {
                401 | 403 => {
                    AppError::external_service(service, format!("API authentication failed: {message}"))
                }
                429 => AppError::external_service(service, format!("Rate limit reached: {message}")),
                400 => AppError::external_service(service, format!("API validation error: {message}")),
                404 => AppError::external_service(
                    service,
                    format!("Deployment or endpoint not found: {message}"),
                ),
                _ => {
                    let code = error_response
                        .error
                        .code
                        .unwrap_or_else(|| "unknown".to_owned());
                    AppError::external_service(service, format!("{code} - {message}"))
                }
            }
        } else {
            AppError::external_service(
                service,
                format!(
                    "API error ({}): {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ),
            )
        }
    }

    fn transport_error(&self, error: &reqwest::Error) -> AppError {
        error!("Failed to send request to Azure OpenAI: {}", error);
        if error.is_timeout() {
            AppError::external_timeout(service_names::AZURE_OPENAI, self.request_timeout_secs)
        } else if error.is_connect() {
            AppError::external_service(
                service_names::AZURE_OPENAI,
                format!("Cannot connect to {}", self.endpoint),
            )
        } else {
            AppError::external_service(
                service_names::AZURE_OPENAI,
                format!("Failed to connect: {error}"),
            )
        }
    }
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    fn name(&self) -> &'static str {
        "azure-openai"
    }

    fn display_name(&self) -> &'static str {
        service_names::AZURE_OPENAI
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        &self.deployment
    }

    #[instrument(skip(self, request), fields(deployment = %request.model.as_deref().unwrap_or(self.default_model())))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let deployment = request.model.as_deref().unwrap_or(self.default_model());

        let response_format = match request.response_format {
            Some(ResponseFormat::JsonObject) if self.capabilities.supports_json_mode() => {
                Some(AzureResponseFormat {
                    format_type: "json_object",
                })
            }
            _ => None,
        };

        let body = AzureRequest {
            messages: request.messages.iter().map(AzureMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
            response_format,
        };

        for (i, msg) in body.messages.iter().enumerate() {
            debug!("Message[{i}] role={}, content_len={}", msg.role, msg.content.len());
        }

        let response = self
            .authorize(self.client.post(self.api_url(deployment)))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &text));
        }

        let parsed: AzureResponse = serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse Azure OpenAI response: {}", e);
            AppError::external_service(
                service_names::AZURE_OPENAI,
                format!("Failed to parse response: {e}"),
            )
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            AppError::external_service(service_names::AZURE_OPENAI, "API returned no choices")
        })?;

        let content = choice.message.content.ok_or_else(|| {
            AppError::external_service(service_names::AZURE_OPENAI, "API returned no content")
        })?;

        debug!(
            content_len = content.len(),
            finish_reason = ?choice.finish_reason,
            "Received response from Azure OpenAI"
        );

        Ok(ChatResponse {
            content,
            model: parsed.model.unwrap_or_else(|| deployment.to_owned()),
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}
