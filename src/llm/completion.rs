// ABOUTME: Completion adapter that turns one request into exactly one provider call
// ABOUTME: Validates parameters, injects structured-output instructions, and classifies failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{AzureOpenAiProvider, ChatMessage, ChatRequest, LlmProvider, ResponseFormat, TokenUsage};
use crate::config::AzureOpenAiConfig;
use crate::kpi::shaper::parse_structured_json;
use metrically_core::constants::{generation, messages};
use metrically_core::errors::{AppError, AppResult, ErrorCode};

/// How the provider output should be interpreted
#[derive(Debug, Clone, PartialEq)]
pub enum OutputMode {
    /// Free-form text returned as-is
    Text,
    /// JSON document conforming to `schema`
    Structured {
        /// JSON-schema-shaped object describing the expected document
        schema: Value,
    },
}

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System message setting model behaviour
    pub system_message: String,
    /// User prompt
    pub user_prompt: String,
    /// Sampling temperature in `[0, 1]`
    pub temperature: f32,
    /// Token budget, must be positive
    pub max_tokens: u32,
    /// Optional nucleus sampling
    pub top_p: Option<f32>,
    /// Output interpretation
    pub output: OutputMode,
}

impl CompletionRequest {
    /// Free-form request with default sampling parameters
    #[must_use]
    pub fn text(system_message: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_message: system_message.into(),
            user_prompt: user_prompt.into(),
            temperature: generation::DEFAULT_TEMPERATURE,
            max_tokens: generation::DEFAULT_MAX_TOKENS,
            top_p: None,
            output: OutputMode::Text,
        }
    }

    /// Switch to structured output against `schema`
    #[must_use]
    pub fn structured(mut self, schema: Value) -> Self {
        self.output = OutputMode::Structured { schema };
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the token budget
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set nucleus sampling
    #[must_use]
    pub const fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Check parameters before any provider call
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` or `MISSING_REQUIRED_FIELD` describing the
    /// first violated constraint
    pub fn validate(&self) -> AppResult<()> {
        if self.user_prompt.trim().is_empty() {
            return Err(AppError::missing_field("prompt must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(AppError::invalid_input(format!(
                "temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AppError::invalid_input("max_tokens must be positive"));
        }
        if let Some(top_p) = self.top_p {
            if !(top_p > 0.0 && top_p <= 1.0) {
                return Err(AppError::invalid_input(format!(
                    "top_p must be in (0, 1], got {top_p}"
                )));
            }
        }
        if let OutputMode::Structured { schema } = &self.output {
            if !schema.is_object() {
                return Err(AppError::invalid_input("output_schema must be a JSON object"));
            }
        }
        Ok(())
    }

    fn system_message_for_output(&self) -> String {
        match &self.output {
            OutputMode::Text => self.system_message.clone(),
            OutputMode::Structured { schema } => {
                let schema_text =
                    serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
                format!(
                    "{}\n\nYou MUST format your response as a JSON object that conforms to the following schema:\n{schema_text}\n\nDo not include any explanatory text outside the JSON structure.",
                    self.system_message
                )
            }
        }
    }
}

/// Successful completion payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompletionContent {
    /// Free-form text
    Text(String),
    /// Parsed JSON document
    Structured(Value),
}

/// A successful completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Text or parsed document
    pub content: CompletionContent,
    /// Provider output before parsing
    pub raw_text: String,
    /// Model that answered
    pub model: String,
    /// Token accounting when the provider reports it
    pub usage: Option<TokenUsage>,
}

/// Why a completion did not produce a usable result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// Request parameters were rejected before any provider call
    #[error("{message}")]
    InvalidRequest {
        /// `INVALID_INPUT` or `MISSING_REQUIRED_FIELD`
        code: ErrorCode,
        /// Violated constraint
        message: String,
    },
    /// No provider credentials are configured
    #[error("Azure OpenAI client not initialized")]
    ProviderUnavailable,
    /// Provider was reached but failed, or could not be reached
    #[error("{0}")]
    ProviderError(String),
    /// Provider did not answer within the configured bound
    #[error("provider did not respond within {seconds}s")]
    Timeout {
        /// Configured bound
        seconds: u64,
    },
    /// Provider answered but the structured output did not parse
    #[error("Failed to parse structured output: {reason}")]
    MalformedStructuredOutput {
        /// Provider output exactly as received
        raw_text: String,
        /// Parser diagnostic
        reason: String,
    },
}

impl CompletionError {
    /// Keep the validation code of a rejected request
    #[must_use]
    pub fn invalid_request(error: AppError) -> Self {
        Self::InvalidRequest {
            code: error.code,
            message: error.message,
        }
    }

    fn from_provider(error: AppError, timeout_secs: u64) -> Self {
        if error.code == ErrorCode::ExternalTimeout {
            Self::Timeout {
                seconds: timeout_secs,
            }
        } else {
            Self::ProviderError(error.message)
        }
    }

    /// Convert into an HTTP-facing error; `context` prefixes generation failures
    #[must_use]
    pub fn into_app_error(self, context: &str) -> AppError {
        match self {
            Self::InvalidRequest { code, message } => AppError::new(code, message),
            Self::ProviderUnavailable => {
                AppError::external_unavailable(messages::PROVIDER_UNAVAILABLE)
            }
            Self::ProviderError(message) => AppError::new(
                ErrorCode::ExternalServiceError,
                format!("{context}: {message}"),
            ),
            Self::Timeout { seconds } => AppError::new(
                ErrorCode::ExternalTimeout,
                format!("{context}: provider did not respond within {seconds}s"),
            ),
            Self::MalformedStructuredOutput { raw_text, reason } => AppError::new(
                ErrorCode::MalformedStructuredOutput,
                format!("{context}: Failed to parse structured output ({reason})"),
            )
            .with_details(serde_json::json!({ "raw_content": raw_text })),
        }
    }
}

/// Result of one completion call
pub type CompletionResult = Result<Completion, CompletionError>;

/// Adapter between the KPI service and a chat-completion provider
#[derive(Clone)]
pub struct CompletionAdapter {
    provider: Option<Arc<dyn LlmProvider>>,
    deployment: String,
    request_timeout: Duration,
}

impl CompletionAdapter {
    /// Build from configuration
    ///
    /// Missing key or endpoint yields an unconfigured adapter; no network
    /// traffic happens here.
    ///
    /// # Errors
    ///
    /// Returns an error only if the HTTP client cannot be constructed
    pub fn from_config(config: &AzureOpenAiConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        if !config.is_configured() {
            warn!("Azure OpenAI API key or endpoint not configured");
            return Ok(Self::unconfigured(config.deployment.clone(), timeout));
        }

        let provider = AzureOpenAiProvider::new(config)?;
        info!(
            provider = provider.display_name(),
            deployment = %config.deployment,
            json_mode = config.json_mode,
            "Azure OpenAI provider initialized"
        );
        Ok(Self::with_provider(
            Arc::new(provider),
            config.deployment.clone(),
            timeout,
        ))
    }

    /// Adapter backed by an explicit provider
    #[must_use]
    pub fn with_provider(
        provider: Arc<dyn LlmProvider>,
        deployment: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            provider: Some(provider),
            deployment: deployment.into(),
            request_timeout,
        }
    }

    /// Adapter that reports itself unavailable
    #[must_use]
    pub fn unconfigured(deployment: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            provider: None,
            deployment: deployment.into(),
            request_timeout,
        }
    }

    /// True iff credentials are configured; never touches the network
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Configured deployment, only when available
    #[must_use]
    pub fn deployment(&self) -> Option<&str> {
        self.provider.as_ref().map(|_| self.deployment.as_str())
    }

    /// Perform exactly one provider call
    ///
    /// # Errors
    ///
    /// Every failure is classified into one [`CompletionError`] variant
    pub async fn complete(&self, request: &CompletionRequest) -> CompletionResult {
        request.validate().map_err(CompletionError::invalid_request)?;

        let Some(provider) = &self.provider else {
            return Err(CompletionError::ProviderUnavailable);
        };

        let chat_request = self.build_chat_request(request, provider.as_ref());
        let structured = matches!(request.output, OutputMode::Structured { .. });
        let timeout_secs = self.request_timeout.as_secs();

        debug!(
            provider = provider.name(),
            prompt_len = request.user_prompt.len(),
            structured,
            "Dispatching completion request"
        );

        let started = Instant::now();
        let response = match timeout(self.request_timeout, provider.complete(&chat_request)).await
        {
            Err(_) => {
                warn!(provider = provider.name(), timeout_secs, "Completion request timed out");
                return Err(CompletionError::Timeout {
                    seconds: timeout_secs,
                });
            }
            Ok(Err(error)) => {
                warn!(
                    provider = provider.name(),
                    code = ?error.code,
                    "Completion request failed: {}",
                    error.message
                );
                return Err(CompletionError::from_provider(error, timeout_secs));
            }
            Ok(Ok(response)) => response,
        };

        info!(
            provider = provider.name(),
            model = %response.model,
            structured,
            duration_ms = started.elapsed().as_millis() as u64,
            total_tokens = response.usage.map(|u| u.total_tokens),
            "Completion received"
        );

        let content = if structured {
            CompletionContent::Structured(parse_structured_json(&response.content)?)
        } else {
            CompletionContent::Text(response.content.clone())
        };

        Ok(Completion {
            content,
            raw_text: response.content,
            model: response.model,
            usage: response.usage,
        })
    }

    fn build_chat_request(&self, request: &CompletionRequest, provider: &dyn LlmProvider) -> ChatRequest {
        let messages = vec![
            ChatMessage::system(request.system_message_for_output()),
            ChatMessage::user(request.user_prompt.clone()),
        ];

        let mut chat = ChatRequest::new(messages)
            .with_model(self.deployment.clone())
            .with_temperature(request.temperature)
            .with_max_tokens(request.max_tokens);

        if let Some(top_p) = request.top_p {
            chat = chat.with_top_p(top_p);
        }
        if matches!(request.output, OutputMode::Structured { .. })
            && provider.capabilities().supports_json_mode()
        {
            chat = chat.with_response_format(ResponseFormat::JsonObject);
        }
        chat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use serde_json::json;

    #[test]
    fn test_validate_rejects_out_of_range_parameters() {
        let base = CompletionRequest::text("s", "p");
        assert!(base.validate().is_ok());
        assert!(base.clone().with_temperature(1.5).validate().is_err());
        assert!(base.clone().with_temperature(-0.1).validate().is_err());
        assert!(base.clone().with_max_tokens(0).validate().is_err());
        assert!(CompletionRequest::text("s", "   ").validate().is_err());
        assert!(base.structured(json!("not an object")).validate().is_err());
    }

    #[test]
    fn test_structured_system_message_embeds_schema() {
        let request = CompletionRequest::text("Base.", "p").structured(json!({"type": "object"}));
        let system = request.system_message_for_output();
        assert!(system.starts_with("Base.\n\nYou MUST format your response as a JSON object"));
        assert!(system.contains("\"type\": \"object\""));
        assert!(system.ends_with("Do not include any explanatory text outside the JSON structure."));
    }

    #[test]
    fn test_unconfigured_adapter() {
        let adapter = CompletionAdapter::unconfigured("gpt-4", Duration::from_secs(1));
        assert!(!adapter.is_available());
        assert_eq!(adapter.deployment(), None);
    }

    fn azure_config(key: Option<&str>, endpoint: Option<&str>) -> AzureOpenAiConfig {
        AzureOpenAiConfig {
            api_key: key.map(|k| Secret::new(k.to_owned())),
            endpoint: endpoint.map(ToOwned::to_owned),
            deployment: "kpi-gpt4".to_owned(),
            ..AzureOpenAiConfig::default()
        }
    }

    #[test]
    fn test_from_config_requires_key_and_endpoint() {
        let key_only = CompletionAdapter::from_config(&azure_config(Some("key"), None)).unwrap();
        assert!(!key_only.is_available());
        assert_eq!(key_only.deployment(), None);

        let endpoint_only = CompletionAdapter::from_config(&azure_config(
            None,
            Some("https://metrically.openai.azure.com"),
        ))
        .unwrap();
        assert!(!endpoint_only.is_available());
        assert_eq!(endpoint_only.deployment(), None);
    }

    #[test]
    fn test_from_config_with_credentials_is_available() {
        let adapter = CompletionAdapter::from_config(&azure_config(
            Some("key"),
            Some("https://metrically.openai.azure.com"),
        ))
        .unwrap();
        assert!(adapter.is_available());
        assert_eq!(adapter.deployment(), Some("kpi-gpt4"));
    }

    #[tokio::test]
    async fn test_unconfigured_adapter_fails_without_network() {
        let adapter = CompletionAdapter::from_config(&azure_config(None, None)).unwrap();
        let error = adapter
            .complete(&CompletionRequest::text("s", "p"))
            .await
            .unwrap_err();
        assert_eq!(error, CompletionError::ProviderUnavailable);
    }

    #[test]
    fn test_malformed_output_keeps_raw_text_in_details() {
        let error = CompletionError::MalformedStructuredOutput {
            raw_text: "not json".to_owned(),
            reason: "expected value".to_owned(),
        }
        .into_app_error("Failed to generate completion");
        assert_eq!(error.code, ErrorCode::MalformedStructuredOutput);
        assert_eq!(
            error.details.unwrap()["raw_content"],
            json!("not json")
        );
    }

    #[test]
    fn test_invalid_request_keeps_validation_code() {
        let missing = CompletionError::invalid_request(AppError::missing_field("blank"))
            .into_app_error("ctx");
        assert_eq!(missing.code, ErrorCode::MissingRequiredField);
        assert_eq!(missing.message, "blank");

        let invalid = CompletionError::invalid_request(AppError::invalid_input("bad"))
            .into_app_error("ctx");
        assert_eq!(invalid.code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_unavailable_maps_to_503() {
        let error = CompletionError::ProviderUnavailable.into_app_error("ctx");
        assert_eq!(error.http_status(), 503);
    }
}
