// ABOUTME: KPI orchestration service composing prompts, the completion adapter, and shaping
// ABOUTME: Explicitly constructed and injected; holds no state besides the adapter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use serde::Serialize;
use tracing::{info, instrument};

use super::prompts::{
    build_kpi_prompt, build_legacy_kpi_prompt, build_sql_prompt, kpi_output_schema,
    KPI_ARCHITECT_SYSTEM_MESSAGE, SQL_EXPERT_SYSTEM_MESSAGE,
};
use super::shaper::{shape_kpi_system, KpiReport, KpiSystem};
use super::{BusinessProfile, OutputFormat};
use crate::llm::{
    CompletionAdapter, CompletionError, CompletionRequest, CompletionResult, TokenUsage,
};
use metrically_core::constants::{generation, messages};
use metrically_core::errors::AppError;

/// Generated KPI system content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum KpiContent {
    /// Parsed, schema-shaped system
    Structured(KpiSystem),
    /// Markdown text, returned without heuristics
    Markdown(String),
}

/// Result of full KPI generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KpiGeneration {
    /// Generated content
    pub content: KpiContent,
    /// Token accounting
    pub usage: Option<TokenUsage>,
}

/// Result of single-metric SQL generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlGeneration {
    /// Trimmed SQL text
    pub sql: String,
    /// Token accounting
    pub usage: Option<TokenUsage>,
}

/// KPI orchestration service
#[derive(Clone)]
pub struct KpiService {
    adapter: CompletionAdapter,
}

impl KpiService {
    /// Create the service around an adapter
    #[must_use]
    pub const fn new(adapter: CompletionAdapter) -> Self {
        Self { adapter }
    }

    /// True iff the provider is configured; no network call
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.adapter.is_available()
    }

    /// Deployment name when available
    #[must_use]
    pub fn deployment(&self) -> Option<&str> {
        self.adapter.deployment()
    }

    /// Generate a full KPI system
    ///
    /// # Errors
    ///
    /// Returns the adapter failure unchanged; blank required profile fields
    /// are rejected before any provider call
    #[instrument(skip(self, profile), fields(product_type = %profile.product_type, format = ?format))]
    pub async fn generate_kpi_system(
        &self,
        profile: &BusinessProfile,
        format: OutputFormat,
    ) -> Result<KpiGeneration, CompletionError> {
        validate_profile(profile)?;

        let mut request =
            CompletionRequest::text(KPI_ARCHITECT_SYSTEM_MESSAGE, build_kpi_prompt(profile))
                .with_temperature(generation::KPI_TEMPERATURE)
                .with_max_tokens(generation::KPI_MAX_TOKENS);
        if format == OutputFormat::Structured {
            request = request.structured(kpi_output_schema());
        }

        let completion = self.adapter.complete(&request).await?;
        let content = match format {
            OutputFormat::Structured => {
                let system = shape_kpi_system(&completion)?;
                info!(metrics = system.metrics.len(), "KPI system generated");
                KpiContent::Structured(system)
            }
            OutputFormat::Markdown => KpiContent::Markdown(completion.raw_text),
        };

        Ok(KpiGeneration {
            content,
            usage: completion.usage,
        })
    }

    /// Generate a KPI system as annotated free text (single-profile path)
    ///
    /// # Errors
    ///
    /// Returns the adapter failure unchanged
    #[instrument(skip(self, profile), fields(product_type = %profile.product_type))]
    pub async fn generate_kpi_report(
        &self,
        profile: &BusinessProfile,
    ) -> Result<KpiReport, CompletionError> {
        validate_profile(profile)?;

        let request = CompletionRequest::text(
            KPI_ARCHITECT_SYSTEM_MESSAGE,
            build_legacy_kpi_prompt(profile),
        )
        .with_temperature(generation::KPI_TEMPERATURE)
        .with_max_tokens(generation::LEGACY_KPI_MAX_TOKENS)
        .with_top_p(generation::LEGACY_KPI_TOP_P);

        let completion = self.adapter.complete(&request).await?;
        Ok(KpiReport::new(completion.raw_text, profile.tech_stack.trim()))
    }

    /// Generate SQL computing one metric
    ///
    /// # Errors
    ///
    /// Returns the adapter failure unchanged
    #[instrument(skip(self, metric_calculation))]
    pub async fn generate_sql_for_metric(
        &self,
        metric_name: &str,
        metric_calculation: &str,
        tech_stack: &str,
    ) -> Result<SqlGeneration, CompletionError> {
        if metric_name.trim().is_empty()
            || metric_calculation.trim().is_empty()
            || tech_stack.trim().is_empty()
        {
            return Err(CompletionError::invalid_request(AppError::missing_field(
                "metric_name, metric_calculation and tech_stack are required",
            )));
        }

        let request = CompletionRequest::text(
            SQL_EXPERT_SYSTEM_MESSAGE,
            build_sql_prompt(metric_name, metric_calculation, tech_stack),
        )
        .with_temperature(generation::SQL_TEMPERATURE)
        .with_max_tokens(generation::SQL_MAX_TOKENS);

        let completion = self.adapter.complete(&request).await?;
        Ok(SqlGeneration {
            sql: completion.raw_text.trim().to_owned(),
            usage: completion.usage,
        })
    }

    /// Free-form completion passthrough
    ///
    /// # Errors
    ///
    /// Returns the adapter failure unchanged
    pub async fn complete(&self, request: &CompletionRequest) -> CompletionResult {
        self.adapter.complete(request).await
    }
}

/// Comment returned in place of SQL when generation fails
#[must_use]
pub const fn sql_failure_comment(error: &CompletionError) -> &'static str {
    match error {
        CompletionError::ProviderUnavailable => messages::SQL_FAILURE_UNAVAILABLE,
        _ => messages::SQL_FAILURE_ERROR,
    }
}

fn validate_profile(profile: &BusinessProfile) -> Result<(), CompletionError> {
    profile.validate().map_err(CompletionError::invalid_request)
}
