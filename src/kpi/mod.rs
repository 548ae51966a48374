// ABOUTME: KPI generation domain: business profiles, prompts, response shaping, and orchestration
// ABOUTME: Composes prompt building, the completion adapter, and response shaping per use case
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! # KPI Generation
//!
//! Data flows one way: a [`BusinessProfile`] becomes a prompt
//! ([`prompts`]), the prompt goes through the
//! [`CompletionAdapter`](crate::llm::CompletionAdapter), and the output is
//! shaped ([`shaper`]) before it reaches the caller. [`KpiService`] wires the
//! three together; [`catalog`] serves fixed examples without any provider.

/// Fixed illustrative KPI systems
pub mod catalog;
/// Prompt construction
pub mod prompts;
/// KPI orchestration service
pub mod service;
/// Post-processing of provider output
pub mod shaper;

pub use catalog::{example_systems, ExampleSystem};
pub use service::{sql_failure_comment, KpiContent, KpiGeneration, KpiService, SqlGeneration};
pub use shaper::{
    analyze_response, shape_kpi_system, DashboardRecommendation, KpiCategory, KpiMetric,
    KpiReport, KpiSystem, ResponseAnalysis,
};

use metrically_core::errors::{AppError, AppResult};
use serde::{Deserialize, Deserializer, Serialize};

/// Business-profile input for KPI generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessProfile {
    /// Product type, e.g. `SaaS`
    #[serde(default)]
    pub product_type: String,
    /// Company stage, e.g. `Seed`
    #[serde(default)]
    pub company_stage: String,
    /// Data stack, e.g. `PostgreSQL`
    #[serde(default)]
    pub tech_stack: String,
    /// Industry vertical
    #[serde(default)]
    pub industry: Option<String>,
    /// Business model
    #[serde(default)]
    pub business_model: Option<String>,
    /// Strategic focus areas in priority order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub strategic_focus: Vec<String>,
    /// Free-text context appended verbatim to the prompt
    #[serde(default, alias = "custom_prompt")]
    pub custom_context: Option<String>,
}

impl BusinessProfile {
    /// Profile with the three required fields
    #[must_use]
    pub fn new(
        product_type: impl Into<String>,
        company_stage: impl Into<String>,
        tech_stack: impl Into<String>,
    ) -> Self {
        Self {
            product_type: product_type.into(),
            company_stage: company_stage.into(),
            tech_stack: tech_stack.into(),
            ..Self::default()
        }
    }

    /// Set the industry
    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Set the business model
    #[must_use]
    pub fn with_business_model(mut self, business_model: impl Into<String>) -> Self {
        self.business_model = Some(business_model.into());
        self
    }

    /// Set the strategic focus areas
    #[must_use]
    pub fn with_strategic_focus<I, S>(mut self, focus: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strategic_focus = focus.into_iter().map(Into::into).collect();
        self
    }

    /// Set the custom context block
    #[must_use]
    pub fn with_custom_context(mut self, context: impl Into<String>) -> Self {
        self.custom_context = Some(context.into());
        self
    }

    /// Reject blank required fields
    ///
    /// # Errors
    ///
    /// Returns `MISSING_REQUIRED_FIELD` when product type, stage, or tech stack is blank
    pub fn validate(&self) -> AppResult<()> {
        if self.product_type.trim().is_empty()
            || self.company_stage.trim().is_empty()
            || self.tech_stack.trim().is_empty()
        {
            return Err(AppError::missing_field("Missing required parameters"));
        }
        Ok(())
    }
}

/// Output shape requested for full KPI generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON document conforming to the KPI schema
    #[default]
    Structured,
    /// Free-form markdown text
    Markdown,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Trimmed, non-empty view of an optional field
pub(crate) fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}
