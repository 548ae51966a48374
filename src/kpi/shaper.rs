// ABOUTME: Post-processing of provider output for KPI generation
// ABOUTME: Keyword heuristics for free text and strict JSON shaping for structured output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::llm::{Completion, CompletionContent, CompletionError};

/// Keyword heuristics over free-form KPI text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseAnalysis {
    /// Case-insensitive occurrences of `metric`
    pub metrics_count: usize,
    /// Mentions `sql`
    pub has_sql: bool,
    /// Mentions `visualization` or `chart`
    pub has_visualizations: bool,
    /// Mentions `benchmark` or `target`
    pub has_benchmarks: bool,
}

/// Compute the heuristics for `raw_text`
#[must_use]
pub fn analyze_response(raw_text: &str) -> ResponseAnalysis {
    let lower = raw_text.to_lowercase();
    ResponseAnalysis {
        metrics_count: lower.matches("metric").count(),
        has_sql: lower.contains("sql"),
        has_visualizations: lower.contains("visualization") || lower.contains("chart"),
        has_benchmarks: lower.contains("benchmark") || lower.contains("target"),
    }
}

/// Response body for single-profile KPI generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiReport {
    /// Provider text as received
    pub raw_response: String,
    /// Tech stack from the request
    pub tech_stack: String,
    /// Keyword heuristics
    #[serde(flatten)]
    pub analysis: ResponseAnalysis,
}

impl KpiReport {
    /// Annotate raw text with heuristics
    #[must_use]
    pub fn new(raw_response: String, tech_stack: impl Into<String>) -> Self {
        let analysis = analyze_response(&raw_response);
        Self {
            raw_response,
            tech_stack: tech_stack.into(),
            analysis,
        }
    }
}

/// Metric category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KpiCategory {
    /// How customers find the product
    Acquisition,
    /// Initial product engagement
    Activation,
    /// Ongoing product engagement
    Retention,
    /// Monetization
    Revenue,
}

impl KpiCategory {
    /// Canonical name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acquisition => "Acquisition",
            Self::Activation => "Activation",
            Self::Retention => "Retention",
            Self::Revenue => "Revenue",
        }
    }
}

impl fmt::Display for KpiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KpiCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let name = normalized
            .strip_suffix(" metrics")
            .unwrap_or(&normalized)
            .trim();
        match name {
            "acquisition" => Ok(Self::Acquisition),
            "activation" => Ok(Self::Activation),
            "retention" => Ok(Self::Retention),
            "revenue" => Ok(Self::Revenue),
            _ => Err(format!("unknown metric category '{s}'")),
        }
    }
}

impl Serialize for KpiCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for KpiCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One metric in a structured KPI system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiMetric {
    /// Funnel category
    pub category: KpiCategory,
    /// Metric name
    pub name: String,
    /// What it measures
    #[serde(default)]
    pub description: String,
    /// Calculation formula
    #[serde(default)]
    pub calculation: String,
    /// Why it matters
    #[serde(default)]
    pub importance: String,
    /// SQL computing the metric
    #[serde(default)]
    pub sql_query: String,
    /// Suggested visualization
    #[serde(default)]
    pub visualization: String,
    /// Benchmark or target
    #[serde(default)]
    pub benchmark: String,
}

/// Dashboard grouping related metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRecommendation {
    /// Dashboard name
    pub name: String,
    /// Purpose
    #[serde(default)]
    pub description: String,
    /// Names of the metrics shown
    #[serde(rename = "included_metrics", default)]
    pub included_metric_names: Vec<String>,
}

/// Structured KPI system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiSystem {
    /// Metrics in model order
    pub metrics: Vec<KpiMetric>,
    /// Dashboards in model order
    pub dashboard_recommendations: Vec<DashboardRecommendation>,
    /// Overall summary
    pub summary: String,
}

/// Parse provider text as a JSON object
///
/// A surrounding markdown code fence is stripped first.
///
/// # Errors
///
/// Returns `MalformedStructuredOutput` carrying `raw` unchanged when the text
/// is not a JSON object
pub fn parse_structured_json(raw: &str) -> Result<Value, CompletionError> {
    let malformed = |reason: String| CompletionError::MalformedStructuredOutput {
        raw_text: raw.to_owned(),
        reason,
    };

    let value: Value =
        serde_json::from_str(strip_code_fence(raw)).map_err(|e| malformed(e.to_string()))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(malformed("expected a JSON object".to_owned()))
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.find('\n').map_or("", |newline| &rest[newline + 1..]);
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Deserialize a structured completion into a [`KpiSystem`]
///
/// # Errors
///
/// Returns `MalformedStructuredOutput` retaining the raw text when the
/// document does not have the KPI shape
pub fn shape_kpi_system(completion: &Completion) -> Result<KpiSystem, CompletionError> {
    let value = match &completion.content {
        CompletionContent::Structured(value) => value.clone(),
        CompletionContent::Text(text) => parse_structured_json(text)?,
    };
    serde_json::from_value(value).map_err(|e| CompletionError::MalformedStructuredOutput {
        raw_text: completion.raw_text.clone(),
        reason: e.to_string(),
    })
}
