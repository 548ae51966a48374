// ABOUTME: Deterministic prompt builders for KPI-system and single-metric SQL generation
// ABOUTME: Also owns the fixed system messages and the KPI output JSON schema
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use serde_json::{json, Value};

use super::{present, BusinessProfile};

/// System message for KPI-system generation
pub const KPI_ARCHITECT_SYSTEM_MESSAGE: &str =
    "You are an expert KPI architect and data analyst for startups.";

/// System message for SQL generation
pub const SQL_EXPERT_SYSTEM_MESSAGE: &str =
    "You are a SQL expert that creates clean, efficient queries.";

/// Default system message for free-form completions
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Categories the model must group metrics into
pub const KPI_CATEGORIES: [&str; 4] = ["Acquisition", "Activation", "Retention", "Revenue"];

const METRICS_SECTION: &str = "1. METRICS: A list of 6-8 KEY metrics this startup should track, divided into these categories:
   - Acquisition metrics (how customers find them)
   - Activation metrics (initial product engagement)
   - Retention metrics (ongoing product engagement)
   - Revenue metrics (monetization)
   - Each metric should have a name, description, calculation formula, and why it matters.";

const VISUALIZATION_SECTION: &str = "3. DASHBOARD VISUALIZATION: For each metric, recommend a visualization type (line chart, bar chart, etc.) with explanation.";

const BENCHMARKS_SECTION: &str = "4. BENCHMARKS: For each metric, provide industry benchmarks or targets that would indicate good performance.";

const RECOMMENDATIONS_SECTION: &str =
    "5. DASHBOARD RECOMMENDATIONS: Suggest 2-3 dashboards that group related metrics together.";

const LEGACY_FORMAT_INSTRUCTION: &str =
    "Format your response in a structured way that can be easily parsed. Use clear section headings.";

/// Join focus areas as `A`, `A and B`, `A, B and C`
///
/// Blank entries are skipped; `None` when nothing remains.
#[must_use]
pub fn join_focus_areas(areas: &[String]) -> Option<String> {
    let areas: Vec<&str> = areas
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();

    match areas.as_slice() {
        [] => None,
        [only] => Some((*only).to_owned()),
        [head @ .., last] => Some(format!("{} and {last}", head.join(", "))),
    }
}

/// Prompt for the full KPI system, including dashboard recommendations
#[must_use]
pub fn build_kpi_prompt(profile: &BusinessProfile) -> String {
    let mut prompt = format!(
        "Create a complete KPI system for a {} stage startup with a {} product",
        profile.company_stage.trim(),
        profile.product_type.trim()
    );
    if let Some(industry) = present(profile.industry.as_ref()) {
        prompt.push_str(&format!(" in the {industry} industry"));
    }
    if let Some(model) = present(profile.business_model.as_ref()) {
        prompt.push_str(&format!(" with a {model} business model"));
    }
    let tech_stack = profile.tech_stack.trim();
    prompt.push_str(&format!(".\n\nThey use {tech_stack} for their data."));

    if let Some(focus) = join_focus_areas(&profile.strategic_focus) {
        prompt.push_str(&format!("\nTheir strategic focus areas are: {focus}."));
    }
    if let Some(context) = present(profile.custom_context.as_ref()) {
        prompt.push_str(&format!(
            "\n\nAdditional context about the company:\n{context}"
        ));
    }

    prompt.push_str(&format!(
        "\n\nInclude the following in your response:\n\n{METRICS_SECTION}\n\n{}\n\n{VISUALIZATION_SECTION}\n\n{BENCHMARKS_SECTION}\n\n{RECOMMENDATIONS_SECTION}",
        sql_section(tech_stack)
    ));
    prompt
}

/// Prompt for the single-profile path: four sections, no recommendations
///
/// Only product type, stage, tech stack, and industry are used.
#[must_use]
pub fn build_legacy_kpi_prompt(profile: &BusinessProfile) -> String {
    let mut prompt = format!(
        "As an expert KPI architect, create a complete KPI system for a {} stage startup with a {} product",
        profile.company_stage.trim(),
        profile.product_type.trim()
    );
    if let Some(industry) = present(profile.industry.as_ref()) {
        prompt.push_str(&format!(" in the {industry} industry"));
    }
    let tech_stack = profile.tech_stack.trim();
    prompt.push_str(&format!(
        ".\n\nThey use {tech_stack} for their data.\n\nInclude the following in your response:\n\n{METRICS_SECTION}\n\n{}\n\n{VISUALIZATION_SECTION}\n\n{BENCHMARKS_SECTION}\n\n{LEGACY_FORMAT_INSTRUCTION}",
        sql_section(tech_stack)
    ));
    prompt
}

/// Prompt asking for one SQL statement computing a metric
#[must_use]
pub fn build_sql_prompt(metric_name: &str, metric_calculation: &str, tech_stack: &str) -> String {
    format!(
        "Create a SQL query for {} that calculates the '{}' metric.\n\n\
         Metric description: {}\n\n\
         Assume standard table names based on the metric context (e.g., users, events, transactions).\n\
         Keep the query concise but clear with comments explaining each part.\n\n\
         Only return the SQL query, nothing else.",
        tech_stack.trim(),
        metric_name.trim(),
        metric_calculation.trim()
    )
}

fn sql_section(tech_stack: &str) -> String {
    format!(
        "2. SQL QUERIES: For each metric, provide a SQL query tailored for {tech_stack} that would calculate this metric."
    )
}

/// JSON schema for structured KPI-system output
#[must_use]
pub fn kpi_output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "metrics": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "category": {"type": "string", "enum": KPI_CATEGORIES},
                        "name": {"type": "string"},
                        "description": {"type": "string"},
                        "calculation": {"type": "string"},
                        "importance": {"type": "string"},
                        "sql_query": {"type": "string"},
                        "visualization": {"type": "string"},
                        "benchmark": {"type": "string"}
                    },
                    "required": ["category", "name"]
                }
            },
            "dashboard_recommendations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "description": {"type": "string"},
                        "included_metrics": {"type": "array", "items": {"type": "string"}}
                    }
                }
            },
            "summary": {"type": "string"}
        },
        "required": ["metrics", "dashboard_recommendations", "summary"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_join_focus_areas() {
        assert_eq!(join_focus_areas(&[]), None);
        assert_eq!(join_focus_areas(&focus(&["A"])).as_deref(), Some("A"));
        assert_eq!(
            join_focus_areas(&focus(&["A", "B"])).as_deref(),
            Some("A and B")
        );
        assert_eq!(
            join_focus_areas(&focus(&["A", "B", "C"])).as_deref(),
            Some("A, B and C")
        );
        assert_eq!(join_focus_areas(&focus(&[" ", ""])), None);
    }

    #[test]
    fn test_kpi_prompt_mentions_profile_and_sections() {
        let profile = BusinessProfile::new("SaaS", "Seed", "PostgreSQL")
            .with_industry("Fintech")
            .with_business_model("subscription")
            .with_strategic_focus(["growth", "retention"])
            .with_custom_context("We sell to banks.");
        let prompt = build_kpi_prompt(&profile);

        assert!(prompt.starts_with(
            "Create a complete KPI system for a Seed stage startup with a SaaS product in the Fintech industry with a subscription business model."
        ));
        assert!(prompt.contains("They use PostgreSQL for their data."));
        assert!(prompt.contains("\nTheir strategic focus areas are: growth and retention."));
        assert!(prompt.contains("\n\nAdditional context about the company:\nWe sell to banks."));
        for section in [
            "1. METRICS",
            "2. SQL QUERIES",
            "3. DASHBOARD VISUALIZATION",
            "4. BENCHMARKS",
            "5. DASHBOARD RECOMMENDATIONS",
        ] {
            assert!(prompt.contains(section), "missing {section}");
        }
    }

    #[test]
    fn test_optional_clauses_omitted_when_blank() {
        let profile = BusinessProfile::new("SaaS", "Seed", "PostgreSQL").with_industry("  ");
        let prompt = build_kpi_prompt(&profile);
        assert!(prompt.starts_with(
            "Create a complete KPI system for a Seed stage startup with a SaaS product.\n\n"
        ));
        assert!(!prompt.contains("strategic focus"));
        assert!(!prompt.contains("Additional context"));
    }

    #[test]
    fn test_legacy_prompt_omits_recommendations() {
        let profile = BusinessProfile::new("Mobile App", "Pre-seed", "Firebase")
            .with_industry("Health")
            .with_business_model("freemium");
        let prompt = build_legacy_kpi_prompt(&profile);
        assert!(prompt.starts_with("As an expert KPI architect, create a complete KPI system"));
        assert!(prompt.contains("in the Health industry."));
        assert!(!prompt.contains("freemium"));
        assert!(!prompt.contains("DASHBOARD RECOMMENDATIONS"));
        assert!(prompt.ends_with(LEGACY_FORMAT_INSTRUCTION));
    }

    #[test]
    fn test_sql_prompt() {
        let prompt = build_sql_prompt("Churn Rate", "Lost customers / total customers", "BigQuery");
        assert!(prompt.starts_with(
            "Create a SQL query for BigQuery that calculates the 'Churn Rate' metric."
        ));
        assert!(prompt.contains("Metric description: Lost customers / total customers"));
        assert!(prompt.ends_with("Only return the SQL query, nothing else."));
    }

    #[test]
    fn test_builders_are_deterministic() {
        let profile = || {
            BusinessProfile::new("Marketplace", "Series A", "Snowflake")
                .with_industry("Logistics")
                .with_business_model("commission")
                .with_strategic_focus(["supply", "demand", "liquidity"])
                .with_custom_context("Two-sided, B2B.")
        };

        assert_eq!(build_kpi_prompt(&profile()), build_kpi_prompt(&profile()));
        assert_eq!(
            build_legacy_kpi_prompt(&profile()),
            build_legacy_kpi_prompt(&profile())
        );
        assert_eq!(
            build_sql_prompt("GMV", "sum of order value", "Snowflake"),
            build_sql_prompt("GMV", "sum of order value", "Snowflake")
        );
    }

    #[test]
    fn test_schema_enumerates_categories() {
        let schema = kpi_output_schema();
        assert_eq!(
            schema["properties"]["metrics"]["items"]["properties"]["category"]["enum"],
            json!(["Acquisition", "Activation", "Retention", "Revenue"])
        );
    }
}
