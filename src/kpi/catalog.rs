// ABOUTME: Fixed illustrative KPI systems served without any provider involvement
// ABOUTME: Used by the public example-systems endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use serde::Serialize;

/// Pre-built KPI system shown to prospective users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExampleSystem {
    /// Display name
    pub name: &'static str,
    /// Product type it targets
    pub product_type: &'static str,
    /// Company stage it targets
    pub company_stage: &'static str,
    /// Metric names
    pub metrics: &'static [&'static str],
}

const EXAMPLE_SYSTEMS: [ExampleSystem; 3] = [
    ExampleSystem {
        name: "SaaS Starter Pack",
        product_type: "SaaS",
        company_stage: "Seed",
        metrics: &[
            "MRR (Monthly Recurring Revenue)",
            "CAC (Customer Acquisition Cost)",
            "LTV (Lifetime Value)",
            "Churn Rate",
            "Activation Rate",
            "Feature Adoption",
        ],
    },
    ExampleSystem {
        name: "E-commerce Growth Kit",
        product_type: "E-commerce",
        company_stage: "Series A",
        metrics: &[
            "Average Order Value",
            "Conversion Rate",
            "Customer Retention Rate",
            "Return Rate",
            "Cart Abandonment Rate",
            "Revenue per Visitor",
        ],
    },
    ExampleSystem {
        name: "Mobile App Traction",
        product_type: "Mobile App",
        company_stage: "Pre-seed",
        metrics: &[
            "DAU/MAU Ratio",
            "Session Duration",
            "Retention D1/D7/D30",
            "Install to Sign-up Rate",
            "Push Notification Opt-in Rate",
            "Feature Engagement Depth",
        ],
    },
];

/// The fixed example systems
#[must_use]
pub const fn example_systems() -> &'static [ExampleSystem] {
    &EXAMPLE_SYSTEMS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        let systems = example_systems();
        assert_eq!(systems.len(), 3);
        assert!(systems.iter().all(|s| s.metrics.len() == 6));
        assert_eq!(systems[0].name, "SaaS Starter Pack");
    }
}
