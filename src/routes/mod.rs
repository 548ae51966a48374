// ABOUTME: Route module organization for Metrically HTTP endpoints
// ABOUTME: Provides route definitions organized by domain with thin handlers over services
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! Route module for Metrically
//!
//! Each domain module contains route definitions and thin handler functions
//! that delegate to service layers held in
//! [`ServerResources`](crate::resources::ServerResources).

/// AI generation routes
pub mod ai;
/// Authentication and account routes
pub mod auth;
/// Request extractors with uniform rejections
pub mod extract;
/// Health check and configuration status routes
pub mod health;
/// Single-profile KPI routes and fixed examples
pub mod kpi;

/// AI route handlers
pub use ai::AiRoutes;
/// Authentication route handlers
pub use auth::AuthRoutes;
/// Authentication service
pub use auth::AuthService;
/// Health route handlers
pub use health::HealthRoutes;
/// KPI route handlers
pub use kpi::KpiRoutes;
