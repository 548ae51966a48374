// ABOUTME: Core types and constants for the Metrically KPI generation service
// ABOUTME: Foundation crate with error handling and application-wide constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

#![deny(unsafe_code)]

//! # Metrically Core
//!
//! Foundation crate shared by the Metrically server. It changes rarely, which
//! keeps incremental builds of the server crate cheap.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode` and the HTTP error body
//! - **constants**: Environment variable names, defaults and user-facing messages

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;
