// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Re-exports the environment-driven server configuration types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! Configuration module for the Metrically API

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AuthConfig, AzureOpenAiConfig, Environment, HttpConfig, Secret, ServerConfig,
};
