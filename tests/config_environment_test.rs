// ABOUTME: Integration tests for loading server configuration from process environment variables
// ABOUTME: Serialized because they mutate the shared process environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::env;

use metrically_server::config::{Environment, ServerConfig};
use serial_test::serial;

const MANAGED_VARS: [&str; 8] = [
    "AZURE_OPENAI_API_KEY",
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_DEPLOYMENT_NAME",
    "SECRET_KEY",
    "ENVIRONMENT",
    "HTTP_PORT",
    "CORS_ALLOWED_ORIGINS",
    "SEED_DEMO_USER",
];

fn clear_managed_vars() {
    for var in MANAGED_VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_reads_provider_settings() {
    clear_managed_vars();
    env::set_var("AZURE_OPENAI_API_KEY", "test-key");
    env::set_var("AZURE_OPENAI_ENDPOINT", "https://metrically.openai.azure.com/");
    env::set_var("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt-4o");
    env::set_var("SECRET_KEY", "env-secret");
    env::set_var("ENVIRONMENT", "production");
    env::set_var("HTTP_PORT", "9100");

    let config = ServerConfig::from_env().unwrap();
    assert!(config.azure_openai.is_configured());
    assert_eq!(config.azure_openai.deployment, "gpt-4o");
    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.http.port, 9100);
    assert!(!config.auth.secret_generated);
    assert_eq!(config.auth.secret_key.expose(), "env-secret");
    assert!(!config.auth.seed_demo_user);

    clear_managed_vars();
}

#[test]
#[serial]
fn test_from_env_without_credentials_still_loads() {
    clear_managed_vars();

    let config = ServerConfig::from_env().unwrap();
    assert!(!config.azure_openai.is_configured());
    assert!(config.auth.secret_generated);
    assert_eq!(config.http.cors_allowed_origins, vec!["*"]);
    assert_eq!(config.environment, Environment::Development);
}

#[test]
#[serial]
fn test_from_env_rejects_unparseable_values() {
    clear_managed_vars();
    env::set_var("HTTP_PORT", "eighty");

    let error = ServerConfig::from_env().unwrap_err();
    assert!(error.message.contains("HTTP_PORT"));

    clear_managed_vars();
}

#[test]
#[serial]
fn test_cors_origin_list() {
    clear_managed_vars();
    env::set_var(
        "CORS_ALLOWED_ORIGINS",
        "https://app.metrically.ai, http://localhost:3000",
    );

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(
        config.http.cors_allowed_origins,
        vec!["https://app.metrically.ai", "http://localhost:3000"]
    );

    clear_managed_vars();
}
