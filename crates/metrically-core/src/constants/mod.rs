// ABOUTME: Shared constants for environment variables, defaults, and fixed service messages
// ABOUTME: Single source of truth for strings that appear in prompts, responses, and configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! Constants grouped by concern.

/// Environment variable names
pub mod env_config {
    /// Azure `OpenAI` API key
    pub const AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
    /// Azure `OpenAI` API version
    pub const AZURE_OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
    /// Azure `OpenAI` resource endpoint
    pub const AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
    /// Azure `OpenAI` deployment name
    pub const AZURE_OPENAI_DEPLOYMENT_NAME: &str = "AZURE_OPENAI_DEPLOYMENT_NAME";
    /// Whether the deployment honours `response_format = json_object`
    pub const AZURE_OPENAI_JSON_MODE: &str = "AZURE_OPENAI_JSON_MODE";
    /// Upper bound per provider call in seconds
    pub const LLM_REQUEST_TIMEOUT_SECS: &str = "LLM_REQUEST_TIMEOUT_SECS";
    /// Provider connect timeout in seconds
    pub const LLM_CONNECT_TIMEOUT_SECS: &str = "LLM_CONNECT_TIMEOUT_SECS";
    /// Token signing secret
    pub const SECRET_KEY: &str = "SECRET_KEY";
    /// Token lifetime in minutes
    pub const ACCESS_TOKEN_EXPIRE_MINUTES: &str = "ACCESS_TOKEN_EXPIRE_MINUTES";
    /// bcrypt work factor for password hashes
    pub const BCRYPT_COST: &str = "BCRYPT_COST";
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// HTTP bind host
    pub const HOST: &str = "HOST";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// Comma-separated CORS origins
    pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
    /// Whether to seed the demo account
    pub const SEED_DEMO_USER: &str = "SEED_DEMO_USER";
    /// Whole-request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
}

/// Default configuration values
pub mod defaults {
    /// Default Azure `OpenAI` API version
    pub const AZURE_OPENAI_API_VERSION: &str = "2023-05-15";
    /// Default deployment name
    pub const AZURE_OPENAI_DEPLOYMENT_NAME: &str = "gpt-4";
    /// Default provider request timeout
    pub const LLM_REQUEST_TIMEOUT_SECS: u64 = 60;
    /// Default provider connect timeout
    pub const LLM_CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Default token lifetime
    pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 30;
    /// bcrypt work factor
    pub const BCRYPT_COST: u32 = 12;
    /// Default HTTP port
    pub const HTTP_PORT: u16 = 8000;
    /// Default bind host
    pub const HOST: &str = "0.0.0.0";
    /// Per-request timeout applied by the HTTP stack
    pub const REQUEST_TIMEOUT_SECS: u64 = 180;
    /// Request body limit
    pub const MAX_BODY_BYTES: usize = 1024 * 1024;
}

/// Accepted ranges for numeric settings
pub mod limits {
    /// Provider timeouts, seconds
    pub const LLM_TIMEOUT_SECS: (u64, u64) = (1, 600);
    /// Token lifetime, minutes (one year at most)
    pub const ACCESS_TOKEN_EXPIRE_MINUTES: (i64, i64) = (1, 525_600);
    /// bcrypt work factor
    pub const BCRYPT_COST: (u32, u32) = (4, 31);
    /// Whole-request timeout, seconds
    pub const REQUEST_TIMEOUT_SECS: (u64, u64) = (1, 3600);
}

/// Service identity strings
pub mod service_names {
    /// Application name
    pub const APP_NAME: &str = "Metrically";
    /// Public API title
    pub const API_TITLE: &str = "Metrically API";
    /// Completion provider display name
    pub const AZURE_OPENAI: &str = "Azure OpenAI";
    /// Welcome message on `/`
    pub const WELCOME_MESSAGE: &str = "Welcome to Metrically API";
}

/// Demo account seeded in development
pub mod demo_user {
    /// Demo email
    pub const EMAIL: &str = "demo@metrically.ai";
    /// Demo password
    pub const PASSWORD: &str = "demopassword";
    /// Demo display name
    pub const FULL_NAME: &str = "Demo User";
}

/// Generation parameters
pub mod generation {
    /// KPI generation temperature
    pub const KPI_TEMPERATURE: f32 = 0.5;
    /// KPI generation token limit
    pub const KPI_MAX_TOKENS: u32 = 2500;
    /// Legacy KPI generation token limit
    pub const LEGACY_KPI_MAX_TOKENS: u32 = 2000;
    /// Legacy KPI generation nucleus sampling
    pub const LEGACY_KPI_TOP_P: f32 = 0.95;
    /// SQL generation temperature
    pub const SQL_TEMPERATURE: f32 = 0.3;
    /// SQL generation token limit
    pub const SQL_MAX_TOKENS: u32 = 500;
    /// Default free-form completion temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    /// Default free-form completion token limit
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;
}

/// Fixed user-facing messages
pub mod messages {
    /// Returned for every failed login
    pub const INCORRECT_CREDENTIALS: &str = "Incorrect email or password";
    /// Returned for duplicate registration
    pub const EMAIL_ALREADY_REGISTERED: &str = "Email already registered";
    /// Returned for any bearer token failure
    pub const INVALID_CREDENTIALS: &str = "Could not validate credentials";
    /// Returned when the provider is not configured
    pub const PROVIDER_UNAVAILABLE: &str =
        "Azure OpenAI service is not available. Please check your API configuration.";
    /// SQL fallback when the provider is unavailable
    pub const SQL_FAILURE_UNAVAILABLE: &str =
        "-- Failed to generate SQL query - API connection error";
    /// SQL fallback for any other provider failure
    pub const SQL_FAILURE_ERROR: &str = "-- Failed to generate SQL query due to an error";
}
