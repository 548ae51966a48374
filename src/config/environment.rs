// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses provider credentials, token settings, and HTTP options from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! Environment-based configuration management
//!
//! Configuration comes from the process environment only. Missing provider
//! credentials never fail startup: the completion adapter simply reports
//! itself unavailable.

use metrically_core::constants::{defaults, env_config, limits};
use metrically_core::errors::{AppError, AppResult};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Length of the per-process secret generated when `SECRET_KEY` is absent
const GENERATED_SECRET_LEN: usize = 64;

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is a development environment
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// String value that never appears in `Debug` output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Access the underlying value
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Azure `OpenAI` connection settings
#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    /// API key, absent when not configured
    pub api_key: Option<Secret>,
    /// Resource endpoint, absent when not configured
    pub endpoint: Option<String>,
    /// API version query parameter
    pub api_version: String,
    /// Deployment (model) name
    pub deployment: String,
    /// Whether the deployment honours `response_format = json_object`
    pub json_mode: bool,
    /// Upper bound per provider call
    pub request_timeout_secs: u64,
    /// Connect timeout
    pub connect_timeout_secs: u64,
}

impl AzureOpenAiConfig {
    /// True when both key and endpoint are present
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.endpoint.is_some()
    }
}

impl Default for AzureOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            api_version: defaults::AZURE_OPENAI_API_VERSION.to_owned(),
            deployment: defaults::AZURE_OPENAI_DEPLOYMENT_NAME.to_owned(),
            json_mode: true,
            request_timeout_secs: defaults::LLM_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: defaults::LLM_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Token signing and account settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub secret_key: Secret,
    /// True when the secret was generated for this process only
    pub secret_generated: bool,
    /// Token lifetime in minutes
    pub access_token_expire_minutes: i64,
    /// bcrypt work factor, 4 to 31
    pub bcrypt_cost: u32,
    /// Seed the demo account at startup
    pub seed_demo_user: bool,
}

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Allowed CORS origins, `*` for any
    pub cors_allowed_origins: Vec<String>,
    /// Whole-request timeout
    pub request_timeout_secs: u64,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// HTTP listener
    pub http: HttpConfig,
    /// Completion provider
    pub azure_openai: AzureOpenAiConfig,
    /// Authentication
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a present variable cannot be parsed
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values count as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a present variable cannot be parsed
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let environment = get(env_config::ENVIRONMENT)
            .map(|value| Environment::from_str_or_default(&value))
            .unwrap_or_default();

        let azure_openai = AzureOpenAiConfig {
            api_key: get(env_config::AZURE_OPENAI_API_KEY).map(Secret::new),
            endpoint: get(env_config::AZURE_OPENAI_ENDPOINT),
            api_version: get(env_config::AZURE_OPENAI_API_VERSION)
                .unwrap_or_else(|| defaults::AZURE_OPENAI_API_VERSION.to_owned()),
            deployment: get(env_config::AZURE_OPENAI_DEPLOYMENT_NAME)
                .unwrap_or_else(|| defaults::AZURE_OPENAI_DEPLOYMENT_NAME.to_owned()),
            json_mode: parse_bool(get(env_config::AZURE_OPENAI_JSON_MODE).as_deref(), true),
            request_timeout_secs: parse_in_range(
                env_config::LLM_REQUEST_TIMEOUT_SECS,
                get(env_config::LLM_REQUEST_TIMEOUT_SECS),
                defaults::LLM_REQUEST_TIMEOUT_SECS,
                limits::LLM_TIMEOUT_SECS,
            )?,
            connect_timeout_secs: parse_in_range(
                env_config::LLM_CONNECT_TIMEOUT_SECS,
                get(env_config::LLM_CONNECT_TIMEOUT_SECS),
                defaults::LLM_CONNECT_TIMEOUT_SECS,
                limits::LLM_TIMEOUT_SECS,
            )?,
        };

        let (secret_key, secret_generated) = match get(env_config::SECRET_KEY) {
            Some(secret) => (Secret::new(secret), false),
            None => {
                warn!(
                    "{} is not set; generated a per-process signing secret, tokens will not survive a restart",
                    env_config::SECRET_KEY
                );
                (Secret::new(generate_secret()), true)
            }
        };

        let access_token_expire_minutes = parse_in_range(
            env_config::ACCESS_TOKEN_EXPIRE_MINUTES,
            get(env_config::ACCESS_TOKEN_EXPIRE_MINUTES),
            defaults::ACCESS_TOKEN_EXPIRE_MINUTES,
            limits::ACCESS_TOKEN_EXPIRE_MINUTES,
        )?;

        let bcrypt_cost = parse_in_range(
            env_config::BCRYPT_COST,
            get(env_config::BCRYPT_COST),
            defaults::BCRYPT_COST,
            limits::BCRYPT_COST,
        )?;

        let auth = AuthConfig {
            secret_key,
            secret_generated,
            access_token_expire_minutes,
            bcrypt_cost,
            seed_demo_user: parse_bool(
                get(env_config::SEED_DEMO_USER).as_deref(),
                environment.is_development(),
            ),
        };

        let http = HttpConfig {
            host: get(env_config::HOST).unwrap_or_else(|| defaults::HOST.to_owned()),
            port: parse_or(
                env_config::HTTP_PORT,
                get(env_config::HTTP_PORT),
                defaults::HTTP_PORT,
            )?,
            cors_allowed_origins: parse_origins(
                get(env_config::CORS_ALLOWED_ORIGINS).as_deref().unwrap_or("*"),
            ),
            request_timeout_secs: parse_in_range(
                env_config::REQUEST_TIMEOUT_SECS,
                get(env_config::REQUEST_TIMEOUT_SECS),
                defaults::REQUEST_TIMEOUT_SECS,
                limits::REQUEST_TIMEOUT_SECS,
            )?,
        };

        Ok(Self {
            environment,
            http,
            azure_openai,
            auth,
        })
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Metrically API Configuration: environment={}, bind={}:{}, azure_openai={}, deployment={}, json_mode={}, provider_timeout={}s, token_lifetime={}m, signing_secret={}, demo_user={}",
            self.environment,
            self.http.host,
            self.http.port,
            if self.azure_openai.is_configured() {
                "configured"
            } else {
                "not configured"
            },
            self.azure_openai.deployment,
            self.azure_openai.json_mode,
            self.azure_openai.request_timeout_secs,
            self.auth.access_token_expire_minutes,
            if self.auth.secret_generated {
                "generated"
            } else {
                "configured"
            },
            self.auth.seed_demo_user,
        )
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> AppResult<T> {
    value.map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|_| AppError::config(format!("Invalid {key} value: {raw}")))
    })
}

fn parse_in_range<T>(key: &str, value: Option<String>, default: T, (min, max): (T, T)) -> AppResult<T>
where
    T: FromStr + PartialOrd + fmt::Display,
{
    let parsed = parse_or(key, value, default)?;
    if parsed < min || parsed > max {
        return Err(AppError::config(format!(
            "{key} must be between {min} and {max}, got {parsed}"
        )));
    }
    Ok(parsed)
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    value.map_or(default, |raw| {
        matches!(raw.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
    })
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<ServerConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_provider() {
        let config = config_from(&[]).unwrap();
        assert!(!config.azure_openai.is_configured());
        assert_eq!(config.azure_openai.api_version, "2023-05-15");
        assert_eq!(config.azure_openai.deployment, "gpt-4");
        assert_eq!(config.auth.access_token_expire_minutes, 30);
        assert!(config.auth.secret_generated);
        assert!(config.auth.seed_demo_user);
        assert_eq!(config.http.port, 8000);
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        let config = config_from(&[
            ("AZURE_OPENAI_API_KEY", ""),
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
        ])
        .unwrap();
        assert!(!config.azure_openai.is_configured());
    }

    #[test]
    fn test_configured_provider() {
        let config = config_from(&[
            ("AZURE_OPENAI_API_KEY", "key"),
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_OPENAI_DEPLOYMENT_NAME", "gpt-4o"),
            ("AZURE_OPENAI_JSON_MODE", "false"),
        ])
        .unwrap();
        assert!(config.azure_openai.is_configured());
        assert_eq!(config.azure_openai.deployment, "gpt-4o");
        assert!(!config.azure_openai.json_mode);
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let error = config_from(&[("HTTP_PORT", "not-a-port")]).unwrap_err();
        assert_eq!(error.code, metrically_core::errors::ErrorCode::ConfigError);
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        assert_eq!(config_from(&[]).unwrap().auth.bcrypt_cost, 12);
        assert_eq!(
            config_from(&[("BCRYPT_COST", "4")]).unwrap().auth.bcrypt_cost,
            4
        );
        assert!(config_from(&[("BCRYPT_COST", "3")]).is_err());
        assert!(config_from(&[("BCRYPT_COST", "32")]).is_err());
    }

    #[test]
    fn test_numeric_settings_are_bounded() {
        for (key, value) in [
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "0"),
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "9223372036854775807"),
            ("LLM_REQUEST_TIMEOUT_SECS", "0"),
            ("LLM_CONNECT_TIMEOUT_SECS", "0"),
            ("REQUEST_TIMEOUT_SECS", "0"),
            ("REQUEST_TIMEOUT_SECS", "86400"),
        ] {
            let error = config_from(&[(key, value)]).unwrap_err();
            assert_eq!(error.code, metrically_core::errors::ErrorCode::ConfigError);
            assert!(error.message.starts_with(key), "{}", error.message);
        }

        let config = config_from(&[
            ("ACCESS_TOKEN_EXPIRE_MINUTES", "525600"),
            ("LLM_REQUEST_TIMEOUT_SECS", "1"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.auth.access_token_expire_minutes, 525_600);
        assert_eq!(config.azure_openai.request_timeout_secs, 1);
        assert_eq!(config.http.request_timeout_secs, 5);
    }

    #[test]
    fn test_production_does_not_seed_demo_user() {
        let config = config_from(&[("ENVIRONMENT", "production"), ("SECRET_KEY", "s")]).unwrap();
        assert!(!config.auth.seed_demo_user);
        assert!(!config.auth.secret_generated);
    }

    #[test]
    fn test_summary_has_no_secrets() {
        let config = config_from(&[
            ("AZURE_OPENAI_API_KEY", "super-secret-key"),
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("SECRET_KEY", "signing-secret"),
        ])
        .unwrap();
        let summary = config.summary();
        assert!(!summary.contains("super-secret-key"));
        assert!(!summary.contains("signing-secret"));
        assert!(!format!("{config:?}").contains("super-secret-key"));
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://localhost:3000, https://app.example.com"),
            vec!["http://localhost:3000", "https://app.example.com"]
        );
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("PROD"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("test"),
            Environment::Testing
        );
        assert_eq!(
            Environment::from_str_or_default("anything"),
            Environment::Development
        );
    }
}
