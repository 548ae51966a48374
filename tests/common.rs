// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides quiet logging, a scripted fake provider, and router builders
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `metrically_server`

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use metrically_server::config::ServerConfig;
use metrically_server::errors::AppError;
use metrically_server::kpi::KpiService;
use metrically_server::llm::{
    ChatRequest, ChatResponse, CompletionAdapter, LlmCapabilities, LlmProvider, TokenUsage,
};
use metrically_server::resources::ServerResources;
use metrically_server::routes::auth::RegisterRequest;
use metrically_server::server::build_router;
use metrically_server::users::InMemoryUserRepository;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// What the fake provider answers
#[derive(Debug, Clone)]
pub enum Script {
    /// Reply with this content
    Reply(String),
    /// Fail with an external service error
    Fail(String),
    /// Never answer
    Hang,
}

/// Provider double recording every call
pub struct FakeProvider {
    script: Script,
    capabilities: LlmCapabilities,
    calls: AtomicUsize,
    last_request: Mutex<Option<ChatRequest>>,
}

impl FakeProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            capabilities: LlmCapabilities::text_only() | LlmCapabilities::JSON_MODE,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn replying(content: &str) -> Arc<Self> {
        Self::new(Script::Reply(content.to_owned()))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::new(Script::Fail(message.to_owned()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn display_name(&self) -> &'static str {
        "Fake Provider"
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        "fake-deployment"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match &self.script {
            Script::Reply(content) => Ok(ChatResponse {
                content: content.clone(),
                model: request
                    .model
                    .clone()
                    .unwrap_or_else(|| "fake-deployment".to_owned()),
                usage: Some(TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                    total_tokens: 30,
                }),
                finish_reason: Some("stop".to_owned()),
            }),
            Script::Fail(message) => Err(AppError::external_service("Azure OpenAI", message)),
            Script::Hang => {
                std::future::pending::<()>().await;
                Err(AppError::internal("unreachable"))
            }
        }
    }
}

/// Configuration for tests: fixed secret, no provider credentials
pub fn test_config() -> ServerConfig {
    test_config_with(&[])
}

/// Test configuration with `overrides` applied on top
pub fn test_config_with(overrides: &[(&str, &str)]) -> ServerConfig {
    let mut vars: HashMap<&str, &str> = HashMap::from([
        ("SECRET_KEY", "integration-test-secret-key"),
        ("ENVIRONMENT", "testing"),
        ("ACCESS_TOKEN_EXPIRE_MINUTES", "30"),
        ("BCRYPT_COST", "4"),
    ]);
    vars.extend(overrides.iter().copied());
    ServerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_owned()))
        .expect("test configuration must load")
}

/// Resources backed by `provider`
pub fn resources_with_provider(provider: Arc<FakeProvider>) -> Arc<ServerResources> {
    resources_with_adapter(CompletionAdapter::with_provider(
        provider,
        "gpt-4",
        Duration::from_secs(5),
    ))
}

/// Resources without provider credentials
pub fn unconfigured_resources() -> Arc<ServerResources> {
    resources_with_adapter(CompletionAdapter::unconfigured(
        "gpt-4",
        Duration::from_secs(5),
    ))
}

pub fn resources_with_adapter(adapter: CompletionAdapter) -> Arc<ServerResources> {
    resources_with_config(test_config(), adapter)
}

pub fn resources_with_config(config: ServerConfig, adapter: CompletionAdapter) -> Arc<ServerResources> {
    init_test_logging();
    Arc::new(ServerResources::new(
        config,
        KpiService::new(adapter),
        Arc::new(InMemoryUserRepository::new()),
    ))
}

/// Full application router
pub fn app(resources: &Arc<ServerResources>) -> Router {
    build_router(Arc::clone(resources))
}

/// Register a user directly and return a bearer token for it
pub async fn create_user_token(resources: &Arc<ServerResources>, email: &str) -> String {
    let auth = resources.auth_service();
    auth.register(RegisterRequest {
        email: email.to_owned(),
        password: "password123".to_owned(),
        full_name: Some("Test User".to_owned()),
    })
    .await
    .expect("registration must succeed");
    auth.login(email, "password123")
        .await
        .expect("login must succeed")
        .access_token
}

/// A well-formed KPI system document
pub fn sample_kpi_json() -> String {
    serde_json::json!({
        "metrics": [{
            "category": "Revenue",
            "name": "MRR",
            "description": "Monthly recurring revenue",
            "calculation": "SUM(subscription_amount)",
            "importance": "Tracks growth",
            "sql_query": "SELECT SUM(amount) FROM subscriptions",
            "visualization": "line chart",
            "benchmark": "10% MoM"
        }],
        "dashboard_recommendations": [{
            "name": "Growth",
            "description": "Top-line growth",
            "included_metrics": ["MRR"]
        }],
        "summary": "Focus on recurring revenue."
    })
    .to_string()
}
