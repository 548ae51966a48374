// ABOUTME: Shared server resources constructed once at startup and passed to every router
// ABOUTME: Holds configuration, the KPI service, the token manager, and the user repository
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use std::sync::Arc;

use metrically_core::errors::AppResult;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::kpi::KpiService;
use crate::llm::CompletionAdapter;
use crate::middleware::BearerAuthMiddleware;
use crate::routes::auth::AuthService;
use crate::users::{InMemoryUserRepository, UserRepository};

/// Dependencies shared by all handlers
pub struct ServerResources {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    /// KPI orchestration
    pub kpi_service: KpiService,
    /// Token signing and validation
    pub auth_manager: Arc<AuthManager>,
    /// Bearer token checks for protected routes
    pub auth_middleware: BearerAuthMiddleware,
    /// Credential store
    pub users: Arc<dyn UserRepository>,
    auth_service: AuthService,
}

impl ServerResources {
    /// Assemble resources from explicit parts
    #[must_use]
    pub fn new(
        config: ServerConfig,
        kpi_service: KpiService,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        let auth_manager = Arc::new(AuthManager::new(
            config.auth.secret_key.expose().as_bytes(),
            config.auth.access_token_expire_minutes,
        ));
        let auth_service = AuthService::new(Arc::clone(&users), Arc::clone(&auth_manager))
            .with_hash_cost(config.auth.bcrypt_cost);
        Self {
            config: Arc::new(config),
            kpi_service,
            auth_middleware: BearerAuthMiddleware::new(Arc::clone(&auth_manager)),
            auth_manager,
            users,
            auth_service,
        }
    }

    /// Build production resources: Azure-backed adapter and in-memory users
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client cannot be built
    pub fn from_config(config: ServerConfig) -> AppResult<Self> {
        let adapter = CompletionAdapter::from_config(&config.azure_openai)?;
        Ok(Self::new(
            config,
            KpiService::new(adapter),
            Arc::new(InMemoryUserRepository::new()),
        ))
    }

    /// Auth service over the shared repository and token manager
    #[must_use]
    pub fn auth_service(&self) -> AuthService {
        self.auth_service.clone()
    }
}
