// ABOUTME: HTTP server assembly and lifecycle for the Metrically API
// ABOUTME: Builds the axum router with its middleware stack and serves it with graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{middleware, Router};
use metrically_core::constants::defaults;
use metrically_core::errors::AppError;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::middleware::{request_id_middleware, setup_cors};
use crate::resources::ServerResources;
use crate::routes::{AiRoutes, AuthRoutes, HealthRoutes, KpiRoutes};

/// Build the application router with all routes and middleware
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config.http);
    let request_timeout = resources.config.http.request_timeout_secs;

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(KpiRoutes::routes(Arc::clone(&resources)))
        .merge(AiRoutes::routes(resources))
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(defaults::MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout)))
        .layer(middleware::map_response(move |response: Response| async move {
            render_timeout(response, request_timeout)
        }))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
}

async fn handle_not_found() -> AppError {
    AppError::not_found("Endpoint")
}

/// `TimeoutLayer` answers with an empty 408; give it the uniform error body
fn render_timeout(response: Response, seconds: u64) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        warn!(timeout_secs = seconds, "Request timed out");
        return AppError::request_timeout(seconds).into_response();
    }
    response
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!("Handler panicked: {detail}");
    AppError::internal("Internal Server Error").into_response()
}

/// Seed startup data and serve until Ctrl-C or SIGTERM
///
/// # Errors
///
/// Returns an error if seeding fails, the listener cannot bind, or the
/// server stops abnormally
pub async fn run(resources: Arc<ServerResources>) -> Result<()> {
    if resources.config.auth.seed_demo_user {
        resources
            .auth_service()
            .seed_demo_user()
            .await
            .context("failed to seed demo user")?;
    }

    let addr = format!(
        "{}:{}",
        resources.config.http.host, resources.config.http.port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!("HTTP server listening on http://{addr}");
    axum::serve(listener, build_router(resources))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failure")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
