// ABOUTME: Request extractors that report malformed bodies and queries as INVALID_INPUT
// ABOUTME: Thin wrappers over axum Json, Form, and Query with AppError rejections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::{Form, Json};
use metrically_core::errors::AppError;
use serde::de::DeserializeOwned;

/// JSON body; a malformed body is a 400 `INVALID_INPUT`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

/// URL-encoded form body; a malformed body is a 400 `INVALID_INPUT`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiForm<T>(pub T);

/// Query string; an unparseable query is a 400 `INVALID_INPUT`
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| {
                tracing::debug!("Rejected JSON body: {}", rejection.body_text());
                AppError::invalid_input(format!("Invalid JSON body: {}", rejection.body_text()))
            })
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ApiForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Form::<T>::from_request(req, state)
            .await
            .map(|Form(value)| Self(value))
            .map_err(|rejection| {
                AppError::invalid_input(format!("Invalid form body: {}", rejection.body_text()))
            })
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection| {
                AppError::invalid_input(format!("Invalid query string: {}", rejection.body_text()))
            })
    }
}
