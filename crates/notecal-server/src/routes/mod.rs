//! HTTP routes.

pub mod events;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono_tz::Tz;
use notecal_core::ValidationErrors;
use notecal_providers::{GatewayConnector, ProviderError, ProviderErrorCode};
use thiserror::Error;
use tracing::warn;

use crate::engine::EngineError;

/// Shared handler state. Holds no per-request data.
#[derive(Clone)]
pub struct AppState {
    connector: Arc<dyn GatewayConnector>,
    default_time_zone: Tz,
}

impl AppState {
    pub fn new(connector: Arc<dyn GatewayConnector>, default_time_zone: Tz) -> Self {
        Self {
            connector,
            default_time_zone,
        }
    }
}

/// Builds the router with every route mounted.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(events::router())
        .with_state(state)
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// A failed request, rendered as `text/plain`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad query parameters or body.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Credentials missing, invalid or rejected.
    #[error("{0}")]
    Authentication(ProviderError),

    #[error(transparent)]
    Engine(EngineError),
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        if err.is_authentication() {
            Self::Authentication(err)
        } else {
            Self::Engine(EngineError::Provider(err))
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Provider(err) => err.into(),
            other => Self::Engine(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Engine(EngineError::Resolve(_)) => StatusCode::BAD_REQUEST,
            Self::Engine(EngineError::Provider(err)) => match err.code() {
                ProviderErrorCode::AuthenticationFailed => StatusCode::UNAUTHORIZED,
                ProviderErrorCode::AuthorizationFailed => StatusCode::FORBIDDEN,
                ProviderErrorCode::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Validation(errors) => errors.messages().join("\n"),
            other => other.to_string(),
        };
        warn!(status = status.as_u16(), "request failed: {}", body);
        (status, body).into_response()
    }
}
