//! HTTP service that writes note-driven changes to a remote calendar.
//!
//! This crate provides:
//! - [`EventEngine`]: the move/merge/update decision procedure
//! - the axum routes for `POST /events`, `PUT /events/{id}` and
//!   `DELETE /events/{id}`
//! - server configuration, CLI parsing and startup
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use notecal_providers::google::{GoogleConfig, GoogleConnector, OAuthCredentials};
//! use notecal_server::{ServerConfig, serve};
//!
//! let google = GoogleConfig::new(OAuthCredentials::new(id, secret), refresh_token);
//! serve(ServerConfig::default(), Arc::new(GoogleConnector::new(google))).await?;
//! ```

pub mod cli;
mod config;
mod engine;
mod error;
pub mod routes;
mod signals;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use notecal_providers::GatewayConnector;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use cli::Cli;
pub use config::{DEFAULT_BIND_ADDR, ServerConfig};
pub use engine::{EngineError, EngineResult, EventEngine};
pub use error::{ServerError, ServerResult};
pub use routes::{ApiError, AppState};
pub use signals::shutdown_signal;

/// Builds the application with CORS and request tracing.
pub fn build_app(
    config: &ServerConfig,
    connector: Arc<dyn GatewayConnector>,
) -> ServerResult<Router> {
    let state = AppState::new(connector, config.default_time_zone);
    Ok(routes::router(state)
        .layer(cors_layer(&config.cors_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// CORS for the note application. An empty list allows any origin.
pub fn cors_layer(origins: &[String]) -> ServerResult<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| ServerError::config(format!("invalid CORS origin \"{}\"", origin)))
        })
        .collect::<ServerResult<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

/// Binds the listener and serves until a shutdown signal arrives.
pub async fn serve(config: ServerConfig, connector: Arc<dyn GatewayConnector>) -> ServerResult<()> {
    let app = build_app(&config, connector)?;
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| ServerError::bind(config.bind_addr, e))?;

    info!(
        addr = %config.bind_addr,
        default_time_zone = %config.default_time_zone,
        "notecal-server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}
