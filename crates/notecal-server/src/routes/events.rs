//! Event endpoints

use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{post, put},
};
use notecal_core::{ValidationErrors, require_id, validate_event, validate_partial_event};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{ApiError, AppState};
use crate::engine::EventEngine;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event))
        .route("/events/{event_id}", put(update_event).delete(delete_event))
}

#[derive(Debug, Deserialize)]
pub struct CreateQuery {
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub from: Option<String>,
}

/// POST /events?to= - Create an event, respond with its paste text
async fn create_event(
    State(state): State<AppState>,
    Query(query): Query<CreateQuery>,
    body: Bytes,
) -> Result<(StatusCode, String), ApiError> {
    let (calendar_id, data) = ValidationErrors::combine(
        require_id("to", query.to.as_deref()),
        parse_body(&body).and_then(|body| validate_event(&body)),
    )?;

    let gateway = state.connector.connect().await?;
    let engine = EventEngine::new(gateway.as_ref(), state.default_time_zone);
    let text = engine.create_event(&calendar_id, &data).await?;
    Ok((StatusCode::CREATED, text))
}

/// PUT /events/{event_id}?from=&to= - Move and/or update an event
async fn update_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(query): Query<UpdateQuery>,
    body: Bytes,
) -> Result<String, ApiError> {
    let ids = ValidationErrors::combine(
        require_id("eventId", Some(event_id.as_str())),
        require_id("from", query.from.as_deref()),
    );
    let to = match query.to.as_deref() {
        Some(to) => require_id("to", Some(to)).map(Some),
        None => Ok(None),
    };
    let data = parse_body(&body).and_then(|body| validate_partial_event(&body));
    let ((event_id, from), (to, data)) =
        ValidationErrors::combine(ids, ValidationErrors::combine(to, data))?;

    let gateway = state.connector.connect().await?;
    let engine = EventEngine::new(gateway.as_ref(), state.default_time_zone);
    let text = engine
        .update_event(&from, &event_id, &data, to.as_deref())
        .await?;
    Ok(text)
}

/// DELETE /events/{event_id}?from= - Delete an event
async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<String, ApiError> {
    let (event_id, from) = ValidationErrors::combine(
        require_id("eventId", Some(event_id.as_str())),
        require_id("from", query.from.as_deref()),
    )?;

    let gateway = state.connector.connect().await?;
    let engine = EventEngine::new(gateway.as_ref(), state.default_time_zone);
    if engine.delete_event(&from, &event_id).await? {
        Ok(format!("Deleted Event ID::{}", event_id))
    } else {
        Ok(format!("Failed to delete Event ID::{}", event_id))
    }
}

/// Parses a raw body. An empty body reads as `{}`.
fn parse_body(body: &[u8]) -> Result<Value, ValidationErrors> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| {
        debug!("rejecting malformed body: {}", e);
        let mut errors = ValidationErrors::new();
        errors.push("body", format!("invalid JSON: {}", e));
        errors
    })
}
