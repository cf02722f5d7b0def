//! Google Calendar API client.
//!
//! Low-level HTTP client for the single-event endpoints of Calendar API v3.
//! Every mutation is sent with `sendUpdates=none`.

use std::time::Duration;

use notecal_core::EventResource;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::gateway::{BoxFuture, CalendarGateway};

use super::PROVIDER_NAME;

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar API client bound to one access token.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GoogleCalendarClient {
    /// Creates a new Google Calendar client with the given access token.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration("failed to create HTTP client")
                    .with_provider(PROVIDER_NAME)
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
            base_url: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetches one event.
    pub async fn get_event(&self, calendar_id: &str, event_id: &str) -> ProviderResult<EventResource> {
        let url = event_url(&self.base_url, calendar_id, Some(event_id));
        debug!(calendar_id, event_id, "fetching event");

        let response = self.send(self.http_client.get(&url)).await?;
        parse_event(response).await
    }

    /// Inserts a new event.
    pub async fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventResource,
    ) -> ProviderResult<EventResource> {
        let url = event_url(&self.base_url, calendar_id, None);
        debug!(calendar_id, "inserting event");

        let request = self
            .http_client
            .post(&url)
            .query(&[("sendUpdates", "none")]);
        let response = self.send(with_json_body(request, event)?).await?;
        parse_event(response).await
    }

    /// Replaces an event with `event` (PUT, not PATCH).
    pub async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        event: &EventResource,
    ) -> ProviderResult<EventResource> {
        let url = event_url(&self.base_url, calendar_id, Some(event_id));
        debug!(calendar_id, event_id, "replacing event");

        let request = self.http_client.put(&url).query(&[("sendUpdates", "none")]);
        let response = self.send(with_json_body(request, event)?).await?;
        parse_event(response).await
    }

    /// Moves an event to another calendar.
    pub async fn move_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        destination: &str,
    ) -> ProviderResult<EventResource> {
        let url = format!("{}/move", event_url(&self.base_url, calendar_id, Some(event_id)));
        debug!(calendar_id, event_id, destination, "moving event");

        let request = self
            .http_client
            .post(&url)
            .query(&[("destination", destination), ("sendUpdates", "none")]);
        let response = self.send(request).await?;
        parse_event(response).await
    }

    /// Deletes an event. `Ok(false)` if it was already missing or gone.
    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> ProviderResult<bool> {
        let url = event_url(&self.base_url, calendar_id, Some(event_id));
        debug!(calendar_id, event_id, "deleting event");

        let request = self
            .http_client
            .delete(&url)
            .query(&[("sendUpdates", "none")]);
        match self.send(request).await {
            Ok(_) => Ok(true),
            Err(e) if e.code() == crate::ProviderErrorCode::NotFound => {
                warn!(calendar_id, event_id, "event not deleted: {}", e.message());
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Sends an authorized request and turns non-success statuses into errors.
    async fn send(&self, request: RequestBuilder) -> ProviderResult<Response> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                let err = if e.is_timeout() {
                    ProviderError::network("request timeout")
                } else if e.is_connect() {
                    ProviderError::network(format!("connection failed: {}", e))
                } else {
                    ProviderError::network(format!("request failed: {}", e))
                };
                err.with_provider(PROVIDER_NAME)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, retry_after, &body))
    }
}

impl CalendarGateway for GoogleCalendarClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn get<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<EventResource>> {
        Box::pin(self.get_event(calendar_id, event_id))
    }

    fn insert<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a EventResource,
    ) -> BoxFuture<'a, ProviderResult<EventResource>> {
        Box::pin(self.insert_event(calendar_id, event))
    }

    fn update<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        event: &'a EventResource,
    ) -> BoxFuture<'a, ProviderResult<EventResource>> {
        Box::pin(self.update_event(calendar_id, event_id, event))
    }

    fn move_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        destination: &'a str,
    ) -> BoxFuture<'a, ProviderResult<EventResource>> {
        Box::pin(GoogleCalendarClient::move_event(
            self,
            calendar_id,
            event_id,
            destination,
        ))
    }

    fn delete<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<bool>> {
        Box::pin(self.delete_event(calendar_id, event_id))
    }
}

/// Builds `{base}/calendars/{calendar}/events[/{event}]` with encoded segments.
fn event_url(base: &str, calendar_id: &str, event_id: Option<&str>) -> String {
    let mut url = format!(
        "{}/calendars/{}/events",
        base,
        urlencoding::encode(calendar_id)
    );
    if let Some(event_id) = event_id {
        url.push('/');
        url.push_str(&urlencoding::encode(event_id));
    }
    url
}

fn with_json_body(request: RequestBuilder, event: &EventResource) -> ProviderResult<RequestBuilder> {
    let body = serde_json::to_vec(event).map_err(|e| {
        ProviderError::bad_request(format!("failed to serialize event: {}", e))
            .with_provider(PROVIDER_NAME)
    })?;
    Ok(request.header(CONTENT_TYPE, "application/json").body(body))
}

async fn parse_event(response: Response) -> ProviderResult<EventResource> {
    let body = response.text().await.map_err(|e| {
        ProviderError::network(format!("failed to read response: {}", e))
            .with_provider(PROVIDER_NAME)
    })?;

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse event: {}", e))
            .with_provider(PROVIDER_NAME)
    })
}

/// Error envelope returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Maps a non-success response to a [`ProviderError`].
fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> ProviderError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    let err = match status {
        StatusCode::UNAUTHORIZED => {
            ProviderError::authentication(format!("access token rejected: {}", detail))
        }
        StatusCode::FORBIDDEN => ProviderError::authorization(format!("access denied: {}", detail)),
        StatusCode::NOT_FOUND | StatusCode::GONE => {
            ProviderError::not_found(format!("{} ({})", detail, status))
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        s if s.is_server_error() => {
            ProviderError::server(format!("API error ({}): {}", status, detail))
        }
        _ => ProviderError::bad_request(format!("API error ({}): {}", status, detail)),
    };
    err.with_provider(PROVIDER_NAME)
}
