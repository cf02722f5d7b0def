//! In-memory gateway that records every call, for engine and route tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use notecal_core::{EventDateTime, EventResource};
use notecal_providers::{
    BoxFuture, CalendarGateway, GatewayConnector, ProviderError, ProviderResult,
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Get {
        calendar_id: String,
        event_id: String,
    },
    Insert {
        calendar_id: String,
        event: EventResource,
    },
    Update {
        calendar_id: String,
        event_id: String,
        event: EventResource,
    },
    Move {
        calendar_id: String,
        event_id: String,
        destination: String,
    },
    Delete {
        calendar_id: String,
        event_id: String,
    },
}

impl Call {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Call::Get { .. } => "get",
            Call::Insert { .. } => "insert",
            Call::Update { .. } => "update",
            Call::Move { .. } => "move",
            Call::Delete { .. } => "delete",
        }
    }
}

#[derive(Default)]
struct Inner {
    events: Mutex<HashMap<(String, String), EventResource>>,
    calls: Mutex<Vec<Call>>,
    fail_updates: bool,
}

/// Cloning shares the recorded state.
#[derive(Clone, Default)]
pub(crate) struct RecordingGateway {
    inner: Arc<Inner>,
}

impl RecordingGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A gateway whose `update` always fails with a server error.
    pub(crate) fn failing_updates() -> Self {
        Self {
            inner: Arc::new(Inner {
                fail_updates: true,
                ..Default::default()
            }),
        }
    }

    pub(crate) fn seed(&self, calendar_id: &str, event: EventResource) {
        let key = (calendar_id.to_string(), event.event_id().to_string());
        self.inner.events.lock().unwrap().insert(key, event);
    }

    pub(crate) fn stored(&self, calendar_id: &str, event_id: &str) -> Option<EventResource> {
        self.inner
            .events
            .lock()
            .unwrap()
            .get(&(calendar_id.to_string(), event_id.to_string()))
            .cloned()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_kinds(&self) -> Vec<&'static str> {
        self.calls().iter().map(Call::kind).collect()
    }

    fn record(&self, call: Call) {
        self.inner.calls.lock().unwrap().push(call);
    }

    fn missing(calendar_id: &str, event_id: &str) -> ProviderError {
        ProviderError::not_found(format!("event {} not found in {}", event_id, calendar_id))
            .with_provider("memory")
    }
}

impl CalendarGateway for RecordingGateway {
    fn name(&self) -> &str {
        "memory"
    }

    fn get<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<EventResource>> {
        Box::pin(async move {
            self.record(Call::Get {
                calendar_id: calendar_id.to_string(),
                event_id: event_id.to_string(),
            });
            self.stored(calendar_id, event_id)
                .ok_or_else(|| Self::missing(calendar_id, event_id))
        })
    }

    fn insert<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a EventResource,
    ) -> BoxFuture<'a, ProviderResult<EventResource>> {
        Box::pin(async move {
            self.record(Call::Insert {
                calendar_id: calendar_id.to_string(),
                event: event.clone(),
            });
            let id = format!("new-{}", self.calls().len());
            let mut stored = event.clone();
            stored.html_link = Some(format!("https://calendar.test/event?eid={}", id));
            stored.id = Some(id);
            self.seed(calendar_id, stored.clone());
            Ok(stored)
        })
    }

    fn update<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        event: &'a EventResource,
    ) -> BoxFuture<'a, ProviderResult<EventResource>> {
        Box::pin(async move {
            self.record(Call::Update {
                calendar_id: calendar_id.to_string(),
                event_id: event_id.to_string(),
                event: event.clone(),
            });
            if self.inner.fail_updates {
                return Err(ProviderError::server("backend unavailable").with_provider("memory"));
            }
            if self.stored(calendar_id, event_id).is_none() {
                return Err(Self::missing(calendar_id, event_id));
            }
            let mut stored = event.clone();
            stored.id = Some(event_id.to_string());
            self.seed(calendar_id, stored.clone());
            Ok(stored)
        })
    }

    fn move_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
        destination: &'a str,
    ) -> BoxFuture<'a, ProviderResult<EventResource>> {
        Box::pin(async move {
            self.record(Call::Move {
                calendar_id: calendar_id.to_string(),
                event_id: event_id.to_string(),
                destination: destination.to_string(),
            });
            let key = (calendar_id.to_string(), event_id.to_string());
            let event = self
                .inner
                .events
                .lock()
                .unwrap()
                .remove(&key)
                .ok_or_else(|| Self::missing(calendar_id, event_id))?;
            self.seed(destination, event.clone());
            Ok(event)
        })
    }

    fn delete<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<bool>> {
        Box::pin(async move {
            self.record(Call::Delete {
                calendar_id: calendar_id.to_string(),
                event_id: event_id.to_string(),
            });
            let key = (calendar_id.to_string(), event_id.to_string());
            Ok(self.inner.events.lock().unwrap().remove(&key).is_some())
        })
    }
}

/// Hands out clones of one [`RecordingGateway`].
pub(crate) struct RecordingConnector {
    pub(crate) gateway: RecordingGateway,
}

impl GatewayConnector for RecordingConnector {
    fn connect(&self) -> BoxFuture<'_, ProviderResult<Box<dyn CalendarGateway>>> {
        Box::pin(async move { Ok(Box::new(self.gateway.clone()) as Box<dyn CalendarGateway>) })
    }
}

/// Always fails to authenticate.
pub(crate) struct RejectingConnector;

impl GatewayConnector for RejectingConnector {
    fn connect(&self) -> BoxFuture<'_, ProviderResult<Box<dyn CalendarGateway>>> {
        Box::pin(async {
            Err(
                ProviderError::authentication("invalid Google credentials: client_id is required")
                    .with_provider("google"),
            )
        })
    }
}

/// A stored event with provider-managed fields the service never models.
pub(crate) fn standup(event_id: &str) -> EventResource {
    let extra = json!({
        "etag": "\"3181161784712000\"",
        "status": "confirmed",
        "organizer": {"email": "cal-1@group.calendar.google.com"},
        "attendees": [{"email": "ada@example.com", "responseStatus": "accepted"}],
        "reminders": {"useDefault": true}
    });

    EventResource {
        id: Some(event_id.to_string()),
        summary: Some("Standup".to_string()),
        description: Some("daily sync".to_string()),
        location: Some("Room 1".to_string()),
        start: Some(EventDateTime::date_time(
            "2024-03-15T09:00:00+00:00",
            "Etc/UTC",
        )),
        end: Some(EventDateTime::date_time(
            "2024-03-15T10:00:00+00:00",
            "Etc/UTC",
        )),
        html_link: Some(format!("https://calendar.test/event?eid={}", event_id)),
        extra: extra.as_object().cloned().unwrap_or_default(),
    }
}
