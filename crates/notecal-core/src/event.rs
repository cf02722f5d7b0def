//! Provider event resource.
//!
//! [`EventResource`] mirrors the Google Calendar `Event` resource. Only the
//! fields this service reads or writes are typed; everything else the provider
//! returns is kept in [`EventResource::extra`] so that a full-resource replace
//! sends it back untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Start or end of an event in provider representation.
///
/// Exactly one of `date` (all-day) or `date_time` (RFC 3339) is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// All-day date, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Instant with offset, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// IANA timezone the time was expressed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// Creates an all-day value.
    pub fn date(date: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            date_time: None,
            time_zone: Some(time_zone.into()),
        }
    }

    /// Creates a timed value.
    pub fn date_time(date_time: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            date: None,
            date_time: Some(date_time.into()),
            time_zone: Some(time_zone.into()),
        }
    }

    /// Returns `true` if this is an all-day value.
    pub fn is_all_day(&self) -> bool {
        self.date.is_some()
    }
}

/// The full provider-side representation of one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResource {
    /// Provider-issued identifier. Unset on a resource about to be inserted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Event title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    /// Canonical link to the event in the provider's web UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    /// Provider-managed fields (etag, organizer, reminders, attendees, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventResource {
    /// Builds a new resource ready to be inserted.
    ///
    /// Attendees are deliberately absent: the service credentials cannot
    /// invite attendees without domain-wide delegation.
    pub fn draft(
        summary: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<String>,
        start: EventDateTime,
        end: EventDateTime,
    ) -> Self {
        Self {
            summary: Some(summary.into()),
            description: Some(description.into()),
            location: Some(location.into()),
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    /// Returns the event identifier, or an empty string when unset.
    pub fn event_id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    /// Returns the canonical event link, or an empty string when unset.
    pub fn link(&self) -> &str {
        self.html_link.as_deref().unwrap_or_default()
    }
}
