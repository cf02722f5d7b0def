//! Event mutation reconciliation.
//!
//! The engine turns one validated request into a strictly sequential series
//! of gateway calls. Google's update is a full overwrite, so a partial update
//! always starts from the complete current resource and only overwrites the
//! fields the caller supplied. A move, when requested, is always the first
//! side effect.
//!
//! Nothing is retried and nothing is rolled back: if the update after a move
//! fails, the event stays in the destination calendar.

use chrono_tz::Tz;
use notecal_core::{
    EventData, EventDateTime, EventResource, PartialEventData, ResolveError, build_paste_text,
    resolve,
};
use notecal_providers::{CalendarGateway, ProviderError};
use thiserror::Error;
use tracing::{debug, info};

/// Why a mutation did not complete.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("cannot resolve event date: {0}")]
    Resolve(#[from] ResolveError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Applies create, update and delete requests through one gateway.
///
/// Built per request around the gateway handed out for that request.
pub struct EventEngine<'a> {
    gateway: &'a dyn CalendarGateway,
    default_time_zone: Tz,
}

impl<'a> EventEngine<'a> {
    /// `default_time_zone` is used when an update changes the date without
    /// naming a zone.
    pub fn new(gateway: &'a dyn CalendarGateway, default_time_zone: Tz) -> Self {
        Self {
            gateway,
            default_time_zone,
        }
    }

    /// Inserts a new event and returns its paste text.
    #[tracing::instrument(skip(self, data), fields(provider = self.gateway.name()))]
    pub async fn create_event(&self, calendar_id: &str, data: &EventData) -> EngineResult<String> {
        let (start, end) = resolve(&data.date, data.time_zone)?;
        let draft = EventResource::draft(
            data.name.as_str(),
            data.description.as_str(),
            data.location.as_str(),
            start,
            end,
        );

        let created = self.gateway.insert(calendar_id, &draft).await?;
        info!(event_id = created.event_id(), "event created");
        Ok(build_paste_text(&created, calendar_id))
    }

    /// Moves and/or merges fields into an existing event.
    ///
    /// The returned paste text always names the calendar the event lives in
    /// after the request, which is `to_calendar_id` when a move happened.
    #[tracing::instrument(skip(self, data), fields(provider = self.gateway.name()))]
    pub async fn update_event(
        &self,
        from_calendar_id: &str,
        event_id: &str,
        data: &PartialEventData,
        to_calendar_id: Option<&str>,
    ) -> EngineResult<String> {
        let times = self.resolve_partial(data)?;
        let mut calendar_id = from_calendar_id;
        let mut snapshot = None;

        if let Some(destination) = to_calendar_id.filter(|to| *to != from_calendar_id) {
            let moved = self
                .gateway
                .move_event(from_calendar_id, event_id, destination)
                .await?;
            info!(destination, "event moved");
            snapshot = Some(moved);
            calendar_id = destination;
        }

        if !data.is_empty() {
            let current = match snapshot.take() {
                Some(moved) => moved,
                None => self.gateway.get(calendar_id, event_id).await?,
            };
            let merged = merge(current, data, times);
            let updated = self.gateway.update(calendar_id, event_id, &merged).await?;
            info!(calendar_id, "event updated");
            snapshot = Some(updated);
        }

        let snapshot = match snapshot {
            Some(snapshot) => snapshot,
            None => {
                debug!("nothing to change, fetching current state");
                self.gateway.get(calendar_id, event_id).await?
            }
        };

        Ok(build_paste_text(&snapshot, calendar_id))
    }

    /// Deletes an event. `Ok(false)` when the provider reports it could not.
    #[tracing::instrument(skip(self), fields(provider = self.gateway.name()))]
    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> EngineResult<bool> {
        let deleted = self.gateway.delete(calendar_id, event_id).await?;
        if deleted {
            info!("event deleted");
        } else {
            info!("event was not deleted");
        }
        Ok(deleted)
    }

    /// Start and end for a partial update, resolved before any side effect.
    fn resolve_partial(
        &self,
        data: &PartialEventData,
    ) -> EngineResult<Option<(EventDateTime, EventDateTime)>> {
        let Some(ref date) = data.date else {
            return Ok(None);
        };
        let tz = data.time_zone.unwrap_or(self.default_time_zone);
        Ok(Some(resolve(date, tz)?))
    }
}

/// Overwrites the supplied fields of `current`, leaving everything else as is.
fn merge(
    mut current: EventResource,
    data: &PartialEventData,
    times: Option<(EventDateTime, EventDateTime)>,
) -> EventResource {
    if let Some(ref name) = data.name {
        current.summary = Some(name.clone());
    }
    if let Some(ref description) = data.description {
        current.description = Some(description.clone());
    }
    if let Some(ref location) = data.location {
        current.location = Some(location.clone());
    }
    if let Some((start, end)) = times {
        current.start = Some(start);
        current.end = Some(end);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingGateway, standup};
    use chrono::NaiveDate;
    use notecal_core::{DEFAULT_TIME_ZONE, DateDescriptor, DateValue};
    use notecal_providers::ProviderErrorCode;

    fn nine_to_ten() -> DateDescriptor {
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        DateDescriptor::new(
            DateValue::Timed(day.and_hms_opt(9, 0, 0).unwrap()),
            Some(DateValue::Timed(day.and_hms_opt(10, 0, 0).unwrap())),
        )
        .unwrap()
    }

    fn seeded() -> RecordingGateway {
        let gateway = RecordingGateway::new();
        gateway.seed("cal-1", standup("ev-1"));
        gateway
    }

    fn updated_payload(gateway: &RecordingGateway) -> (String, EventResource) {
        gateway
            .calls()
            .into_iter()
            .find_map(|call| match call {
                Call::Update {
                    calendar_id, event, ..
                } => Some((calendar_id, event)),
                _ => None,
            })
            .expect("an update call")
    }

    #[tokio::test]
    async fn create_returns_three_line_paste_text() {
        let gateway = RecordingGateway::new();
        let engine = EventEngine::new(&gateway, DEFAULT_TIME_ZONE);
        let data = EventData {
            name: "Standup".to_string(),
            date: nine_to_ten(),
            description: String::new(),
            time_zone: DEFAULT_TIME_ZONE,
            location: String::new(),
        };

        let text = engine.create_event("cal-1", &data).await.unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Event URL::https://calendar.test/event?eid=new-1",
                "Event ID::new-1",
                "Synced Calendar ID::cal-1",
            ]
        );

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        let Call::Insert { calendar_id, event } = &calls[0] else {
            panic!("expected insert, got {:?}", calls[0]);
        };
        assert_eq!(calendar_id, "cal-1");
        assert_eq!(event.summary.as_deref(), Some("Standup"));
        assert_eq!(
            event.start,
            Some(EventDateTime::date_time("2024-03-15T09:00:00+00:00", "Etc/UTC"))
        );
        assert_eq!(
            event.end,
            Some(EventDateTime::date_time("2024-03-15T10:00:00+00:00", "Etc/UTC"))
        );
        assert!(event.id.is_none());
        assert!(!event.extra.contains_key("attendees"));
    }

    #[tokio::test]
    async fn empty_update_only_fetches() {
        let gateway = seeded();
        let engine = EventEngine::new(&gateway, DEFAULT_TIME_ZONE);

        let text = engine
            .update_event("cal-1", "ev-1", &PartialEventData::default(), None)
            .await
            .unwrap();

        assert_eq!(gateway.call_kinds(), vec!["get"]);
        assert_eq!(gateway.stored("cal-1", "ev-1"), Some(standup("ev-1")));
        assert!(text.ends_with("Synced Calendar ID::cal-1"));
    }

    #[tokio::test]
    async fn description_update_fetches_then_replaces() {
        let gateway = seeded();
        let engine = EventEngine::new(&gateway, DEFAULT_TIME_ZONE);
        let data = PartialEventData {
            description: Some("updated".to_string()),
            ..Default::default()
        };

        let text = engine
            .update_event("cal-1", "ev-1", &data, None)
            .await
            .unwrap();

        assert_eq!(gateway.call_kinds(), vec!["get", "update"]);
        let (calendar_id, sent) = updated_payload(&gateway);
        assert_eq!(calendar_id, "cal-1");

        let mut expected = standup("ev-1");
        expected.description = Some("updated".to_string());
        assert_eq!(sent, expected);
        assert!(text.ends_with("Synced Calendar ID::cal-1"));
    }

    async fn sent_for(data: PartialEventData) -> EventResource {
        let gateway = seeded();
        let engine = EventEngine::new(&gateway, DEFAULT_TIME_ZONE);
        engine
            .update_event("cal-1", "ev-1", &data, None)
            .await
            .unwrap();
        updated_payload(&gateway).1
    }

    #[tokio::test]
    async fn single_field_changes_only_that_field() {
        let sent = sent_for(PartialEventData {
            name: Some("Retro".to_string()),
            ..Default::default()
        })
        .await;
        let mut expected = standup("ev-1");
        expected.summary = Some("Retro".to_string());
        assert_eq!(sent, expected);

        let sent = sent_for(PartialEventData {
            location: Some(String::new()),
            ..Default::default()
        })
        .await;
        let mut expected = standup("ev-1");
        expected.location = Some(String::new());
        assert_eq!(sent, expected);

        // A zone alone does not touch start or end.
        let sent = sent_for(PartialEventData {
            time_zone: Some(chrono_tz::Europe::Paris),
            ..Default::default()
        })
        .await;
        assert_eq!(sent, standup("ev-1"));
    }

    #[tokio::test]
    async fn same_calendar_target_does_not_move() {
        let gateway = seeded();
        let engine = EventEngine::new(&gateway, DEFAULT_TIME_ZONE);
        let data = PartialEventData {
            name: Some("Planning".to_string()),
            ..Default::default()
        };

        let text = engine
            .update_event("cal-1", "ev-1", &data, Some("cal-1"))
            .await
            .unwrap();

        assert_eq!(gateway.call_kinds(), vec!["get", "update"]);
        assert!(text.ends_with("Synced Calendar ID::cal-1"));
    }

    #[tokio::test]
    async fn move_only_skips_fetch_and_update() {
        let gateway = seeded();
        let engine = EventEngine::new(&gateway, DEFAULT_TIME_ZONE);

        let text = engine
            .update_event("cal-1", "ev-1", &PartialEventData::default(), Some("cal-2"))
            .await
            .unwrap();

        assert_eq!(
            gateway.calls(),
            vec![Call::Move {
                calendar_id: "cal-1".to_string(),
                event_id: "ev-1".to_string(),
                destination: "cal-2".to_string(),
            }]
        );
        assert!(text.ends_with("Synced Calendar ID::cal-2"));
        assert!(gateway.stored("cal-2", "ev-1").is_some());
    }

    #[tokio::test]
    async fn move_happens_before_update_on_destination() {
        let gateway = seeded();
        let engine = EventEngine::new(&gateway, DEFAULT_TIME_ZONE);
        let data = PartialEventData {
            name: Some("Moved standup".to_string()),
            ..Default::default()
        };

        let text = engine
            .update_event("cal-1", "ev-1", &data, Some("cal-2"))
            .await
            .unwrap();

        assert_eq!(gateway.call_kinds(), vec!["move", "update"]);
        let (calendar_id, sent) = updated_payload(&gateway);
        assert_eq!(calendar_id, "cal-2");
        assert_eq!(sent.summary.as_deref(), Some("Moved standup"));
        assert!(text.ends_with("Synced Calendar ID::cal-2"));
    }

    #[tokio::test]
    async fn date_without_time_zone_uses_default_zone() {
        let gateway = seeded();
        let engine = EventEngine::new(&gateway, chrono_tz::America::New_York);
        let day = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let data = PartialEventData {
            date: Some(DateDescriptor::timed(day.and_hms_opt(14, 0, 0).unwrap())),
            ..Default::default()
        };

        engine
            .update_event("cal-1", "ev-1", &data, None)
            .await
            .unwrap();

        let (_, sent) = updated_payload(&gateway);
        assert_eq!(
            sent.start,
            Some(EventDateTime::date_time(
                "2024-03-20T14:00:00-04:00",
                "America/New_York"
            ))
        );
        assert_eq!(
            sent.end,
            Some(EventDateTime::date_time(
                "2024-03-20T15:00:00-04:00",
                "America/New_York"
            ))
        );
        assert_eq!(sent.summary, standup("ev-1").summary);
    }

    #[tokio::test]
    async fn explicit_time_zone_wins_over_default() {
        let gateway = seeded();
        let engine = EventEngine::new(&gateway, chrono_tz::America::New_York);
        let data = PartialEventData {
            date: Some(DateDescriptor::all_day(
                NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            )),
            time_zone: Some(chrono_tz::Europe::Paris),
            ..Default::default()
        };

        engine
            .update_event("cal-1", "ev-1", &data, None)
            .await
            .unwrap();

        let (_, sent) = updated_payload(&gateway);
        assert_eq!(sent.start, Some(EventDateTime::date("2024-03-20", "Europe/Paris")));
        assert_eq!(sent.end, Some(EventDateTime::date("2024-03-21", "Europe/Paris")));
    }

    #[tokio::test]
    async fn unresolvable_date_makes_no_calls() {
        let gateway = seeded();
        let engine = EventEngine::new(&gateway, chrono_tz::Europe::Paris);
        let gap = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let data = PartialEventData {
            date: Some(DateDescriptor::timed(gap)),
            ..Default::default()
        };

        let err = engine
            .update_event("cal-1", "ev-1", &data, Some("cal-2"))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Resolve(_)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_event_propagates_provider_error() {
        let gateway = RecordingGateway::new();
        let engine = EventEngine::new(&gateway, DEFAULT_TIME_ZONE);
        let data = PartialEventData {
            description: Some("x".to_string()),
            ..Default::default()
        };

        let err = engine
            .update_event("cal-1", "ev-404", &data, None)
            .await
            .unwrap_err();

        let EngineError::Provider(err) = err else {
            panic!("expected provider error");
        };
        assert_eq!(err.code(), ProviderErrorCode::NotFound);
        assert_eq!(gateway.call_kinds(), vec!["get"]);
    }

    #[tokio::test]
    async fn failed_update_after_move_leaves_event_moved() {
        let gateway = RecordingGateway::failing_updates();
        gateway.seed("cal-1", standup("ev-1"));
        let engine = EventEngine::new(&gateway, DEFAULT_TIME_ZONE);
        let data = PartialEventData {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };

        let err = engine
            .update_event("cal-1", "ev-1", &data, Some("cal-2"))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Provider(_)));
        assert_eq!(gateway.call_kinds(), vec!["move", "update"]);
        assert!(gateway.stored("cal-1", "ev-1").is_none());
        assert_eq!(gateway.stored("cal-2", "ev-1"), Some(standup("ev-1")));
    }

    #[tokio::test]
    async fn delete_reports_outcome() {
        let gateway = seeded();
        let engine = EventEngine::new(&gateway, DEFAULT_TIME_ZONE);

        assert!(engine.delete_event("cal-1", "ev-1").await.unwrap());
        assert!(!engine.delete_event("cal-1", "ev-1").await.unwrap());
        assert_eq!(gateway.call_kinds(), vec!["delete", "delete"]);
    }
}
