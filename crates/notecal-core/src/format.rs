//! Paste text returned to the note application.

use crate::event::EventResource;

/// Renders the three-line `key::value` block for an event.
///
/// Values are provider-issued or already validated, so nothing is escaped.
pub fn build_paste_text(event: &EventResource, calendar_id: &str) -> String {
    format!(
        "Event URL::{}\nEvent ID::{}\nSynced Calendar ID::{}",
        event.link(),
        event.event_id(),
        calendar_id
    )
}
