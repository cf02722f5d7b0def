//! Core types: event payloads, validation, date resolution, paste text.

pub mod event;
pub mod format;
pub mod payload;
pub mod time;
pub mod tracing;

pub use event::{EventDateTime, EventResource};
pub use format::build_paste_text;
pub use payload::{
    EventData, PartialEventData, ValidationErrors, require_id, validate_event,
    validate_partial_event,
};
pub use time::{
    DEFAULT_TIME_ZONE, DateDescriptor, DateValue, DescriptorError, ResolveError, parse_time_zone,
    resolve,
};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
