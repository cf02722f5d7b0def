//! Request payloads and the validation boundary.
//!
//! Raw JSON bodies are checked here and turned into typed [`EventData`] or
//! [`PartialEventData`]. Every problem is collected into [`ValidationErrors`]
//! so the caller can report all of them at once.
//!
//! In [`PartialEventData`] each field is an `Option`: `None` means the caller
//! did not send the key and the existing value must be left alone, while
//! `Some(String::new())` is a deliberate new empty value. An explicit JSON
//! `null` is rejected rather than read as either.

use std::fmt;

use chrono_tz::Tz;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::time::{DEFAULT_TIME_ZONE, DateDescriptor, DateValue, parse_time_zone};

/// Maximum accepted location length, in characters.
pub const MAX_LOCATION_CHARS: usize = 1024;

/// A validated create payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    pub name: String,
    pub date: DateDescriptor,
    pub description: String,
    pub time_zone: Tz,
    pub location: String,
}

/// A validated update payload. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialEventData {
    pub name: Option<String>,
    pub date: Option<DateDescriptor>,
    pub description: Option<String>,
    pub time_zone: Option<Tz>,
    pub location: Option<String>,
}

impl PartialEventData {
    /// Returns `true` when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.date.is_none()
            && self.description.is_none()
            && self.time_zone.is_none()
            && self.location.is_none()
    }
}

/// Every field-level problem found in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors {
    messages: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a problem with `field`.
    pub fn push(&mut self, field: &str, message: impl fmt::Display) {
        self.messages.push(format!("{}: {}", field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Joins two independent validation results, keeping the errors of both.
    pub fn combine<A, B>(
        a: Result<A, ValidationErrors>,
        b: Result<B, ValidationErrors>,
    ) -> Result<(A, B), ValidationErrors> {
        match (a, b) {
            (Ok(a), Ok(b)) => Ok((a, b)),
            (Err(mut a), Err(b)) => {
                a.messages.extend(b.messages);
                Err(a)
            }
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages.join("; "))
    }
}

/// Checks a required identifier such as a calendar id query parameter.
pub fn require_id(field: &str, value: Option<&str>) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    match value.map(str::trim) {
        Some(id) if !id.is_empty() => return Ok(id.to_string()),
        Some(_) => errors.push(field, "must not be empty"),
        None => errors.push(field, "Required"),
    }
    Err(errors)
}

/// Validates a create body.
pub fn validate_event(body: &Value) -> Result<EventData, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(obj) = body_object(body, &mut errors) else {
        return Err(errors);
    };

    let name = required(obj, "name", &mut errors, name_field);
    let date = required(obj, "date", &mut errors, date_field);
    let description = text_field(obj, "description", &mut errors).present();
    let location = location_field(obj, &mut errors).present();
    let time_zone = time_zone_field(obj, &mut errors).present();

    match (name, date) {
        (Some(name), Some(date)) if errors.is_empty() => Ok(EventData {
            name,
            date,
            description: description.unwrap_or_default(),
            time_zone: time_zone.unwrap_or(DEFAULT_TIME_ZONE),
            location: location.unwrap_or_default(),
        }),
        _ => Err(errors),
    }
}

/// Validates an update body. Only supplied keys become `Some`.
pub fn validate_partial_event(body: &Value) -> Result<PartialEventData, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let Some(obj) = body_object(body, &mut errors) else {
        return Err(errors);
    };

    let data = PartialEventData {
        name: name_field(obj, &mut errors).present(),
        date: date_field(obj, &mut errors).present(),
        description: text_field(obj, "description", &mut errors).present(),
        time_zone: time_zone_field(obj, &mut errors).present(),
        location: location_field(obj, &mut errors).present(),
    };

    if errors.is_empty() { Ok(data) } else { Err(errors) }
}

/// Outcome of reading one optional key.
enum Field<T> {
    Absent,
    Present(T),
    Invalid,
}

impl<T> Field<T> {
    fn present(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Invalid => None,
        }
    }
}

fn body_object<'a>(
    body: &'a Value,
    errors: &mut ValidationErrors,
) -> Option<&'a Map<String, Value>> {
    match body {
        Value::Object(obj) => Some(obj),
        other => {
            errors.push("body", format!("expected object, received {}", kind(other)));
            None
        }
    }
}

fn required<T>(
    obj: &Map<String, Value>,
    key: &str,
    errors: &mut ValidationErrors,
    read: fn(&Map<String, Value>, &mut ValidationErrors) -> Field<T>,
) -> Option<T> {
    match read(obj, errors) {
        Field::Present(value) => Some(value),
        Field::Absent => {
            errors.push(key, "Required");
            None
        }
        Field::Invalid => None,
    }
}

fn string_field<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    errors: &mut ValidationErrors,
) -> Field<&'a str> {
    match obj.get(key) {
        None => Field::Absent,
        Some(Value::String(s)) => Field::Present(s),
        Some(other) => {
            errors.push(key, format!("expected string, received {}", kind(other)));
            Field::Invalid
        }
    }
}

fn text_field(obj: &Map<String, Value>, key: &str, errors: &mut ValidationErrors) -> Field<String> {
    match string_field(obj, key, errors) {
        Field::Present(s) => Field::Present(s.trim().to_string()),
        Field::Absent => Field::Absent,
        Field::Invalid => Field::Invalid,
    }
}

fn name_field(obj: &Map<String, Value>, errors: &mut ValidationErrors) -> Field<String> {
    match text_field(obj, "name", errors) {
        Field::Present(name) if name.is_empty() => {
            errors.push("name", "must not be empty");
            Field::Invalid
        }
        field => field,
    }
}

fn location_field(obj: &Map<String, Value>, errors: &mut ValidationErrors) -> Field<String> {
    match text_field(obj, "location", errors) {
        Field::Present(location) if location.chars().count() > MAX_LOCATION_CHARS => {
            errors.push(
                "location",
                format!("must be at most {} characters", MAX_LOCATION_CHARS),
            );
            Field::Invalid
        }
        field => field,
    }
}

fn time_zone_field(obj: &Map<String, Value>, errors: &mut ValidationErrors) -> Field<Tz> {
    match string_field(obj, "timeZone", errors) {
        Field::Present(name) => match parse_time_zone(name) {
            Some(tz) => Field::Present(tz),
            None => {
                errors.push("timeZone", format!("unknown time zone \"{}\"", name));
                Field::Invalid
            }
        },
        Field::Absent => Field::Absent,
        Field::Invalid => Field::Invalid,
    }
}

/// Reads `date` as `"<value>"` or `{"start": "<value>", "end"?: "<value>"}`.
fn date_field(obj: &Map<String, Value>, errors: &mut ValidationErrors) -> Field<DateDescriptor> {
    let (start, end) = match obj.get("date") {
        None => return Field::Absent,
        Some(Value::String(s)) => (parse_date_value("date", s, errors), Field::Absent),
        Some(Value::Object(range)) => (
            date_value_field(range, "start", errors),
            date_value_field(range, "end", errors),
        ),
        Some(other) => {
            errors.push(
                "date",
                format!("expected string or object, received {}", kind(other)),
            );
            return Field::Invalid;
        }
    };

    let start = match start {
        Field::Present(start) => start,
        Field::Absent => {
            errors.push("date.start", "Required");
            return Field::Invalid;
        }
        Field::Invalid => return Field::Invalid,
    };
    let end = match end {
        Field::Present(end) => Some(end),
        Field::Absent => None,
        Field::Invalid => return Field::Invalid,
    };

    match DateDescriptor::new(start, end) {
        Ok(descriptor) => Field::Present(descriptor),
        Err(e) => {
            errors.push("date", e);
            Field::Invalid
        }
    }
}

fn date_value_field(
    range: &Map<String, Value>,
    key: &str,
    errors: &mut ValidationErrors,
) -> Field<DateValue> {
    let field = format!("date.{}", key);
    match range.get(key) {
        None => Field::Absent,
        Some(Value::String(s)) => parse_date_value(&field, s, errors),
        Some(other) => {
            errors.push(&field, format!("expected string, received {}", kind(other)));
            Field::Invalid
        }
    }
}

fn parse_date_value(field: &str, value: &str, errors: &mut ValidationErrors) -> Field<DateValue> {
    match DateValue::parse(value) {
        Some(parsed) => Field::Present(parsed),
        None => {
            errors.push(
                field,
                format!(
                    "expected YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS], received \"{}\"",
                    value
                ),
            );
            Field::Invalid
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
