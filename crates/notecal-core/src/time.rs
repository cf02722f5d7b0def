//! Date descriptors and their resolution into provider start/end pairs.
//!
//! A [`DateDescriptor`] is what callers send: an all-day date or a wall-clock
//! date-time, with an optional end of the same kind. [`resolve`] turns it into
//! the pair of [`EventDateTime`] values the provider expects, interpreting
//! wall-clock times in the requested timezone.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

use crate::event::EventDateTime;

/// Timezone used when a request does not name one.
pub const DEFAULT_TIME_ZONE: Tz = Tz::Etc__UTC;

/// Length of a timed event whose end is not given.
const DEFAULT_EVENT_MINUTES: i64 = 60;

/// Wall-clock formats accepted for timed values.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses an IANA timezone name.
pub fn parse_time_zone(name: &str) -> Option<Tz> {
    name.trim().parse::<Tz>().ok()
}

/// One end of a date descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    /// A calendar date with no time of day.
    AllDay(NaiveDate),
    /// A wall-clock date and time, not yet bound to a timezone.
    Timed(NaiveDateTime),
}

impl DateValue {
    /// Parses `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM[:SS]`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Some(Self::AllDay(date));
        }
        DATE_TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
            .map(Self::Timed)
    }

    /// Returns `true` for all-day values.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }
}

/// Why a start/end combination cannot form a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("start and end must both be dates or both be date-times")]
    MixedKinds,
    #[error("end must be after start")]
    EndBeforeStart,
}

/// An abstract event date: start plus optional end of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateDescriptor {
    start: DateValue,
    end: Option<DateValue>,
}

impl DateDescriptor {
    /// Creates a descriptor, checking that `end` matches `start`.
    ///
    /// All-day ends are exclusive and must fall strictly after the start;
    /// timed ends may equal the start.
    pub fn new(start: DateValue, end: Option<DateValue>) -> Result<Self, DescriptorError> {
        match (start, end) {
            (_, None) => {}
            (DateValue::AllDay(s), Some(DateValue::AllDay(e))) if e <= s => {
                return Err(DescriptorError::EndBeforeStart);
            }
            (DateValue::Timed(s), Some(DateValue::Timed(e))) if e < s => {
                return Err(DescriptorError::EndBeforeStart);
            }
            (DateValue::AllDay(_), Some(DateValue::AllDay(_)))
            | (DateValue::Timed(_), Some(DateValue::Timed(_))) => {}
            _ => return Err(DescriptorError::MixedKinds),
        }
        Ok(Self { start, end })
    }

    /// Single all-day event on `date`.
    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            start: DateValue::AllDay(date),
            end: None,
        }
    }

    /// Timed event starting at `start` with the default duration.
    pub fn timed(start: NaiveDateTime) -> Self {
        Self {
            start: DateValue::Timed(start),
            end: None,
        }
    }

    pub fn start(&self) -> DateValue {
        self.start
    }

    pub fn end(&self) -> Option<DateValue> {
        self.end
    }
}

/// Failure to bind a descriptor to a timezone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The wall-clock time falls in a DST gap.
    #[error("{time} does not exist in time zone {time_zone}")]
    NonexistentLocalTime {
        time: NaiveDateTime,
        time_zone: String,
    },
    /// Date arithmetic left chrono's supported range.
    #[error("date out of range")]
    OutOfRange,
}

/// Converts a descriptor into provider `(start, end)` values in `tz`.
pub fn resolve(
    date: &DateDescriptor,
    tz: Tz,
) -> Result<(EventDateTime, EventDateTime), ResolveError> {
    match (date.start, date.end) {
        (DateValue::AllDay(start), end) => {
            let end = match end {
                Some(DateValue::AllDay(end)) => end,
                _ => start.succ_opt().ok_or(ResolveError::OutOfRange)?,
            };
            Ok((
                EventDateTime::date(start.format("%Y-%m-%d").to_string(), tz.name()),
                EventDateTime::date(end.format("%Y-%m-%d").to_string(), tz.name()),
            ))
        }
        (DateValue::Timed(start), end) => {
            let start_at = localize(start, tz)?;
            let end_at = match end {
                Some(DateValue::Timed(end)) => localize(end, tz)?,
                _ => start_at
                    .checked_add_signed(Duration::minutes(DEFAULT_EVENT_MINUTES))
                    .ok_or(ResolveError::OutOfRange)?,
            };
            Ok((
                EventDateTime::date_time(start_at.to_rfc3339(), tz.name()),
                EventDateTime::date_time(end_at.to_rfc3339(), tz.name()),
            ))
        }
    }
}

/// Binds a wall-clock time to `tz`, taking the earlier instant on a DST fold.
fn localize(time: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>, ResolveError> {
    match tz.from_local_datetime(&time) {
        LocalResult::Single(at) => Ok(at),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(ResolveError::NonexistentLocalTime {
            time,
            time_zone: tz.name().to_string(),
        }),
    }
}
