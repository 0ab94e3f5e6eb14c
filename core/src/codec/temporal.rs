use super::{Codec, CodecError, Raw};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use docfilter_ast::Value;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Drop everything below the millisecond, the resolution document stores keep.
pub fn truncate_millis(datetime: NaiveDateTime) -> NaiveDateTime {
    let nanos = datetime.nanosecond() / 1_000_000 * 1_000_000;
    datetime.with_nanosecond(nanos).unwrap_or(datetime)
}

/// ISO-8601 date and time. Offsets are normalised to UTC; naive input is taken as UTC.
/// A bare date is not a datetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTimeCodec {
    pub millis: bool,
}

impl DateTimeCodec {
    pub fn new() -> Self { Self::default() }

    /// Truncate decoded values to millisecond precision
    pub fn millis() -> Self { Self { millis: true } }

    fn parse(text: &str) -> Option<NaiveDateTime> {
        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return Some(datetime.naive_utc());
        }
        DATETIME_FORMATS.iter().find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    }
}

impl Codec for DateTimeCodec {
    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let text = raw.single()?.trim();
        let datetime = Self::parse(text).ok_or_else(|| CodecError::invalid(text, "datetime"))?;
        Ok(Value::DateTime(if self.millis { truncate_millis(datetime) } else { datetime }))
    }
}

/// `YYYY-MM-DD` only. The last representable date is rejected, since a whole-day
/// match needs the following day as its upper bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateCodec;

impl Codec for DateCodec {
    fn decode(&self, raw: &Raw) -> Result<Value, CodecError> {
        let text = raw.single()?.trim();
        match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            Ok(date) if date.succ_opt().is_some() => Ok(Value::Date(date)),
            _ => Err(CodecError::invalid(text, "date")),
        }
    }
}
