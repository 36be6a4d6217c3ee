//! Formatting and parsing of the naive local date-times stored in the database
//! and exchanged with clients, e.g. "2025-01-31T18:30:00".
//!
//! Date-times are stored as text in this fixed-width format so that SQL string
//! comparisons order them chronologically.

use rusqlite::{Row, types::Type};
use time::{
    Date, PrimitiveDateTime, Time, format_description::BorrowedFormatItem,
    macros::format_description,
};

/// Date time format for timestamps, e.g. "2021-01-01T00:00:00".
const DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Date time format with a fractional second, e.g. "2021-01-01T00:00:00.123".
const DATE_TIME_SUBSECOND_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");

/// Date time format with a space separator, e.g. "2021-01-01 00:00:00".
const DATE_TIME_SPACE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Format `date_time` as "YYYY-MM-DDTHH:MM:SS", dropping any fractional seconds.
pub fn format(date_time: PrimitiveDateTime) -> String {
    date_time
        .replace_nanosecond(0)
        .unwrap_or(date_time)
        .format(DATE_TIME_FORMAT)
        // The format only contains numeric components that always exist.
        .unwrap_or_else(|_| date_time.to_string())
}

/// Parse a date-time string.
///
/// Accepts "YYYY-MM-DDTHH:MM:SS" (optionally with a fractional second),
/// "YYYY-MM-DD HH:MM:SS", or a bare date "YYYY-MM-DD" which is read as midnight.
/// Fractional seconds are truncated.
pub fn parse(text: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    let text = text.trim();

    PrimitiveDateTime::parse(text, DATE_TIME_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(text, DATE_TIME_SUBSECOND_FORMAT))
        .or_else(|_| PrimitiveDateTime::parse(text, DATE_TIME_SPACE_FORMAT))
        .or_else(|_| Date::parse(text, DATE_FORMAT).map(|date| date.with_time(Time::MIDNIGHT)))
        .map(|date_time| date_time.replace_nanosecond(0).unwrap_or(date_time))
}

/// Read the date-time stored as text in column `index` of `row`.
pub fn get_from_row(row: &Row, index: usize) -> Result<PrimitiveDateTime, rusqlite::Error> {
    let text: String = row.get(index)?;

    parse(&text)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

/// Serialize and deserialize a [PrimitiveDateTime] with [format] and [parse].
pub mod serde_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    pub fn serialize<S>(date_time: &PrimitiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format(*date_time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<PrimitiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Like [serde_format] but for optional date-times, e.g. query parameters.
///
/// Empty strings deserialize to `None`.
pub mod option_serde_format {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    pub fn serialize<S>(
        date_time: &Option<PrimitiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date_time {
            Some(date_time) => serializer.serialize_str(&super::format(*date_time)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<PrimitiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if text.trim().is_empty() => Ok(None),
            Some(text) => super::parse(&text)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
