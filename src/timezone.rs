//! Helpers for working out the current date and time in the server's configured timezone.

use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current local date-time in `canonical_timezone`, e.g. "Pacific/Auckland",
/// without the UTC offset and truncated to whole seconds.
///
/// # Errors
///
/// Returns [Error::InvalidTimezoneError] if `canonical_timezone` is not a valid
/// canonical timezone name.
pub fn local_now(canonical_timezone: &str) -> Result<PrimitiveDateTime, Error> {
    let Some(offset) = get_local_offset(canonical_timezone) else {
        tracing::error!("Invalid timezone {}", canonical_timezone);
        return Err(Error::InvalidTimezoneError(canonical_timezone.to_owned()));
    };

    let now = OffsetDateTime::now_utc().to_offset(offset);
    let now = PrimitiveDateTime::new(now.date(), now.time());

    Ok(now.replace_nanosecond(0).unwrap_or(now))
}

#[cfg(test)]
mod tests {
    use time::UtcOffset;

    use crate::Error;

    use super::{get_local_offset, local_now};

    #[test]
    fn utc_has_zero_offset() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn local_now_fails_on_invalid_timezone() {
        assert_eq!(
            local_now("Middle/Earth"),
            Err(Error::InvalidTimezoneError("Middle/Earth".to_owned()))
        );
    }

    #[test]
    fn local_now_has_no_subseconds() {
        let now = local_now("Etc/UTC").unwrap();

        assert_eq!(now.nanosecond(), 0);
    }
}
