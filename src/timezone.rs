//! Resolves the configured canonical timezone to the current UTC offset.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// The current offset of `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if the name is not a known canonical timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in `canonical_timezone`.
///
/// # Errors
/// Returns [Error::InvalidTimezoneError] if the timezone is unknown.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    let offset = get_local_offset(canonical_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {canonical_timezone}");
        Error::InvalidTimezoneError(canonical_timezone.to_owned())
    })?;

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{get_local_offset, local_today};

    #[test]
    fn resolves_canonical_names() {
        assert!(get_local_offset("Pacific/Auckland").is_some());
        assert!(get_local_offset("Etc/UTC").is_some());
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            local_today("Middle/Earth"),
            Err(Error::InvalidTimezoneError("Middle/Earth".to_owned()))
        );
    }
}
