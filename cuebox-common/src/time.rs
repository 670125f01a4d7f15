//! Clock-time parsing utilities
//!
//! Track configurations express trim points as `"H:M:S"` clock strings.
//! This module converts them to milliseconds once, at construction time.

use thiserror::Error;

/// A time string that does not parse as `hours:minutes:seconds`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time string '{0}', expected H:M:S")]
pub struct TimeFormatError(pub String);

/// Parse an `"H:M:S"` clock string into milliseconds.
///
/// Exactly three colon-separated integer fields are required. Fields need
/// not be zero-padded (`"1:02:03"` is accepted). Minutes and seconds must
/// be below 60 and hours below 24, matching a strict clock-time reading.
///
/// # Examples
///
/// ```
/// use cuebox_common::time::parse_hms;
///
/// assert_eq!(parse_hms("00:01:05").unwrap(), 65_000);
/// assert!(parse_hms("1:2").is_err());
/// ```
pub fn parse_hms(value: &str) -> Result<u64, TimeFormatError> {
    let err = || TimeFormatError(value.to_string());

    let mut fields = value.split(':');
    let (hours, minutes, seconds) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(h), Some(m), Some(s), None) => (h, m, s),
        _ => return Err(err()),
    };

    let hours: u64 = hours.parse().map_err(|_| err())?;
    let minutes: u64 = minutes.parse().map_err(|_| err())?;
    let seconds: u64 = seconds.parse().map_err(|_| err())?;

    if hours >= 24 || minutes >= 60 || seconds >= 60 {
        return Err(err());
    }

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1000)
}
