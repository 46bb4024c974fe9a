//! Release date formatting
//!
//! Dates cross the HTTP boundary as `DD.MM.YYYY` and are stored as ISO
//! `YYYY-MM-DD` text. An absent date is rendered as an empty string, never
//! as a sentinel date.

use crate::{Error, Result};
use chrono::NaiveDate;

/// Wire format for release dates (`16.07.2006`)
pub const RELEASE_DATE_FORMAT: &str = "%d.%m.%Y";

/// Parse a `DD.MM.YYYY` release date
///
/// # Examples
///
/// ```
/// use songbook_common::release_date::parse_release_date;
///
/// let date = parse_release_date("16.07.2006").unwrap();
/// assert_eq!(date.to_string(), "2006-07-16");
///
/// assert!(parse_release_date("2006-07-16").is_err());
/// ```
pub fn parse_release_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), RELEASE_DATE_FORMAT).map_err(|e| {
        Error::InvalidInput(format!(
            "release date '{}' must be DD.MM.YYYY: {}",
            s, e
        ))
    })
}

/// Format a stored release date for the API; `None` becomes `""`
pub fn format_release_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(RELEASE_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_day_and_month() {
        let date = NaiveDate::from_ymd_opt(1973, 1, 5).unwrap();
        assert_eq!(format_release_date(Some(date)), "05.01.1973");
    }

    #[test]
    fn test_format_absent_is_empty() {
        assert_eq!(format_release_date(None), "");
    }

    #[test]
    fn test_parse_rejects_impossible_date() {
        let err = parse_release_date("31.02.2001").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        let date = parse_release_date(" 16.07.2006 ").unwrap();
        assert_eq!(format_release_date(Some(date)), "16.07.2006");
    }
}
