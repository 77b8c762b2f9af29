//! Date parsing against a fixed list of accepted formats.

use chrono::{NaiveDate, NaiveDateTime};

/// Date-only formats, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Date-time formats, tried after the date-only formats and `YYYYMMDD`.
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// Parse a date. The first matching format wins; time parts are dropped.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| parse_compact(trimmed))
        .or_else(|| {
            DATETIME_FORMATS.iter().find_map(|format| {
                NaiveDateTime::parse_from_str(trimmed, format)
                    .ok()
                    .map(|dt| dt.date())
            })
        })
}

/// `YYYYMMDD`.
fn parse_compact(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = value[0..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// ISO `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_accepted_formats() {
        assert_eq!(parse_date("2024-01-31"), Some(ymd(2024, 1, 31)));
        assert_eq!(parse_date("31.01.2024"), Some(ymd(2024, 1, 31)));
        assert_eq!(parse_date("1.2.2024"), Some(ymd(2024, 2, 1)));
        assert_eq!(parse_date("31/01/2024"), Some(ymd(2024, 1, 31)));
        assert_eq!(parse_date("20240131"), Some(ymd(2024, 1, 31)));
        assert_eq!(parse_date("2024-01-31 13:45:00"), Some(ymd(2024, 1, 31)));
        assert_eq!(parse_date("2024-01-31T13:45:00"), Some(ymd(2024, 1, 31)));
        assert_eq!(parse_date("31.01.2024 13:45"), Some(ymd(2024, 1, 31)));
    }

    #[test]
    fn rejects_unknown_or_impossible_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("20241301"), None);
        assert_eq!(parse_date("01/31/2024"), None);
    }

    #[test]
    fn formats_iso() {
        assert_eq!(format_date(ymd(2024, 3, 9)), "2024-03-09");
    }
}
