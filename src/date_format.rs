//! Human-readable timestamps in the `dd.MM.yyyy HH:mm` form

use chrono::{NaiveDateTime, ParseError};

const FORMAT: &str = "%d.%m.%Y %H:%M";

/// Format a timestamp, e.g. `31.12.2025 23:59`
pub fn format(date: NaiveDateTime) -> String {
    date.format(FORMAT).to_string()
}

/// Parse a string produced by [`format`], ignoring surrounding whitespace
pub fn parse(value: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_format() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(format(date), "31.12.2025 23:59");
    }

    #[test]
    fn test_format_pads_single_digits() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(7, 3, 0)
            .unwrap();
        assert_eq!(format(date), "05.01.2026 07:03");
    }

    #[test]
    fn test_parse() {
        let parsed = parse("31.12.2025 23:59").unwrap();
        assert_eq!(format(parsed), "31.12.2025 23:59");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let parsed = parse(" 11.11.2025 22:00 \t").unwrap();
        let expected = NaiveDate::from_ymd_opt(2025, 11, 11)
            .unwrap()
            .and_hms_opt(22, 0, 0)
            .unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_drops_seconds() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 30, 45)
            .unwrap();
        let parsed = parse(&format(date)).unwrap();
        assert_eq!(parsed, date.with_second(0).unwrap());
    }

    #[test]
    fn test_parse_rejects_other_layouts() {
        assert!(parse("2025-12-31 23:59").is_err());
        assert!(parse("31.12.2025").is_err());
        assert!(parse("").is_err());
    }
}
