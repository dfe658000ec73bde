// src/utils/date.rs

//! Parsing of the listing's human-readable dates into `YYYY/MM/DD`.
//!
//! Failures are soft: the input is echoed back so the record validator can
//! reject it later instead of aborting extraction.

use std::sync::LazyLock;

use regex::Regex;

/// Canonical date format used in every exported date column.
pub const CANONICAL_DATE_FORMAT: &str = "%Y/%m/%d";

/// Format of the advertised date column on the listing (`15/06/2025`).
pub const ADVERTISED_DATE_FORMAT: &str = "%d/%m/%Y";

static CLOSING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s+(\w+)\s+(\d{4})\s*-\s*(\d{2}:\d{2})").expect("valid closing pattern")
});

static DAY_MONTH_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s+(\w+)\s+(\d{4})").expect("valid day-month-year pattern")
});

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Resolve a full English month name (any case) to its number.
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTHS
        .iter()
        .position(|month| *month == lower)
        .map(|idx| idx as u32 + 1)
}

fn format_date(day: &str, month_name: &str, year: &str) -> Option<String> {
    let month = month_number(month_name)?;
    let day: u32 = day.parse().ok()?;
    let year: u32 = year.parse().ok()?;
    Some(format!("{year}/{month:02}/{day:02}"))
}

/// Split a closing date string such as `Thursday, 31 July 2025 - 10:00`
/// into `("2025/07/31", "10:00")`.
///
/// Unmatched input or an unknown month name yields `(input, "")`.
pub fn parse_closing_date_time(text: &str) -> (String, String) {
    if text.is_empty() {
        return (String::new(), String::new());
    }

    let Some(caps) = CLOSING_PATTERN.captures(text) else {
        log::warn!("Could not parse closing date: {text}");
        return (text.to_string(), String::new());
    };

    match format_date(&caps[1], &caps[2], &caps[3]) {
        Some(date) => (date, caps[4].to_string()),
        None => {
            log::warn!("Could not parse month name: {}", &caps[2]);
            (text.to_string(), String::new())
        }
    }
}

/// Convert a date string such as `Sunday, 15 June 2025` into `2025/06/15`.
///
/// Unmatched input or an unknown month name is returned unchanged.
pub fn parse_day_month_year(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let Some(caps) = DAY_MONTH_YEAR_PATTERN.captures(text) else {
        log::warn!("Could not parse date: {text}");
        return text.to_string();
    };

    format_date(&caps[1], &caps[2], &caps[3]).unwrap_or_else(|| {
        log::warn!("Could not parse month name: {}", &caps[2]);
        text.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_month_year_zero_pads() {
        assert_eq!(parse_day_month_year("Sunday, 15 June 2025"), "2025/06/15");
        assert_eq!(parse_day_month_year("5 March 2024"), "2024/03/05");
        assert_eq!(parse_day_month_year("1 december 2023 - 09:00"), "2023/12/01");
    }

    #[test]
    fn day_month_year_round_trips_every_month() {
        for (idx, month) in MONTHS.iter().enumerate() {
            let text = format!("7 {month} 2025");
            assert_eq!(parse_day_month_year(&text), format!("2025/{:02}/07", idx + 1));
        }
    }

    #[test]
    fn unknown_month_echoes_input() {
        assert_eq!(parse_day_month_year("15 Juny 2025"), "15 Juny 2025");
        assert_eq!(parse_day_month_year("15 Jun 2025"), "15 Jun 2025");
        assert_eq!(parse_day_month_year("to be announced"), "to be announced");
    }

    #[test]
    fn empty_input() {
        assert_eq!(parse_day_month_year(""), "");
        assert_eq!(parse_closing_date_time(""), (String::new(), String::new()));
    }

    #[test]
    fn closing_date_time_splits() {
        assert_eq!(
            parse_closing_date_time("Thursday, 31 July 2025 - 10:00"),
            ("2025/07/31".to_string(), "10:00".to_string())
        );
        assert_eq!(
            parse_closing_date_time("4 August 2025-11:30"),
            ("2025/08/04".to_string(), "11:30".to_string())
        );
    }

    #[test]
    fn closing_without_time_is_soft_failure() {
        assert_eq!(
            parse_closing_date_time("Thursday, 31 July 2025"),
            ("Thursday, 31 July 2025".to_string(), String::new())
        );
        assert_eq!(
            parse_closing_date_time("31 Jully 2025 - 10:00"),
            ("31 Jully 2025 - 10:00".to_string(), String::new())
        );
    }

    #[test]
    fn month_lookup_is_case_insensitive() {
        assert_eq!(month_number("JULY"), Some(7));
        assert_eq!(month_number("september"), Some(9));
        assert_eq!(month_number("Sept"), None);
    }
}
