//! Period label parser
//!
//! Two shapes are recognised, both anchored at the start of the trimmed,
//! lower-cased label:
//!
//! - range: `MM/DD-MM/DD/YYYY` (the separators between the two halves may be
//!   `-` or `/`, with optional spaces around the first one); the year is
//!   written once and shared by both ends
//! - single date: `MM/DD/YYYY` or `MM/DD/YY`
//!
//! Anything after the date (an `-OT` suffix, a note) is ignored here and left
//! to [`is_overtime`](crate::core::overtime::is_overtime).

use crate::error::SkipReason;
use crate::types::{CellValue, PayDate, PeriodSpan};
use regex::Regex;
use std::sync::OnceLock;

fn range_pattern() -> &'static Regex {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    RANGE_RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})/(\d{1,2})\s*[-/]\s*(\d{1,2})[-/](\d{1,2})[-/](\d{4})")
            .expect("valid regex")
    })
}

fn single_pattern() -> &'static Regex {
    static SINGLE_RE: OnceLock<Regex> = OnceLock::new();
    SINGLE_RE.get_or_init(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2,4})").expect("valid regex"))
}

fn month_start_pattern() -> &'static Regex {
    static MONTH_RE: OnceLock<Regex> = OnceLock::new();
    MONTH_RE.get_or_init(|| Regex::new(r"^0?(\d{1,2})[/-]").expect("valid regex"))
}

/// Parse a period label into a [`PeriodSpan`].
///
/// # Examples
///
/// ```
/// use paysheet_accrual::parser::parse_period;
///
/// let week = parse_period("06/01-06/07/2025-OT").unwrap();
/// assert_eq!((week.start.month, week.start.day, week.start.year), (6, 1, 2025));
/// assert_eq!(week.end.unwrap().day, 7);
///
/// let day = parse_period("6/15/25").unwrap();
/// assert_eq!(day.start.year, 2025);
/// assert!(day.end.is_none());
///
/// assert!(parse_period("Total Hours").is_err());
/// ```
pub fn parse_period(text: &str) -> Result<PeriodSpan, SkipReason> {
    let normalized = text.trim().to_lowercase();
    let unparseable = || SkipReason::Unparseable(text.trim().to_string());

    if let Some(caps) = range_pattern().captures(&normalized) {
        let num = |i: usize| caps[i].parse::<u32>().ok();
        let (Some(sm), Some(sd), Some(em), Some(ed)) = (num(1), num(2), num(3), num(4)) else {
            return Err(unparseable());
        };
        let year: i32 = caps[5].parse().map_err(|_| unparseable())?;

        let end = PayDate::new(em, ed, year).ok_or_else(unparseable)?;
        let mut start = PayDate::new(sm, sd, year).ok_or_else(unparseable)?;
        // 12/29-01/04/2026: the written year belongs to the end date. A
        // backwards range within one month is malformed.
        if start > end {
            if start.month <= end.month {
                return Err(unparseable());
            }
            start.year -= 1;
        }
        return PeriodSpan::range(start, end).ok_or_else(unparseable);
    }

    if let Some(caps) = single_pattern().captures(&normalized) {
        let month: u32 = caps[1].parse().map_err(|_| unparseable())?;
        let day: u32 = caps[2].parse().map_err(|_| unparseable())?;
        let mut year: i32 = caps[3].parse().map_err(|_| unparseable())?;
        if year < 100 {
            year += 2000;
        }
        let date = PayDate::new(month, day, year).ok_or_else(unparseable)?;
        return Ok(PeriodSpan::single(date));
    }

    Err(unparseable())
}

/// Period of a grid cell: typed date cells are taken as-is, text is parsed.
pub fn period_of_cell(cell: &CellValue) -> Result<PeriodSpan, SkipReason> {
    match cell {
        CellValue::Date(d) => Ok(PeriodSpan::single(PayDate::from(*d))),
        CellValue::Empty => Err(SkipReason::EmptyPeriod),
        other => parse_period(&other.display_text()),
    }
}

/// True when the label's leading token is `month` (optionally zero-padded)
/// followed by `/` or `-`.
///
/// The token must sit at the start of the label, so a day number that
/// happens to equal the month never matches:
///
/// ```
/// use paysheet_accrual::parser::matches_month;
///
/// assert!(matches_month("06/01-06/07/2025", 6));
/// assert!(matches_month("6-15-2025", 6));
/// assert!(!matches_month("01/06-01/12/2025", 6));
/// assert!(!matches_month("04/06-04/12/2025", 6));
/// ```
pub fn matches_month(text: &str, month: u32) -> bool {
    let normalized = text.trim().to_lowercase();
    month_start_pattern()
        .captures(&normalized)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .is_some_and(|leading| leading == month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_range() {
        let span = parse_period("06/01-06/07/2025").unwrap();
        assert_eq!(span.start, PayDate::new(6, 1, 2025).unwrap());
        assert_eq!(span.end, PayDate::new(6, 7, 2025));
    }

    #[test]
    fn test_parse_range_separator_variants() {
        for label in [
            "06/01 - 06/07/2025",
            "06/01/06/07/2025",
            "06/01-06-07-2025",
            "6/1-6/7/2025",
        ] {
            let span = parse_period(label).unwrap_or_else(|_| panic!("{label} should parse"));
            assert_eq!(span.start.day, 1, "{label}");
            assert_eq!(span.end.unwrap().day, 7, "{label}");
        }
    }

    #[test]
    fn test_parse_range_with_trailing_text() {
        let span = parse_period("  06/08-06/14/2025 - OT  ").unwrap();
        assert_eq!(span.start.day, 8);
        assert_eq!(span.end.unwrap().day, 14);
    }

    #[test]
    fn test_parse_year_crossing_range() {
        let span = parse_period("12/29-01/04/2026").unwrap();
        assert_eq!(span.start, PayDate::new(12, 29, 2025).unwrap());
        assert_eq!(span.end, PayDate::new(1, 4, 2026));
        assert!(span.start <= span.end.unwrap());
    }

    #[test]
    fn test_parse_backwards_range_is_unparseable() {
        for label in ["06/30-06/01/2025", "06/30-06/01/2025-OT"] {
            assert_eq!(
                parse_period(label),
                Err(SkipReason::Unparseable(label.to_string())),
                "{label}"
            );
        }
    }

    #[test]
    fn test_parse_single_dates() {
        let full = parse_period("07/04/2025").unwrap();
        assert_eq!(full.start, PayDate::new(7, 4, 2025).unwrap());
        assert!(full.is_single_day());

        let short = parse_period("07/04/25").unwrap();
        assert_eq!(short.start.year, 2025);
    }

    #[test]
    fn test_single_date_round_trip() {
        for (month, day, year) in [(1, 1, 2025), (12, 31, 2024), (2, 29, 2028), (9, 9, 2009)] {
            let long = format!("{:02}/{:02}/{}", month, day, year);
            let short = format!("{}/{}/{:02}", month, day, year % 100);
            for text in [long, short] {
                let span = parse_period(&text).unwrap();
                assert_eq!(
                    (span.start.month, span.start.day, span.start.year),
                    (month, day, year),
                    "{text}"
                );
            }
        }
    }

    #[test]
    fn test_unparseable_labels() {
        for label in ["", "Total", "Week of June", "2025-06-01", "13/01/2025", "06-01-2025"] {
            assert!(
                matches!(parse_period(label), Err(SkipReason::Unparseable(_))),
                "{label:?} should be unparseable"
            );
        }
    }

    #[test]
    fn test_period_of_typed_date_cell() {
        let cell = CellValue::Date(NaiveDate::from_ymd_opt(2025, 6, 20).unwrap());
        let span = period_of_cell(&cell).unwrap();
        assert_eq!(span.start, PayDate::new(6, 20, 2025).unwrap());
        assert_eq!(period_of_cell(&CellValue::Empty), Err(SkipReason::EmptyPeriod));
    }

    #[test]
    fn test_month_match_is_anchored() {
        assert!(matches_month("06/01-06/07/2025", 6));
        assert!(matches_month("6/01-6/07/2025", 6));
        assert!(matches_month("  06/30/2025", 6));
        assert!(matches_month("11/03-11/09/2025", 11));

        // day token equal to the month must not match
        assert!(!matches_month("01/06-01/12/2025", 6));
        assert!(!matches_month("04/06-04/12/2025", 6));
        assert!(!matches_month("07/06-07/12/2025", 6));
        // 1 is not a prefix match for 11 or 12
        assert!(!matches_month("11/01-11/07/2025", 1));
        assert!(!matches_month("Week 06/01", 6));
    }
}
