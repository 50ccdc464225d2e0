//! Calendar date text (`06/15/2025`, `6-15-25`, `2025-06-15`)

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

fn month_first_pattern() -> &'static Regex {
    static MDY_RE: OnceLock<Regex> = OnceLock::new();
    MDY_RE.get_or_init(|| {
        Regex::new(r"^0?(\d{1,2})[/-]0?(\d{1,2})[/-](\d{4}|\d{2})$").expect("valid regex")
    })
}

fn year_first_pattern() -> &'static Regex {
    static YMD_RE: OnceLock<Regex> = OnceLock::new();
    YMD_RE.get_or_init(|| {
        Regex::new(r"^(\d{4})[/-](\d{1,2})[/-](\d{1,2})(?:[ T]\d{1,2}:\d{2}(?::\d{2})?)?$")
            .expect("valid regex")
    })
}

/// Parse a calendar date.
///
/// Accepts month-first dates with `/` or `-` and two- or four-digit years
/// (two-digit years land in the 2000s), and year-first ISO-style dates with an
/// optional time part. Impossible dates such as `02/30/2025` yield `None`.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = year_first_pattern().captures(trimmed) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let caps = month_first_pattern().captures(trimmed)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
