//! Tolerant numeric extraction
//!
//! Paysheet cells carry currency strings, parenthesised negatives and
//! comma-grouped numbers next to raw floats. Everything here coerces to
//! `f64` and falls back to `0.0` (or `1.0` for multipliers) instead of failing.

use crate::types::CellValue;
use regex::Regex;
use std::sync::OnceLock;

fn decimal_pattern() -> &'static Regex {
    static DECIMAL_RE: OnceLock<Regex> = OnceLock::new();
    DECIMAL_RE.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("valid regex"))
}

fn letters_pattern() -> &'static Regex {
    static LETTERS_RE: OnceLock<Regex> = OnceLock::new();
    LETTERS_RE.get_or_init(|| Regex::new(r"[A-Za-z]+").expect("valid regex"))
}

fn small_int_pattern() -> &'static Regex {
    static SMALL_INT_RE: OnceLock<Regex> = OnceLock::new();
    SMALL_INT_RE.get_or_init(|| Regex::new(r"(\d{1,2})").expect("valid regex"))
}

/// Numeric value of any cell. Dates and empty cells are `0.0`.
pub fn coerce_number(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Number(n) if n.is_finite() => *n,
        CellValue::Text(s) => parse_amount_text(s),
        _ => 0.0,
    }
}

/// Extract the first signed decimal from currency-ish text.
///
/// `$` and `,` are stripped and parentheses mean negation.
///
/// ```
/// use paysheet_accrual::parser::parse_amount_text;
///
/// assert_eq!(parse_amount_text("$1,234.56"), 1234.56);
/// assert_eq!(parse_amount_text("(500)"), -500.0);
/// assert_eq!(parse_amount_text(""), 0.0);
/// assert_eq!(parse_amount_text("abc"), 0.0);
/// ```
pub fn parse_amount_text(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$' && *c != ')')
        .map(|c| if c == '(' { '-' } else { c })
        .collect();

    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }

    decimal_pattern()
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// First one- or two-digit number in the text once letters are removed
pub fn first_numeric_token(text: &str) -> Option<u32> {
    let digits_only = letters_pattern().replace_all(text, "");
    small_int_pattern()
        .captures(&digits_only)
        .and_then(|caps| caps[1].parse().ok())
}

/// Parse multiplier input: `0.5`, `.6`, `1/2`, `50%`.
///
/// Empty or malformed input means "no scaling" and yields `1.0`.
pub fn parse_multiplier(text: &str) -> f64 {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return 1.0;
    }

    let parsed = if let Some(percent) = compact.strip_suffix('%') {
        percent.parse::<f64>().ok().map(|p| p / 100.0)
    } else if compact.contains('/') {
        let parts: Vec<&str> = compact.split('/').collect();
        match parts.as_slice() {
            [num, den] => match (num.parse::<f64>(), den.parse::<f64>()) {
                (Ok(n), Ok(d)) if d != 0.0 => Some(n / d),
                _ => None,
            },
            _ => None,
        }
    } else {
        compact.parse::<f64>().ok()
    };

    parsed.filter(|m| m.is_finite()).unwrap_or(1.0)
}
