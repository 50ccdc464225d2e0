//! Label-column hours/payments scan
//!
//! Some paysheets carry the period in column B or C, hours one column to the
//! right and the payment one further. This scan does not rely on any section
//! header: it accepts any row whose label starts with (or ranges from) the
//! target month.

use crate::config::{ColumnScanTuning, Period};
use crate::error::AccrualResult;
use crate::grid::GridAccessor;
use crate::parser::{coerce_number, first_numeric_token, parse_period};
use crate::types::{round_to, Trace};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ColumnScanTotals {
    /// Rounded to 4 places
    pub hours: f64,
    /// Rounded to cents
    pub payments: f64,
    pub matched_rows: usize,
}

fn starts_with_month(text: &str, month: u32) -> bool {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().is_ok_and(|m| m == month)
}

/// Whether a label cell names the target month
fn label_matches(text: &str, period: Period) -> bool {
    if first_numeric_token(text) != Some(period.month) {
        return false;
    }
    if !text.contains('-') && !starts_with_month(text, period.month) {
        return false;
    }
    match parse_period(text) {
        Ok(span) => span.start.year == period.year,
        Err(_) => true,
    }
}

pub fn scan_hours_and_payments<G: GridAccessor + ?Sized>(
    grid: &G,
    period: Period,
    tuning: &ColumnScanTuning,
    trace: &mut Trace,
) -> AccrualResult<ColumnScanTotals> {
    let rows = match tuning.scan_row_limit {
        Some(limit) if limit > 0 => limit.min(grid.row_count()),
        _ => grid.row_count(),
    };

    let mut hours_sum = 0.0;
    let mut payments_sum = 0.0;
    let mut matched_rows = 0;

    for row in 0..rows {
        for &col in &tuning.columns {
            if col >= grid.col_count() {
                continue;
            }
            let label = grid.text(row, col)?;
            if label.is_empty() || !label_matches(&label, period) {
                continue;
            }

            let hours = coerce_number(&grid.cell(row, col + 1)?);
            if hours <= 0.0 || hours > tuning.maximum_hours {
                trace.record(format!(
                    "row {}: column scan '{}' ignored, hours {} out of range",
                    row, label, hours
                ));
                continue;
            }

            let raw_payment = coerce_number(&grid.cell(row, col + 2)?);
            let payment = if raw_payment >= tuning.minimum_payment {
                raw_payment
            } else {
                0.0
            };

            hours_sum += hours;
            payments_sum += payment;
            matched_rows += 1;
            trace.record(format!(
                "row {}: column scan '{}' -> {} hrs, {:.2}",
                row, label, hours, payment
            ));
        }
    }

    let totals = ColumnScanTotals {
        hours: round_to(hours_sum, 4),
        payments: round_to(payments_sum, 2),
        matched_rows,
    };
    tracing::debug!(
        hours = totals.hours,
        payments = totals.payments,
        rows = totals.matched_rows,
        "column scan complete"
    );
    Ok(totals)
}
