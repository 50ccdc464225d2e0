//! Overtime classification and OT-rate-table billing

use crate::config::AccrualConfig;
use crate::core::aggregator::section_end;
use crate::core::anchors::{find_overtime_rates, find_section_anchors};
use crate::error::{AccrualResult, SkipReason};
use crate::grid::GridAccessor;
use crate::parser::{coerce_number, matches_month, parse_period};
use crate::types::{round_to, CellValue, Trace};
use regex::Regex;
use std::sync::OnceLock;

fn overtime_suffix_pattern() -> &'static Regex {
    static OT_RE: OnceLock<Regex> = OnceLock::new();
    // "-OT", "- OT", "-OT " and a trailing whitespace-separated "OT"
    OT_RE.get_or_init(|| Regex::new(r"(?:-\s*|\s+)OT\s*$").expect("valid regex"))
}

/// True when the label carries a trailing overtime marker.
///
/// ```
/// use paysheet_accrual::core::overtime::is_overtime;
///
/// assert!(is_overtime("06/01-06/07/2025-OT"));
/// assert!(is_overtime("06/01-06/07/2025 OT"));
/// assert!(!is_overtime("06/01-06/07/2025"));
/// assert!(!is_overtime("06/01-06/07/2025-OTHER"));
/// ```
pub fn is_overtime(label: &str) -> bool {
    let upper = label.trim().to_uppercase();
    overtime_suffix_pattern().is_match(&upper)
}

/// Hours of one OT-walk row.
///
/// Unparseable labels that still lead with the month are kept; labels that
/// parse must also match the year.
fn overtime_row(
    label: &str,
    hours_cell: &CellValue,
    month: u32,
    year: i32,
    skips: &[String],
) -> Result<f64, SkipReason> {
    if label.is_empty() {
        return Err(SkipReason::EmptyPeriod);
    }
    let lowered = label.to_lowercase();
    if let Some(keyword) = skips.iter().find(|k| lowered.contains(k.as_str())) {
        return Err(SkipReason::Terminator(keyword.clone()));
    }
    let out_of_period = || SkipReason::OutOfPeriod {
        label: label.to_string(),
        month,
        year,
    };
    if !matches_month(&lowered, month) {
        return Err(out_of_period());
    }
    if let Ok(span) = parse_period(&lowered) {
        if span.start.year != year {
            return Err(out_of_period());
        }
    }

    let hours = coerce_number(hours_cell);
    if hours <= 0.0 {
        return Err(SkipReason::NonPositiveValue(hours));
    }
    Ok(hours)
}

/// Bill the first section with the sheet's Total/OT rate pair.
///
/// Each month row contributes `hours × (ot_rate if overtime else total_rate)`.
/// The walk stops where [`section_end`] closes the section. Returns `None`
/// when the rate pair or a section header is missing.
pub fn billed_with_overtime<G: GridAccessor + ?Sized>(
    grid: &G,
    month: u32,
    year: i32,
    config: &AccrualConfig,
    trace: &mut Trace,
) -> AccrualResult<Option<f64>> {
    let Some(rates) = find_overtime_rates(grid, config, trace)? else {
        return Ok(None);
    };

    let anchors = find_section_anchors(grid, config)?;
    let Some(anchor) = anchors.first() else {
        trace.record("overtime billing: no section header found");
        return Ok(None);
    };
    let end_row = section_end(grid, anchor, anchors.get(1).map(|a| a.row), config)?;
    trace.record(format!(
        "overtime billing: section at row {}, ends at row {}",
        anchor.row, end_row
    ));

    let skips = &config.labels.overtime_skips;
    let mut billed = 0.0;

    for row in anchor.row + 1..end_row {
        let label = grid.text(row, anchor.col)?;
        let hours_cell = grid.cell(row, anchor.col + 1)?;
        let hours = match overtime_row(&label, &hours_cell, month, year, skips) {
            Ok(hours) => hours,
            Err(reason) => {
                trace.record(format!("row {}: skipped, {}", row, reason));
                continue;
            }
        };

        let overtime = is_overtime(&label);
        let rate = rates.rate_for(overtime);
        let amount = hours * rate;
        billed += amount;
        trace.record(format!(
            "row {}: {} {} hrs x {:.2}{} = {:.2}",
            row,
            label,
            hours,
            rate,
            if overtime { " (OT)" } else { "" },
            amount
        ));
    }

    Ok(Some(round_to(billed, 2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Sheet;

    #[test]
    fn test_overtime_suffix_variants() {
        for label in [
            "06/01-06/07/2025-OT",
            "06/01-06/07/2025 - OT",
            "06/01-06/07/2025 -ot ",
            "06/01-06/07/2025 OT",
            "06/01-06/07/2025\tot",
        ] {
            assert!(is_overtime(label), "{label:?}");
        }
        for label in [
            "06/01-06/07/2025",
            "06/01-06/07/2025-OTHER",
            "06/01-06/07/2025OT",
            "OT 06/01-06/07/2025",
            "",
        ] {
            assert!(!is_overtime(label), "{label:?}");
        }
    }

    fn ot_sheet() -> Sheet {
        let mut sheet = Sheet::new("2025");
        sheet.set(1, 0, "Total Rate");
        sheet.set(1, 1, 50.0);
        sheet.set(2, 0, "OT Rate");
        sheet.set(2, 1, 75.0);
        sheet.set(5, 0, "Work Period");
        sheet.set(5, 1, "Hours");
        sheet.set(6, 0, "06/01-06/07/2025");
        sheet.set(6, 1, 40.0);
        sheet.set(7, 0, "06/08-06/14/2025-OT");
        sheet.set(7, 1, 10.0);
        sheet.set(8, 0, "07/06-07/12/2025");
        sheet.set(8, 1, 40.0);
        sheet.set(9, 0, "Total Hours");
        sheet.set(9, 1, 90.0);
        sheet
    }

    #[test]
    fn test_billed_with_overtime_table() {
        let mut trace = Trace::new();
        let billed = billed_with_overtime(&ot_sheet(), 6, 2025, &AccrualConfig::default(), &mut trace)
            .unwrap();
        assert_eq!(billed, Some(2750.0));
        assert!(trace.contains("(OT)"));
    }

    #[test]
    fn test_billed_with_overtime_other_year_excluded() {
        let mut trace = Trace::new();
        let billed = billed_with_overtime(&ot_sheet(), 6, 2024, &AccrualConfig::default(), &mut trace)
            .unwrap();
        assert_eq!(billed, Some(0.0));
    }

    #[test]
    fn test_billed_with_overtime_stops_at_section_end() {
        let mut sheet = ot_sheet();
        sheet.set(11, 0, "Deductions");
        sheet.set(12, 0, "06/20/2025");
        sheet.set(12, 1, 300.0);
        let mut trace = Trace::new();
        let billed = billed_with_overtime(&sheet, 6, 2025, &AccrualConfig::default(), &mut trace)
            .unwrap();
        assert_eq!(billed, Some(2750.0));
        assert!(trace.contains("ends at row 9"));
        assert!(!trace.contains("row 12"));
    }

    #[test]
    fn test_overtime_row_skip_reasons() {
        let skips = AccrualConfig::default().labels.overtime_skips;
        let hours = CellValue::Number(8.0);
        assert_eq!(overtime_row("", &hours, 6, 2025, &skips), Err(SkipReason::EmptyPeriod));
        assert_eq!(
            overtime_row("Total Hours", &hours, 6, 2025, &skips),
            Err(SkipReason::Terminator("total".to_string()))
        );
        assert!(matches!(
            overtime_row("07/06-07/12/2025", &hours, 6, 2025, &skips),
            Err(SkipReason::OutOfPeriod { .. })
        ));
        assert_eq!(
            overtime_row("06/01-06/07/2025", &CellValue::Empty, 6, 2025, &skips),
            Err(SkipReason::NonPositiveValue(0.0))
        );
        // month-led labels that do not parse are still billed
        assert_eq!(overtime_row("06/wk 1", &hours, 6, 2025, &skips), Ok(8.0));
    }

    #[test]
    fn test_billed_without_rates_is_none() {
        let mut sheet = ot_sheet();
        sheet.set(2, 1, CellValue::Empty);
        let mut trace = Trace::new();
        let billed = billed_with_overtime(&sheet, 6, 2025, &AccrualConfig::default(), &mut trace)
            .unwrap();
        assert_eq!(billed, None);
        assert!(trace.contains("overtime rates not found"));
    }
}
