//! End-to-end section aggregation tests on in-memory sheets

use paysheet_accrual::core::{aggregate_sheet, billed_with_overtime, find_section_anchors};
use paysheet_accrual::types::SectionKind;
use paysheet_accrual::{AccrualConfig, CellValue, Period, Sheet, Trace};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;

fn june() -> Period {
    Period::new(6, 2025).unwrap()
}

/// "Work Period" at row 5, static admin fee 50, one regular and one OT week
fn work_period_sheet() -> Sheet {
    let mut sheet = Sheet::new("2025");
    sheet.set(0, 0, "Employee: Ada Lovelace");
    sheet.set(2, 0, "Admin Fee");
    sheet.set(2, 1, 50.0);
    sheet.set(5, 0, "Work Period");
    sheet.set(5, 1, "Hours");
    sheet.set(6, 0, "06/01-06/07/2025");
    sheet.set(6, 1, 40.0);
    sheet.set(7, 0, "06/08-06/14/2025-OT");
    sheet.set(7, 1, 45.0);
    sheet.set(8, 0, "05/25-05/31/2025");
    sheet.set(8, 1, 38.0);
    sheet.set(10, 0, "Total Hours");
    sheet.set(10, 1, 123.0);
    sheet
}

// ═══════════════════════════════════════════════════════════════════════════
// WORK PERIOD SECTIONS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_work_period_static_rate_ignores_ot_suffix() {
    let result = aggregate_sheet(&work_period_sheet(), june(), &AccrualConfig::default()).unwrap();

    assert_eq!(result.aggregate.total_hours, 85.0);
    assert_eq!(result.aggregate.total_fee, 4250.0);
    assert_eq!(result.aggregate.last_rate_used, 50.0);
    assert_eq!(result.sections.len(), 1);
    assert_eq!(result.sections[0].anchor.kind, SectionKind::WorkPeriod);
    assert_eq!(result.sections[0].anchor.row, 5);
    assert_eq!(result.sections[0].end_row, 10);
}

#[test]
fn test_skipped_rows_are_traced() {
    let result = aggregate_sheet(&work_period_sheet(), june(), &AccrualConfig::default()).unwrap();

    // May row is outside the period, empty row 9 is skipped
    assert!(result.trace.contains("row 8: skipped"));
    assert!(result.trace.contains("row 9: skipped"));
    assert!(result.trace.contains("[OT]"));
}

#[test]
fn test_dated_rates_with_mid_month_change() {
    let mut sheet = Sheet::new("2025");
    sheet.set(1, 0, "Admin Fee");
    sheet.set(1, 1, 50.0);
    sheet.set(2, 0, "Admin Fee Eff 6/15/2025");
    sheet.set(2, 1, "$60.00");
    sheet.set(4, 0, "Work Period");
    sheet.set(5, 0, "06/01-06/07/2025");
    sheet.set(5, 1, 40.0);
    sheet.set(6, 0, "06/15-06/21/2025");
    sheet.set(6, 1, 40.0);
    sheet.set(7, 0, "Total");

    let result = aggregate_sheet(&sheet, june(), &AccrualConfig::default()).unwrap();
    assert_eq!(result.aggregate.total_hours, 80.0);
    assert_eq!(result.aggregate.total_fee, 40.0 * 50.0 + 40.0 * 60.0);
    assert_eq!(result.aggregate.last_rate_used, 60.0);
}

#[test]
fn test_full_month_row_takes_mid_month_rate() {
    let mut sheet = Sheet::new("2025");
    sheet.set(1, 0, "Admin Fee");
    sheet.set(1, 1, 50.0);
    sheet.set(2, 0, "Admin Fee Eff 06/15/25");
    sheet.set(2, 1, 65.0);
    sheet.set(4, 0, "Work Period");
    sheet.set(5, 0, "06/01-06/30/2025");
    sheet.set(5, 1, 160.0);

    let result = aggregate_sheet(&sheet, june(), &AccrualConfig::default()).unwrap();
    assert_eq!(result.aggregate.total_fee, 160.0 * 65.0);
    assert!(result.trace.contains("full-month rate"));
}

#[test]
fn test_section_without_rate_contributes_zero() {
    let mut sheet = Sheet::new("2025");
    sheet.set(4, 0, "Work Period");
    sheet.set(5, 0, "06/01-06/07/2025");
    sheet.set(5, 1, 40.0);

    let result = aggregate_sheet(&sheet, june(), &AccrualConfig::default()).unwrap();
    assert!(result.aggregate.is_empty());
    assert!(result.trace.contains("no admin fee rate found"));
}

#[test]
fn test_sheet_without_sections() {
    let mut sheet = Sheet::new("2025");
    sheet.set(0, 0, "Admin Fee");
    sheet.set(0, 1, 50.0);

    let result = aggregate_sheet(&sheet, june(), &AccrualConfig::default()).unwrap();
    assert!(result.sections.is_empty());
    assert_eq!(result.aggregate.total_fee, 0.0);
    assert!(result.trace.contains("no section header found"));
}

// ═══════════════════════════════════════════════════════════════════════════
// HOURS & PAYMENT SECTIONS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_hours_and_payment_single_dates_sum_amounts() {
    let mut sheet = Sheet::new("2025");
    sheet.set(1, 2, "Admin Fee");
    sheet.set(1, 3, 50.0);
    sheet.set(3, 2, "Hours & Payment");
    sheet.set(4, 2, "06/06/2025");
    sheet.set(4, 3, "$1,200.00");
    sheet.set(5, 2, CellValue::Date(NaiveDate::from_ymd_opt(2025, 6, 13).unwrap()));
    sheet.set(5, 3, 800.0);
    sheet.set(6, 2, "Deductions");

    let result = aggregate_sheet(&sheet, june(), &AccrualConfig::default()).unwrap();
    // pre-computed amounts count one unit each
    assert_eq!(result.aggregate.total_hours, 2.0);
    assert_eq!(result.aggregate.total_fee, 2000.0);
    assert_eq!(result.sections[0].anchor.kind, SectionKind::HoursAndPayment);
}

#[test]
fn test_two_sections_respect_guard_band() {
    let mut sheet = Sheet::new("2025");
    sheet.set(0, 0, "Admin Fee");
    sheet.set(0, 1, 50.0);
    sheet.set(2, 0, "Work Period");
    sheet.set(3, 0, "06/01-06/07/2025");
    sheet.set(3, 1, 40.0);
    // inside the guard band of the next header: not part of section 1
    sheet.set(5, 0, "06/08-06/14/2025");
    sheet.set(5, 1, 40.0);
    sheet.set(9, 0, "Hours and Payment");
    sheet.set(10, 0, "06/20/2025");
    sheet.set(10, 1, 500.0);

    let anchors = find_section_anchors(&sheet, &AccrualConfig::default()).unwrap();
    assert_eq!(anchors.iter().map(|a| a.row).collect::<Vec<_>>(), vec![2, 9]);

    let result = aggregate_sheet(&sheet, june(), &AccrualConfig::default()).unwrap();
    assert_eq!(result.sections[0].end_row, 4);
    assert_eq!(result.sections[0].aggregate.total_hours, 40.0);
    assert_eq!(result.sections[1].aggregate.total_fee, 500.0);
    assert_eq!(result.aggregate.total_fee, 40.0 * 50.0 + 500.0);
}

#[test]
fn test_section_header_counted_once_per_row() {
    let mut sheet = Sheet::new("2025");
    sheet.set(3, 0, "Work Period");
    sheet.set(3, 1, "Work Period");

    let anchors = find_section_anchors(&sheet, &AccrualConfig::default()).unwrap();
    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].col, 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// OT RATE TABLE
// ═══════════════════════════════════════════════════════════════════════════

fn ot_rate_sheet() -> Sheet {
    let mut sheet = Sheet::new("2025");
    sheet.set(1, 0, "Total Rate");
    sheet.set(1, 1, 50.0);
    sheet.set(2, 0, "OT Rate");
    sheet.set(2, 1, "$75.00");
    sheet.set(5, 0, "Work Period");
    sheet.set(6, 0, "06/01-06/07/2025");
    sheet.set(6, 1, 40.0);
    sheet.set(7, 0, "06/08-06/14/2025-OT");
    sheet.set(7, 1, 10.0);
    sheet.set(8, 0, "07/01-07/07/2025");
    sheet.set(8, 1, 40.0);
    sheet.set(9, 0, "Total Hours");
    sheet.set(9, 1, 90.0);
    sheet
}

#[test]
fn test_ot_rate_table_billing() {
    let mut trace = Trace::new();
    let billed = billed_with_overtime(&ot_rate_sheet(), 6, 2025, &AccrualConfig::default(), &mut trace)
        .unwrap();
    assert_eq!(billed, Some(2750.0));
    assert!(trace.contains("(OT)"));
}

#[test]
fn test_ot_billing_needs_matching_year() {
    let mut trace = Trace::new();
    let billed = billed_with_overtime(&ot_rate_sheet(), 6, 2024, &AccrualConfig::default(), &mut trace)
        .unwrap();
    assert_eq!(billed, Some(0.0));
}

#[test]
fn test_ot_billing_without_rate_table() {
    let mut trace = Trace::new();
    let billed =
        billed_with_overtime(&work_period_sheet(), 6, 2025, &AccrualConfig::default(), &mut trace)
            .unwrap();
    assert_eq!(billed, None);
}

#[test]
fn test_ot_billing_stops_at_section_terminator() {
    let mut sheet = ot_rate_sheet();
    sheet.set(11, 0, "Deductions");
    sheet.set(12, 0, "06/20/2025");
    sheet.set(12, 1, 300.0);

    let mut trace = Trace::new();
    let billed = billed_with_overtime(&sheet, 6, 2025, &AccrualConfig::default(), &mut trace)
        .unwrap();
    assert_eq!(billed, Some(2750.0));
}

#[test]
fn test_ot_billing_traces_skipped_rows() {
    let mut trace = Trace::new();
    billed_with_overtime(&ot_rate_sheet(), 6, 2025, &AccrualConfig::default(), &mut trace)
        .unwrap();
    // July week is outside the month
    assert!(trace.contains("row 8: skipped, period 07/01-07/07/2025 is outside 06/2025"));
}
