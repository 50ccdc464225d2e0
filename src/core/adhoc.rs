//! Ad-hoc amounts (bonus, retro, ACH) looked up by date
//!
//! The amount sits to the right of its date cell. Rows directly below whose
//! label mentions an adjustment keyword add to it; the first row without one
//! ends the run.

use crate::config::{AccrualConfig, AdjustmentDate};
use crate::error::AccrualResult;
use crate::grid::{GridAccessor, Workbook};
use crate::parser::{coerce_number, parse_date_text};
use crate::types::{round_to, CellValue, Trace};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateAmount {
    pub row: usize,
    pub col: usize,
    pub base: f64,
    pub adjustments: f64,
}

impl DateAmount {
    pub fn total(&self) -> f64 {
        self.base + self.adjustments
    }
}

fn cell_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Text(s) => parse_date_text(s),
        _ => None,
    }
}

fn is_adjustment_label(cell: &CellValue, keywords: &[String]) -> bool {
    let text = cell.display_text().to_lowercase();
    !text.is_empty() && keywords.iter().any(|k| text.contains(k.as_str()))
}

fn locate_in_columns<G: GridAccessor + ?Sized>(
    grid: &G,
    date: NaiveDate,
    columns: &[usize],
) -> AccrualResult<Option<(usize, usize)>> {
    for row in 0..grid.row_count() {
        for &col in columns {
            if col >= grid.col_count() {
                continue;
            }
            if cell_date(&grid.cell(row, col)?) == Some(date) {
                return Ok(Some((row, col)));
            }
        }
    }
    Ok(None)
}

/// Find `date` in one sheet: preferred columns first, then the fallback window
pub fn find_amount_for_date<G: GridAccessor + ?Sized>(
    grid: &G,
    date: NaiveDate,
    config: &AccrualConfig,
) -> AccrualResult<Option<DateAmount>> {
    let located = match locate_in_columns(grid, date, &config.lookup.preferred_columns)? {
        Some(hit) => Some(hit),
        None => locate_in_columns(grid, date, &config.lookup.fallback_columns)?,
    };
    let Some((row, col)) = located else {
        return Ok(None);
    };

    let base = coerce_number(&grid.cell(row, col + 1)?);
    let mut adjustments = 0.0;
    let mut next = row + 1;
    while next < grid.row_count()
        && is_adjustment_label(&grid.cell(next, col)?, &config.labels.adjustment_keywords)
    {
        adjustments += coerce_number(&grid.cell(next, col + 1)?);
        next += 1;
    }

    Ok(Some(DateAmount {
        row,
        col,
        base,
        adjustments,
    }))
}

/// Amount for `date` from the first sheet that contains it, `0.0` if none does
pub fn amount_for_date(
    workbook: &Workbook,
    date: NaiveDate,
    config: &AccrualConfig,
    trace: &mut Trace,
) -> AccrualResult<f64> {
    for sheet in &workbook.sheets {
        if let Some(found) = find_amount_for_date(sheet, date, config)? {
            trace.record(format!(
                "{} found in '{}' row {}, col {}: base {:.2} + adjustments {:.2} = {:.2}",
                date.format("%m/%d/%Y"),
                sheet.name,
                found.row,
                found.col,
                found.base,
                found.adjustments,
                found.total()
            ));
            return Ok(found.total());
        }
    }
    trace.record(format!("{} not found in any sheet", date.format("%m/%d/%Y")));
    Ok(0.0)
}

/// Sum of `round2(amount × multiplier)` over every adjustment date
pub fn adjustment_total(
    workbook: &Workbook,
    dates: &[AdjustmentDate],
    config: &AccrualConfig,
    trace: &mut Trace,
) -> AccrualResult<f64> {
    let mut total = 0.0;
    for adj in dates {
        let amount = amount_for_date(workbook, adj.date, config, trace)?;
        let scaled = round_to(amount * adj.multiplier, 2);
        if amount != 0.0 {
            trace.record(format!(
                "{}: {:.2} x {} = {:.2}",
                adj.date.format("%m/%d/%Y"),
                amount,
                adj.multiplier,
                scaled
            ));
        }
        total += scaled;
    }
    Ok(round_to(total, 2))
}
