//! Section aggregation
//!
//! Walks the rows under each section header, keeps the rows whose period
//! falls in the target month, prices them against the section's rate
//! timeline and sums the results. Row-level faults never fail the walk: each
//! one becomes a [`SkipReason`] recorded in the trace.
//!
//! Row shape decides the arithmetic:
//!
//! - a range row (`06/01-06/07/2025 | 40`) holds hours, billed at the rate
//!   resolved for the period
//! - a single-date row (`06/15/2025 | 812.50`) holds a final amount, summed
//!   as-is and counted as one hour, provided a rate is in force that day

use crate::config::{AccrualConfig, Period};
use crate::core::anchors::{collect_rate_timeline, find_section_anchors};
use crate::core::overtime::is_overtime;
use crate::core::timeline::{RateBasis, RateTimeline};
use crate::error::{AccrualResult, SkipReason};
use crate::grid::GridAccessor;
use crate::parser::{coerce_number, period_of_cell};
use crate::types::{Aggregate, CellValue, SectionAnchor, Trace};
use serde::Serialize;

/// What one accepted row adds to its section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowContribution {
    pub label: String,
    pub hours: f64,
    pub fee: f64,
    pub rate: f64,
    pub basis: RateBasis,
    pub overtime: bool,
}

/// Totals and bounds of one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub anchor: SectionAnchor,
    /// Exclusive
    pub end_row: usize,
    pub timeline: RateTimeline,
    pub aggregate: Aggregate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetAggregate {
    pub aggregate: Aggregate,
    pub sections: Vec<SectionReport>,
    pub trace: Trace,
}

/// Exclusive end row of the section opened by `anchor`.
///
/// The section stops at the first period cell containing a section
/// terminator, at the row entering the guard band before `next_anchor_row`,
/// or at the end of the sheet.
pub fn section_end<G: GridAccessor + ?Sized>(
    grid: &G,
    anchor: &SectionAnchor,
    next_anchor_row: Option<usize>,
    config: &AccrualConfig,
) -> AccrualResult<usize> {
    let guard = config.scan.section_guard_rows;
    let terminators = &config.labels.section_terminators;

    for row in anchor.row + 1..grid.row_count() {
        if next_anchor_row.is_some_and(|next| row + guard >= next) {
            return Ok(row);
        }
        let text = grid.text(row, anchor.col)?.to_lowercase();
        if !text.is_empty() && terminators.iter().any(|t| text.contains(t.as_str())) {
            return Ok(row);
        }
    }

    Ok(grid.row_count())
}

/// Price one row from its period cell and the cell to its right
pub fn evaluate_row(
    period_cell: &CellValue,
    value_cell: &CellValue,
    period: Period,
    timeline: &RateTimeline,
    config: &AccrualConfig,
) -> Result<RowContribution, SkipReason> {
    if period_cell.is_empty() {
        return Err(SkipReason::EmptyPeriod);
    }

    let label = period_cell.display_text();
    let lowered = label.to_lowercase();
    if let Some(keyword) = config
        .labels
        .row_terminators
        .iter()
        .find(|k| lowered.contains(k.as_str()))
    {
        return Err(SkipReason::Terminator(keyword.clone()));
    }

    let span = period_of_cell(period_cell)?;
    if !span.is_in_month(period.month, period.year) {
        return Err(SkipReason::OutOfPeriod {
            label,
            month: period.month,
            year: period.year,
        });
    }

    let value = coerce_number(value_cell);
    if value <= 0.0 {
        return Err(SkipReason::NonPositiveValue(value));
    }

    let overtime = is_overtime(&label);
    if span.is_single_day() {
        let rate = timeline.rate_on(span.start);
        if rate <= 0.0 {
            return Err(SkipReason::NoApplicableRate(label));
        }
        return Ok(RowContribution {
            label,
            hours: 1.0,
            fee: value,
            rate,
            basis: RateBasis::StartDate,
            overtime,
        });
    }

    let resolved = timeline.resolve(&span);
    if resolved.rate <= 0.0 {
        return Err(SkipReason::NoApplicableRate(label));
    }
    Ok(RowContribution {
        label,
        hours: value,
        fee: value * resolved.rate,
        rate: resolved.rate,
        basis: resolved.basis,
        overtime,
    })
}

/// Sum the rows of one section, `anchor.row + 1 .. end_row`
pub fn aggregate_section<G: GridAccessor + ?Sized>(
    grid: &G,
    anchor: &SectionAnchor,
    end_row: usize,
    period: Period,
    timeline: &RateTimeline,
    config: &AccrualConfig,
    trace: &mut Trace,
) -> AccrualResult<Aggregate> {
    let mut aggregate = Aggregate::default();

    for row in anchor.row + 1..end_row {
        let period_cell = grid.cell(row, anchor.col)?;
        let value_cell = grid.cell(row, anchor.col + 1)?;

        match evaluate_row(&period_cell, &value_cell, period, timeline, config) {
            Ok(contribution) => {
                trace.record(format!(
                    "row {}: {} -> {} x {:.2} = {:.2}{}{}",
                    row,
                    contribution.label,
                    contribution.hours,
                    contribution.rate,
                    contribution.fee,
                    match contribution.basis {
                        RateBasis::FullMonthOverride => " (full-month rate)",
                        RateBasis::StartDate => "",
                    },
                    if contribution.overtime { " [OT]" } else { "" },
                ));
                aggregate.add_row(contribution.hours, contribution.fee, contribution.rate);
            }
            Err(reason) => trace.record(format!("row {}: skipped, {}", row, reason)),
        }
    }

    Ok(aggregate)
}

/// Aggregate every section of a sheet for the target period
pub fn aggregate_sheet<G: GridAccessor + ?Sized>(
    grid: &G,
    period: Period,
    config: &AccrualConfig,
) -> AccrualResult<SheetAggregate> {
    let mut result = SheetAggregate::default();
    let anchors = find_section_anchors(grid, config)?;

    if anchors.is_empty() {
        result.trace.record("no section header found");
        return Ok(result);
    }

    for (idx, anchor) in anchors.iter().enumerate() {
        let next_row = anchors.get(idx + 1).map(|a| a.row);
        let end_row = section_end(grid, anchor, next_row, config)?;
        result.trace.record(format!(
            "section {} ({}) at row {}, col {}; ends at row {}",
            idx + 1,
            anchor.kind,
            anchor.row,
            anchor.col,
            end_row
        ));

        let timeline = collect_rate_timeline(grid, anchor.row, config, &mut result.trace)?;
        let aggregate = if timeline.is_empty() {
            result
                .trace
                .record(format!("section {}: no admin fee rate found, skipped", idx + 1));
            Aggregate::default()
        } else {
            aggregate_section(
                grid,
                anchor,
                end_row,
                period,
                &timeline,
                config,
                &mut result.trace,
            )?
        };

        tracing::info!(
            section = idx + 1,
            kind = %anchor.kind,
            hours = aggregate.total_hours,
            fee = aggregate.total_fee,
            "section aggregated"
        );
        result.aggregate.merge(&aggregate);
        result.sections.push(SectionReport {
            anchor: anchor.clone(),
            end_row,
            timeline,
            aggregate,
        });
    }

    Ok(result)
}
