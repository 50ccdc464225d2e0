//! Label scanning over an unlabeled grid
//!
//! Paysheets have no fixed layout, so everything the engine needs is located
//! by searching for marker text: section headers, admin-fee rate labels and
//! the Total/OT rate pair. Matching is case-insensitive on trimmed cell text.

use crate::config::AccrualConfig;
use crate::core::timeline::RateTimeline;
use crate::error::AccrualResult;
use crate::grid::GridAccessor;
use crate::parser::coerce_number;
use crate::types::{CellValue, OvertimeRates, PayDate, RateEntry, SectionAnchor, SectionKind, Trace};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

fn label_date_pattern() -> &'static Regex {
    static LABEL_DATE_RE: OnceLock<Regex> = OnceLock::new();
    LABEL_DATE_RE
        .get_or_init(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{2,4})").expect("valid regex"))
}

/// Whether one row may yield several hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPolicy {
    /// Stop at the first matching column (merged header cells repeat text)
    FirstPerRow,
    EveryMatch,
}

/// Rows a scan visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanWindow {
    /// `above` rows before and `below` rows after `row`, excluding `row` itself
    Around {
        row: usize,
        above: usize,
        below: usize,
    },
    FirstRows(usize),
    WholeSheet,
}

impl ScanWindow {
    pub fn rows(&self, row_count: usize) -> Vec<usize> {
        match *self {
            ScanWindow::Around { row, above, below } => {
                let start = row.saturating_sub(above);
                let end = row.saturating_add(below).saturating_add(1).min(row_count);
                (start..end).filter(|r| *r != row).collect()
            }
            ScanWindow::FirstRows(n) => (0..n.min(row_count)).collect(),
            ScanWindow::WholeSheet => (0..row_count).collect(),
        }
    }
}

/// A matching label and the value to its right
#[derive(Debug, Clone, PartialEq)]
pub struct LabelHit {
    pub row: usize,
    pub col: usize,
    /// Trimmed original text of the label cell
    pub text: String,
    /// Cell at `col + 1`
    pub adjacent: CellValue,
}

/// Scan `cols` of every row in `window` for cells whose lower-cased text
/// satisfies `predicate`.
pub fn scan_for_label<G, P>(
    grid: &G,
    window: ScanWindow,
    cols: Range<usize>,
    predicate: P,
    policy: ScanPolicy,
) -> AccrualResult<Vec<LabelHit>>
where
    G: GridAccessor + ?Sized,
    P: Fn(&str) -> bool,
{
    let mut hits = Vec::new();
    let cols = cols.start..cols.end.min(grid.col_count());

    for row in window.rows(grid.row_count()) {
        for col in cols.clone() {
            let cell = grid.cell(row, col)?;
            if cell.is_empty() {
                continue;
            }
            let text = cell.display_text();
            if !predicate(&text.to_lowercase()) {
                continue;
            }
            hits.push(LabelHit {
                row,
                col,
                text,
                adjacent: grid.cell(row, col + 1)?,
            });
            if policy == ScanPolicy::FirstPerRow {
                break;
            }
        }
    }

    Ok(hits)
}

fn contains_any(text: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| text.contains(n.as_str()))
}

/// Every section header in the sheet, top to bottom
pub fn find_section_anchors<G: GridAccessor + ?Sized>(
    grid: &G,
    config: &AccrualConfig,
) -> AccrualResult<Vec<SectionAnchor>> {
    let labels = &config.labels;
    let hits = scan_for_label(
        grid,
        ScanWindow::WholeSheet,
        0..grid.col_count(),
        |text| contains_any(text, &labels.work_period) || contains_any(text, &labels.hours_and_payment),
        ScanPolicy::FirstPerRow,
    )?;

    Ok(hits
        .into_iter()
        .map(|hit| {
            let lowered = hit.text.to_lowercase();
            let kind = if contains_any(&lowered, &labels.work_period) {
                SectionKind::WorkPeriod
            } else {
                SectionKind::HoursAndPayment
            };
            SectionAnchor {
                row: hit.row,
                col: hit.col,
                kind,
                label: hit.text,
            }
        })
        .collect())
}

/// Effective date written inside a rate label ("Admin Fee Eff 7/1/25")
pub fn label_effective_date(text: &str) -> Option<PayDate> {
    let caps = label_date_pattern().captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let mut year: i32 = caps[3].parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    PayDate::new(month, day, year)
}

/// Build the rate timeline for the section headed at `header_row` from the
/// admin-fee labels in the surrounding window
pub fn collect_rate_timeline<G: GridAccessor + ?Sized>(
    grid: &G,
    header_row: usize,
    config: &AccrualConfig,
    trace: &mut Trace,
) -> AccrualResult<RateTimeline> {
    let labels = &config.labels;
    let dated = labels.dated_rate.to_lowercase();
    let window = ScanWindow::Around {
        row: header_row,
        above: config.scan.rate_rows_above,
        below: config.scan.rate_rows_below,
    };

    let hits = scan_for_label(
        grid,
        window,
        0..grid.col_count(),
        |text| text.contains(&dated) || labels.static_rate.iter().any(|s| s == text),
        ScanPolicy::EveryMatch,
    )?;

    let mut entries = Vec::with_capacity(hits.len());
    for hit in hits {
        let rate = coerce_number(&hit.adjacent);
        let entry = if hit.text.to_lowercase().contains(&dated) {
            match label_effective_date(&hit.text) {
                Some(date) => RateEntry::on(date, rate),
                None => {
                    trace.record(format!(
                        "row {}: rate label '{}' has no effective date, ignored",
                        hit.row, hit.text
                    ));
                    continue;
                }
            }
        } else {
            RateEntry::fixed(rate)
        };

        if rate <= 0.0 {
            trace.record(format!(
                "row {}: rate label '{}' skipped, non-positive value {}",
                hit.row, hit.text, rate
            ));
            continue;
        }
        trace.record(format!(
            "row {}: rate label '{}' -> {:.2}",
            hit.row, hit.text, rate
        ));
        entries.push(entry);
    }

    Ok(RateTimeline::new(entries))
}

/// Total and OT rates from the sheet's leading rows. Later labels override
/// earlier ones; `None` unless both are positive.
pub fn find_overtime_rates<G: GridAccessor + ?Sized>(
    grid: &G,
    config: &AccrualConfig,
    trace: &mut Trace,
) -> AccrualResult<Option<OvertimeRates>> {
    let total_label = config.labels.total_rate.to_lowercase();
    let ot_label = config.labels.ot_rate.to_lowercase();

    let hits = scan_for_label(
        grid,
        ScanWindow::FirstRows(config.scan.ot_rate_rows),
        0..grid.col_count(),
        |text| text.contains(&total_label) || text.contains(&ot_label),
        ScanPolicy::EveryMatch,
    )?;

    let mut total_rate = 0.0;
    let mut ot_rate = 0.0;
    for hit in &hits {
        let lowered = hit.text.to_lowercase();
        let value = coerce_number(&hit.adjacent);
        if lowered.contains(&total_label) {
            total_rate = value;
        }
        if lowered.contains(&ot_label) {
            ot_rate = value;
        }
    }

    if total_rate > 0.0 && ot_rate > 0.0 {
        trace.record(format!(
            "overtime rates found: total {:.2}, ot {:.2}",
            total_rate, ot_rate
        ));
        Ok(Some(OvertimeRates { total_rate, ot_rate }))
    } else {
        trace.record(format!(
            "overtime rates not found: total {}, ot {}",
            total_rate, ot_rate
        ));
        Ok(None)
    }
}
