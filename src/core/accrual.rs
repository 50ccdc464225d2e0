//! Batch accrual run: many paysheets into one master ledger
//!
//! Every paysheet is matched to a ledger row by file number and evaluated on
//! its own (in parallel with the `parallel` feature). Writes reach the sink
//! afterwards, sequentially and in input order. A document that cannot be
//! read is counted as failed without stopping the batch.

use crate::config::{AccrualConfig, Period};
use crate::core::adhoc::adjustment_total;
use crate::core::aggregator::{aggregate_sheet, SheetAggregate};
use crate::core::column_scan::{scan_hours_and_payments, ColumnScanTotals};
use crate::core::ledger::{
    build_ledger_lookup, document_file_number, ensure_month_columns, is_hourly, LedgerColumns,
    LedgerRow, MonthColumns,
};
use crate::core::overtime::billed_with_overtime;
use crate::error::{AccrualError, AccrualResult};
use crate::grid::{GridAccessor, Workbook};
use crate::types::{round_to, CellValue, CellWrite, Trace, WriteValue};
use crate::writer::Sink;
use serde::Serialize;
use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Where a paysheet comes from. Each call to `load` yields an independent
/// workbook owned by the caller.
pub trait PaysheetSource: Send + Sync {
    fn id(&self) -> &str;

    fn load(&self) -> AccrualResult<Workbook>;
}

impl<T: PaysheetSource + ?Sized> PaysheetSource for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn load(&self) -> AccrualResult<Workbook> {
        (**self).load()
    }
}

impl PaysheetSource for Workbook {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> AccrualResult<Workbook> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Report only; nothing reaches the sink
    pub dry_run: bool,
    /// Also aggregate admin fees and write them to the ledger's admin fee column
    pub admin_fee: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum DocumentStatus {
    Updated,
    NoFileNumber,
    NotInLedger,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub document: String,
    pub status: DocumentStatus,
    pub file_number: Option<String>,
    pub ledger_row: Option<usize>,
    pub name: Option<String>,
    pub hours: f64,
    pub billed: f64,
    pub adjustment_total: f64,
    pub hourly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_fee: Option<SheetAggregate>,
    pub writes: Vec<CellWrite>,
    pub trace: Trace,
}

impl DocumentReport {
    fn new(document: impl Into<String>, status: DocumentStatus) -> Self {
        Self {
            document: document.into(),
            status,
            file_number: None,
            ledger_row: None,
            name: None,
            hours: 0.0,
            billed: 0.0,
            adjustment_total: 0.0,
            hourly: false,
            admin_fee: None,
            writes: Vec::new(),
            trace: Trace::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccrualSummary {
    pub period: Period,
    pub dry_run: bool,
    pub updated: usize,
    pub no_match: usize,
    pub failed: usize,
    pub columns: LedgerColumns,
    pub header_writes: Vec<CellWrite>,
    pub documents: Vec<DocumentReport>,
}

struct LedgerContext<'a, G: ?Sized> {
    grid: &'a G,
    columns: LedgerColumns,
    month: MonthColumns,
    lookup: HashMap<String, LedgerRow>,
}

pub struct AccrualRunner<'a> {
    config: &'a AccrualConfig,
    period: Period,
    options: RunOptions,
}

impl<'a> AccrualRunner<'a> {
    pub fn new(config: &'a AccrualConfig, period: Period, options: RunOptions) -> Self {
        Self {
            config,
            period,
            options,
        }
    }

    /// Evaluate every source against `ledger` and send the resulting writes
    /// to `sink` (unless this is a dry run)
    pub fn run<G, S, K>(&self, ledger: &G, sources: &[S], sink: &mut K) -> AccrualResult<AccrualSummary>
    where
        G: GridAccessor + Sync + ?Sized,
        S: PaysheetSource,
        K: Sink + ?Sized,
    {
        let ledger_config = &self.config.ledger;
        let month_name = self.period.month_name();
        let columns = LedgerColumns::detect(ledger, ledger_config.header_row, month_name, ledger_config)?;
        if columns.file.is_none() {
            return Err(AccrualError::Validation(format!(
                "ledger header row {} has no file number column",
                ledger_config.header_row
            )));
        }
        let month = ensure_month_columns(ledger, ledger_config.header_row, month_name, &columns)?;
        let lookup = build_ledger_lookup(ledger, ledger_config.header_row, &columns)?;
        tracing::info!(
            rows = lookup.len(),
            documents = sources.len(),
            hours_col = month.hours,
            billed_col = month.billed,
            "ledger loaded"
        );

        let ctx = LedgerContext {
            grid: ledger,
            columns,
            month,
            lookup,
        };

        #[cfg(feature = "parallel")]
        let documents: Vec<DocumentReport> = sources
            .par_iter()
            .map(|source| self.process_document(source, &ctx))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let documents: Vec<DocumentReport> = sources
            .iter()
            .map(|source| self.process_document(source, &ctx))
            .collect();

        let mut summary = AccrualSummary {
            period: self.period,
            dry_run: self.options.dry_run,
            updated: 0,
            no_match: 0,
            failed: 0,
            columns: ctx.columns,
            header_writes: ctx.month.header_writes,
            documents: Vec::with_capacity(documents.len()),
        };

        if !self.options.dry_run {
            for write in &summary.header_writes {
                sink.write(write.clone())?;
            }
        }

        for report in documents {
            match report.status {
                DocumentStatus::Updated => {
                    summary.updated += 1;
                    if !self.options.dry_run {
                        for write in &report.writes {
                            sink.write(write.clone())?;
                        }
                    }
                }
                DocumentStatus::NoFileNumber | DocumentStatus::NotInLedger => summary.no_match += 1,
                DocumentStatus::Failed(_) => summary.failed += 1,
            }
            summary.documents.push(report);
        }

        tracing::info!(
            updated = summary.updated,
            no_match = summary.no_match,
            failed = summary.failed,
            dry_run = summary.dry_run,
            "accrual run complete"
        );
        Ok(summary)
    }

    fn process_document<G, S>(&self, source: &S, ctx: &LedgerContext<'_, G>) -> DocumentReport
    where
        G: GridAccessor + ?Sized,
        S: PaysheetSource,
    {
        match self.evaluate_document(source, ctx) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(document = source.id(), error = %e, "paysheet failed");
                DocumentReport::new(source.id(), DocumentStatus::Failed(e.to_string()))
            }
        }
    }

    fn evaluate_document<G, S>(
        &self,
        source: &S,
        ctx: &LedgerContext<'_, G>,
    ) -> AccrualResult<DocumentReport>
    where
        G: GridAccessor + ?Sized,
        S: PaysheetSource,
    {
        let workbook = source.load()?;

        let Some(file_number) = document_file_number(&workbook)? else {
            return Ok(DocumentReport::new(&workbook.id, DocumentStatus::NoFileNumber));
        };
        let Some(entry) = ctx.lookup.get(&file_number) else {
            let mut report = DocumentReport::new(&workbook.id, DocumentStatus::NotInLedger);
            report.file_number = Some(file_number);
            return Ok(report);
        };

        let mut report = DocumentReport::new(&workbook.id, DocumentStatus::Updated);
        report.file_number = Some(file_number);
        report.ledger_row = Some(entry.row);
        report.name = Some(entry.name.clone());

        let sheet = workbook.sheet_for_year(self.period.year)?;
        report.trace.record(format!("using sheet '{}'", sheet.name));

        let totals: ColumnScanTotals =
            scan_hours_and_payments(sheet, self.period, &self.config.column_scan, &mut report.trace)?;
        report.hours = totals.hours;
        report.billed = totals.payments;

        if self.config.overtime_enabled() {
            if let Some(ot_billed) = billed_with_overtime(
                sheet,
                self.period.month,
                self.period.year,
                self.config,
                &mut report.trace,
            )? {
                if ot_billed > 0.0 {
                    report.billed = ot_billed;
                }
            }
        }

        if !self.config.adjustments.is_empty() {
            report.adjustment_total =
                adjustment_total(&workbook, &self.config.adjustments, self.config, &mut report.trace)?;
        }

        if self.options.admin_fee {
            report.admin_fee = Some(aggregate_sheet(sheet, self.period, self.config)?);
        }

        report.hourly = is_hourly(ctx.grid, entry.row, &ctx.columns, &workbook.id)?;
        report.writes = self.ledger_writes(&report, entry.row, ctx)?;

        tracing::info!(
            document = %workbook.id,
            row = entry.row,
            hours = report.hours,
            billed = report.billed,
            "paysheet evaluated"
        );
        Ok(report)
    }

    fn ledger_writes<G: GridAccessor + ?Sized>(
        &self,
        report: &DocumentReport,
        row: usize,
        ctx: &LedgerContext<'_, G>,
    ) -> AccrualResult<Vec<CellWrite>> {
        let ledger = &self.config.ledger;
        let mut writes = vec![
            CellWrite::new(row, ctx.month.hours, round_to(report.hours, 4)),
            CellWrite::new(row, ctx.month.billed, round_to(report.billed, 2)),
        ];

        if report.hourly {
            let value = match ctx.grid.cell(row, ledger.hourly_source_col)? {
                CellValue::Number(n) => Some(WriteValue::Number(n)),
                other if other.is_empty() => None,
                other => Some(WriteValue::Text(other.display_text())),
            };
            if let Some(value) = value {
                writes.push(CellWrite {
                    row,
                    col: ledger.hourly_target_col,
                    value,
                });
            }
        }

        if report.adjustment_total > 0.0 {
            writes.push(CellWrite::new(
                row,
                ledger.adjustment_col,
                round_to(report.adjustment_total, 2),
            ));
        }

        if let (Some(col), Some(admin)) = (ctx.columns.admin_fee, &report.admin_fee) {
            if admin.aggregate.total_fee > 0.0 {
                writes.push(CellWrite::new(row, col, round_to(admin.aggregate.total_fee, 2)));
            }
        }

        Ok(writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Sheet;
    use crate::writer::RecordingSink;

    fn ledger() -> Sheet {
        let mut sheet = Sheet::new("Profit Sharing");
        sheet.set(2, 0, "File #");
        sheet.set(2, 1, "Employee");
        sheet.set(2, 2, "June Hours");
        sheet.set(2, 3, "June Billed to the Client");
        sheet.set(3, 0, "123456");
        sheet.set(3, 1, "Ada Lovelace");
        sheet
    }

    fn paysheet(id: &str) -> Workbook {
        let mut sheet = Sheet::new("2025");
        sheet.set(4, 1, "06/01-06/07/2025");
        sheet.set(4, 2, 40.0);
        sheet.set(4, 3, 2000.0);
        Workbook::new(id, vec![sheet])
    }

    fn june() -> Period {
        Period::new(6, 2025).unwrap()
    }

    #[test]
    fn test_run_writes_hours_and_billed() {
        let config = AccrualConfig::default();
        let runner = AccrualRunner::new(&config, june(), RunOptions::default());
        let mut sink = RecordingSink::new();

        let summary = runner
            .run(&ledger(), &[paysheet("123456_June.xlsx")], &mut sink)
            .unwrap();

        assert_eq!((summary.updated, summary.no_match, summary.failed), (1, 0, 0));
        assert_eq!(sink.value_at(3, 2).unwrap().value, WriteValue::Number(40.0));
        assert_eq!(sink.value_at(3, 3).unwrap().value, WriteValue::Number(2000.0));
    }

    #[test]
    fn test_unmatched_and_failed_documents_are_counted() {
        struct Broken;
        impl PaysheetSource for Broken {
            fn id(&self) -> &str {
                "broken.xlsx"
            }
            fn load(&self) -> AccrualResult<Workbook> {
                Err(AccrualError::grid_access("broken.xlsx", "unreadable"))
            }
        }

        let config = AccrualConfig::default();
        let runner = AccrualRunner::new(&config, june(), RunOptions::default());
        let mut sink = RecordingSink::new();
        let ledger = ledger();

        let sources: Vec<Box<dyn PaysheetSource>> = vec![
            Box::new(paysheet("999999_June.xlsx")),
            Box::new(Broken),
            Box::new(Workbook::new("nobody.xlsx", vec![Sheet::new("2025")])),
        ];
        let summary = runner.run(&ledger, &sources, &mut sink).unwrap();
        assert_eq!((summary.updated, summary.no_match, summary.failed), (0, 2, 1));
        assert!(sink.is_empty());
        assert!(matches!(
            summary.documents[1].status,
            DocumentStatus::Failed(ref msg) if msg.contains("broken.xlsx")
        ));
    }

    #[test]
    fn test_dry_run_emits_nothing() {
        let config = AccrualConfig::default();
        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };
        let runner = AccrualRunner::new(&config, june(), options);
        let mut sink = RecordingSink::new();

        let summary = runner
            .run(&ledger(), &[paysheet("123456.xlsx")], &mut sink)
            .unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.documents[0].hours, 40.0);
        assert!(!summary.documents[0].writes.is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_ledger_without_file_column_is_rejected() {
        let config = AccrualConfig::default();
        let runner = AccrualRunner::new(&config, june(), RunOptions::default());
        let mut sink = RecordingSink::new();
        let empty = Sheet::new("Profit Sharing");
        let result = runner.run(&empty, &[paysheet("123456.xlsx")], &mut sink);
        assert!(matches!(result, Err(AccrualError::Validation(_))));
    }
}
