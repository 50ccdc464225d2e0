//! Accrual engine: anchors, rate timelines, aggregation and the batch runner

pub mod accrual;
pub mod adhoc;
pub mod aggregator;
pub mod anchors;
pub mod column_scan;
pub mod ledger;
pub mod overtime;
pub mod timeline;

pub use accrual::{AccrualRunner, AccrualSummary, DocumentReport, DocumentStatus, PaysheetSource, RunOptions};
pub use aggregator::{aggregate_section, aggregate_sheet, SectionReport, SheetAggregate};
pub use anchors::{find_section_anchors, scan_for_label, LabelHit, ScanPolicy, ScanWindow};
pub use column_scan::{scan_hours_and_payments, ColumnScanTotals};
pub use overtime::{billed_with_overtime, is_overtime};
pub use timeline::{RateBasis, RateTimeline, ResolvedRate};
