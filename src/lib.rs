//! Paysheet Accrual - month-end accruals from contractor paysheet workbooks
//!
//! This library reads paysheets (semi-structured spreadsheets of weekly or
//! daily period rows), finds the sections that matter, resolves the admin
//! fee rate in force for each row and totals hours, fees and billed amounts
//! for a target month.
//!
//! # Features
//!
//! - Section discovery ("Work Period", "Hours & Payment") with guard bands
//! - Dated rate timelines ("Admin Fee Eff 6/16/2025") with a full-month override
//! - Overtime billing from a Total Rate / OT Rate table
//! - Label-column scans and ad-hoc date lookups (bonus, retro, ACH)
//! - Batch runs against a master ledger, emitting cell writes to a [`writer::Sink`]
//!
//! # Example
//!
//! ```
//! use paysheet_accrual::core::aggregate_sheet;
//! use paysheet_accrual::{AccrualConfig, Period, Sheet};
//!
//! let mut sheet = Sheet::new("2025");
//! sheet.set(3, 0, "Admin Fee");
//! sheet.set(3, 1, 50.0);
//! sheet.set(5, 0, "Work Period");
//! sheet.set(6, 0, "06/01-06/07/2025");
//! sheet.set(6, 1, 40.0);
//! sheet.set(7, 0, "06/08-06/14/2025-OT");
//! sheet.set(7, 1, 45.0);
//!
//! let period = Period::new(6, 2025)?;
//! let result = aggregate_sheet(&sheet, period, &AccrualConfig::default())?;
//!
//! assert_eq!(result.aggregate.total_hours, 85.0);
//! assert_eq!(result.aggregate.total_fee, 4250.0);
//! # Ok::<(), paysheet_accrual::AccrualError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod grid;
pub mod parser;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use config::{AccrualConfig, Period};
pub use error::{AccrualError, AccrualResult, SkipReason};
pub use grid::{GridAccessor, Sheet, Workbook};
pub use types::{Aggregate, CellValue, CellWrite, PayDate, PeriodSpan, Trace, WriteValue};
