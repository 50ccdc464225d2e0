//! CLI command handlers

pub mod commands;

pub use commands::{admin_fee, adjustment_dates, billed, lookup, periods, run, scan, RunRequest, ScanOverrides};
