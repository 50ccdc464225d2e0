//! Output side of the engine: ledger cell writes and serialized reports

use crate::error::AccrualResult;
use crate::types::CellWrite;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Receiver of `(row, column, value)` writes destined for the ledger
pub trait Sink {
    fn write(&mut self, write: CellWrite) -> AccrualResult<()>;
}

/// Sink that keeps every write in order, for reports and tests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordingSink {
    pub writes: Vec<CellWrite>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Last value written to `(row, col)`
    pub fn value_at(&self, row: usize, col: usize) -> Option<&CellWrite> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.row == row && w.col == col)
    }
}

impl Sink for RecordingSink {
    fn write(&mut self, write: CellWrite) -> AccrualResult<()> {
        self.writes.push(write);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Yaml,
    Json,
}

impl ReportFormat {
    /// JSON for `.json` paths, YAML otherwise
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Yaml,
        }
    }
}

pub fn render_report<T: Serialize>(value: &T, format: ReportFormat) -> AccrualResult<String> {
    Ok(match format {
        ReportFormat::Yaml => serde_yaml::to_string(value)?,
        ReportFormat::Json => serde_json::to_string_pretty(value)?,
    })
}

/// Serialize `value` to `path`, format chosen by extension
pub fn write_report<T: Serialize>(path: &Path, value: &T) -> AccrualResult<()> {
    let content = render_report(value, ReportFormat::from_path(path))?;
    fs::write(path, content)?;
    Ok(())
}
