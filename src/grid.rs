//! Read-only grid abstraction over one paysheet sheet
//!
//! All coordinates are 0-based. Reads outside the grid return
//! [`CellValue::Empty`]; only a source that cannot produce cells at all
//! reports [`AccrualError::GridAccess`].

use crate::error::{AccrualError, AccrualResult};
use crate::types::CellValue;

/// Narrow read interface the engine consumes
pub trait GridAccessor {
    fn row_count(&self) -> usize;

    fn col_count(&self) -> usize;

    /// Typed value at `(row, col)`; out-of-range reads are `Empty`
    fn cell(&self, row: usize, col: usize) -> AccrualResult<CellValue>;

    /// Trimmed display text of a cell
    fn text(&self, row: usize, col: usize) -> AccrualResult<String> {
        Ok(self.cell(row, col)?.display_text())
    }
}

/// In-memory sheet, the shape every tabular source is converted into
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<CellValue>>,
    width: usize,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            width: 0,
        }
    }

    /// Build from row vectors; ragged rows are allowed
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            name: name.into(),
            rows,
            width,
        }
    }

    /// Set one cell, growing the sheet as needed
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<CellValue>) {
        if row >= self.rows.len() {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if col >= cells.len() {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value.into();
        self.width = self.width.max(col + 1);
    }

    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|cells| cells.iter().all(CellValue::is_empty))
    }
}

impl GridAccessor for Sheet {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn col_count(&self) -> usize {
        self.width
    }

    fn cell(&self, row: usize, col: usize) -> AccrualResult<CellValue> {
        Ok(self.get(row, col).clone())
    }
}

/// All sheets of one paysheet document
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    /// Document identifier (usually the file name) used in errors and reports
    pub id: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(id: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self {
            id: id.into(),
            sheets,
        }
    }

    /// The sheet whose name carries the target year, else the first sheet
    pub fn sheet_for_year(&self, year: i32) -> AccrualResult<&Sheet> {
        let year_text = year.to_string();
        self.sheets
            .iter()
            .find(|s| s.name.contains(&year_text))
            .or_else(|| self.sheets.first())
            .ok_or_else(|| AccrualError::grid_access(&self.id, "workbook has no sheets"))
    }

    pub fn sheet_by_name(&self, name: &str) -> AccrualResult<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| AccrualError::grid_access(&self.id, format!("sheet '{}' not found", name)))
    }
}
