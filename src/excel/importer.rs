//! Spreadsheet importer - .xls/.xlsx/.xlsm/.ods → in-memory [`Workbook`]

use crate::core::accrual::PaysheetSource;
use crate::error::{AccrualError, AccrualResult};
use crate::grid::{Sheet, Workbook};
use crate::parser::parse_date_text;
use crate::types::CellValue;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions treated as paysheets when scanning a folder
pub const PAYSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "ods"];

/// Reads every sheet of a spreadsheet file into typed cells
pub struct PaysheetImporter {
    path: PathBuf,
}

impl PaysheetImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Document identifier: the file name
    pub fn document_id(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn import(&self) -> AccrualResult<Workbook> {
        let id = self.document_id();
        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| AccrualError::grid_access(&id, format!("failed to open: {}", e)))?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(sheet_names.len());

        for sheet_name in sheet_names {
            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                AccrualError::grid_access(&id, format!("failed to read sheet '{}': {}", sheet_name, e))
            })?;
            sheets.push(self.convert_sheet(&sheet_name, &range));
        }

        tracing::debug!(document = %id, sheets = sheets.len(), "workbook imported");
        Ok(Workbook::new(id, sheets))
    }

    /// Copy a calamine range into a sheet, keeping absolute cell positions
    fn convert_sheet(&self, sheet_name: &str, range: &Range<Data>) -> Sheet {
        let mut sheet = Sheet::new(sheet_name);
        if range.is_empty() {
            return sheet;
        }

        let (row_offset, col_offset) = range.start().unwrap_or((0, 0));
        for (row, col, data) in range.cells() {
            let value = convert_cell(data);
            if value.is_empty() {
                continue;
            }
            sheet.set(
                row + row_offset as usize,
                col + col_offset as usize,
                value,
            );
        }
        sheet
    }
}

/// Map one calamine cell onto the engine's cell type
pub fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => CellValue::Date(datetime.date()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match parse_date_text(s) {
            Some(date) => CellValue::Date(date),
            None => CellValue::text(s.clone()),
        },
        Data::DurationIso(s) => CellValue::text(s.clone()),
    }
}

/// A paysheet file on disk, loaded on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaysheetFile {
    path: PathBuf,
    id: String,
}

impl PaysheetFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let importer = PaysheetImporter::new(&path);
        Self {
            id: importer.document_id(),
            path: importer.path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PaysheetSource for PaysheetFile {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> AccrualResult<Workbook> {
        PaysheetImporter::new(&self.path).import()
    }
}

fn is_paysheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            PAYSHEET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Every spreadsheet under `dir` (recursively), sorted by path
pub fn collect_paysheets(dir: &Path) -> AccrualResult<Vec<PaysheetFile>> {
    if !dir.is_dir() {
        return Err(AccrualError::Import(format!(
            "paysheet folder not found: {}",
            dir.display()
        )));
    }

    let mut pending = vec![dir.to_path_buf()];
    let mut files = Vec::new();
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if is_paysheet(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files.into_iter().map(PaysheetFile::new).collect())
}
