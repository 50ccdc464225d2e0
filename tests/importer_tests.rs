//! Spreadsheet import tests against real .xlsx files

use paysheet_accrual::core::{aggregate_sheet, PaysheetSource};
use paysheet_accrual::excel::{collect_paysheets, PaysheetImporter};
use paysheet_accrual::{AccrualConfig, AccrualError, CellValue, GridAccessor, Period};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook as XlsxWorkbook};
use std::path::Path;
use tempfile::TempDir;

fn write_fixture(path: &Path) {
    let mut workbook = XlsxWorkbook::new();
    let date_format = Format::new().set_num_format("mm/dd/yyyy");

    let old = workbook.add_worksheet();
    old.set_name("2024").unwrap();
    old.write_string(0, 0, "last year").unwrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name("Paysheet 2025").unwrap();
    sheet.write_string(1, 0, "Admin Fee").unwrap();
    sheet.write_number(1, 1, 50).unwrap();
    sheet.write_string(3, 0, "Work Period").unwrap();
    sheet.write_string(4, 0, "06/01-06/07/2025").unwrap();
    sheet.write_number(4, 1, 40).unwrap();
    sheet.write_string(5, 0, "06/08-06/14/2025-OT").unwrap();
    sheet.write_number(5, 1, 45).unwrap();
    sheet.write_string(6, 0, "Total").unwrap();
    let date = ExcelDateTime::from_ymd(2025, 6, 15).unwrap();
    sheet
        .write_datetime_with_format(8, 6, &date, &date_format)
        .unwrap();
    sheet.write_number(8, 7, 1000.0).unwrap();
    sheet.write_boolean(9, 0, true).unwrap();

    workbook.save(path).unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// CELL CONVERSION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_import_keeps_sheets_and_positions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("123456_June.xlsx");
    write_fixture(&path);

    let workbook = PaysheetImporter::new(&path).import().unwrap();
    assert_eq!(workbook.id, "123456_June.xlsx");
    assert_eq!(workbook.sheets.len(), 2);

    let sheet = workbook.sheet_for_year(2025).unwrap();
    assert_eq!(sheet.name, "Paysheet 2025");
    assert_eq!(sheet.cell(3, 0).unwrap(), CellValue::text("Work Period"));
    assert_eq!(sheet.cell(4, 1).unwrap(), CellValue::Number(40.0));
    assert_eq!(sheet.cell(9, 0).unwrap(), CellValue::text("true"));
    assert_eq!(sheet.cell(50, 50).unwrap(), CellValue::Empty);
}

#[test]
fn test_date_cells_stay_dates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("123456_June.xlsx");
    write_fixture(&path);

    let workbook = PaysheetImporter::new(&path).import().unwrap();
    let sheet = workbook.sheet_for_year(2025).unwrap();
    assert_eq!(
        sheet.cell(8, 6).unwrap(),
        CellValue::Date(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap())
    );
    // text that looks like a date is still text
    assert!(matches!(sheet.cell(4, 0).unwrap(), CellValue::Text(_)));
}

#[test]
fn test_imported_sheet_aggregates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("123456_June.xlsx");
    write_fixture(&path);

    let workbook = PaysheetImporter::new(&path).import().unwrap();
    let sheet = workbook.sheet_for_year(2025).unwrap();
    let result = aggregate_sheet(sheet, Period::new(6, 2025).unwrap(), &AccrualConfig::default())
        .unwrap();
    assert_eq!(result.aggregate.total_hours, 85.0);
    assert_eq!(result.aggregate.total_fee, 4250.0);
}

// ═══════════════════════════════════════════════════════════════════════════
// FILES AND FOLDERS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_corrupt_file_is_grid_access_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("654321.xlsx");
    std::fs::write(&path, b"not a spreadsheet").unwrap();

    match PaysheetImporter::new(&path).import() {
        Err(AccrualError::GridAccess { document, .. }) => assert_eq!(document, "654321.xlsx"),
        other => panic!("expected grid access failure, got {:?}", other.map(|w| w.id)),
    }
}

#[test]
fn test_folder_sources_load_lazily() {
    let dir = TempDir::new().unwrap();
    write_fixture(&dir.path().join("123456_June.xlsx"));
    std::fs::write(dir.path().join("README.md"), b"paysheets").unwrap();

    let sources = collect_paysheets(dir.path()).unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].id(), "123456_June.xlsx");
    assert_eq!(sources[0].path(), dir.path().join("123456_June.xlsx"));

    let workbook = sources[0].load().unwrap();
    assert_eq!(workbook.sheets.len(), 2);
}
