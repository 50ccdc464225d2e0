//! Spreadsheet input
//!
//! Decoding is delegated to `calamine`; this module only converts its cells
//! into [`CellValue`](crate::types::CellValue)s and finds paysheet files.

mod importer;

pub use importer::{
    collect_paysheets, convert_cell, PaysheetFile, PaysheetImporter, PAYSHEET_EXTENSIONS,
};
