//! Master ledger ("Profit Sharing") layout
//!
//! The ledger has one header row and one row per employee keyed by a 5-6
//! digit file number. Columns are found by keyword, never by position, except
//! for the fixed N/V/AB conventions carried in [`LedgerConfig`].

use crate::config::LedgerConfig;
use crate::error::AccrualResult;
use crate::grid::{GridAccessor, Workbook};
use crate::types::CellWrite;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

fn file_number_pattern() -> &'static Regex {
    static FILE_RE: OnceLock<Regex> = OnceLock::new();
    FILE_RE.get_or_init(|| Regex::new(r"(\d{5,6})").expect("valid regex"))
}

fn hourly_word_pattern() -> &'static Regex {
    static HOURLY_RE: OnceLock<Regex> = OnceLock::new();
    HOURLY_RE.get_or_init(|| Regex::new(r"\bhourly\b").expect("valid regex"))
}

/// Ledger columns located by header keyword (0-based)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerColumns {
    pub file: Option<usize>,
    pub name: Option<usize>,
    pub hours: Option<usize>,
    pub billed: Option<usize>,
    pub admin_fee: Option<usize>,
    pub wages_earned: Option<usize>,
    pub salary_paid: Option<usize>,
    pub gross_salary: Option<usize>,
}

fn find_by_keywords(headers: &[(usize, String)], keywords: &[String]) -> Option<usize> {
    headers
        .iter()
        .find(|(_, text)| keywords.iter().any(|k| text.contains(&k.to_lowercase())))
        .map(|(col, _)| *col)
}

impl LedgerColumns {
    /// Scan the header row. `month_name` selects the "<Month> Hours" and
    /// "<Month> Billed" columns.
    pub fn detect<G: GridAccessor + ?Sized>(
        grid: &G,
        header_row: usize,
        month_name: &str,
        config: &LedgerConfig,
    ) -> AccrualResult<Self> {
        let mut headers = Vec::new();
        for col in 0..grid.col_count() {
            let text = grid.text(header_row, col)?;
            if !text.is_empty() {
                headers.push((col, text.to_lowercase()));
            }
        }

        let month = month_name.to_lowercase();
        let hours_keywords = vec![format!("{} hours", month)];
        // another month's "billed" column must not win over this month's
        let billed = find_by_keywords(&headers, &[format!("{} billed", month)]).or_else(|| {
            find_by_keywords(
                &headers,
                &["billed to the client".to_string(), "billed".to_string()],
            )
        });

        let gross_salary = find_by_keywords(&headers, &config.gross_keywords).or_else(|| {
            (grid.col_count() > config.gross_fallback_col).then_some(config.gross_fallback_col)
        });

        Ok(Self {
            file: find_by_keywords(&headers, &config.file_keywords),
            name: find_by_keywords(&headers, &config.name_keywords),
            hours: find_by_keywords(&headers, &hours_keywords),
            billed,
            admin_fee: find_by_keywords(&headers, &config.admin_fee_keywords),
            wages_earned: find_by_keywords(&headers, &config.wages_keywords),
            salary_paid: find_by_keywords(&headers, &config.salary_keywords),
            gross_salary,
        })
    }
}

/// Hours/billed columns for the month, plus the header writes that create
/// whichever of them the ledger lacks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthColumns {
    pub hours: usize,
    pub billed: usize,
    pub header_writes: Vec<CellWrite>,
}

/// Append missing "<Month> Hours" / "<Month> Billed to the Client" columns
/// after the last non-empty header cell
pub fn ensure_month_columns<G: GridAccessor + ?Sized>(
    grid: &G,
    header_row: usize,
    month_name: &str,
    columns: &LedgerColumns,
) -> AccrualResult<MonthColumns> {
    if let (Some(hours), Some(billed)) = (columns.hours, columns.billed) {
        return Ok(MonthColumns {
            hours,
            billed,
            header_writes: Vec::new(),
        });
    }

    let mut last = 0;
    for col in 0..grid.col_count() {
        if !grid.cell(header_row, col)?.is_empty() {
            last = col;
        }
    }

    let mut header_writes = Vec::new();
    let mut next_col = |title: String, writes: &mut Vec<CellWrite>| {
        last += 1;
        writes.push(CellWrite::new(header_row, last, title.as_str()));
        last
    };

    let hours = match columns.hours {
        Some(col) => col,
        None => next_col(format!("{} Hours", month_name), &mut header_writes),
    };
    let billed = match columns.billed {
        Some(col) => col,
        None => next_col(
            format!("{} Billed to the Client", month_name),
            &mut header_writes,
        ),
    };

    Ok(MonthColumns {
        hours,
        billed,
        header_writes,
    })
}

/// First 5-6 digit run; otherwise the first six digits when the text holds
/// at least five.
///
/// ```
/// use paysheet_accrual::core::ledger::extract_file_number;
///
/// assert_eq!(extract_file_number("APP-123456").as_deref(), Some("123456"));
/// assert_eq!(extract_file_number("12-34-56-7").as_deref(), Some("123456"));
/// assert_eq!(extract_file_number("12-34"), None);
/// ```
pub fn extract_file_number(text: &str) -> Option<String> {
    if let Some(m) = file_number_pattern().find(text) {
        return Some(m.as_str().to_string());
    }
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.len() >= 5 {
        Some(digits.chars().take(6).collect())
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub row: usize,
    pub file_number: String,
    pub name: String,
}

/// File number -> ledger row, for every row below the header. Later rows
/// with the same file number replace earlier ones.
pub fn build_ledger_lookup<G: GridAccessor + ?Sized>(
    grid: &G,
    header_row: usize,
    columns: &LedgerColumns,
) -> AccrualResult<HashMap<String, LedgerRow>> {
    let mut lookup = HashMap::new();
    let Some(file_col) = columns.file else {
        return Ok(lookup);
    };

    for row in header_row + 1..grid.row_count() {
        let text = grid.text(row, file_col)?;
        let Some(file_number) = extract_file_number(&text) else {
            continue;
        };
        let name = match columns.name {
            Some(col) => grid.text(row, col)?,
            None => String::new(),
        };
        lookup.insert(
            file_number.clone(),
            LedgerRow {
                row,
                file_number,
                name,
            },
        );
    }

    Ok(lookup)
}

/// File number of a paysheet: from its identifier, else from the first
/// 20 rows x 10 columns of any sheet
pub fn document_file_number(workbook: &Workbook) -> AccrualResult<Option<String>> {
    if let Some(m) = file_number_pattern().find(&workbook.id) {
        return Ok(Some(m.as_str().to_string()));
    }

    for sheet in &workbook.sheets {
        for row in 0..sheet.row_count().min(20) {
            for col in 0..sheet.col_count().min(10) {
                let text = sheet.text(row, col)?;
                if let Some(m) = file_number_pattern().find(&text) {
                    return Ok(Some(m.as_str().to_string()));
                }
            }
        }
    }

    Ok(None)
}

/// Hourly employees are marked in the name cell, anywhere in the first 30
/// cells of their ledger row, or in the paysheet's identifier
pub fn is_hourly<G: GridAccessor + ?Sized>(
    grid: &G,
    row: usize,
    columns: &LedgerColumns,
    document_id: &str,
) -> AccrualResult<bool> {
    if let Some(col) = columns.name {
        if grid.text(row, col)?.to_lowercase().contains("hourly") {
            return Ok(true);
        }
    }

    let mut row_text = Vec::new();
    for col in 0..grid.col_count().min(30) {
        row_text.push(grid.text(row, col)?);
    }
    if hourly_word_pattern().is_match(&row_text.join(" ").to_lowercase()) {
        return Ok(true);
    }

    Ok(document_id.to_lowercase().contains("hourly"))
}
