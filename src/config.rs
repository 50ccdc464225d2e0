//! Engine configuration
//!
//! Label vocabularies, scan windows and column conventions live in one
//! immutable [`AccrualConfig`] handed to the engine at construction. Every
//! field has a default matching the paysheet exports seen in practice, so an
//! empty YAML file (or no file at all) is a valid configuration.

use crate::error::{AccrualError, AccrualResult};
use chrono::{Month, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccrualConfig {
    pub labels: LabelConfig,
    pub scan: ScanConfig,
    pub column_scan: ColumnScanTuning,
    pub lookup: LookupConfig,
    pub ledger: LedgerConfig,
    /// Replace column-scan payments with OT-rate-table billing when available
    pub overtime_detection: OvertimeDetection,
    /// Ad-hoc adjustment dates and their multipliers
    pub adjustments: Vec<AdjustmentDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OvertimeDetection {
    Enabled,
    Disabled,
}

impl Default for OvertimeDetection {
    fn default() -> Self {
        OvertimeDetection::Enabled
    }
}

/// Case-insensitive label fragments the anchor scanner looks for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub work_period: Vec<String>,
    pub hours_and_payment: Vec<String>,
    /// Prefix of dated rate labels, e.g. "Admin Fee Eff 7/1/25"
    pub dated_rate: String,
    /// Exact text of static rate labels, e.g. "Admin Fee"
    pub static_rate: Vec<String>,
    pub total_rate: String,
    pub ot_rate: String,
    /// Period-cell keywords that make the aggregation loop skip a row
    pub row_terminators: Vec<String>,
    /// Period-cell keywords that close a section
    pub section_terminators: Vec<String>,
    /// Period-cell keywords skipped by the OT-rate-table billing walk
    pub overtime_skips: Vec<String>,
    /// Label keywords marking retro/ACH adjustment rows below a dated amount
    pub adjustment_keywords: Vec<String>,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            work_period: strings(&["work period"]),
            hours_and_payment: strings(&["hours & payment", "hours and payment"]),
            dated_rate: "admin fee eff".to_string(),
            static_rate: strings(&["admin fee", "adminfee"]),
            total_rate: "total rate".to_string(),
            ot_rate: "ot rate".to_string(),
            row_terminators: strings(&[
                "total", "hours", "payment", "deductions", "gross", "taxes", "buffer", "net",
                "rate", "employee",
            ]),
            section_terminators: strings(&["total", "admin fees", "deductions"]),
            overtime_skips: strings(&["total", "hours", "payment", "deductions"]),
            adjustment_keywords: strings(&["retro", "ach"]),
        }
    }
}

/// Row windows used by the anchor scanner and section splitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub rate_rows_above: usize,
    pub rate_rows_below: usize,
    /// OT rate labels are only looked for in this many leading rows
    pub ot_rate_rows: usize,
    /// A section stops this many rows before the next section header
    pub section_guard_rows: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rate_rows_above: 10,
            rate_rows_below: 10,
            ot_rate_rows: 20,
            section_guard_rows: 5,
        }
    }
}

/// Tuning for the label-column hours/payments scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnScanTuning {
    /// 0-based label columns (B and C by default)
    pub columns: Vec<usize>,
    /// Only scan this many rows; `None` or `0` scans the whole sheet
    pub scan_row_limit: Option<usize>,
    pub minimum_payment: f64,
    /// Hours above this are treated as noise (totals, IDs)
    pub maximum_hours: f64,
}

impl Default for ColumnScanTuning {
    fn default() -> Self {
        Self {
            columns: vec![1, 2],
            scan_row_limit: None,
            minimum_payment: 1.0,
            maximum_hours: 500.0,
        }
    }
}

/// Column windows for the amount-for-date lookup (0-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// G and H
    pub preferred_columns: Vec<usize>,
    /// E through I
    pub fallback_columns: Vec<usize>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            preferred_columns: vec![6, 7],
            fallback_columns: vec![4, 5, 6, 7, 8],
        }
    }
}

/// Master ledger ("Profit Sharing") conventions, 0-based
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub sheet: String,
    pub header_row: usize,
    pub file_keywords: Vec<String>,
    pub name_keywords: Vec<String>,
    pub admin_fee_keywords: Vec<String>,
    pub wages_keywords: Vec<String>,
    pub salary_keywords: Vec<String>,
    pub gross_keywords: Vec<String>,
    /// Gross salary column used when no header matches (V)
    pub gross_fallback_col: usize,
    /// Hourly employees get the N value copied into V
    pub hourly_source_col: usize,
    pub hourly_target_col: usize,
    /// Ad-hoc adjustment totals land in AB
    pub adjustment_col: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            sheet: "Profit Sharing".to_string(),
            header_row: 2,
            file_keywords: strings(&[
                "app id", "appid", "app_id", "applicant", "file", "file #", "file id", "app no",
            ]),
            name_keywords: strings(&["employee", "emp", "name", "payroll name", "consultant name"]),
            admin_fee_keywords: strings(&["admin fee", "adminfee", "admin"]),
            wages_keywords: strings(&["wages earned", "wagesearned"]),
            salary_keywords: strings(&["salary paid", "salarypaid", "salary"]),
            gross_keywords: strings(&["gross salary", "grosssalary", "gross"]),
            gross_fallback_col: 21,
            hourly_source_col: 13,
            hourly_target_col: 21,
            adjustment_col: 27,
        }
    }
}

/// One ad-hoc adjustment date (bonus, retro, ACH) and the share of its amount to accrue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentDate {
    pub date: NaiveDate,
    pub multiplier: f64,
}

impl AccrualConfig {
    /// Load a YAML configuration file
    pub fn load(path: &Path) -> AccrualResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AccrualConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the defaults
    pub fn load_or_default(path: Option<&Path>) -> AccrualResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> AccrualResult<()> {
        if self.labels.work_period.is_empty() && self.labels.hours_and_payment.is_empty() {
            return Err(AccrualError::Config(
                "at least one section header label is required".to_string(),
            ));
        }
        if self.column_scan.columns.is_empty() {
            return Err(AccrualError::Config(
                "column_scan.columns must name at least one column".to_string(),
            ));
        }
        if self.column_scan.maximum_hours <= 0.0 {
            return Err(AccrualError::Config(
                "column_scan.maximum_hours must be positive".to_string(),
            ));
        }
        if let Some(adj) = self.adjustments.iter().find(|a| !a.multiplier.is_finite()) {
            return Err(AccrualError::Config(format!(
                "adjustment multiplier for {} is not a number",
                adj.date
            )));
        }
        Ok(())
    }

    pub fn overtime_enabled(&self) -> bool {
        self.overtime_detection == OvertimeDetection::Enabled
    }
}

/// The (month, year) every aggregation is filtered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> AccrualResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AccrualError::Validation(format!(
                "month must be 1-12, got {}",
                month
            )));
        }
        if !(1000..=9999).contains(&year) {
            return Err(AccrualError::Validation(format!(
                "year must have four digits, got {}",
                year
            )));
        }
        Ok(Self { month, year })
    }

    /// Accepts a month number ("6") or name ("June", "jun")
    pub fn parse(month: &str, year: i32) -> AccrualResult<Self> {
        let trimmed = month.trim();
        let number = match trimmed.parse::<u32>() {
            Ok(n) => n,
            Err(_) => trimmed
                .parse::<Month>()
                .map(|m| m.number_from_month())
                .map_err(|_| AccrualError::Validation(format!("unknown month '{}'", trimmed)))?,
        };
        Self::new(number, year)
    }

    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map_or("", |m| m.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = AccrualConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scan.rate_rows_above, 10);
        assert_eq!(config.scan.section_guard_rows, 5);
        assert_eq!(config.column_scan.columns, vec![1, 2]);
        assert!(config.overtime_enabled());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
column_scan:
  columns: [3, 4]
  scan_row_limit: 60
  minimum_payment: 5.0
overtime_detection: disabled
adjustments:
  - date: 2025-06-15
    multiplier: 0.5
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = AccrualConfig::load(file.path()).unwrap();
        assert_eq!(config.column_scan.columns, vec![3, 4]);
        assert_eq!(config.column_scan.scan_row_limit, Some(60));
        assert_eq!(config.column_scan.maximum_hours, 500.0);
        assert!(!config.overtime_enabled());
        assert_eq!(config.adjustments.len(), 1);
        assert_eq!(config.adjustments[0].multiplier, 0.5);
        assert_eq!(config.labels, LabelConfig::default());
    }

    #[test]
    fn test_empty_columns_rejected() {
        let mut config = AccrualConfig::default();
        config.column_scan.columns.clear();
        assert!(matches!(config.validate(), Err(AccrualError::Config(_))));
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(Period::parse("June", 2025).unwrap().month, 6);
        assert_eq!(Period::parse("jun", 2025).unwrap().month, 6);
        assert_eq!(Period::parse("11", 2025).unwrap().month, 11);
        assert!(Period::parse("Smarch", 2025).is_err());
        assert!(Period::parse("13", 2025).is_err());
        assert!(Period::new(6, 25).is_err());
        assert_eq!(Period::new(6, 2025).unwrap().month_name(), "June");
    }
}
