use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

//==============================================================================
// Cells
//==============================================================================

/// Typed value of one grid position (0-based row/column, owned by the grid)
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    /// A cell the source stored as a date, as opposed to text that looks like one
    Date(NaiveDate),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Empty cells and whitespace-only text both count as empty
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display text used for label matching.
    ///
    /// Whole numbers drop the trailing `.0` and dates render as `M/D/YYYY`,
    /// which is how the paysheet exports show them.
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Date(d) => format!("{}/{}/{}", d.month(), d.day(), d.year()),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

//==============================================================================
// Dates and periods
//==============================================================================

/// A `(month, day, year)` date as written on a paysheet.
///
/// Ordering is lexicographic on `(year, month, day)`. Only the month
/// (`1..=12`) and day (`1..=31`) ranges are checked; "02/30" is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PayDate {
    // field order drives the derived Ord
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl PayDate {
    pub fn new(month: u32, day: u32, year: i32) -> Option<Self> {
        if (1..=12).contains(&month) && (1..=31).contains(&day) {
            Some(Self { year, month, day })
        } else {
            None
        }
    }

    pub fn to_naive_date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    pub fn is_in_month(&self, month: u32, year: i32) -> bool {
        self.month == month && self.year == year
    }
}

impl From<NaiveDate> for PayDate {
    fn from(d: NaiveDate) -> Self {
        Self {
            year: d.year(),
            month: d.month(),
            day: d.day(),
        }
    }
}

impl fmt::Display for PayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}/{}", self.month, self.day, self.year)
    }
}

/// The date or date range one paysheet row represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSpan {
    pub start: PayDate,
    /// `None` means a single day; otherwise `start <= end`
    pub end: Option<PayDate>,
}

impl PeriodSpan {
    pub fn single(date: PayDate) -> Self {
        Self {
            start: date,
            end: None,
        }
    }

    /// Builds a range, returning `None` when `start > end`
    pub fn range(start: PayDate, end: PayDate) -> Option<Self> {
        if start <= end {
            Some(Self {
                start,
                end: Some(end),
            })
        } else {
            None
        }
    }

    pub fn is_single_day(&self) -> bool {
        self.end.is_none()
    }

    /// Starts on the 1st and ends on the 28th or later of the same month
    pub fn is_full_month(&self) -> bool {
        match self.end {
            Some(end) => {
                self.start.year == end.year
                    && self.start.month == end.month
                    && self.start.day == 1
                    && end.day >= 28
            }
            None => false,
        }
    }

    /// Month membership is decided by the start date
    pub fn is_in_month(&self, month: u32, year: i32) -> bool {
        self.start.is_in_month(month, year)
    }
}

impl fmt::Display for PeriodSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{} - {}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

//==============================================================================
// Rates
//==============================================================================

/// When a rate starts to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effective {
    /// No stated effective date: in force from the beginning of time
    Static,
    On(PayDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub effective: Effective,
    pub rate: f64,
}

impl RateEntry {
    pub fn on(date: PayDate, rate: f64) -> Self {
        Self {
            effective: Effective::On(date),
            rate,
        }
    }

    pub fn fixed(rate: f64) -> Self {
        Self {
            effective: Effective::Static,
            rate,
        }
    }

    pub fn effective_date(&self) -> Option<PayDate> {
        match self.effective {
            Effective::On(d) => Some(d),
            Effective::Static => None,
        }
    }
}

/// Regular and overtime rates read from a paysheet header block
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OvertimeRates {
    pub total_rate: f64,
    pub ot_rate: f64,
}

impl OvertimeRates {
    pub fn rate_for(&self, overtime: bool) -> f64 {
        if overtime {
            self.ot_rate
        } else {
            self.total_rate
        }
    }
}

//==============================================================================
// Sections and aggregates
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    WorkPeriod,
    HoursAndPayment,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionKind::WorkPeriod => write!(f, "Work Period"),
            SectionKind::HoursAndPayment => write!(f, "Hours & Payment"),
        }
    }
}

/// Header cell that opens one payroll section of a sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionAnchor {
    pub row: usize,
    pub col: usize,
    pub kind: SectionKind,
    pub label: String,
}

/// Hours, fee and the most recent rate applied, summable across sections
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Aggregate {
    pub total_hours: f64,
    pub total_fee: f64,
    pub last_rate_used: f64,
}

impl Aggregate {
    pub fn add_row(&mut self, hours: f64, fee: f64, rate: f64) {
        self.total_hours += hours;
        self.total_fee += fee;
        self.last_rate_used = rate;
    }

    /// Adds another accumulator; its rate wins when it contributed anything
    pub fn merge(&mut self, other: &Aggregate) {
        self.total_hours += other.total_hours;
        self.total_fee += other.total_fee;
        if other.total_hours > 0.0 {
            self.last_rate_used = other.last_rate_used;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_hours == 0.0 && self.total_fee == 0.0
    }
}

//==============================================================================
// Trace
//==============================================================================

/// Ordered, human-readable record of every decision the engine made.
///
/// Each entry is also emitted as a `tracing` debug event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trace(Vec<String>);

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(target: "paysheet_accrual::trace", "{}", line);
        self.0.push(line);
    }

    pub fn extend(&mut self, other: Trace) {
        self.0.extend(other.0);
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.iter().any(|line| line.contains(needle))
    }
}

//==============================================================================
// Sink values
//==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WriteValue {
    Number(f64),
    Text(String),
}

impl From<f64> for WriteValue {
    fn from(n: f64) -> Self {
        WriteValue::Number(n)
    }
}

impl From<&str> for WriteValue {
    fn from(s: &str) -> Self {
        WriteValue::Text(s.to_string())
    }
}

/// One `(row, column, value)` write destined for the ledger sheet (0-based)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellWrite {
    pub row: usize,
    pub col: usize,
    pub value: WriteValue,
}

impl CellWrite {
    pub fn new(row: usize, col: usize, value: impl Into<WriteValue>) -> Self {
        Self {
            row,
            col,
            value: value.into(),
        }
    }
}

/// Round to `places` decimals the way the ledger stores values
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
