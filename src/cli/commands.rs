use crate::config::{AccrualConfig, AdjustmentDate, Period};
use crate::core::accrual::{AccrualRunner, AccrualSummary, DocumentStatus, RunOptions};
use crate::core::adhoc::amount_for_date;
use crate::core::aggregator::{aggregate_sheet, SheetAggregate};
use crate::core::column_scan::scan_hours_and_payments;
use crate::core::overtime::{billed_with_overtime, is_overtime};
use crate::error::{AccrualError, AccrualResult};
use crate::excel::{collect_paysheets, PaysheetImporter};
use crate::parser::{matches_month, parse_date_text, parse_multiplier, parse_period};
use crate::types::{round_to, Trace};
use crate::writer::{write_report, RecordingSink};
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    let rounded = (n * 1e4).round() / 1e4;
    format!("{:.4}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn format_currency(n: f64) -> String {
    format!("${:.2}", n)
}

fn print_trace(trace: &Trace) {
    println!("\n   {}", "Trace:".cyan());
    for line in trace.lines() {
        println!("      {}", line.dimmed());
    }
}

fn load_config(path: Option<&Path>) -> AccrualResult<AccrualConfig> {
    if let Some(path) = path {
        println!("   Config: {}", path.display());
    }
    AccrualConfig::load_or_default(path)
}

/// Pair `--dates` with `--multipliers`; missing multipliers mean `1.0`
pub fn adjustment_dates(dates: &[String], multipliers: &[String]) -> AccrualResult<Vec<AdjustmentDate>> {
    if !multipliers.is_empty() && multipliers.len() != dates.len() {
        return Err(AccrualError::Validation(format!(
            "{} dates but {} multipliers",
            dates.len(),
            multipliers.len()
        )));
    }

    dates
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            let date = parse_date_text(text)
                .ok_or_else(|| AccrualError::Validation(format!("could not parse date '{}'", text)))?;
            let multiplier = multipliers.get(idx).map_or(1.0, |m| parse_multiplier(m));
            Ok(AdjustmentDate { date, multiplier })
        })
        .collect()
}

/// Execute the admin-fee command
pub fn admin_fee(
    paysheet: PathBuf,
    period: Period,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    verbose: bool,
) -> AccrualResult<()> {
    println!("{}", "💼 Paysheet Accrual - Admin Fee".bold().green());
    println!("   Paysheet: {}", paysheet.display());
    println!("   Period: {} {}\n", period.month_name(), period.year);

    let config = load_config(config.as_deref())?;
    let workbook = PaysheetImporter::new(&paysheet).import()?;
    let sheet = workbook.sheet_for_year(period.year)?;
    let result = aggregate_sheet(sheet, period, &config)?;

    print_sheet_aggregate(&result, verbose);

    if let Some(path) = output {
        write_report(&path, &result)?;
        println!("\n   Report written to {}", path.display().to_string().bright_blue());
    }
    Ok(())
}

fn print_sheet_aggregate(result: &SheetAggregate, verbose: bool) {
    if result.sections.is_empty() {
        println!("{}", "⚠️  No Work Period or Hours & Payment section found".yellow());
    }
    for (idx, section) in result.sections.iter().enumerate() {
        println!(
            "   📊 Section {} ({}) rows {}..{}: {} hrs, {}",
            idx + 1,
            section.anchor.kind.to_string().bright_blue(),
            section.anchor.row + 1,
            section.end_row,
            format_number(section.aggregate.total_hours),
            format_currency(section.aggregate.total_fee)
        );
    }

    println!("\n{}", "✅ Admin Fee Totals:".bold().green());
    println!("   Total Hours: {}", format_number(result.aggregate.total_hours).bold());
    println!("   Rate Used: {}", format_currency(result.aggregate.last_rate_used));
    println!(
        "   Total Admin Fee: {}",
        format_currency(result.aggregate.total_fee).bold().green()
    );

    if verbose {
        print_trace(&result.trace);
    }
}

/// Execute the billed command (Total/OT rate table)
pub fn billed(
    paysheet: PathBuf,
    period: Period,
    config: Option<PathBuf>,
    verbose: bool,
) -> AccrualResult<()> {
    println!("{}", "💼 Paysheet Accrual - OT Billing".bold().green());
    println!("   Paysheet: {}", paysheet.display());
    println!("   Period: {} {}\n", period.month_name(), period.year);

    let config = load_config(config.as_deref())?;
    let workbook = PaysheetImporter::new(&paysheet).import()?;
    let sheet = workbook.sheet_for_year(period.year)?;

    let mut trace = Trace::new();
    match billed_with_overtime(sheet, period.month, period.year, &config, &mut trace)? {
        Some(amount) => println!(
            "{} {}",
            "✅ Billed to the client:".bold().green(),
            format_currency(amount).bold()
        ),
        None => println!("{}", "⚠️  No Total Rate / OT Rate pair found".yellow()),
    }

    if verbose {
        print_trace(&trace);
    }
    Ok(())
}

/// Flags of the scan command; unset flags keep the config's tuning
#[derive(Debug, Clone, Default)]
pub struct ScanOverrides {
    pub columns: Vec<usize>,
    pub rows: Option<usize>,
    pub min_payment: Option<f64>,
}

/// Execute the scan command (label-column hours and payments)
pub fn scan(
    paysheet: PathBuf,
    period: Period,
    overrides: ScanOverrides,
    config: Option<PathBuf>,
    verbose: bool,
) -> AccrualResult<()> {
    println!("{}", "💼 Paysheet Accrual - Column Scan".bold().green());
    println!("   Paysheet: {}", paysheet.display());
    println!("   Period: {} {}\n", period.month_name(), period.year);

    let mut tuning = load_config(config.as_deref())?.column_scan;
    if !overrides.columns.is_empty() {
        tuning.columns = overrides.columns;
    }
    if overrides.rows.is_some() {
        tuning.scan_row_limit = overrides.rows;
    }
    if let Some(min) = overrides.min_payment {
        tuning.minimum_payment = min;
    }

    let workbook = PaysheetImporter::new(&paysheet).import()?;
    let sheet = workbook.sheet_for_year(period.year)?;
    let mut trace = Trace::new();
    let totals = scan_hours_and_payments(sheet, period, &tuning, &mut trace)?;

    println!("{}", "✅ Column Scan Totals:".bold().green());
    println!("   Rows matched: {}", totals.matched_rows);
    println!("   Hours: {}", format_number(totals.hours).bold());
    println!("   Payments: {}", format_currency(totals.payments).bold());

    if verbose {
        print_trace(&trace);
    }
    Ok(())
}

/// Execute the lookup command (ad-hoc amount for a date)
pub fn lookup(
    paysheet: PathBuf,
    date: String,
    multiplier: Option<String>,
    config: Option<PathBuf>,
    verbose: bool,
) -> AccrualResult<()> {
    println!("{}", "💼 Paysheet Accrual - Date Lookup".bold().green());
    println!("   Paysheet: {}", paysheet.display());

    let target = parse_date_text(&date)
        .ok_or_else(|| AccrualError::Validation(format!("could not parse date '{}'", date)))?;
    let multiplier = multiplier.as_deref().map_or(1.0, parse_multiplier);
    println!("   Date: {}", target.format("%m/%d/%Y"));
    println!("   Multiplier: {}\n", format_number(multiplier));

    let config = load_config(config.as_deref())?;
    let workbook = PaysheetImporter::new(&paysheet).import()?;
    let mut trace = Trace::new();
    let amount = amount_for_date(&workbook, target, &config, &mut trace)?;
    let scaled = round_to(amount * multiplier, 2);

    if amount == 0.0 {
        println!("{}", "⚠️  Date not found (amount 0.00)".yellow());
    }
    println!("   Amount: {}", format_currency(amount));
    println!("   Accrued: {}", format_currency(scaled).bold().green());

    if verbose {
        print_trace(&trace);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct PeriodLine {
    label: String,
    parsed: Option<String>,
    overtime: bool,
    in_month: Option<bool>,
}

/// Execute the periods command (parse labels without a spreadsheet)
pub fn periods(labels: Vec<String>, month: Option<u32>) -> AccrualResult<()> {
    println!("{}", "💼 Paysheet Accrual - Period Labels".bold().green());
    println!();

    let lines: Vec<PeriodLine> = labels
        .iter()
        .map(|label| PeriodLine {
            label: label.clone(),
            parsed: parse_period(label).ok().map(|span| span.to_string()),
            overtime: is_overtime(label),
            in_month: month.map(|m| matches_month(label, m)),
        })
        .collect();

    for line in &lines {
        let parsed = match &line.parsed {
            Some(span) => span.bright_blue().to_string(),
            None => "unparseable".red().to_string(),
        };
        let ot = if line.overtime { " [OT]".yellow().to_string() } else { String::new() };
        let month_flag = match line.in_month {
            Some(true) => " ✓ month".green().to_string(),
            Some(false) => " ✗ month".dimmed().to_string(),
            None => String::new(),
        };
        println!("   {:<28} → {}{}{}", line.label, parsed, ot, month_flag);
    }
    Ok(())
}

/// Inputs of the run command
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub master: PathBuf,
    pub paysheets: PathBuf,
    pub period: Period,
    pub sheet: Option<String>,
    pub dates: Vec<String>,
    pub multipliers: Vec<String>,
    pub dry_run: bool,
    pub admin_fee: bool,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub verbose: bool,
}

impl RunRequest {
    pub fn new(master: PathBuf, paysheets: PathBuf, period: Period) -> Self {
        Self {
            master,
            paysheets,
            period,
            sheet: None,
            dates: Vec::new(),
            multipliers: Vec::new(),
            dry_run: false,
            admin_fee: false,
            config: None,
            output: None,
            verbose: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    summary: &'a AccrualSummary,
    sink: &'a RecordingSink,
}

/// Execute the run command (all paysheets into the master ledger)
pub fn run(request: RunRequest) -> AccrualResult<()> {
    let period = request.period;

    println!("{}", "💼 Paysheet Accrual - Accrual Run".bold().green());
    println!("   Master: {}", request.master.display());
    println!("   Paysheets: {}", request.paysheets.display());
    println!("   Period: {} {}", period.month_name(), period.year);
    if request.dry_run {
        println!("{}", "\n📋 DRY RUN MODE - No writes will be emitted".yellow());
    }
    println!();

    let mut config = load_config(request.config.as_deref())?;
    if let Some(sheet) = request.sheet {
        config.ledger.sheet = sheet;
    }
    config
        .adjustments
        .extend(adjustment_dates(&request.dates, &request.multipliers)?);
    config.validate()?;

    let master = PaysheetImporter::new(&request.master).import()?;
    let ledger = master.sheet_by_name(&config.ledger.sheet)?;
    let sources = collect_paysheets(&request.paysheets)?;
    println!("   Found {} paysheet(s)\n", sources.len());

    let options = RunOptions {
        dry_run: request.dry_run,
        admin_fee: request.admin_fee,
    };
    let mut sink = RecordingSink::new();
    let summary = AccrualRunner::new(&config, period, options).run(ledger, &sources, &mut sink)?;

    for (idx, doc) in summary.documents.iter().enumerate() {
        let prefix = format!("[{}/{}]", idx + 1, summary.documents.len());
        match &doc.status {
            DocumentStatus::Updated => {
                println!(
                    "   {} {} → row {} ({}): {} hrs, billed {}{}",
                    prefix,
                    doc.document.bright_blue(),
                    doc.ledger_row.map_or(0, |r| r + 1),
                    doc.name.as_deref().unwrap_or(""),
                    format_number(doc.hours),
                    format_currency(doc.billed),
                    if doc.adjustment_total > 0.0 {
                        format!(", AB {}", format_currency(doc.adjustment_total))
                    } else {
                        String::new()
                    }
                );
            }
            DocumentStatus::NoFileNumber => {
                println!("   {} {} {}", prefix, doc.document, "✗ no file number".yellow())
            }
            DocumentStatus::NotInLedger => {
                println!("   {} {} {}", prefix, doc.document, "✗ not in ledger".yellow())
            }
            DocumentStatus::Failed(message) => {
                println!("   {} {} {}", prefix, doc.document, format!("✗ {}", message).red())
            }
        }
        if request.verbose {
            for line in doc.trace.lines() {
                println!("         {}", line.dimmed());
            }
        }
    }

    println!("\n{}", "═".repeat(50));
    println!("   {} {}", "✓ Updated:".green(), summary.updated);
    println!("   {} {}", "⚠ No Match:".yellow(), summary.no_match);
    println!("   {} {}", "✗ Failed:".red(), summary.failed);
    println!("   Writes: {}", sink.len());
    println!("{}", "═".repeat(50));

    if let Some(path) = request.output {
        write_report(
            &path,
            &RunReport {
                summary: &summary,
                sink: &sink,
            },
        )?;
        println!("\n   Report written to {}", path.display().to_string().bright_blue());
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
