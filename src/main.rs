use clap::{Parser, Subcommand};
use paysheet_accrual::cli;
use paysheet_accrual::config::Period;
use paysheet_accrual::error::AccrualResult;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "accrual")]
#[command(about = "Monthly admin-fee and billing accruals from paysheet workbooks.")]
#[command(long_about = "Paysheet Accrual - month-end accruals from contractor paysheets
Hours, billed amounts and admin fees per employee, straight from the workbooks

COMMANDS:
  admin-fee   - Admin fee for one paysheet (Work Period / Hours & Payment sections)
  billed      - Billed amount from the Total Rate / OT Rate table
  scan        - Hours and payments from the period label columns
  lookup      - Amount recorded for one ad-hoc date (bonus, retro, ACH)
  periods     - Parse period labels without opening a workbook
  run         - Evaluate a folder of paysheets against the master ledger

EXAMPLES:
  accrual admin-fee 123456_June.xlsx --month June --year 2025
  accrual billed 123456_June.xlsx -m 6 -y 2025
  accrual lookup 123456_June.xlsx --date 06/15/2025 --multiplier 0.5
  accrual run --master master.xlsx --paysheets ./june -m 6 -y 2025 --dry-run

LOGGING:
  -v raises the log level to debug; RUST_LOG overrides it.")]
#[command(version)]
struct Cli {
    /// Show the per-row trace and debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Compute the admin fee accrued by one paysheet for a month.

Finds every 'Work Period' and 'Hours & Payment' section, collects the admin
fee rates above and below each header, and prices every row whose period
label falls in the target month.

RATES:
  Admin Fee        <rate>          applies from the beginning of time
  Admin Fee Eff 6/16/2025  <rate>  applies from that date on
  A rate effective mid-month that lands on a row covering the whole month
  is applied to that row.

Use --output to save the per-section breakdown as YAML or JSON.")]
    /// Admin fee for one paysheet
    AdminFee {
        /// Paysheet workbook (.xls, .xlsx, .xlsm, .ods)
        paysheet: PathBuf,

        /// Target month (number or name)
        #[arg(short, long)]
        month: String,

        /// Target year (also selects the sheet named after it)
        #[arg(short, long)]
        year: i32,

        /// YAML config overriding labels and scan tuning
        #[arg(short, long, env = "ACCRUAL_CONFIG")]
        config: Option<PathBuf>,

        /// Write the breakdown to a .yaml or .json file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    #[command(long_about = "Compute the amount billed to the client from a Total Rate / OT Rate table.

Regular rows are billed at 'Total Rate', rows labelled '-OT' or ' OT' at
'OT Rate'. Both labels must sit in the first 20 rows.")]
    /// Billed amount using the Total Rate / OT Rate table
    Billed {
        /// Paysheet workbook
        paysheet: PathBuf,

        /// Target month (number or name)
        #[arg(short, long)]
        month: String,

        /// Target year
        #[arg(short, long)]
        year: i32,

        /// YAML config overriding labels and scan tuning
        #[arg(short, long, env = "ACCRUAL_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Hours and payments from the period label columns
    Scan {
        /// Paysheet workbook
        paysheet: PathBuf,

        /// Target month (number or name)
        #[arg(short, long)]
        month: String,

        /// Target year
        #[arg(short, long)]
        year: i32,

        /// Label columns to scan, 0-based (default: 1,2)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<usize>,

        /// Only scan the first N rows
        #[arg(long)]
        rows: Option<usize>,

        /// Payments below this count as zero
        #[arg(long)]
        min_payment: Option<f64>,

        /// YAML config overriding labels and scan tuning
        #[arg(short, long, env = "ACCRUAL_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Amount recorded for one ad-hoc date
    Lookup {
        /// Paysheet workbook
        paysheet: PathBuf,

        /// Date to look up (MM/DD/YYYY or YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Share of the amount to accrue (e.g. 0.5)
        #[arg(long)]
        multiplier: Option<String>,

        /// YAML config overriding lookup columns and adjustment keywords
        #[arg(short, long, env = "ACCRUAL_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Parse period labels and show their spans
    Periods {
        /// Labels such as "06/01-06/07/2025" or "6/9/2025-OT"
        #[arg(required = true)]
        labels: Vec<String>,

        /// Also report whether each label falls in this month (1-12)
        #[arg(short, long)]
        month: Option<u32>,
    },

    #[command(long_about = "Evaluate every paysheet in a folder against the master ledger.

Each paysheet is matched to a ledger row by its 5-6 digit file number (from
the file name, else from its first rows). Hours and billed amounts are
written to the '<Month> Hours' and '<Month> Billed to the Client' columns,
which are added when missing.

AD-HOC DATES:
  --dates 06/15/2025,06/30/2025 --multipliers 0.5,1
  Sums the amounts found for each date (times its multiplier) into column AB.

Writes are collected, not applied: use --output to save them with the
summary. --dry-run evaluates everything and emits no writes.")]
    /// Evaluate a folder of paysheets against the master ledger
    Run {
        /// Master ledger workbook
        #[arg(long)]
        master: PathBuf,

        /// Folder of paysheets (searched recursively)
        #[arg(long)]
        paysheets: PathBuf,

        /// Target month (number or name)
        #[arg(short, long)]
        month: String,

        /// Target year
        #[arg(short, long)]
        year: i32,

        /// Ledger sheet name (default: "Profit Sharing")
        #[arg(long)]
        sheet: Option<String>,

        /// Ad-hoc dates to accrue
        #[arg(long, value_delimiter = ',')]
        dates: Vec<String>,

        /// Multipliers matching --dates
        #[arg(long, value_delimiter = ',')]
        multipliers: Vec<String>,

        /// Evaluate without emitting writes
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Also compute admin fees into the ledger's admin fee column
        #[arg(long)]
        admin_fee: bool,

        /// YAML config overriding labels and scan tuning
        #[arg(short, long, env = "ACCRUAL_CONFIG")]
        config: Option<PathBuf>,

        /// Write the summary and writes to a .yaml or .json file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "paysheet_accrual=debug"
    } else {
        "paysheet_accrual=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> AccrualResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let verbose = cli.verbose;

    match cli.command {
        Commands::AdminFee {
            paysheet,
            month,
            year,
            config,
            output,
        } => cli::admin_fee(paysheet, Period::parse(&month, year)?, config, output, verbose),

        Commands::Billed {
            paysheet,
            month,
            year,
            config,
        } => cli::billed(paysheet, Period::parse(&month, year)?, config, verbose),

        Commands::Scan {
            paysheet,
            month,
            year,
            columns,
            rows,
            min_payment,
            config,
        } => cli::scan(
            paysheet,
            Period::parse(&month, year)?,
            cli::ScanOverrides {
                columns,
                rows,
                min_payment,
            },
            config,
            verbose,
        ),

        Commands::Lookup {
            paysheet,
            date,
            multiplier,
            config,
        } => cli::lookup(paysheet, date, multiplier, config, verbose),

        Commands::Periods { labels, month } => cli::periods(labels, month),

        Commands::Run {
            master,
            paysheets,
            month,
            year,
            sheet,
            dates,
            multipliers,
            dry_run,
            admin_fee,
            config,
            output,
        } => cli::run(cli::RunRequest {
            master,
            paysheets,
            period: Period::parse(&month, year)?,
            sheet,
            dates,
            multipliers,
            dry_run,
            admin_fee,
            config,
            output,
            verbose,
        }),
    }
}
