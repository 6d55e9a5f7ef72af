//! These structs provide the CLI interface for the gastos CLI.

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// gastos: a command-line tool for a household expense ledger kept in
/// Google Sheets.
///
/// Each year of expenses lives in its own Google sheet with one tab per
/// month; this program reads and writes those tabs, derives monthly and
/// annual totals, and keeps a small local cache so repeated reads do not
/// hammer the Sheets API.
///
/// You will need an OAuth client and a refresh token for a Google account
/// with edit access to the sheets. Run `gastos init` once to set up the
/// data directory.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need two things ready:
    ///
    /// - A credentials JSON file holding your OAuth client id, client
    ///   secret and refresh token, passed as --credentials. It will be
    ///   moved into the data directory.
    ///
    /// - The URL of each year's Google sheet, passed as repeated
    ///   --sheet YEAR=URL arguments.
    Init(InitArgs),
    /// List the years that have a configured spreadsheet.
    Years,
    /// Show the grand total of every configured year.
    Annual,
    /// Show the twelve per-month totals of one year.
    Months(MonthsArgs),
    /// List the expenses of one month, tagged with their sheet rows.
    Expenses(MonthArgs),
    /// Show the derived financial summary of one month.
    Summary(MonthArgs),
    /// Append a new expense to a month tab.
    Add(AddArgs),
    /// Overwrite an existing expense row.
    Edit(EditArgs),
    /// Blank an expense row. The row itself is kept so other rows keep
    /// their positions.
    Delete(DeleteArgs),
    /// Update the pension figure in a month's summary block.
    Pension(PensionArgs),
    /// Drop every cached entry.
    CacheClear,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where gastos data and configuration is held.
    /// Defaults to ~/gastos
    #[arg(long, env = "GASTOS_HOME", default_value_t = default_gastos_home())]
    gastos_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, gastos_home: PathBuf) -> Self {
        Self {
            log_level,
            gastos_home: gastos_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn gastos_home(&self) -> &DisplayPath {
        &self.gastos_home
    }
}

/// Args for the `gastos init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The path to a JSON file with your OAuth client id, client secret and
    /// refresh token. It will be moved to the secrets location in the data
    /// directory.
    #[arg(long)]
    credentials: PathBuf,

    /// A year and the URL of its Google sheet, as YEAR=URL. Repeat for each
    /// year, e.g. --sheet 2025=https://docs.google.com/spreadsheets/d/...
    #[arg(long = "sheet", value_parser = parse_year_sheet, required = true)]
    sheets: Vec<(i32, String)>,
}

impl InitArgs {
    pub fn credentials(&self) -> &Path {
        &self.credentials
    }

    pub fn spreadsheets(&self) -> BTreeMap<i32, String> {
        self.sheets.iter().cloned().collect()
    }
}

fn parse_year_sheet(s: &str) -> Result<(i32, String), String> {
    let (year, url) = s
        .split_once('=')
        .ok_or_else(|| format!("expected YEAR=URL, got '{s}'"))?;
    let year = year
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("invalid year in '{s}': {e}"))?;
    Ok((year, url.trim().to_string()))
}

/// Args for commands that take a year.
#[derive(Debug, Parser, Clone)]
pub struct MonthsArgs {
    /// The year to report on.
    #[arg(long)]
    year: i32,
}

impl MonthsArgs {
    pub fn year(&self) -> i32 {
        self.year
    }
}

/// Args for commands that take a year and a month.
#[derive(Debug, Parser, Clone)]
pub struct MonthArgs {
    /// The year of the month tab.
    #[arg(long)]
    year: i32,

    /// The month number, 1-12.
    #[arg(long)]
    month: u32,
}

impl MonthArgs {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

/// Args for the `gastos add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The year of the month tab.
    #[arg(long)]
    year: i32,

    /// The month number, 1-12.
    #[arg(long)]
    month: u32,

    /// The day of the expense. Either the sheet's own DD/MM/YYYY or ISO
    /// YYYY-MM-DD, which is rewritten before it reaches the sheet.
    #[arg(long)]
    date: String,

    /// A free-text label for the expense.
    #[arg(long)]
    description: String,

    /// The amount, in any encoding the ledger understands (e.g. 43,00 or
    /// 1,234.56).
    #[arg(long)]
    amount: String,
}

impl AddArgs {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

/// Args for the `gastos edit` command.
#[derive(Debug, Parser, Clone)]
pub struct EditArgs {
    /// The year of the month tab.
    #[arg(long)]
    year: i32,

    /// The month number, 1-12.
    #[arg(long)]
    month: u32,

    /// The 1-based sheet row of the expense, as listed by `gastos expenses`.
    #[arg(long)]
    row: u32,

    /// The day of the expense.
    #[arg(long)]
    date: String,

    /// A free-text label for the expense.
    #[arg(long)]
    description: String,

    /// The amount, in any encoding the ledger understands.
    #[arg(long)]
    amount: String,
}

impl EditArgs {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

/// Args for the `gastos delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The year of the month tab.
    #[arg(long)]
    year: i32,

    /// The month number, 1-12.
    #[arg(long)]
    month: u32,

    /// The 1-based sheet row to blank.
    #[arg(long)]
    row: u32,
}

impl DeleteArgs {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn row(&self) -> u32 {
        self.row
    }
}

/// Args for the `gastos pension` command.
#[derive(Debug, Parser, Clone)]
pub struct PensionArgs {
    /// The year of the month tab.
    #[arg(long)]
    year: i32,

    /// The month number, 1-12.
    #[arg(long)]
    month: u32,

    /// The pension amount, in any encoding the ledger understands.
    #[arg(long)]
    amount: String,
}

impl PensionArgs {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }
}

fn default_gastos_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("gastos"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --gastos-home or GASTOS_HOME instead of relying on the default \
                gastos home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("gastos")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
