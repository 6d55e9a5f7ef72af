//! The expense ledger repository: one trait, implemented directly against
//! the backing spreadsheets and by a caching decorator. Which variant a
//! caller gets is decided by composition at construction time.

mod cached;
mod sheets;

pub use cached::CachedLedger;
pub use sheets::SheetsLedger;

use crate::model::{AnnualTotal, Expense, FinancialSummary, MonthlyTotal, RowRef};
use crate::Result;
use rust_decimal::Decimal;

/// The capability set of the expense ledger.
#[async_trait::async_trait]
pub trait Ledger: Send {
    /// Years with a configured spreadsheet, ascending.
    async fn list_years(&mut self) -> Result<Vec<i32>>;

    /// The grand total of every configured year, ascending by year.
    /// Unreadable years degrade to 0 plus a recorded warning.
    async fn annual_totals(&mut self) -> Result<Vec<AnnualTotal>>;

    /// The grand total for one year; 0 if the year has no entry.
    async fn annual_total(&mut self, year: i32) -> Result<Decimal> {
        Ok(self
            .annual_totals()
            .await?
            .into_iter()
            .find(|t| t.year == year)
            .map(|t| t.total)
            .unwrap_or_default())
    }

    /// Twelve per-month totals for a year. Months that cannot be read
    /// degrade to 0 plus a recorded warning.
    async fn monthly_totals(&mut self, year: i32) -> Result<Vec<MonthlyTotal>>;

    /// The transaction region of one month tab, in row order, each expense
    /// tagged with its 1-based row.
    async fn expenses(&mut self, year: i32, month: u32) -> Result<Vec<Expense>>;

    /// The derived financial summary of one month tab. All-zero if the tab
    /// cannot be read.
    async fn monthly_summary(&mut self, year: i32, month: u32) -> Result<FinancialSummary>;

    /// Appends a new expense. The expense must be `RowRef::Unsaved`.
    async fn add_expense(&mut self, year: i32, month: u32, expense: &Expense) -> Result<()>;

    /// Overwrites the row referenced by the expense, which must be
    /// `RowRef::Row`.
    async fn edit_expense(&mut self, year: i32, month: u32, expense: &Expense) -> Result<()>;

    /// Blanks the referenced row's cells. The row itself stays in place, so
    /// the handles of the rows below it keep their meaning.
    async fn delete_expense(&mut self, year: i32, month: u32, row: RowRef) -> Result<()>;

    /// Writes the pension amount into the cell next to the month's pension
    /// label row.
    async fn set_pension(&mut self, year: i32, month: u32, amount: Decimal) -> Result<()>;

    /// Non-fatal issues accumulated by earlier read operations. Never
    /// cached; always describes the most recent calls.
    fn warnings(&self) -> Vec<String>;
}
