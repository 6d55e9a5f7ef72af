//! The caching decorator over a `Ledger`.

use crate::cache::TtlCache;
use crate::model::{AnnualTotal, Expense, FinancialSummary, MonthlyTotal, RowRef};
use crate::repo::Ledger;
use crate::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

const AVAILABLE_YEARS_KEY: &str = "available_years";
const ANNUAL_TOTALS_KEY: &str = "annual_totals";

/// Routes every read through a file-backed TTL cache and invalidates
/// exactly the keys a successful write affects. A failed write leaves the
/// cache alone so it keeps reflecting the last known-good state.
///
/// Cached values are plain serialized data; on a hit the domain objects are
/// rebuilt from it, so a caller mutating a returned `Expense` can never
/// corrupt the cache.
pub struct CachedLedger<L> {
    inner: L,
    cache: TtlCache,
}

impl<L: Ledger> CachedLedger<L> {
    pub fn new(inner: L, cache: TtlCache) -> Self {
        Self { inner, cache }
    }

    /// Best-effort cache fill. A cache write failure must not fail the read
    /// that produced the data.
    async fn fill<T: Serialize>(&mut self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value).await {
            warn!("Failed to cache '{key}': {e}");
        }
    }

    /// Drops every key a write to (year, month) affects.
    async fn invalidate_month(&mut self, year: i32, month: u32) {
        for key in [
            expenses_key(year, month),
            monthly_totals_key(year),
            monthly_financial_key(year, month),
            ANNUAL_TOTALS_KEY.to_string(),
        ] {
            if let Err(e) = self.cache.invalidate(&key).await {
                warn!("Failed to invalidate '{key}': {e}");
            }
        }
    }
}

fn expenses_key(year: i32, month: u32) -> String {
    format!("expenses_{year}_{month}")
}

fn monthly_totals_key(year: i32) -> String {
    format!("monthly_totals_{year}")
}

fn monthly_financial_key(year: i32, month: u32) -> String {
    format!("monthly_financial_{year}_{month}")
}

#[async_trait::async_trait]
impl<L: Ledger> Ledger for CachedLedger<L> {
    async fn list_years(&mut self) -> Result<Vec<i32>> {
        if let Some(years) = self.cache.get(AVAILABLE_YEARS_KEY).await {
            return Ok(years);
        }
        let years = self.inner.list_years().await?;
        self.fill(AVAILABLE_YEARS_KEY, &years).await;
        Ok(years)
    }

    async fn annual_totals(&mut self) -> Result<Vec<AnnualTotal>> {
        if let Some(totals) = self.cache.get(ANNUAL_TOTALS_KEY).await {
            return Ok(totals);
        }
        let totals = self.inner.annual_totals().await?;
        self.fill(ANNUAL_TOTALS_KEY, &totals).await;
        Ok(totals)
    }

    async fn monthly_totals(&mut self, year: i32) -> Result<Vec<MonthlyTotal>> {
        let key = monthly_totals_key(year);
        if let Some(totals) = self.cache.get(&key).await {
            return Ok(totals);
        }
        let totals = self.inner.monthly_totals(year).await?;
        self.fill(&key, &totals).await;
        Ok(totals)
    }

    async fn expenses(&mut self, year: i32, month: u32) -> Result<Vec<Expense>> {
        let key = expenses_key(year, month);
        if let Some(expenses) = self.cache.get(&key).await {
            return Ok(expenses);
        }
        let expenses = self.inner.expenses(year, month).await?;
        self.fill(&key, &expenses).await;
        Ok(expenses)
    }

    async fn monthly_summary(&mut self, year: i32, month: u32) -> Result<FinancialSummary> {
        let key = monthly_financial_key(year, month);
        if let Some(summary) = self.cache.get(&key).await {
            return Ok(summary);
        }
        let summary = self.inner.monthly_summary(year, month).await?;
        self.fill(&key, &summary).await;
        Ok(summary)
    }

    async fn add_expense(&mut self, year: i32, month: u32, expense: &Expense) -> Result<()> {
        self.inner.add_expense(year, month, expense).await?;
        self.invalidate_month(year, month).await;
        Ok(())
    }

    async fn edit_expense(&mut self, year: i32, month: u32, expense: &Expense) -> Result<()> {
        self.inner.edit_expense(year, month, expense).await?;
        self.invalidate_month(year, month).await;
        Ok(())
    }

    async fn delete_expense(&mut self, year: i32, month: u32, row: RowRef) -> Result<()> {
        self.inner.delete_expense(year, month, row).await?;
        self.invalidate_month(year, month).await;
        Ok(())
    }

    async fn set_pension(&mut self, year: i32, month: u32, amount: Decimal) -> Result<()> {
        self.inner.set_pension(year, month, amount).await?;
        self.invalidate_month(year, month).await;
        Ok(())
    }

    fn warnings(&self) -> Vec<String> {
        self.inner.warnings()
    }
}
