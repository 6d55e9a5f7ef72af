//! Read-side commands: configured years, annual and monthly totals, expense
//! listings and the monthly financial summary.

use crate::api::Mode;
use crate::commands::{ledger, with_warnings, Out};
use crate::model::{AnnualTotal, Expense, FinancialSummary, MonthlyTotal};
use crate::repo::Ledger;
use crate::{Config, Result, TtlCache};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Lists the years that have a configured spreadsheet.
pub async fn years(config: Config, mode: Mode) -> Result<Out<Vec<i32>>> {
    let mut repo = ledger(&config, mode).await?;
    let years = repo.list_years().await?;
    let list = years
        .iter()
        .map(|y| y.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Ok(Out::new(format!("Configured years: {list}"), years))
}

/// Shows the grand total of every configured year.
pub async fn annual(config: Config, mode: Mode) -> Result<Out<Vec<AnnualTotal>>> {
    let mut repo = ledger(&config, mode).await?;
    let totals = repo.annual_totals().await?;
    let mut lines = vec!["Annual totals:".to_string()];
    for t in &totals {
        lines.push(format!("  {}  {}", t.year, money(t.total)));
    }
    let message = with_warnings(lines.join("\n"), &repo.warnings());
    Ok(Out::new(message, totals))
}

/// Shows the twelve per-month totals of one year.
pub async fn months(config: Config, mode: Mode, year: i32) -> Result<Out<Vec<MonthlyTotal>>> {
    let mut repo = ledger(&config, mode).await?;
    let totals = repo.monthly_totals(year).await?;
    let mut lines = vec![format!("Monthly totals for {year}:")];
    for t in &totals {
        lines.push(format!("  {:<12} {}", t.name, money(t.total)));
    }
    let message = with_warnings(lines.join("\n"), &repo.warnings());
    Ok(Out::new(message, totals))
}

/// Lists the expenses of one month, tagged with their sheet rows.
pub async fn expenses(
    config: Config,
    mode: Mode,
    year: i32,
    month: u32,
) -> Result<Out<Vec<Expense>>> {
    let mut repo = ledger(&config, mode).await?;
    let expenses = repo.expenses(year, month).await?;
    let mut lines = vec![format!(
        "{} expenses in {}/{year}:",
        expenses.len(),
        month
    )];
    for e in &expenses {
        lines.push(format!(
            "  row {:>3}  {:<12} {:<30} {}",
            e.row.row_number().unwrap_or_default(),
            e.date,
            e.description,
            money(e.amount)
        ));
    }
    let message = with_warnings(lines.join("\n"), &repo.warnings());
    Ok(Out::new(message, expenses))
}

/// Shows the derived financial summary of one month.
pub async fn summary(
    config: Config,
    mode: Mode,
    year: i32,
    month: u32,
) -> Result<Out<FinancialSummary>> {
    let mut repo = ledger(&config, mode).await?;
    let summary = repo.monthly_summary(year, month).await?;
    let message = format!(
        "Summary for {month}/{year}:\n  Total expenses  {}\n  Transfer        {}\n  Pension         {}\n  Total final     {}",
        money(summary.total_expenses),
        money(summary.transfer_amount),
        money(summary.pension),
        money(summary.total_final),
    );
    Ok(Out::new(
        with_warnings(message, &repo.warnings()),
        summary,
    ))
}

/// Drops every cached entry so the next read goes to the spreadsheet.
pub async fn cache_clear(config: Config) -> Result<Out<()>> {
    let cache = TtlCache::new(config.cache_dir(), config.cache_ttl()).await?;
    cache.purge().await?;
    Ok(Out::new_message("Cache cleared"))
}

/// Formats a decimal as a grouped two-decimal money string.
fn money(value: Decimal) -> String {
    format_num::format_num!(",.2", value.to_f64().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(Decimal::from_str("43").unwrap()), "43.00");
        assert_eq!(money(Decimal::from_str("1234.5").unwrap()), "1,234.50");
    }
}
