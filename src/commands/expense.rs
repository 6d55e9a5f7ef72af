//! Write-side commands: add, edit and delete expenses, and set the month's
//! pension figure.

use crate::api::Mode;
use crate::args::{AddArgs, DeleteArgs, EditArgs, PensionArgs};
use crate::commands::{ledger, Out};
use crate::model::{parse_money, Expense, RowRef};
use crate::repo::Ledger;
use crate::{Config, Result};
use anyhow::Context;
use rust_decimal::Decimal;

/// Appends a new expense to a month tab. The amount is accepted in any of
/// the locale encodings the ledger itself understands.
pub async fn add(config: Config, mode: Mode, args: AddArgs) -> Result<Out<Expense>> {
    let amount = parse_amount(args.amount())?;
    let expense = Expense::new(args.date(), args.description(), amount);

    let mut repo = ledger(&config, mode).await?;
    repo.add_expense(args.year(), args.month(), &expense).await?;

    let message = format!(
        "Added '{}' to {}/{}",
        expense.description,
        args.month(),
        args.year()
    );
    Ok(Out::new(message, expense))
}

/// Overwrites an existing expense row.
pub async fn edit(config: Config, mode: Mode, args: EditArgs) -> Result<Out<Expense>> {
    let amount = parse_amount(args.amount())?;
    let expense = Expense::persisted(args.row(), args.date(), args.description(), amount);

    let mut repo = ledger(&config, mode).await?;
    repo.edit_expense(args.year(), args.month(), &expense).await?;

    let message = format!(
        "Updated row {} of {}/{}",
        args.row(),
        args.month(),
        args.year()
    );
    Ok(Out::new(message, expense))
}

/// Blanks an expense row. The row itself stays in the tab.
pub async fn delete(config: Config, mode: Mode, args: DeleteArgs) -> Result<Out<u32>> {
    let mut repo = ledger(&config, mode).await?;
    repo.delete_expense(args.year(), args.month(), RowRef::Row(args.row()))
        .await?;

    let message = format!(
        "Deleted row {} of {}/{}",
        args.row(),
        args.month(),
        args.year()
    );
    Ok(Out::new(message, args.row()))
}

/// Updates the pension figure in a month's summary block.
pub async fn pension(config: Config, mode: Mode, args: PensionArgs) -> Result<Out<Decimal>> {
    let amount = parse_amount(args.amount())?;

    let mut repo = ledger(&config, mode).await?;
    repo.set_pension(args.year(), args.month(), amount).await?;

    let message = format!(
        "Set pension for {}/{} to {}",
        args.month(),
        args.year(),
        amount
    );
    Ok(Out::new(message, amount))
}

/// Parses a CLI amount argument through the ledger's own money parser.
fn parse_amount(raw: &str) -> Result<Decimal> {
    Ok(parse_money(raw).with_context(|| format!("Unrecognized amount '{raw}'"))?)
}
