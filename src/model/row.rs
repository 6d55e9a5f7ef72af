//! Classification of raw ledger rows.

use crate::model::CellValue;

/// What one row of a month tab represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// A dated transaction row.
    Transaction,
    /// An interior gap. Skipped, never an end marker.
    Blank,
    /// A summary/aggregate row. Ends the transaction region permanently.
    Boundary,
}

/// Classifies a row from its date, description and amount cells.
///
/// Boundary keywords win over everything else: a subtotal row keeps its
/// meaning even if someone types a date next to it. Rows carrying a
/// description or amount but no date are treated as blanks and skipped.
pub fn classify(
    date: &CellValue,
    description: &CellValue,
    amount: &CellValue,
    boundary_keywords: &[String],
) -> RowKind {
    if date.is_empty() && description.is_empty() && amount.is_empty() {
        return RowKind::Blank;
    }
    let combined = format!("{} {}", date.text(), description.text()).to_lowercase();
    if boundary_keywords
        .iter()
        .any(|keyword| combined.contains(&keyword.to_lowercase()))
    {
        return RowKind::Boundary;
    }
    if date.is_empty() {
        return RowKind::Blank;
    }
    RowKind::Transaction
}
