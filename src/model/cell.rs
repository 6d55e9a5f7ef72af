//! Tagged cell values produced by the sheet store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single spreadsheet cell as returned by a `SheetStore`.
///
/// The remote store hands back untyped grid text. Classifying each cell once
/// at the API boundary lets the money parser and the row classifier work over
/// a closed set of shapes instead of re-inspecting raw strings everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    /// An empty or whitespace-only cell.
    Empty,
    /// A plain dot-decimal numeric cell.
    Number(Decimal),
    /// Anything else, kept as trimmed text.
    Text(String),
}

impl CellValue {
    /// Classifies raw cell text.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        match Decimal::from_str(trimmed) {
            Ok(value) => CellValue::Number(value),
            Err(_) => CellValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// The cell's text content. Empty cells yield an empty string and
    /// numeric cells their canonical decimal rendering.
    pub fn text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(value) => value.to_string(),
            CellValue::Text(text) => text.clone(),
        }
    }

    /// Resolves the cell to a monetary amount. Numeric cells are taken
    /// as-is, text cells go through the money parser, empty cells are `None`.
    pub fn money(&self) -> Option<Decimal> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(value) => Some(*value),
            CellValue::Text(text) => crate::model::money::parse_money(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_empty() {
        assert_eq!(CellValue::from_raw(""), CellValue::Empty);
        assert_eq!(CellValue::from_raw("   "), CellValue::Empty);
    }

    #[test]
    fn test_from_raw_number() {
        assert_eq!(
            CellValue::from_raw("43.5"),
            CellValue::Number(Decimal::from_str("43.5").unwrap())
        );
        assert_eq!(
            CellValue::from_raw(" 120 "),
            CellValue::Number(Decimal::from(120))
        );
    }

    #[test]
    fn test_from_raw_text() {
        assert_eq!(
            CellValue::from_raw("Supermercado"),
            CellValue::Text("Supermercado".to_string())
        );
        // Comma-decimal text is not a plain numeric; the money parser
        // resolves it later.
        assert_eq!(
            CellValue::from_raw("43,00"),
            CellValue::Text("43,00".to_string())
        );
    }

    #[test]
    fn test_money_resolution() {
        assert_eq!(CellValue::Empty.money(), None);
        assert_eq!(
            CellValue::from_raw("12.5").money(),
            Some(Decimal::from_str("12.5").unwrap())
        );
        assert_eq!(
            CellValue::from_raw("43,00").money(),
            Some(Decimal::from_str("43.00").unwrap())
        );
        assert_eq!(CellValue::from_raw("Farmacia").money(), None);
    }
}
