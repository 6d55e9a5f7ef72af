//! Derived financial aggregates.

use crate::model::money::round2;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The derived monthly aggregate, scanned from the label/value cell pairs
/// that sit next to the transaction region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FinancialSummary {
    /// Sum of the month's expenses.
    pub total_expenses: Decimal,
    /// The half-share figure transferred between the two households.
    pub transfer_amount: Decimal,
    /// The recurring monthly allowance, 0 if the tab has none.
    pub pension: Decimal,
    /// Transfer plus pension.
    pub total_final: Decimal,
}

impl FinancialSummary {
    /// Fills in the fields the sheet does not state explicitly:
    /// total = transfer × 2, transfer = total ÷ 2, final = transfer + pension.
    /// Rounding to two places happens here, where the derived values are
    /// produced.
    pub fn derive_missing(mut self) -> Self {
        let two = Decimal::from(2);
        if self.total_expenses.is_zero() && !self.transfer_amount.is_zero() {
            self.total_expenses = round2(self.transfer_amount * two);
        }
        if self.transfer_amount.is_zero() && !self.total_expenses.is_zero() {
            self.transfer_amount = round2(self.total_expenses / two);
        }
        if self.total_final.is_zero() && !self.transfer_amount.is_zero() {
            self.total_final = round2(self.transfer_amount + self.pension);
        }
        self
    }
}

/// One month's total within a per-year report. Always present for all twelve
/// months; unreadable months degrade to a zero total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month: u32,
    pub name: String,
    pub total: Decimal,
}

/// One year's grand total, read from that year's annual summary tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualTotal {
    pub year: i32,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_derive_total_final_from_transfer_and_pension() {
        let summary = FinancialSummary {
            transfer_amount: dec("125.42"),
            pension: dec("238.20"),
            ..Default::default()
        }
        .derive_missing();
        assert_eq!(summary.total_final, dec("363.62"));
        assert_eq!(summary.total_expenses, dec("250.84"));
    }

    #[test]
    fn test_derive_transfer_from_total() {
        let summary = FinancialSummary {
            total_expenses: dec("55.50"),
            ..Default::default()
        }
        .derive_missing();
        assert_eq!(summary.transfer_amount, dec("27.75"));
        assert_eq!(summary.total_final, dec("27.75"));
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let summary = FinancialSummary {
            total_expenses: dec("100"),
            transfer_amount: dec("50"),
            pension: dec("10"),
            total_final: dec("61"),
        }
        .derive_missing();
        assert_eq!(summary.total_final, dec("61"));
    }

    #[test]
    fn test_all_zero_stays_all_zero() {
        assert_eq!(
            FinancialSummary::default().derive_missing(),
            FinancialSummary::default()
        );
    }
}
