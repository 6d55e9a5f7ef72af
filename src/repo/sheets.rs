//! The direct spreadsheet-backed `Ledger` implementation.

use crate::api::SheetStore;
use crate::error::Error;
use crate::model::{
    classify, normalize_date, round2, AnnualTotal, CellValue, Expense, FinancialSummary,
    MonthlyTotal, RowKind,
};
use crate::model::RowRef;
use crate::repo::Ledger;
use crate::{Config, Result};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Cell window holding the date/description/amount columns, with headroom.
const EXPENSE_RANGE: &str = "A1:C200";
/// Cell window scanned for summary label/value pairs.
const SUMMARY_RANGE: &str = "A1:F200";
/// Columns covered by the native append.
const APPEND_RANGE: &str = "A:C";

/// Reads and writes expense data in the backing spreadsheets: one workbook
/// per year, one tab per month. Non-fatal read problems are collected as
/// warnings so a single bad tab never takes down a whole report.
pub struct SheetsLedger {
    config: Config,
    store: Box<dyn SheetStore + Send>,
    warnings: Vec<String>,
}

impl SheetsLedger {
    /// Create a new `SheetsLedger` that will use a dynamically-dispatched
    /// `store` to get and send its data.
    pub fn new(config: Config, store: Box<dyn SheetStore + Send>) -> Self {
        Self {
            config,
            store,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }

    /// Reads a range, or records a warning and returns `None` so aggregate
    /// reads degrade instead of failing.
    async fn read_or_warn(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
        what: &str,
    ) -> Option<Vec<Vec<CellValue>>> {
        match self.store.read_range(spreadsheet_id, range).await {
            Ok(grid) => Some(grid),
            Err(e) => {
                self.warn(format!("Error reading {what}: {e:#}"));
                None
            }
        }
    }

    /// Scans the transaction region of a month grid: the header row is
    /// skipped, blank rows are passed over, and the first boundary row ends
    /// the region for good. Each expense keeps its 1-based sheet row.
    fn scan_transactions(&mut self, grid: &[Vec<CellValue>], tab: &str) -> Vec<Expense> {
        let keywords = self.config.boundary_keywords().to_vec();
        let mut expenses = Vec::new();
        for (ix, row) in grid.iter().enumerate().skip(1) {
            let date = row.first().cloned().unwrap_or(CellValue::Empty);
            let description = row.get(1).cloned().unwrap_or(CellValue::Empty);
            let amount = row.get(2).cloned().unwrap_or(CellValue::Empty);
            match classify(&date, &description, &amount, &keywords) {
                RowKind::Blank => continue,
                RowKind::Boundary => break,
                RowKind::Transaction => {
                    let value = match (&amount, amount.money()) {
                        (CellValue::Empty, _) => Decimal::ZERO,
                        (_, Some(parsed)) => parsed,
                        (cell, None) => {
                            self.warn(format!(
                                "Unparseable amount '{}' in {tab} row {}; counted as 0",
                                cell.text(),
                                ix + 1
                            ));
                            Decimal::ZERO
                        }
                    };
                    expenses.push(Expense::persisted(
                        ix as u32 + 1,
                        date.text(),
                        description.text(),
                        value,
                    ));
                }
            }
        }
        expenses
    }

    /// Searches a year's annual tab for the configured label and returns
    /// the value in the cell to its right.
    async fn find_annual_total(&mut self, year: i32) -> Option<Decimal> {
        let id = self.config.spreadsheet_id(year).ok()?.to_string();
        let range = format!(
            "{}!{}",
            self.config.annual_sheet(),
            self.config.annual_search_range()
        );
        let grid = self
            .read_or_warn(&id, &range, &format!("annual summary for {year}"))
            .await?;

        let label = self.config.annual_search_label().to_string();
        for row in &grid {
            for (ix, cell) in row.iter().enumerate() {
                if let CellValue::Text(text) = cell {
                    if text.trim() == label {
                        return row.get(ix + 1).and_then(CellValue::money);
                    }
                }
            }
        }
        self.warn(format!("'{label}' not found in the {year} annual tab"));
        None
    }
}

#[async_trait::async_trait]
impl Ledger for SheetsLedger {
    async fn list_years(&mut self) -> Result<Vec<i32>> {
        Ok(self.config.years())
    }

    async fn annual_totals(&mut self) -> Result<Vec<AnnualTotal>> {
        let mut totals = Vec::new();
        for year in self.config.years() {
            let total = self.find_annual_total(year).await.unwrap_or_default();
            totals.push(AnnualTotal { year, total });
        }
        Ok(totals)
    }

    async fn monthly_totals(&mut self, year: i32) -> Result<Vec<MonthlyTotal>> {
        let id = self.config.spreadsheet_id(year)?.to_string();
        let mut totals = Vec::new();
        for month in 1..=12 {
            let name = self.config.month_label(month);
            let total = match self.config.month_tab(month).map(str::to_string) {
                Ok(tab) => {
                    let range = format!("{tab}!{EXPENSE_RANGE}");
                    match self
                        .read_or_warn(&id, &range, &format!("{tab} {year} for monthly totals"))
                        .await
                    {
                        Some(grid) => {
                            let sum: Decimal = self
                                .scan_transactions(&grid, &tab)
                                .iter()
                                .map(|e| e.amount)
                                .sum();
                            round2(sum)
                        }
                        None => Decimal::ZERO,
                    }
                }
                Err(_) => Decimal::ZERO,
            };
            totals.push(MonthlyTotal { month, name, total });
        }
        Ok(totals)
    }

    async fn expenses(&mut self, year: i32, month: u32) -> Result<Vec<Expense>> {
        let id = self.config.spreadsheet_id(year)?.to_string();
        let tab = self.config.month_tab(month)?.to_string();
        let range = format!("{tab}!{EXPENSE_RANGE}");
        let Some(grid) = self
            .read_or_warn(&id, &range, &format!("expenses {tab} {year}"))
            .await
        else {
            return Ok(Vec::new());
        };
        Ok(self.scan_transactions(&grid, &tab))
    }

    async fn monthly_summary(&mut self, year: i32, month: u32) -> Result<FinancialSummary> {
        let id = self.config.spreadsheet_id(year)?.to_string();
        let Ok(tab) = self.config.month_tab(month).map(str::to_string) else {
            return Ok(FinancialSummary::default());
        };
        let range = format!("{tab}!{SUMMARY_RANGE}");
        let Some(grid) = self
            .read_or_warn(&id, &range, &format!("financial summary {tab} {year}"))
            .await
        else {
            return Ok(FinancialSummary::default());
        };
        Ok(scan_summary(&grid).derive_missing())
    }

    async fn add_expense(&mut self, year: i32, month: u32, expense: &Expense) -> Result<()> {
        if !expense.row.is_unsaved() {
            return Err(Error::RowRefForbidden);
        }
        let id = self.config.spreadsheet_id(year)?.to_string();
        let tab = self.config.month_tab(month)?.to_string();
        debug!("appending expense to {tab} {year}");

        // The store's native append picks the insertion row, so a
        // concurrent hand edit to the same tab cannot race our bookkeeping.
        let values = vec![
            normalize_date(&expense.date),
            expense.description.clone(),
            expense.amount.to_string(),
        ];
        self.store
            .append_row(&id, &format!("{tab}!{APPEND_RANGE}"), values)
            .await
            .map_err(Error::RemoteWrite)
    }

    async fn edit_expense(&mut self, year: i32, month: u32, expense: &Expense) -> Result<()> {
        let row = expense.row.row_number().ok_or(Error::MissingRowRef)?;
        let id = self.config.spreadsheet_id(year)?.to_string();
        let tab = self.config.month_tab(month)?.to_string();
        debug!("updating {tab} {year} row {row}");

        let values = vec![vec![
            normalize_date(&expense.date),
            expense.description.clone(),
            expense.amount.to_string(),
        ]];
        self.store
            .update_range(&id, &format!("{tab}!A{row}:C{row}"), values)
            .await
            .map_err(Error::RemoteWrite)
    }

    async fn delete_expense(&mut self, year: i32, month: u32, row: RowRef) -> Result<()> {
        let row = row.row_number().ok_or(Error::MissingRowRef)?;
        let id = self.config.spreadsheet_id(year)?.to_string();
        let tab = self.config.month_tab(month)?.to_string();
        debug!("blanking {tab} {year} row {row}");

        // Blank the cells instead of removing the row: removal would shift
        // every row handle below it and disturb formulas elsewhere on the
        // tab. The blanked row reads as a gap and is skipped by scans.
        let values = vec![vec![String::new(), String::new(), String::new()]];
        self.store
            .update_range(&id, &format!("{tab}!A{row}:C{row}"), values)
            .await
            .map_err(Error::RemoteWrite)
    }

    async fn set_pension(&mut self, year: i32, month: u32, amount: Decimal) -> Result<()> {
        let id = self.config.spreadsheet_id(year)?.to_string();
        let tab = self.config.month_tab(month)?.to_string();
        let range = format!("{tab}!{SUMMARY_RANGE}");

        // The label lookup gates the write, so a read failure here is an
        // error rather than a warning.
        let grid = self
            .store
            .read_range(&id, &range)
            .await
            .map_err(Error::RemoteRead)?;
        let Some((row_ix, col_ix)) = find_pension_cell(&grid) else {
            return Err(Error::PensionCellNotFound(tab));
        };

        let target = format!("{tab}!{}{}", col_letter(col_ix + 1), row_ix + 1);
        debug!("writing pension to {target}");
        self.store
            .update_range(&id, &target, vec![vec![amount.to_string()]])
            .await
            .map_err(Error::RemoteWrite)
    }

    fn warnings(&self) -> Vec<String> {
        self.warnings.clone()
    }
}

/// Scans a grid for summary label/value pairs: a text cell containing one of
/// the known labels, with its value in one of the next two cells. Later
/// matches for the same field win, mirroring a top-to-bottom hand-kept
/// summary block.
fn scan_summary(grid: &[Vec<CellValue>]) -> FinancialSummary {
    let mut summary = FinancialSummary::default();
    for row in grid {
        for (ix, cell) in row.iter().enumerate() {
            let CellValue::Text(text) = cell else {
                continue;
            };
            let label = text.to_lowercase();
            let value = (1..=2).find_map(|offset| {
                row.get(ix + offset)
                    .and_then(CellValue::money)
                    .filter(|v| *v > Decimal::ZERO)
            });
            let Some(value) = value else {
                continue;
            };
            if label.contains("total a pagar")
                || label.contains("total/2")
                || label.contains("total /2")
            {
                summary.transfer_amount = value;
            } else if label.contains("pensi") {
                summary.pension = value;
            } else if label.contains("total final") {
                summary.total_final = value;
            } else if label.contains("total") {
                summary.total_expenses = value;
            }
        }
    }
    summary
}

/// Finds the zero-based (row, column) of the pension label cell.
fn find_pension_cell(grid: &[Vec<CellValue>]) -> Option<(usize, usize)> {
    for (row_ix, row) in grid.iter().enumerate() {
        for (col_ix, cell) in row.iter().enumerate() {
            if let CellValue::Text(text) = cell {
                if text.to_lowercase().contains("pensi") {
                    return Some((row_ix, col_ix));
                }
            }
        }
    }
    None
}

/// Turns a zero-based column index into its A1 letter form.
fn col_letter(mut ix: usize) -> String {
    let mut letters = String::new();
    loop {
        letters.insert(0, (b'A' + (ix % 26) as u8) as char);
        if ix < 26 {
            break;
        }
        ix = ix / 26 - 1;
    }
    letters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TestStore;
    use crate::test::TestEnv;
    use std::collections::HashMap;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    /// The January scenario: two expenses around a gap, then a subtotal row.
    fn enero_rows() -> Vec<Vec<String>> {
        grid(&[
            &["Fecha", "Descripción", "Importe"],
            &["15/01/2025", "Supermercado", "43,00"],
            &["", "", ""],
            &["20/01/2025", "Farmacia", "12,50"],
            &["", "Total a Pagar:", "27,75"],
        ])
    }

    async fn ledger_with(tabs: HashMap<String, Vec<Vec<String>>>) -> (SheetsLedger, TestStore) {
        let env = TestEnv::new().await;
        let store = TestStore::new(tabs);
        let ledger = SheetsLedger::new(env.config(), Box::new(store.clone()));
        (ledger, store)
    }

    fn one_tab(name: &str, rows: Vec<Vec<String>>) -> HashMap<String, Vec<Vec<String>>> {
        HashMap::from([(name.to_string(), rows)])
    }

    #[tokio::test]
    async fn test_expenses_end_to_end_scenario() {
        let (mut ledger, _store) = ledger_with(one_tab("Gastos Enero", enero_rows())).await;

        let expenses = ledger.expenses(2025, 1).await.unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].row, RowRef::Row(2));
        assert_eq!(expenses[0].description, "Supermercado");
        assert_eq!(expenses[0].amount, dec("43.00"));
        assert_eq!(expenses[1].row, RowRef::Row(4));
        assert_eq!(expenses[1].amount, dec("12.50"));

        let summary = ledger.monthly_summary(2025, 1).await.unwrap();
        assert_eq!(summary.transfer_amount, dec("27.75"));
        assert_eq!(summary.total_expenses, dec("55.50"));
        assert_eq!(summary.total_final, dec("27.75"));
    }

    #[tokio::test]
    async fn test_scan_stops_at_first_boundary_row() {
        let mut rows = enero_rows();
        // A well-formed transaction after the boundary must never surface.
        rows.push(
            ["31/01/2025", "Fantasma", "99,99"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let (mut ledger, _store) = ledger_with(one_tab("Gastos Enero", rows)).await;

        let expenses = ledger.expenses(2025, 1).await.unwrap();
        assert_eq!(expenses.len(), 2);
        assert!(expenses.iter().all(|e| e.row.row_number().unwrap() < 5));
    }

    #[tokio::test]
    async fn test_expenses_invalid_month() {
        let (mut ledger, _store) = ledger_with(one_tab("Gastos Enero", enero_rows())).await;
        assert!(matches!(
            ledger.expenses(2025, 13).await,
            Err(Error::InvalidMonth(13))
        ));
    }

    #[tokio::test]
    async fn test_expenses_read_failure_degrades_with_warning() {
        // No tabs at all: every read fails.
        let (mut ledger, _store) = ledger_with(HashMap::new()).await;
        let expenses = ledger.expenses(2025, 1).await.unwrap();
        assert!(expenses.is_empty());
        assert_eq!(ledger.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_amount_counts_as_zero_with_warning() {
        let rows = grid(&[
            &["Fecha", "Descripción", "Importe"],
            &["15/01/2025", "Supermercado", "43,00"],
            &["16/01/2025", "Panadería", "unas monedas"],
        ]);
        let (mut ledger, _store) = ledger_with(one_tab("Gastos Enero", rows)).await;

        let expenses = ledger.expenses(2025, 1).await.unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[1].amount, Decimal::ZERO);
        assert_eq!(ledger.warnings().len(), 1);
        assert!(ledger.warnings()[0].contains("unas monedas"));
    }

    #[tokio::test]
    async fn test_monthly_totals_cover_all_months() {
        let (mut ledger, _store) = ledger_with(one_tab("Gastos Enero", enero_rows())).await;

        let totals = ledger.monthly_totals(2025).await.unwrap();
        assert_eq!(totals.len(), 12);
        assert_eq!(totals[0].month, 1);
        assert_eq!(totals[0].name, "Enero");
        assert_eq!(totals[0].total, dec("55.50"));
        // The other eleven tabs are unreadable and degrade to zero.
        assert!(totals[1..].iter().all(|t| t.total.is_zero()));
        assert_eq!(ledger.warnings().len(), 11);
    }

    #[tokio::test]
    async fn test_monthly_summary_derives_final_from_transfer_and_pension() {
        let rows = grid(&[
            &["Fecha", "Descripción", "Importe", "Resumen", "Valor"],
            &["", "", "", "Total a Pagar:", "125,42"],
            &["", "", "", "Pensión:", "238,20"],
        ]);
        let (mut ledger, _store) = ledger_with(one_tab("Gastos Enero", rows)).await;

        let summary = ledger.monthly_summary(2025, 1).await.unwrap();
        assert_eq!(summary.transfer_amount, dec("125.42"));
        assert_eq!(summary.pension, dec("238.20"));
        assert_eq!(summary.total_final, dec("363.62"));
    }

    #[tokio::test]
    async fn test_monthly_summary_unreadable_tab_is_all_zero() {
        let (mut ledger, _store) = ledger_with(HashMap::new()).await;
        let summary = ledger.monthly_summary(2025, 1).await.unwrap();
        assert_eq!(summary, FinancialSummary::default());
        assert_eq!(ledger.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_add_expense_appends_and_normalizes_date() {
        let (mut ledger, store) = ledger_with(one_tab("Gastos Enero", enero_rows())).await;

        let expense = Expense::new("2025-01-25", "Gasolina", dec("30.00"));
        ledger.add_expense(2025, 1, &expense).await.unwrap();

        let rows = store.rows("Gastos Enero").unwrap();
        // Appended after the last data row (the boundary row holds text in
        // column B, so it counts as data for the append region).
        assert_eq!(rows[5][0], "25/01/2025");
        assert_eq!(rows[5][1], "Gasolina");
        assert_eq!(rows[5][2], "30.00");
    }

    #[tokio::test]
    async fn test_add_expense_rejects_row_ref() {
        let (mut ledger, _store) = ledger_with(one_tab("Gastos Enero", enero_rows())).await;
        let expense = Expense::persisted(2, "15/01/2025", "Supermercado", dec("43.00"));
        assert!(matches!(
            ledger.add_expense(2025, 1, &expense).await,
            Err(Error::RowRefForbidden)
        ));
    }

    #[tokio::test]
    async fn test_edit_expense_overwrites_exactly_one_row() {
        let (mut ledger, store) = ledger_with(one_tab("Gastos Enero", enero_rows())).await;

        let expense = Expense::persisted(4, "21/01/2025", "Farmacia Central", dec("13.00"));
        ledger.edit_expense(2025, 1, &expense).await.unwrap();

        let rows = store.rows("Gastos Enero").unwrap();
        assert_eq!(rows[3][0], "21/01/2025");
        assert_eq!(rows[3][1], "Farmacia Central");
        assert_eq!(rows[3][2], "13.00");
        // The neighboring rows are untouched.
        assert_eq!(rows[1][1], "Supermercado");
        assert_eq!(rows[4][1], "Total a Pagar:");
    }

    #[tokio::test]
    async fn test_edit_expense_requires_row_ref() {
        let (mut ledger, _store) = ledger_with(one_tab("Gastos Enero", enero_rows())).await;
        let expense = Expense::new("21/01/2025", "Farmacia", dec("13.00"));
        assert!(matches!(
            ledger.edit_expense(2025, 1, &expense).await,
            Err(Error::MissingRowRef)
        ));
    }

    #[tokio::test]
    async fn test_delete_blanks_but_keeps_the_row() {
        let (mut ledger, store) = ledger_with(one_tab("Gastos Enero", enero_rows())).await;
        let before = store.rows("Gastos Enero").unwrap().len();

        ledger.delete_expense(2025, 1, RowRef::Row(4)).await.unwrap();

        let rows = store.rows("Gastos Enero").unwrap();
        assert_eq!(rows.len(), before);
        assert!(rows[3].iter().take(3).all(|cell| cell.is_empty()));

        // The deleted row never surfaces again.
        let expenses = ledger.expenses(2025, 1).await.unwrap();
        assert_eq!(expenses.len(), 1);
        assert!(expenses.iter().all(|e| e.row != RowRef::Row(4)));
    }

    #[tokio::test]
    async fn test_delete_requires_row_ref() {
        let (mut ledger, _store) = ledger_with(one_tab("Gastos Enero", enero_rows())).await;
        assert!(matches!(
            ledger.delete_expense(2025, 1, RowRef::Unsaved).await,
            Err(Error::MissingRowRef)
        ));
    }

    #[tokio::test]
    async fn test_set_pension_writes_next_to_the_label() {
        let rows = grid(&[
            &["Fecha", "Descripción", "Importe", "Resumen", "Valor"],
            &["", "", "", "Total a Pagar:", "125,42"],
            &["", "", "", "Pensión:", "238,20"],
        ]);
        let (mut ledger, store) = ledger_with(one_tab("Gastos Enero", rows)).await;

        ledger.set_pension(2025, 1, dec("250.00")).await.unwrap();

        let rows = store.rows("Gastos Enero").unwrap();
        assert_eq!(rows[2][4], "250.00");
        assert_eq!(rows[2][3], "Pensión:");
    }

    #[tokio::test]
    async fn test_set_pension_without_label_row_fails() {
        let (mut ledger, _store) = ledger_with(one_tab(
            "Gastos Enero",
            grid(&[&["Fecha", "Descripción", "Importe"]]),
        ))
        .await;
        assert!(matches!(
            ledger.set_pension(2025, 1, dec("250.00")).await,
            Err(Error::PensionCellNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_annual_totals_with_label_and_without() {
        let env = TestEnv::with_years(&[2024, 2025]).await;
        let mut tabs = one_tab(
            "Gastos Anual",
            grid(&[&["Resumen Anual", ""], &["Total Final:", "265,95"]]),
        );
        tabs.insert("Gastos Enero".to_string(), enero_rows());
        let store = TestStore::new(tabs);
        let mut ledger = SheetsLedger::new(env.config(), Box::new(store));

        // Both years read the same in-memory annual tab, so both resolve.
        let totals = ledger.annual_totals().await.unwrap();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].year, 2024);
        assert!(totals.iter().all(|t| t.total == dec("265.95")));

        assert_eq!(ledger.annual_total(2025).await.unwrap(), dec("265.95"));
        assert_eq!(ledger.annual_total(1999).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_annual_totals_missing_label_warns_and_zeroes() {
        let (mut ledger, _store) = ledger_with(one_tab(
            "Gastos Anual",
            grid(&[&["Resumen Anual", ""], &["Otra Cosa:", "10"]]),
        ))
        .await;
        let totals = ledger.annual_totals().await.unwrap();
        assert_eq!(totals.len(), 1);
        assert!(totals[0].total.is_zero());
        assert_eq!(ledger.warnings().len(), 1);
    }

    #[tokio::test]
    async fn test_list_years() {
        let env = TestEnv::with_years(&[2024, 2025, 2023]).await;
        let mut ledger = SheetsLedger::new(env.config(), Box::new(TestStore::default()));
        assert_eq!(ledger.list_years().await.unwrap(), vec![2023, 2024, 2025]);
    }

    #[test]
    fn test_col_letter() {
        assert_eq!(col_letter(0), "A");
        assert_eq!(col_letter(4), "E");
        assert_eq!(col_letter(25), "Z");
        assert_eq!(col_letter(26), "AA");
        assert_eq!(col_letter(27), "AB");
    }
}
