//! Implements the `SheetStore` trait using in-memory data.
//!
//! Note: this is compiled even in the "production" version of this app so
//! that the whole app can be run, top-to-bottom, without using Google
//! Sheets.

use crate::api::SheetStore;
use crate::model::CellValue;
use anyhow::Context;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};

/// An in-memory workbook, keyed by tab name. The spreadsheet id argument is
/// ignored: the test store models one household's sheets as a single
/// workbook. State is shared between clones so a test can hold a handle to
/// the same data a repository is writing through.
#[derive(Debug, Clone)]
pub(crate) struct TestStore {
    tabs: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
}

impl TestStore {
    /// Create a new `TestStore` using `tabs`. The map key is the tab name
    /// and the map value is the rows of the tab.
    pub(crate) fn new(tabs: HashMap<String, Vec<Vec<String>>>) -> Self {
        Self {
            tabs: Arc::new(Mutex::new(tabs)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Vec<String>>>> {
        self.tabs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A snapshot of one tab's raw rows, for assertions.
    #[cfg(test)]
    pub(crate) fn rows(&self, tab: &str) -> Option<Vec<Vec<String>>> {
        self.lock().get(tab).cloned()
    }
}

impl Default for TestStore {
    /// Loads the seed data from this module.
    fn default() -> Self {
        Self::new(seed_data())
    }
}

#[async_trait::async_trait]
impl SheetStore for TestStore {
    async fn read_range(
        &mut self,
        _spreadsheet_id: &str,
        range: &str,
    ) -> anyhow::Result<Vec<Vec<CellValue>>> {
        let (tab, window) = parse_range(range)?;
        let tabs = self.lock();
        let grid = tabs
            .get(tab)
            .with_context(|| format!("Sheet tab '{tab}' not found"))?;
        Ok(window.slice(grid))
    }

    async fn append_row(
        &mut self,
        _spreadsheet_id: &str,
        range: &str,
        values: Vec<String>,
    ) -> anyhow::Result<()> {
        let (tab, window) = parse_range(range)?;
        let mut tabs = self.lock();
        let grid = tabs
            .get_mut(tab)
            .with_context(|| format!("Sheet tab '{tab}' not found"))?;

        // Google's append finds the end of the data region covered by the
        // range and writes into the first free row after it. Cells outside
        // the covered columns (e.g. a summary block to the right) stay put.
        let covered = window.start_col..=window.end_col;
        let last_data_row = grid.iter().rposition(|row| {
            row.iter()
                .enumerate()
                .any(|(ix, cell)| covered.contains(&ix) && !cell.trim().is_empty())
        });
        let target = last_data_row.map(|ix| ix + 1).unwrap_or(window.start_row);
        if target >= grid.len() {
            grid.resize_with(target + 1, Vec::new);
        }
        write_cells(&mut grid[target], window.start_col, values);
        Ok(())
    }

    async fn update_range(
        &mut self,
        _spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> anyhow::Result<()> {
        let (tab, window) = parse_range(range)?;
        let mut tabs = self.lock();
        let grid = tabs
            .get_mut(tab)
            .with_context(|| format!("Sheet tab '{tab}' not found"))?;
        for (row_offset, row_values) in values.into_iter().enumerate() {
            let target = window.start_row + row_offset;
            if target >= grid.len() {
                grid.resize_with(target + 1, Vec::new);
            }
            write_cells(&mut grid[target], window.start_col, row_values);
        }
        Ok(())
    }
}

/// Writes `values` into a row starting at `start_col`, growing the row as
/// needed.
fn write_cells(row: &mut Vec<String>, start_col: usize, values: Vec<String>) {
    if row.len() < start_col + values.len() {
        row.resize(start_col + values.len(), String::new());
    }
    for (offset, value) in values.into_iter().enumerate() {
        row[start_col + offset] = value;
    }
}

/// A parsed A1-notation window. Columns are zero-based and inclusive; a
/// `None` end row means the range is unbounded downwards (e.g. `A:C`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start_col: usize,
    end_col: usize,
    start_row: usize,
    end_row: Option<usize>,
}

impl Window {
    fn slice(&self, grid: &[Vec<String>]) -> Vec<Vec<CellValue>> {
        let end_row = self.end_row.unwrap_or(usize::MAX);
        grid.iter()
            .enumerate()
            .filter(|(ix, _)| *ix >= self.start_row && *ix <= end_row)
            .map(|(_, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(ix, _)| *ix >= self.start_col && *ix <= self.end_col)
                    .map(|(_, cell)| CellValue::from_raw(cell))
                    .collect()
            })
            .collect()
    }
}

/// Splits `Tab!A1:C200` into the tab name and its window. Single cells
/// (`Tab!E3`) and column-only ranges (`Tab!A:C`) are accepted too.
fn parse_range(range: &str) -> anyhow::Result<(&str, Window)> {
    let (tab, cells) = range
        .split_once('!')
        .with_context(|| format!("Range '{range}' is missing a tab name"))?;
    let window = match cells.split_once(':') {
        Some((start, end)) => {
            let (start_col, start_row) = parse_cell(start)?;
            let (end_col, end_row) = parse_cell(end)?;
            Window {
                start_col,
                end_col,
                start_row: start_row.unwrap_or(0),
                end_row,
            }
        }
        None => {
            let (col, row) = parse_cell(cells)?;
            Window {
                start_col: col,
                end_col: col,
                start_row: row.unwrap_or(0),
                end_row: row,
            }
        }
    };
    Ok((tab, window))
}

/// Parses a cell reference like `E3` into a zero-based column index and an
/// optional zero-based row index (`E` alone has no row).
fn parse_cell(cell: &str) -> anyhow::Result<(usize, Option<usize>)> {
    let letters: String = cell
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    anyhow::ensure!(!letters.is_empty(), "Invalid cell reference '{cell}'");

    let mut col = 0usize;
    for ch in letters.chars() {
        col = col * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }

    let digits = &cell[letters.len()..];
    let row = if digits.is_empty() {
        None
    } else {
        let number: usize = digits
            .parse()
            .with_context(|| format!("Invalid row in cell reference '{cell}'"))?;
        anyhow::ensure!(number > 0, "Rows are 1-based in '{cell}'");
        Some(number - 1)
    };
    Ok((col - 1, row))
}

/// Provides the seed data from this module: two month tabs and the annual
/// summary tab of a single example year.
fn seed_data() -> HashMap<String, Vec<Vec<String>>> {
    let mut map = HashMap::new();
    map.insert("Gastos Enero".to_string(), load_csv(ENERO_DATA).unwrap());
    map.insert(
        "Gastos Febrero".to_string(),
        load_csv(FEBRERO_DATA).unwrap(),
    );
    map.insert("Gastos Anual".to_string(), load_csv(ANUAL_DATA).unwrap());
    map
}

/// Loads rows from a CSV-formatted string.
fn load_csv(csv_data: &str) -> anyhow::Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed data for the January tab: expenses in columns A-C, the summary
/// block in columns D-E.
const ENERO_DATA: &str = r##"Fecha,Descripción,Importe,Resumen,Valor
15/01/2025,Supermercado,"43,00",Total:,"55,50"
,,,Total a Pagar:,"27,75"
20/01/2025,Farmacia,"12,50",Pensión:,"238,20"
,,,Total Final:,"265,95"
"##;

/// Seed data for the February tab: header only.
const FEBRERO_DATA: &str = r##"Fecha,Descripción,Importe
"##;

/// Seed data for the annual summary tab.
const ANUAL_DATA: &str = r##"Resumen Anual,
Total Final:,"265,95"
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        assert_eq!(parse_cell("A1").unwrap(), (0, Some(0)));
        assert_eq!(parse_cell("E3").unwrap(), (4, Some(2)));
        assert_eq!(parse_cell("C200").unwrap(), (2, Some(199)));
        assert_eq!(parse_cell("A").unwrap(), (0, None));
        assert_eq!(parse_cell("AA10").unwrap(), (26, Some(9)));
        assert!(parse_cell("3").is_err());
        assert!(parse_cell("A0").is_err());
    }

    #[test]
    fn test_parse_range() {
        let (tab, window) = parse_range("Gastos Enero!A1:C200").unwrap();
        assert_eq!(tab, "Gastos Enero");
        assert_eq!(
            window,
            Window {
                start_col: 0,
                end_col: 2,
                start_row: 0,
                end_row: Some(199),
            }
        );

        let (_, single) = parse_range("Gastos Enero!E3").unwrap();
        assert_eq!(
            single,
            Window {
                start_col: 4,
                end_col: 4,
                start_row: 2,
                end_row: Some(2),
            }
        );

        let (_, columns) = parse_range("Gastos Enero!A:C").unwrap();
        assert_eq!(columns.end_row, None);

        assert!(parse_range("A1:C200").is_err());
    }

    #[tokio::test]
    async fn test_read_range_windows_the_grid() {
        let mut store = TestStore::default();
        let grid = store.read_range("ignored", "Gastos Enero!A1:C200").await.unwrap();
        // Five seeded rows, three columns each at most.
        assert_eq!(grid.len(), 5);
        assert!(grid.iter().all(|row| row.len() <= 3));
        assert_eq!(grid[1][1], CellValue::Text("Supermercado".to_string()));
    }

    #[tokio::test]
    async fn test_append_lands_after_last_data_row() {
        let mut store = TestStore::default();
        store
            .append_row(
                "ignored",
                "Gastos Enero!A:C",
                vec![
                    "25/01/2025".to_string(),
                    "Gasolina".to_string(),
                    "30,00".to_string(),
                ],
            )
            .await
            .unwrap();

        let rows = store.rows("Gastos Enero").unwrap();
        // Last data row in A-C was row 4 (20/01 Farmacia); the append lands
        // on row 5, which held only summary cells in D-E, and keeps them.
        assert_eq!(rows[4][0], "25/01/2025");
        assert_eq!(rows[4][1], "Gasolina");
        assert_eq!(rows[4][3], "Total Final:");
    }

    #[tokio::test]
    async fn test_append_to_empty_region_starts_at_top() {
        let mut store = TestStore::new(HashMap::from([(
            "Vacía".to_string(),
            Vec::new(),
        )]));
        store
            .append_row("ignored", "Vacía!A:C", vec!["a".to_string()])
            .await
            .unwrap();
        assert_eq!(store.rows("Vacía").unwrap()[0][0], "a");
    }

    #[tokio::test]
    async fn test_update_range_overwrites_cells() {
        let mut store = TestStore::default();
        store
            .update_range(
                "ignored",
                "Gastos Enero!A2:C2",
                vec![vec![String::new(), String::new(), String::new()]],
            )
            .await
            .unwrap();
        let rows = store.rows("Gastos Enero").unwrap();
        assert_eq!(rows[1][0], "");
        assert_eq!(rows[1][1], "");
        assert_eq!(rows[1][2], "");
        // The summary cells to the right are untouched.
        assert_eq!(rows[1][3], "Total:");
    }

    #[tokio::test]
    async fn test_unknown_tab_errors() {
        let mut store = TestStore::default();
        assert!(store
            .read_range("ignored", "Gastos Marzo!A1:C200")
            .await
            .is_err());
    }
}
