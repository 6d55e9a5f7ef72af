//! Remote tabular store access: the `SheetStore` trait and its Google-backed
//! and in-memory implementations.

mod oauth;
mod sheets_client;
mod test_client;

use crate::model::CellValue;
use crate::{Config, Result};
use serde::{Deserialize, Serialize};

pub(crate) use test_client::TestStore;

/// Environment variable that switches the whole app to the in-memory store.
const TEST_MODE_ENV: &str = "GASTOS_LEDGER_IN_TEST_MODE";

/// Which backing store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// The real Google Sheets API.
    #[default]
    Google,
    /// The in-memory store, for running without Google access.
    Test,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

impl Mode {
    /// When `GASTOS_LEDGER_IN_TEST_MODE` is set and non-zero in length the
    /// in-memory store is used, which allows exercising the program
    /// top-to-bottom without touching the Google APIs.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// The remote tabular store contract consumed by the ledger repository.
///
/// Ranges use A1 notation with a tab prefix, e.g. `Gastos Enero!A1:C200`.
#[async_trait::async_trait]
pub trait SheetStore: Send {
    /// Reads a range from the given spreadsheet as classified cells. Rows
    /// and trailing cells the sheet leaves empty may be omitted.
    async fn read_range(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
    ) -> anyhow::Result<Vec<Vec<CellValue>>>;

    /// Appends one row after the end of the data region covered by `range`.
    async fn append_row(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<String>,
    ) -> anyhow::Result<()>;

    /// Overwrites exactly the cells of `range` with `values`.
    async fn update_range(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> anyhow::Result<()>;
}

/// Creates the store selected by `mode`.
pub async fn new_store(config: &Config, mode: Mode) -> Result<Box<dyn SheetStore + Send>> {
    match mode {
        Mode::Google => Ok(Box::new(sheets_client::GoogleStore::new(config).await?)),
        Mode::Test => Ok(Box::new(TestStore::default())),
    }
}
