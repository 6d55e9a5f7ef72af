//! The `init` command: creates the data directory and the configuration.

use crate::commands::Out;
use crate::{Config, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Creates `$GASTOS_HOME` with its cache and secrets subdirectories, moves
/// the credentials file into place, and writes an initial `config.json`
/// mapping each year to its spreadsheet URL.
pub async fn init(
    home: &Path,
    credentials: &Path,
    spreadsheets: BTreeMap<i32, String>,
) -> Result<Out<()>> {
    let config = Config::create(home, credentials, spreadsheets).await?;
    Ok(Out::new_message(format!(
        "Initialized gastos home at {}",
        config.root().display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_home() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let credentials = dir.path().join("creds.json");
        std::fs::write(&credentials, "{}").unwrap();

        let spreadsheets = BTreeMap::from([(
            2025,
            "https://docs.google.com/spreadsheets/d/Example/edit".to_string(),
        )]);
        let out = init(&home, &credentials, spreadsheets).await.unwrap();
        assert!(out.message().contains("Initialized gastos home"));

        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.spreadsheet_id(2025).unwrap(), "Example");
    }
}
