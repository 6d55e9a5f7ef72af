//! Configuration file handling.
//!
//! The configuration file is stored at `$GASTOS_HOME/config.json` and maps
//! each year to its spreadsheet, each month to its tab name, and carries the
//! annual-summary search settings, the boundary keyword list, the cache TTL
//! and the remote request timeout.

use crate::error::Error;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "gastos";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CACHE: &str = ".cache";
const CREDENTIALS_JSON: &str = "credentials.json";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You
/// instantiate it by providing the path to `$GASTOS_HOME` and from there it
/// loads `$GASTOS_HOME/config.json`. Spreadsheet IDs are extracted from the
/// configured sheet URLs up front so every later lookup is infallible string
/// access.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    cache_dir: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_ids: BTreeMap<i32, String>,
}

impl Config {
    /// Creates the data directory and its subdirectories, moves the
    /// credentials file into the secrets directory, and writes an initial
    /// `config.json` mapping each year to its spreadsheet URL.
    ///
    /// # Errors
    /// Returns an error if any file operation fails or if a spreadsheet URL
    /// has no extractable ID.
    pub async fn create(
        dir: impl Into<PathBuf>,
        credentials_file: &Path,
        spreadsheets: BTreeMap<i32, String>,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the gastos home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let cache_dir = root.join(CACHE);
        utils::make_dir(&cache_dir).await?;
        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        // Move the credentials file to its default location in the data dir.
        let credentials_destination = secrets.join(CREDENTIALS_JSON);
        utils::rename(credentials_file, credentials_destination).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            spreadsheets,
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        let spreadsheet_ids = extract_spreadsheet_ids(&config_file.spreadsheets)?;

        Ok(Self {
            root,
            cache_dir,
            secrets,
            config_path,
            config_file,
            spreadsheet_ids,
        })
    }

    /// Validates that `$GASTOS_HOME` and its expected contents exist, loads
    /// the config file and returns the ready-to-use configuration object.
    pub async fn load(gastos_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = gastos_home.into();
        let root = utils::canonicalize(&maybe_relative).await?;

        // Validate that the home directory exists.
        let _ = utils::read_dir(&root)
            .await
            .context("Gastos home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            return Err(
                anyhow::anyhow!("The config file is missing '{}'", config_path.display()).into(),
            );
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let spreadsheet_ids = extract_spreadsheet_ids(&config_file.spreadsheets)?;

        let config = Self {
            cache_dir: root.join(CACHE),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            spreadsheet_ids,
            root,
        };
        if !config.cache_dir.is_dir() {
            return Err(anyhow::anyhow!(
                "The cache directory is missing '{}'",
                config.cache_dir.display()
            )
            .into());
        }
        if !config.secrets.is_dir() {
            return Err(anyhow::anyhow!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
            .into());
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// Returns the stored `credentials_path` if it is absolute, otherwise
    /// resolves it relative to the home directory.
    pub fn credentials_path(&self) -> PathBuf {
        let p = self.config_file.credentials_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Years with a configured spreadsheet, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.spreadsheet_ids.keys().copied().collect()
    }

    /// The spreadsheet ID for a year.
    pub fn spreadsheet_id(&self, year: i32) -> Result<&str> {
        self.spreadsheet_ids
            .get(&year)
            .map(String::as_str)
            .ok_or(Error::InvalidYear(year))
    }

    /// The tab name for a month (1-12).
    pub fn month_tab(&self, month: u32) -> Result<&str> {
        self.config_file
            .months
            .get(&month)
            .map(String::as_str)
            .ok_or(Error::InvalidMonth(month))
    }

    /// The short display name for a month; falls back to the number.
    pub fn month_label(&self, month: u32) -> String {
        self.config_file
            .month_labels
            .get(&month)
            .cloned()
            .unwrap_or_else(|| month.to_string())
    }

    pub fn annual_sheet(&self) -> &str {
        &self.config_file.annual_sheet
    }

    pub fn annual_search_range(&self) -> &str {
        &self.config_file.annual_search_range
    }

    pub fn annual_search_label(&self) -> &str {
        &self.config_file.annual_search_label
    }

    pub fn boundary_keywords(&self) -> &[String] {
        &self.config_file.boundary_keywords
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config_file.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config_file.request_timeout_secs)
    }
}

/// Represents the serialization and deserialization format of the
/// configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "gastos",
///   "config_version": 1,
///   "spreadsheets": {
///     "2025": "https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX"
///   },
///   "annual_sheet": "Gastos Anual",
///   "cache_ttl_secs": 300
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "gastos".
    app_name: String,

    /// Configuration file version.
    config_version: u8,

    /// Year -> URL of that year's Google sheet.
    spreadsheets: BTreeMap<i32, String>,

    /// Month number -> tab name inside each yearly sheet.
    #[serde(default = "default_months")]
    months: BTreeMap<u32, String>,

    /// Month number -> short display name for report rows.
    #[serde(default = "default_month_labels")]
    month_labels: BTreeMap<u32, String>,

    /// Tab holding each year's grand total.
    #[serde(default = "default_annual_sheet")]
    annual_sheet: String,

    /// Cell window searched for the annual total label.
    #[serde(default = "default_annual_search_range")]
    annual_search_range: String,

    /// Label whose right-hand neighbor holds the annual total.
    #[serde(default = "default_annual_search_label")]
    annual_search_label: String,

    /// Labels that mark the end of a tab's transaction region.
    #[serde(default = "default_boundary_keywords")]
    boundary_keywords: Vec<String>,

    /// How long cached reads stay fresh.
    #[serde(default = "default_cache_ttl_secs")]
    cache_ttl_secs: u64,

    /// Upper bound for a single remote call.
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,

    /// Path to the OAuth credentials file (optional, relative to the home
    /// directory or absolute). Defaults to `.secrets/credentials.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    credentials_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            spreadsheets: BTreeMap::new(),
            months: default_months(),
            month_labels: default_month_labels(),
            annual_sheet: default_annual_sheet(),
            annual_search_range: default_annual_search_range(),
            annual_search_label: default_annual_search_label(),
            boundary_keywords: default_boundary_keywords(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            credentials_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if its
    /// `app_name` is not ours.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;
        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
        if config.app_name != APP_NAME {
            return Err(anyhow::anyhow!(
                "Invalid app_name in config file: expected '{}', got '{}'",
                APP_NAME,
                config.app_name
            )
            .into());
        }
        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
            .map_err(Into::into)
    }

    /// Gets the credentials path, defaulting to
    /// `.secrets/credentials.json` relative to the home directory.
    fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CREDENTIALS_JSON))
    }
}

fn default_months() -> BTreeMap<u32, String> {
    [
        "Gastos Enero",
        "Gastos Febrero",
        "Gastos Marzo",
        "Gastos Abril",
        "Gastos Mayo",
        "Gastos Junio",
        "Gastos Julio",
        "Gastos Agosto",
        "Gastos Septiembre",
        "Gastos Octubre",
        "Gastos Noviembre",
        "Gastos Diciembre",
    ]
    .iter()
    .enumerate()
    .map(|(ix, name)| (ix as u32 + 1, name.to_string()))
    .collect()
}

fn default_month_labels() -> BTreeMap<u32, String> {
    [
        "Enero",
        "Febrero",
        "Marzo",
        "Abril",
        "Mayo",
        "Junio",
        "Julio",
        "Agosto",
        "Septiembre",
        "Octubre",
        "Noviembre",
        "Diciembre",
    ]
    .iter()
    .enumerate()
    .map(|(ix, name)| (ix as u32 + 1, name.to_string()))
    .collect()
}

fn default_annual_sheet() -> String {
    "Gastos Anual".to_string()
}

fn default_annual_search_range() -> String {
    "A1:Z200".to_string()
}

fn default_annual_search_label() -> String {
    "Total Final:".to_string()
}

fn default_boundary_keywords() -> Vec<String> {
    ["total", "total/", "total a pagar", "pensión", "pension", "total final"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Extracts the spreadsheet ID from every configured sheet URL.
fn extract_spreadsheet_ids(spreadsheets: &BTreeMap<i32, String>) -> Result<BTreeMap<i32, String>> {
    let mut ids = BTreeMap::new();
    for (year, url) in spreadsheets {
        let id = extract_spreadsheet_id(url)
            .with_context(|| format!("Bad spreadsheet URL configured for year {year}"))?;
        ids.insert(*year, id.to_string());
    }
    Ok(ids)
}

/// Extracts the spreadsheet ID from a Google Sheets URL such as
/// `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/edit`, dropping
/// any query parameters or fragments after the ID.
fn extract_spreadsheet_id(url: &str) -> anyhow::Result<&str> {
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split('?')
                .next()
                .unwrap_or(id_part)
                .split('#')
                .next()
                .unwrap_or(id_part);
            return Ok(id);
        }
    }
    bail!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}
