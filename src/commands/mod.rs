//! Command handlers for the gastos CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod expense;
mod init;
mod report;

pub use expense::{add, delete, edit, pension};
pub use init::init;
pub use report::{annual, cache_clear, expenses, months, summary, years};

use crate::api::{self, Mode};
use crate::repo::{CachedLedger, SheetsLedger};
use crate::{Config, Result, TtlCache};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

/// Builds the repository every command talks to: the direct spreadsheet
/// ledger wrapped in the file-backed TTL cache.
async fn ledger(config: &Config, mode: Mode) -> Result<CachedLedger<SheetsLedger>> {
    let store = api::new_store(config, mode).await?;
    let cache = TtlCache::new(config.cache_dir(), config.cache_ttl()).await?;
    Ok(CachedLedger::new(
        SheetsLedger::new(config.clone(), store),
        cache,
    ))
}

/// Appends repository warnings under a command's message so the caller sees
/// "data may be incomplete" without the request failing.
fn with_warnings(message: String, warnings: &[String]) -> String {
    if warnings.is_empty() {
        return message;
    }
    let mut out = message;
    out.push_str("\n\nData may be incomplete:");
    for warning in warnings {
        out.push_str("\n  - ");
        out.push_str(warning);
    }
    out
}

/// The output type for a command. This allows the command to return a
/// consistent message and, optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of
    /// the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists)
    /// as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_warnings_empty() {
        assert_eq!(with_warnings("ok".to_string(), &[]), "ok");
    }

    #[test]
    fn test_with_warnings_appends() {
        let out = with_warnings("ok".to_string(), &["one".to_string(), "two".to_string()]);
        assert!(out.starts_with("ok\n\nData may be incomplete:"));
        assert!(out.contains("\n  - one"));
        assert!(out.contains("\n  - two"));
    }
}
