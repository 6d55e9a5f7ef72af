//! Implements the `SheetStore` trait using the `sheets::Client` to interact
//! with the Google Sheets API.

use crate::api::oauth::{Credentials, TokenProvider};
use crate::api::SheetStore;
use crate::model::CellValue;
use crate::{Config, Result};
use anyhow::Context;
use sheets::types::{
    DateTimeRenderOption, Dimension, InsertDataOption, ValueInputOption, ValueRange,
    ValueRenderOption,
};
use sheets::ClientError;
use std::time::Duration;
use tracing::trace;

/// Implements the `SheetStore` trait against the real Google Sheets API. It
/// holds a `TokenProvider`, on which it calls refresh to keep the access
/// token up-to-date, and bounds every remote call with the configured
/// timeout so an unreachable store can never hang a request.
pub(super) struct GoogleStore {
    token_provider: TokenProvider,
    client: sheets::Client,
    timeout: Duration,
}

impl GoogleStore {
    pub(super) async fn new(config: &Config) -> Result<Self> {
        let credentials = Credentials::load(&config.credentials_path()).await?;
        let mut token_provider = TokenProvider::new(credentials);
        let client = create_sheets_client(&mut token_provider).await?;
        Ok(Self {
            token_provider,
            client,
            timeout: config.request_timeout(),
        })
    }

    /// Rebuilds the sheets client with a fresh access token if needed.
    async fn refresh_client(&mut self) -> Result<()> {
        self.client = create_sheets_client(&mut self.token_provider).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SheetStore for GoogleStore {
    async fn read_range(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
    ) -> anyhow::Result<Vec<Vec<CellValue>>> {
        trace!("read_range {range}");
        self.refresh_client().await?;
        let spreadsheets = self.client.spreadsheets();
        let call = spreadsheets.values_get(
            spreadsheet_id,
            range,
            DateTimeRenderOption::FormattedString,
            Dimension::Rows,
            ValueRenderOption::FormattedValue,
        );
        let response = tokio::time::timeout(self.timeout, call)
            .await
            .context("Timed out reading from the Google Sheets API")?
            .map_err(map_client_error)
            .with_context(|| format!("Failed to fetch range {range}"))?;
        Ok(response
            .body
            .values
            .into_iter()
            .map(|row| row.iter().map(|cell| CellValue::from_raw(cell)).collect())
            .collect())
    }

    async fn append_row(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<String>,
    ) -> anyhow::Result<()> {
        trace!("append_row {range}");
        self.refresh_client().await?;
        let body = ValueRange {
            major_dimension: Some(Dimension::Rows),
            range: range.to_string(),
            values: vec![values],
        };
        let spreadsheets = self.client.spreadsheets();
        let call = spreadsheets.values_append(
            spreadsheet_id,
            range,
            false,
            InsertDataOption::InsertRows,
            DateTimeRenderOption::FormattedString,
            ValueRenderOption::FormattedValue,
            ValueInputOption::UserEntered,
            &body,
        );
        tokio::time::timeout(self.timeout, call)
            .await
            .context("Timed out writing to the Google Sheets API")?
            .map_err(map_client_error)
            .with_context(|| format!("Failed to append to range {range}"))?;
        Ok(())
    }

    async fn update_range(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> anyhow::Result<()> {
        trace!("update_range {range}");
        self.refresh_client().await?;
        let body = ValueRange {
            major_dimension: Some(Dimension::Rows),
            range: range.to_string(),
            values,
        };
        let spreadsheets = self.client.spreadsheets();
        let call = spreadsheets.values_update(
            spreadsheet_id,
            range,
            false,
            DateTimeRenderOption::FormattedString,
            ValueRenderOption::FormattedValue,
            ValueInputOption::UserEntered,
            &body,
        );
        tokio::time::timeout(self.timeout, call)
            .await
            .context("Timed out writing to the Google Sheets API")?
            .map_err(map_client_error)
            .with_context(|| format!("Failed to update range {range}"))?;
        Ok(())
    }
}

/// Creates a sheets client carrying a fresh access token. Only the access
/// token matters for API calls; the id/secret/redirect slots are for OAuth
/// flows the sheets crate is not driving here.
async fn create_sheets_client(token_provider: &mut TokenProvider) -> Result<sheets::Client> {
    let access_token = token_provider.token_with_refresh().await?.to_string();
    Ok(sheets::Client::new(
        String::new(),
        String::new(),
        String::new(),
        access_token,
        String::new(),
    ))
}

fn map_client_error(e: ClientError) -> anyhow::Error {
    anyhow::anyhow!("Google Sheets client error: {e}")
}
