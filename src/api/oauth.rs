//! OAuth refresh-token handling for the Google Sheets API.
//!
//! The app runs headless against a sheet the user has already authorized, so
//! there is no interactive consent flow here: `credentials.json` in the
//! secrets directory holds the OAuth client id, client secret and a
//! long-lived refresh token, and a short-lived access token is minted from
//! Google's token endpoint whenever the cached one is close to expiry.

use crate::{utils, Result};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Mint a new access token when the cached one has less than this many
/// seconds left.
const EXPIRY_SLACK_SECS: i64 = 60;

/// The stored OAuth client credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct Credentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl Credentials {
    /// Loads the credentials file from the secrets directory.
    pub(super) async fn load(path: &Path) -> Result<Self> {
        let content = utils::read(path).await?;
        Ok(serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credentials at {}", path.display()))?)
    }
}

/// Keeps a valid access token at hand, refreshing it through the token
/// endpoint when needed.
pub(super) struct TokenProvider {
    credentials: Credentials,
    http: reqwest::Client,
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl TokenProvider {
    pub(super) fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            http: reqwest::Client::new(),
            access_token: String::new(),
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Returns a valid access token, refreshing if the cached one is absent,
    /// expired, or about to expire.
    pub(super) async fn token_with_refresh(&mut self) -> Result<&str> {
        let slack = chrono::Duration::seconds(EXPIRY_SLACK_SECS);
        if !self.access_token.is_empty() && Utc::now() + slack < self.expires_at {
            return Ok(&self.access_token);
        }

        debug!("refreshing Google access token");
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .context("Failed to reach the Google token endpoint")?;
        if !response.status().is_success() {
            return Err(
                anyhow::anyhow!("Token refresh failed with status {}", response.status()).into(),
            );
        }
        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse the token endpoint response")?;

        self.access_token = token.access_token;
        self.expires_at = Utc::now() + chrono::Duration::seconds(token.expires_in);
        debug!("access token valid until {}", self.expires_at);
        Ok(&self.access_token)
    }
}
