//! A file-backed key/value cache with per-entry expiry.
//!
//! Each key is one JSON file under the cache directory, so invalidating a
//! key never perturbs its neighbors. Writes land in a temporary file first
//! and are renamed into place, which keeps a concurrent reader from ever
//! observing a half-written entry. The cache is not safe across hosts; it
//! assumes one storage location visible to all request handlers on a node.

use crate::{utils, Result};
use anyhow::Context;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tracing::trace;

/// The serialized form of one cache entry.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// Unix timestamp after which the entry is stale.
    expires_at: i64,
    value: serde_json::Value,
}

/// A TTL cache over a directory of JSON files.
///
/// The directory and TTL are explicit construction-time configuration and
/// the value is injected where it is needed; there is no global cache state.
#[derive(Debug, Clone)]
pub struct TtlCache {
    dir: PathBuf,
    ttl: Duration,
}

impl TtlCache {
    /// Creates the cache directory if it does not exist yet.
    pub async fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Result<Self> {
        let dir = dir.into();
        utils::make_dir(&dir).await?;
        Ok(Self { dir, ttl })
    }

    /// Returns the cached value for `key`, or `None` if the entry is absent,
    /// expired or unreadable. Expired and corrupt entries are dropped on the
    /// way out.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path(key);
        let content = tokio::fs::read_to_string(&path).await.ok()?;
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(_) => {
                // A corrupt entry is as good as a miss.
                let _ = tokio::fs::remove_file(&path).await;
                return None;
            }
        };
        if Utc::now().timestamp() >= entry.expires_at {
            trace!("cache entry '{key}' expired");
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        trace!("cache hit for '{key}'");
        serde_json::from_value(entry.value).ok()
    }

    /// Stores `value` under `key` with a fresh expiry.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry {
            expires_at: Utc::now().timestamp() + self.ttl.as_secs() as i64,
            value: serde_json::to_value(value)
                .with_context(|| format!("Unable to serialize cache value for '{key}'"))?,
        };
        let json = serde_json::to_string(&entry)
            .with_context(|| format!("Unable to serialize cache entry for '{key}'"))?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        utils::write(&tmp, json).await?;
        utils::rename(&tmp, &path).await
    }

    /// Removes the entry for `key`. A no-op if the entry is absent.
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::from(e)
                .context(format!("Unable to invalidate cache key '{key}'"))
                .into()),
        }
    }

    /// Drops every entry in the cache directory.
    pub async fn purge(&self) -> Result<()> {
        let mut dir = utils::read_dir(&self.dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read cache directory entry")?
        {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                utils::remove(&entry.path()).await?;
            }
        }
        Ok(())
    }

    /// Maps a key to its file, replacing anything outside `[A-Za-z0-9_-]`
    /// so keys cannot escape the cache directory.
    fn path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        count: u32,
    }

    fn payload() -> Payload {
        Payload {
            name: "enero".to_string(),
            count: 3,
        }
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::new(dir.path(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.set("expenses_2025_1", &payload()).await.unwrap();
        let got: Option<Payload> = cache.get("expenses_2025_1").await;
        assert_eq!(got, Some(payload()));
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::new(dir.path(), Duration::from_secs(60))
            .await
            .unwrap();
        let got: Option<Payload> = cache.get("nothing_here").await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_dropped() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::new(dir.path(), Duration::ZERO).await.unwrap();

        cache.set("stale", &payload()).await.unwrap();
        let got: Option<Payload> = cache.get("stale").await;
        assert_eq!(got, None);

        // The lazy drop removed the backing file too.
        assert!(!dir.path().join("stale.json").exists());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::new(dir.path(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.set("key", &payload()).await.unwrap();
        cache.invalidate("key").await.unwrap();
        let got: Option<Payload> = cache.get("key").await;
        assert_eq!(got, None);

        // Invalidating an absent key is fine.
        cache.invalidate("key").await.unwrap();
    }

    #[tokio::test]
    async fn test_invalidation_leaves_other_keys_alone() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::new(dir.path(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.set("expenses_2025_3", &payload()).await.unwrap();
        cache.set("expenses_2025_4", &payload()).await.unwrap();
        cache.invalidate("expenses_2025_3").await.unwrap();

        assert_eq!(cache.get::<Payload>("expenses_2025_3").await, None);
        assert_eq!(cache.get::<Payload>("expenses_2025_4").await, Some(payload()));
    }

    #[tokio::test]
    async fn test_purge() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::new(dir.path(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.set("a", &payload()).await.unwrap();
        cache.set("b", &payload()).await.unwrap();
        cache.purge().await.unwrap();

        assert_eq!(cache.get::<Payload>("a").await, None);
        assert_eq!(cache.get::<Payload>("b").await, None);
    }

    #[tokio::test]
    async fn test_keys_are_sanitized() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::new(dir.path(), Duration::from_secs(60))
            .await
            .unwrap();

        cache.set("../escape/attempt", &payload()).await.unwrap();
        let got: Option<Payload> = cache.get("../escape/attempt").await;
        assert_eq!(got, Some(payload()));

        // The entry stayed inside the cache directory.
        assert!(dir.path().join("___escape_attempt.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = TtlCache::new(dir.path(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::fs::write(dir.path().join("bad.json"), "not json at all")
            .await
            .unwrap();
        let got: Option<Payload> = cache.get("bad").await;
        assert_eq!(got, None);
        assert!(!dir.path().join("bad.json").exists());
    }
}
