//! Graph search response cache.
//!
//! Search responses are stored as JSON keyed by a hash of the normalized
//! request, each with its own expiry.

use std::time::Duration;

use super::connection::CacheDb;
use crate::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::OptionalExtension;

/// Fixed-width RFC 3339 so stored timestamps compare lexically.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl CacheDb {
    /// Get a cached search response that has not yet expired.
    pub async fn get_fresh_search(&self, key_hash: &str) -> Result<Option<String>, Error> {
        let key_hash = key_hash.to_string();
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let json = conn
                    .query_row(
                        "SELECT response_json FROM search_cache WHERE key_hash = ?1 AND expires_at > ?2",
                        params![key_hash, now],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(json)
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a cached search response.
    pub async fn put_search(
        &self, key_hash: &str, query_json: &str, response_json: &str, ttl: Duration,
    ) -> Result<(), Error> {
        let key_hash = key_hash.to_string();
        let query_json = query_json.to_string();
        let response_json = response_json.to_string();

        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let fetched_at = timestamp(now);
        let expires_at = timestamp(now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC));

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO search_cache (key_hash, query_json, response_json, fetched_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(key_hash) DO UPDATE SET
                        query_json = excluded.query_json,
                        response_json = excluded.response_json,
                        fetched_at = excluded.fetched_at,
                        expires_at = excluded.expires_at",
                    params![key_hash, query_json, response_json, fetched_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired search responses, returning how many were removed.
    pub async fn purge_expired_search(&self) -> Result<u64, Error> {
        let now = timestamp(Utc::now());
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM search_cache WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{"value":[{"hitsContainers":[]}]}"#;

    #[tokio::test]
    async fn test_put_and_get_search() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_search("k1", r#""budget""#, RESPONSE, Duration::from_secs(3600))
            .await
            .unwrap();

        let cached = db.get_fresh_search("k1").await.unwrap();
        assert_eq!(cached.as_deref(), Some(RESPONSE));
    }

    #[tokio::test]
    async fn test_get_missing_search() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get_fresh_search("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_returned() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_search("k1", "{}", RESPONSE, Duration::ZERO).await.unwrap();

        assert!(db.get_fresh_search("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired_search() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_search("expired", "{}", "{}", Duration::ZERO).await.unwrap();
        db.put_search("fresh", "{}", "{}", Duration::from_secs(3600)).await.unwrap();

        let deleted = db.purge_expired_search().await.unwrap();
        assert_eq!(deleted, 1);
        assert!(db.get_fresh_search("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_replaces_response() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let ttl = Duration::from_secs(3600);
        db.put_search("k1", "{}", r#"{"old":1}"#, ttl).await.unwrap();
        db.put_search("k1", "{}", r#"{"new":2}"#, ttl).await.unwrap();

        let cached = db.get_fresh_search("k1").await.unwrap();
        assert_eq!(cached.as_deref(), Some(r#"{"new":2}"#));
    }
}
