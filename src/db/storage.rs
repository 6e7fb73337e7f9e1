//! Key/value access to the `local_storage` table.
//!
//! Writes are plain upserts, so the last write for a key wins.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    pub async fn get_item(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT value FROM local_storage WHERE key = ?1")
            .bind(key)
            .fetch_optional(self.pool())
            .await
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        debug!(target: TARGET_DB, "set_item {} ({} bytes)", key, value.len());
        sqlx::query(
            r#"
            INSERT INTO local_storage (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Returns true if the key existed.
    pub async fn remove_item(&self, key: &str) -> Result<bool, sqlx::Error> {
        let rows_affected = sqlx::query("DELETE FROM local_storage WHERE key = ?1")
            .bind(key)
            .execute(self.pool())
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }

    /// Keys starting with `prefix`, in key order.
    pub async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, sqlx::Error> {
        // substr rather than LIKE: keys contain '_' which LIKE treats as a wildcard.
        sqlx::query_scalar::<_, String>(
            "SELECT key FROM local_storage WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(self.pool())
        .await
    }

    /// Deletes every key starting with `prefix`, returning how many were removed.
    pub async fn remove_prefix(&self, prefix: &str) -> Result<u64, sqlx::Error> {
        let rows_affected =
            sqlx::query("DELETE FROM local_storage WHERE substr(key, 1, length(?1)) = ?1")
                .bind(prefix)
                .execute(self.pool())
                .await?
                .rows_affected();
        Ok(rows_affected)
    }

    /// Reads a JSON value. Values that no longer decode are logged and treated as absent.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, sqlx::Error> {
        let Some(raw) = self.get_item(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(target: TARGET_DB, "Ignoring malformed value for key {}: {}", key, e);
                Ok(None)
            }
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), sqlx::Error> {
        let raw = serde_json::to_string(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        self.set_item(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let db = Database::in_memory().await.unwrap();
        assert_eq!(db.get_item("learningPoints").await.unwrap(), None);

        db.set_item("learningPoints", "10").await.unwrap();
        db.set_item("learningPoints", "25").await.unwrap();
        assert_eq!(
            db.get_item("learningPoints").await.unwrap().as_deref(),
            Some("25")
        );

        assert!(db.remove_item("learningPoints").await.unwrap());
        assert!(!db.remove_item("learningPoints").await.unwrap());
    }

    #[tokio::test]
    async fn test_prefix_does_not_treat_underscore_as_wildcard() {
        let db = Database::in_memory().await.unwrap();
        db.set_item("news__all_latest_1", "[]").await.unwrap();
        db.set_item("news__all_latest_1_time", "1").await.unwrap();
        db.set_item("newsXletter", "x").await.unwrap();

        let keys = db.keys_with_prefix("news_").await.unwrap();
        assert_eq!(keys, vec!["news__all_latest_1", "news__all_latest_1_time"]);

        assert_eq!(db.remove_prefix("news_").await.unwrap(), 2);
        assert_eq!(db.get_item("newsXletter").await.unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_malformed_json_reads_as_absent() {
        let db = Database::in_memory().await.unwrap();
        db.set_item("readTopics", "not json").await.unwrap();
        let topics: Option<Vec<String>> = db.get_json("readTopics").await.unwrap();
        assert!(topics.is_none());

        db.set_json("readTopics", &vec!["emi".to_string()]).await.unwrap();
        let topics: Option<Vec<String>> = db.get_json("readTopics").await.unwrap();
        assert_eq!(topics, Some(vec!["emi".to_string()]));
    }
}
