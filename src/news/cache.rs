//! Time-windowed cache of news pages in the local store.
//!
//! A page is stored under its `news_…` key with the write time under the same
//! key suffixed `_time`. Entries older than the TTL are ignored, not deleted;
//! the next successful fetch overwrites them.

use tracing::debug;

use super::types::{NewsPage, NewsQuery};
use crate::clock::Clock;
use crate::db::Database;
use crate::TARGET_DB;

pub const CACHE_TTL_MS: i64 = 30 * 60 * 1000;
pub const CACHE_KEY_PREFIX: &str = "news_";

pub struct NewsCache<C: Clock> {
    db: Database,
    clock: C,
    ttl_ms: i64,
}

impl<C: Clock> NewsCache<C> {
    pub fn new(db: Database, clock: C) -> Self {
        Self {
            db,
            clock,
            ttl_ms: CACHE_TTL_MS,
        }
    }

    fn time_key(key: &str) -> String {
        format!("{}_time", key)
    }

    /// The cached page for `query` if it was stored less than the TTL ago.
    pub async fn get(&self, query: &NewsQuery) -> Result<Option<NewsPage>, sqlx::Error> {
        let key = query.cache_key();
        let stored_at = self
            .db
            .get_item(&Self::time_key(&key))
            .await?
            .and_then(|t| t.parse::<i64>().ok());

        let Some(stored_at) = stored_at else {
            return Ok(None);
        };

        let age = self.clock.now_millis() - stored_at;
        if age >= self.ttl_ms {
            debug!(target: TARGET_DB, "Cache entry {} expired ({} ms old)", key, age);
            return Ok(None);
        }

        let page = self.db.get_json::<NewsPage>(&key).await?;
        if page.is_some() {
            debug!(target: TARGET_DB, "Cache hit for {} ({} ms old)", key, age);
        }
        Ok(page)
    }

    pub async fn put(&self, query: &NewsQuery, page: &NewsPage) -> Result<(), sqlx::Error> {
        let key = query.cache_key();
        self.db.set_json(&key, page).await?;
        self.db
            .set_item(&Self::time_key(&key), &self.clock.now_millis().to_string())
            .await
    }

    /// Drops every cached page.
    pub async fn clear(&self) -> Result<u64, sqlx::Error> {
        self.db.remove_prefix(CACHE_KEY_PREFIX).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::news::types::{Article, Pagination};

    fn page() -> NewsPage {
        NewsPage {
            articles: vec![Article {
                title: "Gold hits record".to_string(),
                link: "https://example.com/gold".to_string(),
                ..Article::default()
            }],
            pagination: Pagination::single_page(1, 10, 1),
        }
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let db = Database::in_memory().await.unwrap();
        let clock = ManualClock::new(1_000_000);
        let cache = NewsCache::new(db, clock.clone());
        let query = NewsQuery::new(10);

        assert_eq!(cache.get(&query).await.unwrap(), None);
        cache.put(&query, &page()).await.unwrap();

        clock.advance_mins(29);
        assert_eq!(cache.get(&query).await.unwrap(), Some(page()));

        clock.advance_mins(1);
        assert_eq!(cache.get(&query).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_removes_pages_and_timestamps() {
        let db = Database::in_memory().await.unwrap();
        let cache = NewsCache::new(db.clone(), ManualClock::new(0));
        cache.put(&NewsQuery::new(10), &page()).await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(db.keys_with_prefix("news_").await.unwrap().is_empty());
    }
}
