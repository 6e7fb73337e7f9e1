use tracing::info;

use super::core::Database;
use crate::news::{Article, Bookmark};
use crate::TARGET_DB;

pub const BOOKMARKS_KEY: &str = "bookmarkedNews";

impl Database {
    /// Bookmarked articles in the order they were added.
    pub async fn get_bookmarks(&self) -> Result<Vec<Bookmark>, sqlx::Error> {
        Ok(self
            .get_json::<Vec<Bookmark>>(BOOKMARKS_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn is_bookmarked(&self, link: &str) -> Result<bool, sqlx::Error> {
        Ok(self
            .get_bookmarks()
            .await?
            .iter()
            .any(|b| b.article.link == link))
    }

    /// Bookmarks the article, or removes it if its link is already bookmarked.
    /// Returns whether the article is bookmarked afterwards.
    pub async fn toggle_bookmark(
        &self,
        article: &Article,
        bookmarked_at: i64,
    ) -> Result<bool, sqlx::Error> {
        let mut bookmarks = self.get_bookmarks().await?;
        let before = bookmarks.len();
        bookmarks.retain(|b| b.article.link != article.link);

        let now_bookmarked = bookmarks.len() == before;
        if now_bookmarked {
            bookmarks.push(Bookmark {
                article: article.clone(),
                bookmarked_at,
            });
        }

        self.set_json(BOOKMARKS_KEY, &bookmarks).await?;
        info!(
            target: TARGET_DB,
            "{} bookmark for {}",
            if now_bookmarked { "Added" } else { "Removed" },
            article.link
        );
        Ok(now_bookmarked)
    }

    /// Removes every bookmark with this link. Returns true if any was removed.
    pub async fn remove_bookmark(&self, link: &str) -> Result<bool, sqlx::Error> {
        let mut bookmarks = self.get_bookmarks().await?;
        let before = bookmarks.len();
        bookmarks.retain(|b| b.article.link != link);
        if bookmarks.len() == before {
            return Ok(false);
        }
        self.set_json(BOOKMARKS_KEY, &bookmarks).await?;
        Ok(true)
    }
}
