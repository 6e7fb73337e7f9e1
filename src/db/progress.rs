//! Learning progress kept in the local store.
//!
//! Each pillar's percentage lives under `pillar_progress_{id}` and is mirrored
//! into the `pillarProgress` map read by the progress bar.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::core::Database;
use crate::TARGET_DB;

pub const PILLAR_PROGRESS_PREFIX: &str = "pillar_progress_";
pub const PILLAR_PROGRESS_KEY: &str = "pillarProgress";
pub const LEARNING_POINTS_KEY: &str = "learningPoints";
pub const PILLAR_ACTIVITY_KEY: &str = "pillarActivity";
pub const BOOKMARKED_TOPICS_KEY: &str = "bookmarkedTopics";
pub const READ_TOPICS_KEY: &str = "readTopics";

/// Seconds on a pillar page worth one percent of progress.
pub const SECONDS_PER_PERCENT: u64 = 30;
/// Most progress a single visit can add.
pub const MAX_VISIT_GAIN: u8 = 10;
/// Learning points worth one percent of pillar progress.
pub const POINTS_PER_PERCENT: u64 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarActivity {
    #[serde(default)]
    pub visits: u32,
    #[serde(default)]
    pub seconds_spent: u64,
    #[serde(default)]
    pub last_visit: i64,
}

fn clamp_percent(value: u64) -> u8 {
    value.min(100) as u8
}

impl Database {
    pub async fn pillar_progress(&self, pillar: &str) -> Result<u8, sqlx::Error> {
        let key = format!("{}{}", PILLAR_PROGRESS_PREFIX, pillar);
        Ok(self
            .get_item(&key)
            .await?
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(clamp_percent)
            .unwrap_or(0))
    }

    /// Every pillar with recorded progress, from the `pillarProgress` map.
    pub async fn all_pillar_progress(&self) -> Result<BTreeMap<String, u8>, sqlx::Error> {
        Ok(self
            .get_json::<BTreeMap<String, u8>>(PILLAR_PROGRESS_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Stores a pillar's percentage, clamped to 100, in both locations.
    pub async fn set_pillar_progress(&self, pillar: &str, percent: u64) -> Result<u8, sqlx::Error> {
        let percent = clamp_percent(percent);
        let key = format!("{}{}", PILLAR_PROGRESS_PREFIX, pillar);
        self.set_item(&key, &percent.to_string()).await?;

        let mut all = self.all_pillar_progress().await?;
        all.insert(pillar.to_string(), percent);
        self.set_json(PILLAR_PROGRESS_KEY, &all).await?;

        debug!(target: TARGET_DB, "Pillar {} progress now {}%", pillar, percent);
        Ok(percent)
    }

    /// Average progress across `pillars`; pillars never visited count as 0.
    pub async fn overall_progress(&self, pillars: &[&str]) -> Result<u8, sqlx::Error> {
        if pillars.is_empty() {
            return Ok(0);
        }
        let mut total: u64 = 0;
        for pillar in pillars {
            total += self.pillar_progress(pillar).await? as u64;
        }
        Ok((total / pillars.len() as u64) as u8)
    }

    pub async fn pillar_activity(&self) -> Result<BTreeMap<String, PillarActivity>, sqlx::Error> {
        Ok(self
            .get_json::<BTreeMap<String, PillarActivity>>(PILLAR_ACTIVITY_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Records time spent on a pillar page and converts it into progress:
    /// one percent per 30 seconds, at most 10 percent per visit.
    pub async fn record_visit(
        &self,
        pillar: &str,
        seconds: u64,
        now_ms: i64,
    ) -> Result<u8, sqlx::Error> {
        let mut activity = self.pillar_activity().await?;
        let entry = activity.entry(pillar.to_string()).or_default();
        entry.visits += 1;
        entry.seconds_spent += seconds;
        entry.last_visit = now_ms;
        self.set_json(PILLAR_ACTIVITY_KEY, &activity).await?;

        let gain = (seconds / SECONDS_PER_PERCENT).min(MAX_VISIT_GAIN as u64);
        let current = self.pillar_progress(pillar).await? as u64;
        self.set_pillar_progress(pillar, current + gain).await
    }

    pub async fn learning_points(&self) -> Result<u64, sqlx::Error> {
        Ok(self
            .get_item(LEARNING_POINTS_KEY)
            .await?
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0))
    }

    /// Adds points (quiz answers, calculator use) to the running total and to
    /// the pillar's progress. Returns the new total and pillar percentage.
    pub async fn award_points(&self, pillar: &str, points: u64) -> Result<(u64, u8), sqlx::Error> {
        let total = self.learning_points().await? + points;
        self.set_item(LEARNING_POINTS_KEY, &total.to_string()).await?;

        let current = self.pillar_progress(pillar).await? as u64;
        let percent = self
            .set_pillar_progress(pillar, current + points / POINTS_PER_PERCENT)
            .await?;
        Ok((total, percent))
    }

    async fn topic_list(&self, key: &str) -> Result<Vec<String>, sqlx::Error> {
        Ok(self.get_json::<Vec<String>>(key).await?.unwrap_or_default())
    }

    pub async fn read_topics(&self) -> Result<Vec<String>, sqlx::Error> {
        self.topic_list(READ_TOPICS_KEY).await
    }

    /// Returns true if the topic was not already marked as read.
    pub async fn mark_topic_read(&self, topic: &str) -> Result<bool, sqlx::Error> {
        let mut topics = self.read_topics().await?;
        if topics.iter().any(|t| t == topic) {
            return Ok(false);
        }
        topics.push(topic.to_string());
        self.set_json(READ_TOPICS_KEY, &topics).await?;
        Ok(true)
    }

    pub async fn bookmarked_topics(&self) -> Result<Vec<String>, sqlx::Error> {
        self.topic_list(BOOKMARKED_TOPICS_KEY).await
    }

    /// Returns whether the topic is bookmarked afterwards.
    pub async fn toggle_topic_bookmark(&self, topic: &str) -> Result<bool, sqlx::Error> {
        let mut topics = self.bookmarked_topics().await?;
        let before = topics.len();
        topics.retain(|t| t != topic);
        let now_bookmarked = topics.len() == before;
        if now_bookmarked {
            topics.push(topic.to_string());
        }
        self.set_json(BOOKMARKED_TOPICS_KEY, &topics).await?;
        Ok(now_bookmarked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_visit_heuristic_and_clamp() {
        let db = Database::in_memory().await.unwrap();
        assert_eq!(db.record_visit("saving", 95, 1_000).await.unwrap(), 3);
        // Long visits are capped per visit.
        assert_eq!(db.record_visit("saving", 3_600, 2_000).await.unwrap(), 13);

        let activity = db.pillar_activity().await.unwrap();
        assert_eq!(
            activity.get("saving"),
            Some(&PillarActivity {
                visits: 2,
                seconds_spent: 3_695,
                last_visit: 2_000,
            })
        );

        db.set_pillar_progress("saving", 98).await.unwrap();
        assert_eq!(db.record_visit("saving", 300, 3_000).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_progress_mirrored_into_map() {
        let db = Database::in_memory().await.unwrap();
        db.set_pillar_progress("loans", 40).await.unwrap();
        db.set_pillar_progress("taxes", 250).await.unwrap();

        assert_eq!(db.get_item("pillar_progress_taxes").await.unwrap().as_deref(), Some("100"));
        let all = db.all_pillar_progress().await.unwrap();
        assert_eq!(all.get("loans"), Some(&40));
        assert_eq!(all.get("taxes"), Some(&100));

        assert_eq!(db.overall_progress(&["loans", "taxes", "saving"]).await.unwrap(), 46);
        assert_eq!(db.overall_progress(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_award_points() {
        let db = Database::in_memory().await.unwrap();
        assert_eq!(db.award_points("investing", 10).await.unwrap(), (10, 2));
        assert_eq!(db.award_points("investing", 25).await.unwrap(), (35, 7));
        assert_eq!(db.learning_points().await.unwrap(), 35);
    }

    #[tokio::test]
    async fn test_topic_lists() {
        let db = Database::in_memory().await.unwrap();
        assert!(db.mark_topic_read("compound-interest").await.unwrap());
        assert!(!db.mark_topic_read("compound-interest").await.unwrap());
        assert_eq!(db.read_topics().await.unwrap(), vec!["compound-interest"]);

        assert!(db.toggle_topic_bookmark("emi").await.unwrap());
        assert!(!db.toggle_topic_bookmark("emi").await.unwrap());
        assert!(db.bookmarked_topics().await.unwrap().is_empty());
    }
}
