//! Payloads exchanged with the news backend, plus bookmark and query types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Coerces any JSON scalar into a string. `null` and containers become empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(&Value::deserialize(deserializer)?))
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect(),
        _ => Vec::new(),
    })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// A news article as returned by the backend. Every field is decoded
/// defensively, so a malformed item never fails the whole page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub published: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub tags: Vec<String>,
}

/// A bookmarked article, stored under `bookmarkedNews`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(flatten)]
    pub article: Article,
    #[serde(rename = "bookmarkedAt", default)]
    pub bookmarked_at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub total_items: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_next: bool,
}

impl Pagination {
    /// Used when the backend omits pagination: a single, final page.
    pub fn single_page(page: u32, limit: u32, items: usize) -> Self {
        Self {
            page,
            limit,
            total_items: items as u64,
            total_pages: page,
            has_next: false,
        }
    }
}

/// Raw `GET /api/news` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Article>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One page of articles, as kept by the controller and the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsPage {
    pub articles: Vec<Article>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Latest,
    Oldest,
    Relevance,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Latest => "latest",
            SortOrder::Oldest => "oldest",
            SortOrder::Relevance => "relevance",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "latest" => Ok(SortOrder::Latest),
            "oldest" => Ok(SortOrder::Oldest),
            "relevance" => Ok(SortOrder::Relevance),
            other => Err(format!("Unknown sort order: {}", other)),
        }
    }
}

pub const DEFAULT_CATEGORY: &str = "all";

/// Parameters of one `GET /api/news` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub query: String,
    pub category: String,
    pub sort: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl NewsQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            query: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            sort: SortOrder::default(),
            page: 1,
            limit,
        }
    }

    /// Only first pages without a search term are served from the cache.
    pub fn is_cacheable(&self) -> bool {
        self.query.trim().is_empty() && self.page == 1
    }

    /// Storage key of this page: `news_{query}_{category}_{sort}_{page}`.
    pub fn cache_key(&self) -> String {
        format!(
            "news_{}_{}_{}_{}",
            self.query.trim(),
            self.category,
            self.sort,
            self.page
        )
    }

    /// Query-string pairs; empty search and the `all` category are omitted.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sort", self.sort.to_string()),
        ];
        let query = self.query.trim();
        if !query.is_empty() {
            params.push(("q", query.to_string()));
        }
        if !self.category.is_empty() && self.category != DEFAULT_CATEGORY {
            params.push(("category", self.category.clone()));
        }
        params
    }
}

/// `GET /api/digest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub highlights: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub market_summary: String,
}

/// Body of `POST /api/news/summary`.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRequest<'a> {
    pub title: &'a str,
    pub summary: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub summary: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopularCalculator {
    #[serde(default, alias = "calculator", deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub uses: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsStats {
    #[serde(default)]
    pub total_page_views: u64,
    #[serde(default)]
    pub monthly_active_users: u64,
    #[serde(default)]
    pub weekly_active_users: u64,
    #[serde(default)]
    pub calculator_uses: u64,
    #[serde(default)]
    pub popular_calculators: Vec<PopularCalculator>,
}

/// `GET /api/analytics/stats` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<AnalyticsStats>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_article_fields_are_coerced() {
        let article: Article = serde_json::from_value(json!({
            "title": 42,
            "summary": null,
            "source": true,
            "link": "https://example.com/a",
            "tags": ["rbi", 7, null]
        }))
        .unwrap();

        assert_eq!(article.title, "42");
        assert_eq!(article.summary, "");
        assert_eq!(article.source, "true");
        assert_eq!(article.published, "");
        assert_eq!(article.tags, vec!["rbi", "7", ""]);

        let article: Article = serde_json::from_value(json!({ "tags": "markets" })).unwrap();
        assert!(article.tags.is_empty());
    }

    #[test]
    fn test_bookmark_serializes_flat() {
        let bookmark = Bookmark {
            article: Article {
                title: "Repo rate unchanged".to_string(),
                link: "https://example.com/rbi".to_string(),
                ..Article::default()
            },
            bookmarked_at: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&bookmark).unwrap();
        assert_eq!(value["link"], "https://example.com/rbi");
        assert_eq!(value["bookmarkedAt"], 1_700_000_000_000_i64);

        let back: Bookmark = serde_json::from_value(value).unwrap();
        assert_eq!(back, bookmark);
    }

    #[test]
    fn test_cache_key_and_params() {
        let mut query = NewsQuery::new(10);
        assert_eq!(query.cache_key(), "news__all_latest_1");
        assert!(query.is_cacheable());
        assert_eq!(
            query.to_params(),
            vec![
                ("page", "1".to_string()),
                ("limit", "10".to_string()),
                ("sort", "latest".to_string())
            ]
        );

        query.query = "sensex".to_string();
        query.category = "markets".to_string();
        assert!(!query.is_cacheable());
        assert!(query.to_params().contains(&("q", "sensex".to_string())));
        assert!(query.to_params().contains(&("category", "markets".to_string())));
    }

    #[test]
    fn test_analytics_payload() {
        let response: AnalyticsResponse = serde_json::from_value(json!({
            "success": true,
            "data": {
                "total_page_views": 1200,
                "monthly_active_users": 300,
                "weekly_active_users": 90,
                "calculator_uses": 450,
                "popular_calculators": [{ "name": "education-loan", "uses": 120 }]
            }
        }))
        .unwrap();
        let stats = response.data.unwrap();
        assert_eq!(stats.calculator_uses, 450);
        assert_eq!(stats.popular_calculators[0].name, "education-loan");
    }
}
