//! HTTP client for the news backend.

use serde::de::DeserializeOwned;
use std::future::Future;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use url::Url;

use super::error::FetchError;
use super::types::{
    AnalyticsResponse, AnalyticsStats, Article, Digest, NewsPage, NewsQuery, NewsResponse,
    Pagination, SummaryRequest, SummaryResponse,
};
use crate::TARGET_WEB_REQUEST;

/// Feed and summary requests.
pub const NEWS_TIMEOUT: Duration = Duration::from_secs(15);
/// Digest and analytics requests.
pub const DIGEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The slice of the backend the feed controller depends on.
pub trait NewsApi: Send + Sync {
    fn fetch_news(
        &self,
        query: &NewsQuery,
    ) -> impl Future<Output = Result<NewsPage, FetchError>> + Send;
}

#[derive(Clone, Debug)]
pub struct NewsClient {
    http: reqwest::Client,
    base_url: Url,
    news_timeout: Duration,
    other_timeout: Duration,
}

impl NewsClient {
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .gzip(true)
            .user_agent(concat!("finwise/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            base_url,
            news_timeout: NEWS_TIMEOUT,
            other_timeout: DIGEST_TIMEOUT,
        })
    }

    /// Overrides the request timeouts: `news` for feed and summary requests,
    /// `other` for digest and stats.
    pub fn with_timeouts(mut self, news: Duration, other: Duration) -> Self {
        self.news_timeout = news;
        self.other_timeout = other;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| FetchError::Network(format!("invalid URL {}: {}", joined, e)))
    }

    /// Sends the request and decodes a JSON body, all within `limit`.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        limit: Duration,
    ) -> Result<T, FetchError> {
        let exchange = async {
            let response = request
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(e, limit))?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }
            let body = response
                .bytes()
                .await
                .map_err(|e| FetchError::from_reqwest(e, limit))?;
            serde_json::from_slice::<T>(&body).map_err(|e| FetchError::Decode(e.to_string()))
        };

        match timeout(limit, exchange).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(limit)),
        }
    }

    /// `GET /api/digest`.
    pub async fn fetch_digest(&self) -> Result<Digest, FetchError> {
        let url = self.endpoint("/api/digest")?;
        debug!(target: TARGET_WEB_REQUEST, "Fetching digest from {}", url);

        let digest: Digest = self
            .send_json(self.http.get(url), self.other_timeout)
            .await?;
        if !digest.success {
            return Err(FetchError::Api("digest unavailable".to_string()));
        }
        Ok(digest)
    }

    /// `POST /api/news/summary` for one article.
    pub async fn summarize(&self, article: &Article) -> Result<String, FetchError> {
        let url = self.endpoint("/api/news/summary")?;
        debug!(target: TARGET_WEB_REQUEST, "Requesting summary for {}", article.link);

        let body = SummaryRequest {
            title: &article.title,
            summary: &article.summary,
        };
        let response: SummaryResponse = self
            .send_json(self.http.post(url).json(&body), self.news_timeout)
            .await?;
        if !response.success {
            return Err(FetchError::Api(
                response
                    .message
                    .unwrap_or_else(|| "summary failed".to_string()),
            ));
        }
        Ok(response.summary)
    }

    /// `GET /api/analytics/stats`.
    pub async fn fetch_stats(&self) -> Result<AnalyticsStats, FetchError> {
        let url = self.endpoint("/api/analytics/stats")?;
        let response: AnalyticsResponse = self
            .send_json(self.http.get(url), self.other_timeout)
            .await?;
        match response {
            AnalyticsResponse {
                success: true,
                data: Some(stats),
                ..
            } => Ok(stats),
            AnalyticsResponse { message, .. } => Err(FetchError::Api(
                message.unwrap_or_else(|| "stats unavailable".to_string()),
            )),
        }
    }
}

impl NewsApi for NewsClient {
    async fn fetch_news(&self, query: &NewsQuery) -> Result<NewsPage, FetchError> {
        let url = self.endpoint("/api/news")?;
        info!(
            target: TARGET_WEB_REQUEST,
            "Fetching news page {} (q={:?}, category={}, sort={})",
            query.page,
            query.query,
            query.category,
            query.sort
        );

        let request = self.http.get(url).query(&query.to_params());
        let response: NewsResponse = self.send_json(request, self.news_timeout).await?;
        if !response.success {
            warn!(target: TARGET_WEB_REQUEST, "News backend reported failure: {:?}", response.message);
            return Err(FetchError::Api(
                response
                    .message
                    .unwrap_or_else(|| "news unavailable".to_string()),
            ));
        }

        let pagination = response
            .pagination
            .unwrap_or_else(|| Pagination::single_page(query.page, query.limit, response.data.len()));

        Ok(NewsPage {
            articles: response.data,
            pagination,
        })
    }
}
