//! State machine behind the news feed.
//!
//! `Idle -> Loading -> (Success | Error)`, with `loading_more` tracked
//! separately while a next page is being appended. Every operation handles
//! its own failure: errors end up in the state, never in a return value.

use tracing::{error, info, warn};

use super::cache::NewsCache;
use super::client::NewsApi;
use super::error::FetchError;
use super::types::{Article, NewsPage, NewsQuery, Pagination, SortOrder};
use crate::clock::Clock;
use crate::TARGET_WEB_REQUEST;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Idle,
    Loading,
    Success,
    /// Holds the user-facing message.
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Replace { force: bool },
    Append,
}

pub struct NewsController<A: NewsApi, C: Clock> {
    api: A,
    cache: NewsCache<C>,
    query: NewsQuery,
    articles: Vec<Article>,
    pagination: Option<Pagination>,
    status: FeedStatus,
    loading_more: bool,
    load_more_error: Option<String>,
    failed: Option<(NewsQuery, FetchMode)>,
}

impl<A: NewsApi, C: Clock> NewsController<A, C> {
    pub fn new(api: A, cache: NewsCache<C>, page_limit: u32) -> Self {
        Self {
            api,
            cache,
            query: NewsQuery::new(page_limit),
            articles: Vec::new(),
            pagination: None,
            status: FeedStatus::Idle,
            loading_more: false,
            load_more_error: None,
            failed: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn query(&self) -> &NewsQuery {
        &self.query
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    /// Message from the last failed "load more", cleared by the next success.
    pub fn load_more_error(&self) -> Option<&str> {
        self.load_more_error.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.pagination.map(|p| p.has_next).unwrap_or(false)
    }

    /// Initial load of the first page for the current filters.
    pub async fn load(&mut self) {
        let query = self.first_page();
        self.fetch(query, FetchMode::Replace { force: false }).await;
    }

    /// Submits a search. Always goes to the network.
    pub async fn search(&mut self, term: &str) {
        self.query.query = term.trim().to_string();
        let query = self.first_page();
        self.fetch(query, FetchMode::Replace { force: true }).await;
    }

    pub async fn set_category(&mut self, category: &str) {
        if self.query.category == category && self.status != FeedStatus::Idle {
            return;
        }
        self.query.category = category.to_string();
        self.load().await;
    }

    pub async fn set_sort(&mut self, sort: SortOrder) {
        if self.query.sort == sort && self.status != FeedStatus::Idle {
            return;
        }
        self.query.sort = sort;
        self.load().await;
    }

    /// Appends the next page of the feed on screen. Only runs from `Success`,
    /// when there is a next page and nothing else is in flight.
    pub async fn load_more(&mut self) {
        if self.loading_more || self.status != FeedStatus::Success || !self.has_more() {
            return;
        }
        let mut query = self.query.clone();
        query.page += 1;
        self.fetch(query, FetchMode::Append).await;
    }

    /// Reruns the last failed request, or reloads when nothing failed.
    pub async fn retry(&mut self) {
        match self.failed.take() {
            Some((query, mode)) => self.fetch(query, mode).await,
            None => self.load().await,
        }
    }

    /// Drops cached pages so the next load hits the network.
    pub async fn clear_cache(&self) -> Result<u64, sqlx::Error> {
        self.cache.clear().await
    }

    fn first_page(&self) -> NewsQuery {
        let mut query = self.query.clone();
        query.page = 1;
        query
    }

    async fn fetch(&mut self, query: NewsQuery, mode: FetchMode) {
        match mode {
            FetchMode::Replace { .. } => self.status = FeedStatus::Loading,
            FetchMode::Append => self.loading_more = true,
        }

        if let FetchMode::Replace { force: false } = mode {
            if query.is_cacheable() {
                match self.cache.get(&query).await {
                    Ok(Some(page)) => {
                        info!(target: TARGET_WEB_REQUEST, "Serving {} from cache", query.cache_key());
                        self.apply(query, page, mode);
                        return;
                    }
                    Ok(None) => {}
                    Err(e) => warn!(target: TARGET_WEB_REQUEST, "News cache read failed: {}", e),
                }
            }
        }

        match self.api.fetch_news(&query).await {
            Ok(page) => {
                if matches!(mode, FetchMode::Replace { .. }) && query.is_cacheable() {
                    if let Err(e) = self.cache.put(&query, &page).await {
                        warn!(target: TARGET_WEB_REQUEST, "News cache write failed: {}", e);
                    }
                }
                self.apply(query, page, mode);
            }
            Err(e) => self.fail(query, mode, e),
        }
    }

    fn apply(&mut self, query: NewsQuery, page: NewsPage, mode: FetchMode) {
        match mode {
            FetchMode::Replace { .. } => self.articles = page.articles,
            FetchMode::Append => self.articles.extend(page.articles),
        }
        self.query.page = query.page;
        self.pagination = Some(page.pagination);
        self.status = FeedStatus::Success;
        self.loading_more = false;
        self.load_more_error = None;
        self.failed = None;
    }

    fn fail(&mut self, query: NewsQuery, mode: FetchMode, e: FetchError) {
        error!(target: TARGET_WEB_REQUEST, "Failed to fetch news page {}: {}", query.page, e);
        let message = e.user_message().to_string();
        match mode {
            FetchMode::Replace { .. } => {
                // The previous page no longer belongs to the current filters.
                self.pagination = None;
                self.status = FeedStatus::Error(message);
            }
            FetchMode::Append => {
                self.loading_more = false;
                self.load_more_error = Some(message);
            }
        }
        self.failed = Some((query, mode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::Database;
    use crate::news::error::{NETWORK_MESSAGE, SERVER_MESSAGE, TIMEOUT_MESSAGE};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves `total_pages` one-article pages and records every request.
    struct FakeApi {
        total_pages: u32,
        calls: AtomicUsize,
        requests: Mutex<Vec<NewsQuery>>,
        failures: Mutex<VecDeque<FetchError>>,
    }

    impl FakeApi {
        fn new(total_pages: u32) -> Self {
            Self {
                total_pages,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                failures: Mutex::new(VecDeque::new()),
            }
        }

        fn fail_next(&self, e: FetchError) {
            self.failures.lock().unwrap().push_back(e);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> NewsQuery {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl NewsApi for FakeApi {
        async fn fetch_news(&self, query: &NewsQuery) -> Result<NewsPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(query.clone());
            if let Some(e) = self.failures.lock().unwrap().pop_front() {
                return Err(e);
            }
            Ok(NewsPage {
                articles: vec![Article {
                    title: format!("{} {} p{}", query.query, query.category, query.page),
                    link: format!("https://example.com/{}/{}", query.category, query.page),
                    ..Article::default()
                }],
                pagination: Pagination {
                    page: query.page,
                    limit: query.limit,
                    total_items: self.total_pages as u64,
                    total_pages: self.total_pages,
                    has_next: query.page < self.total_pages,
                },
            })
        }
    }

    async fn controller(total_pages: u32) -> (NewsController<FakeApi, ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let db = Database::in_memory().await.unwrap();
        let cache = NewsCache::new(db, clock.clone());
        (
            NewsController::new(FakeApi::new(total_pages), cache, 10),
            clock,
        )
    }

    #[tokio::test]
    async fn test_default_page_cached_for_thirty_minutes() {
        let (mut feed, clock) = controller(3).await;
        assert_eq!(feed.status(), &FeedStatus::Idle);

        feed.load().await;
        assert_eq!(feed.api().calls(), 1);
        assert_eq!(feed.status(), &FeedStatus::Success);

        clock.advance_mins(10);
        feed.load().await;
        assert_eq!(feed.api().calls(), 1);
        assert_eq!(feed.articles().len(), 1);

        clock.advance_mins(21);
        feed.load().await;
        assert_eq!(feed.api().calls(), 2);
    }

    #[tokio::test]
    async fn test_search_bypasses_cache() {
        let (mut feed, _clock) = controller(3).await;
        feed.load().await;

        feed.search("sensex").await;
        assert_eq!(feed.api().calls(), 2);
        assert_eq!(feed.api().last_request().query, "sensex");

        // Clearing the search still forces a network call.
        feed.search("").await;
        assert_eq!(feed.api().calls(), 3);
    }

    #[tokio::test]
    async fn test_filter_change_refetches_first_page() {
        let (mut feed, _clock) = controller(3).await;
        feed.load().await;
        feed.load_more().await;
        assert_eq!(feed.query().page, 2);

        feed.set_category("markets").await;
        assert_eq!(feed.api().calls(), 3);
        assert_eq!(feed.api().last_request().page, 1);
        assert_eq!(feed.api().last_request().category, "markets");
        assert_eq!(feed.articles().len(), 1);

        feed.set_category("markets").await;
        assert_eq!(feed.api().calls(), 3);

        feed.set_sort(SortOrder::Oldest).await;
        assert_eq!(feed.api().calls(), 4);
        assert_eq!(feed.api().last_request().sort, SortOrder::Oldest);
    }

    #[tokio::test]
    async fn test_load_more_appends_until_last_page() {
        let (mut feed, _clock) = controller(2).await;
        feed.load().await;
        assert!(feed.has_more());

        feed.load_more().await;
        assert_eq!(feed.articles().len(), 2);
        assert_eq!(feed.query().page, 2);
        assert!(!feed.has_more());
        assert!(!feed.is_loading_more());

        feed.load_more().await;
        assert_eq!(feed.api().calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_then_retry() {
        let (mut feed, _clock) = controller(3).await;
        feed.api().fail_next(FetchError::Status(503));

        feed.load().await;
        assert_eq!(feed.status(), &FeedStatus::Error(SERVER_MESSAGE.to_string()));

        feed.retry().await;
        assert_eq!(feed.status(), &FeedStatus::Success);
        assert_eq!(feed.api().calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_filter_change_blocks_load_more() {
        let (mut feed, _clock) = controller(3).await;
        feed.load().await;
        assert!(feed.has_more());

        feed.api().fail_next(FetchError::Status(503));
        feed.set_category("markets").await;
        assert_eq!(feed.status(), &FeedStatus::Error(SERVER_MESSAGE.to_string()));
        assert!(feed.pagination().is_none());
        assert!(!feed.has_more());

        feed.load_more().await;
        assert_eq!(feed.api().calls(), 2);
        assert_eq!(feed.status(), &FeedStatus::Error(SERVER_MESSAGE.to_string()));

        feed.retry().await;
        assert_eq!(feed.status(), &FeedStatus::Success);
        assert_eq!(feed.api().last_request().category, "markets");
        assert_eq!(feed.articles().len(), 1);
        assert_eq!(feed.articles()[0].link, "https://example.com/markets/1");
        assert!(feed.has_more());
    }

    #[tokio::test]
    async fn test_error_messages_by_kind() {
        let (mut feed, _clock) = controller(3).await;

        feed.api().fail_next(FetchError::Timeout(std::time::Duration::from_secs(15)));
        feed.search("gold").await;
        assert_eq!(feed.status(), &FeedStatus::Error(TIMEOUT_MESSAGE.to_string()));

        feed.api().fail_next(FetchError::Network("connection refused".to_string()));
        feed.search("gold").await;
        assert_eq!(feed.status(), &FeedStatus::Error(NETWORK_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_load_more_failure_keeps_articles() {
        let (mut feed, _clock) = controller(3).await;
        feed.load().await;

        feed.api().fail_next(FetchError::Network("reset".to_string()));
        feed.load_more().await;
        assert_eq!(feed.status(), &FeedStatus::Success);
        assert_eq!(feed.articles().len(), 1);
        assert_eq!(feed.load_more_error(), Some(NETWORK_MESSAGE));

        feed.retry().await;
        assert_eq!(feed.articles().len(), 2);
        assert_eq!(feed.load_more_error(), None);
    }
}
