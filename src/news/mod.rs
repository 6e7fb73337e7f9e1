//! News feed: backend client, page cache and the feed controller.

mod cache;
mod client;
mod controller;
pub mod error;
mod types;

pub use self::cache::{NewsCache, CACHE_KEY_PREFIX, CACHE_TTL_MS};
pub use self::client::{NewsApi, NewsClient, DIGEST_TIMEOUT, NEWS_TIMEOUT};
pub use self::controller::{FeedStatus, NewsController};
pub use self::error::FetchError;
pub use self::types::*;
