use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_DATABASE_PATH: &str = "finwise.db";
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const DEFAULT_DEBOUNCE_MS: u64 = 400;
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "all", "markets", "economy", "banking", "personal-finance", "crypto",
];

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: Url,
    pub database_path: String,
    pub page_limit: u32,
    pub categories: Vec<String>,
    pub debounce: Duration,
}

impl AppConfig {
    /// Builds the configuration from `FINWISE_API_BASE_URL`, `DATABASE_PATH`,
    /// `NEWS_PAGE_LIMIT`, `NEWS_CATEGORIES` and `CALC_DEBOUNCE_MS`.
    pub fn from_env() -> Result<Self> {
        let raw_url = env::var("FINWISE_API_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = Url::parse(&raw_url)
            .with_context(|| format!("Invalid FINWISE_API_BASE_URL: {}", raw_url))?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());

        let page_limit = env::var("NEWS_PAGE_LIMIT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT);

        let mut categories = get_env_var_as_vec("NEWS_CATEGORIES", ';');
        if categories.is_empty() {
            categories = DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
        }

        let debounce_ms = env::var("CALC_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_DEBOUNCE_MS);

        Ok(Self {
            api_base_url,
            database_path,
            page_limit,
            categories,
            debounce: Duration::from_millis(debounce_ms),
        })
    }
}

/// Retrieves an environment variable and splits it into a vector of strings based on a delimiter.
///
/// Empty segments are dropped, so an unset variable yields an empty vector.
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    env::var(var)
        .unwrap_or_default()
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
