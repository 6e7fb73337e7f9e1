pub mod calculators;
pub mod clock;
pub mod db;
pub mod environment;
pub mod logging;
pub mod news;
pub mod util;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_DB: &str = "db_query";
pub const TARGET_CALC: &str = "calculator";

/// Learning pillars tracked by the progress bar.
pub const PILLARS: &[&str] = &[
    "budgeting",
    "saving",
    "investing",
    "insurance",
    "loans",
    "taxes",
];
