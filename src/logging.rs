use std::io;
use tracing::Level;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Directory the rolling log files are written to.
pub const LOG_DIR: &str = "logs";

/// Installs console (stderr) and daily-rolling file logging for a binary.
///
/// `RUST_LOG` overrides the console filter when set; otherwise `level` is used
/// with HTTP and database chatter turned down.
pub fn setup_logging(app_name: &str, level: Level) -> anyhow::Result<()> {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},web_request=warn,db_query=warn,sqlx=off,hyper=off,reqwest=warn",
            level.as_str().to_lowercase()
        ))
    });

    let console_log = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let file_appender = rolling::daily(LOG_DIR, format!("{}.log", app_name));
    let file_log = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug,sqlx=info,hyper=off"));

    tracing_subscriber::Registry::default()
        .with(console_log)
        .with(file_log)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
