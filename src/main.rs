//! News report - summaries of a news site's access log
//!
//! Prints three reports from the `news` database:
//! - The most popular articles of all time
//! - The most popular authors of all time
//! - Days on which more than 1% of requests led to errors

mod config;
mod db;
mod error;
mod report;

use anyhow::Result;
use futures::FutureExt;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::report::Reporter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any other initialization)
    let _ = dotenvy::dotenv();

    let config = config::Config::load()?;
    init_tracing(&config.logging);
    info!("Configuration loaded");

    let settings = config.report.clone();
    db::scoped(&config.database, move |session| {
        async move {
            let mut out = std::io::stdout();
            Reporter::new(session, settings).print_all(&mut out).await
        }
        .boxed()
    })
    .await
    .map_err(|e| {
        if e.is_connection() {
            anyhow::Error::new(e).context(format!("Database '{}' is unreachable", config.database.name))
        } else {
            e.into()
        }
    })?;

    info!("Reports complete");
    Ok(())
}

/// Diagnostics go to stderr so stdout carries only the reports.
/// Use LOG_FORMAT=gcp for structured GCP Cloud Logging.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.to_lowercase()));

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "gcp" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_stackdriver::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
