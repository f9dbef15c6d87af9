//! Case History - pandemic case dashboard
//!
//! Downloads the confirmed/deaths/recovered time series once at startup and
//! serves a dashboard with:
//! - Country and state/province selection
//! - Daily new and cumulative bar charts per selected metric

mod chart;
mod config;
mod dashboard;
mod data;
mod error;
mod web;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::data::fetch::SourceClient;
use crate::data::Metric;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any other initialization)
    let _ = dotenvy::dotenv();

    // Load configuration
    let config = config::Config::load()?;

    // RUST_LOG overrides the configured level.
    // Use LOG_FORMAT=gcp for structured GCP Cloud Logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "gcp" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting Case History dashboard...");

    // Build the unified table; the dashboard cannot start without it
    let client = SourceClient::new(&config.source).context("Failed to build HTTP client")?;
    let dataset = data::build_unified_table(
        &client,
        &config.source.location(Metric::Confirmed),
        &config.source.location(Metric::Deaths),
        &config.source.location(Metric::Recovered),
    )
    .await
    .context("Failed to load case data")?;

    let dashboard = dashboard::Dashboard::new(Arc::new(dataset), &config.dashboard);
    info!("Default selection: {}", dashboard.default_country());

    // Start web server (blocking)
    web::start_server(&config, dashboard).await?;

    Ok(())
}
