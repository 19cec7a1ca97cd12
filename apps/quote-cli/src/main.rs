//! # Bundle Quote CLI
//!
//! Prices a cart file against the bundle catalog and prints the quote as JSON.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          quote-cli                                      │
//! │                                                                         │
//! │  args + env ───► rate limit ───► SQLite catalog ───► bundle-core       │
//! │                      │                                    │             │
//! │                      ▼                                    ▼             │
//! │               memory | Redis                        JSON on stdout      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Logs go to stderr so stdout stays machine-readable.

mod cli;
mod config;
mod quote;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::QuoteConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = QuoteConfig::load().context("Failed to load configuration")?;
    info!(
        db = %config.database_path.display(),
        currency = %config.default_currency,
        redis = config.redis_url.is_some(),
        "Configuration loaded"
    );

    let output = quote::run(&cli, &config).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize quote")?
    );
    Ok(())
}
