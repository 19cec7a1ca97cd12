//! Command line arguments.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "quote-cli")]
#[command(version)]
#[command(about = "Price a cart against the active bundle catalog")]
#[command(long_about = None)]
pub struct Cli {
    /// Cart file: a JSON array of cart lines
    pub cart: PathBuf,

    /// Currency code for the formatted totals (defaults to DEFAULT_CURRENCY)
    #[arg(long)]
    pub currency: Option<String>,

    /// Pricing instant in RFC 3339 (defaults to now)
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,

    /// Customer the quote is rate limited under
    #[arg(long, default_value = "anonymous")]
    pub customer: String,
}
