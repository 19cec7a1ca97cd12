//! Quote orchestration: cart file in, priced summary out.

use std::path::Path;

use anyhow::{bail, Context};
use bundle_core::validation::{validate_cart_line, validate_currency_code};
use bundle_core::{BundleDefinition, Cart, CartLine, CurrencyFormatter, DiscountSummary};
use bundle_store::{
    Database, DbConfig, RateLimitConfig, RateLimitDecision, RateLimitStore, RateLimiter,
    RedisRateLimitStore,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::config::QuoteConfig;

/// Totals rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTotals {
    pub original_total: String,
    pub total_discount: String,
    pub final_total: String,
}

/// What the CLI prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteOutput {
    pub quoted_at: DateTime<Utc>,
    pub currency: String,
    pub summary: DiscountSummary,
    pub display: DisplayTotals,
}

/// Runs one quote end to end.
pub async fn run(cli: &Cli, config: &QuoteConfig) -> anyhow::Result<QuoteOutput> {
    let now = cli.at.unwrap_or_else(Utc::now);

    let currency = match cli.currency.as_deref() {
        Some(code) => {
            validate_currency_code(code).context("Invalid --currency")?;
            code.trim().to_ascii_uppercase()
        }
        None => config.default_currency.clone(),
    };

    // Wall-clock time, even when pricing at another instant
    enforce_rate_limit(config, &cli.customer, Utc::now()).await?;

    let cart = read_cart(&cli.cart)?;

    let db_config =
        DbConfig::new(config.database_path.clone()).max_connections(config.db_max_connections);
    let db = Database::new(db_config)
        .await
        .with_context(|| format!("Failed to open catalog {}", config.database_path.display()))?;

    let result = quote_cart(&db, &cart, now, &currency).await;
    db.close().await;
    result
}

/// Applies the shared quote limit for `customer`.
///
/// Windows live in Redis so they outlast this process. Without `REDIS_URL`
/// there is nowhere to keep them between runs, and limiting is off.
pub async fn enforce_rate_limit(
    config: &QuoteConfig,
    customer: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<RateLimitDecision>> {
    let Some(url) = config.redis_url.as_deref() else {
        warn!("REDIS_URL not set; quote rate limiting is disabled");
        return Ok(None);
    };

    let store = RedisRateLimitStore::connect(url)
        .await
        .context("Failed to connect to Redis")?;
    let limiter = RateLimiter::new(store, RateLimitConfig::per_minute(config.quote_rate_limit));
    check_rate_limit(&limiter, customer, now).await.map(Some)
}

/// Counts one quote for `customer`, failing when the window is exhausted.
pub async fn check_rate_limit<S: RateLimitStore>(
    limiter: &RateLimiter<S>,
    customer: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<RateLimitDecision> {
    let decision = limiter
        .check(customer, now)
        .await
        .context("Rate limit check failed")?;

    if !decision.allowed {
        bail!(
            "Quote rate limit exceeded for {}; retry after {}",
            customer,
            decision.reset_at.to_rfc3339()
        );
    }

    debug!(customer = %customer, remaining = decision.remaining, "Quote admitted");
    Ok(decision)
}

/// Reads and validates a cart file.
pub fn read_cart(path: &Path) -> anyhow::Result<Cart> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cart {}", path.display()))?;
    parse_cart(&raw).with_context(|| format!("Invalid cart {}", path.display()))
}

/// Parses a JSON array of cart lines into a [`Cart`].
///
/// Every line is validated before merging. Merging then rejects duplicate
/// products with different prices and quantities past the per-product cap.
pub fn parse_cart(raw: &str) -> anyhow::Result<Cart> {
    let lines: Vec<CartLine> = serde_json::from_str(raw).context("Malformed cart JSON")?;

    for (index, line) in lines.iter().enumerate() {
        validate_cart_line(line).with_context(|| format!("Cart line {}", index + 1))?;
    }

    Ok(Cart::try_from(lines)?)
}

/// Prices `cart` against the bundles live in `db` at `now`.
pub async fn quote_cart(
    db: &Database,
    cart: &Cart,
    now: DateTime<Utc>,
    currency: &str,
) -> anyhow::Result<QuoteOutput> {
    let bundles = db
        .bundles()
        .list_active(now)
        .await
        .context("Failed to load active bundles")?;

    let output = build_quote(cart, &bundles, now, currency);
    info!(
        lines = cart.lines().len(),
        bundles = bundles.len(),
        applied = output.summary.applied.len(),
        discount_cents = output.summary.total_discount.cents(),
        "Quote computed"
    );
    Ok(output)
}

/// Pure pricing step.
pub fn build_quote(
    cart: &Cart,
    bundles: &[BundleDefinition],
    now: DateTime<Utc>,
    currency: &str,
) -> QuoteOutput {
    let summary = cart.quote(bundles, now);
    let formatter = CurrencyFormatter::new(currency);

    let display = DisplayTotals {
        original_total: formatter.format(summary.original_total),
        total_discount: formatter.format(summary.total_discount),
        final_total: formatter.format(summary.final_total),
    };

    QuoteOutput {
        quoted_at: now,
        currency: formatter.default_code().to_string(),
        summary,
        display,
    }
}
