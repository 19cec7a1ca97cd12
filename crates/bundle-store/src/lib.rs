//! # bundle-store: Storage Layer for Bundle Pricing
//!
//! This crate owns everything with side effects: the SQLite bundle catalog
//! (via sqlx) and the windows behind request rate limiting (memory or Redis).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bundle Pricing Data Flow                         │
//! │                                                                         │
//! │  quote-cli / storefront request                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  bundle-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │ BundleRepo     │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │◄───│ list_active    │   │  (embedded)  │   │   │
//! │  │   │  SqlitePool   │    │ insert, ...    │   │ 001_bundle_  │   │   │
//! │  │   └───────────────┘    └────────────────┘   │ catalog.sql  │   │   │
//! │  │                                             └──────────────┘   │   │
//! │  │   ┌─────────────────────────────────────────────────────────┐  │   │
//! │  │   │ RateLimiter<S>  ── MemoryRateLimitStore | Redis store   │  │   │
//! │  │   └─────────────────────────────────────────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bundle-core::select_best_discounts (pure)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Storage error types
//! - [`repository`] - Bundle catalog repository
//! - [`rate_limit`] - Fixed-window limiter and its stores
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bundle_store::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bundles.db")).await?;
//! let bundles = db.bundles().list_active(Utc::now()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod rate_limit;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use rate_limit::{
    MemoryRateLimitStore, RateLimitConfig, RateLimitDecision, RateLimitStore, RateLimiter,
    RedisRateLimitStore, WindowEntry,
};

pub use repository::bundle::BundleRepository;
