//! # bundle-core: Pure Pricing Logic for the Storefront
//!
//! This crate prices a cart against the seller's promotional bundles. It
//! contains business logic only, as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Bundle Pricing Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Storefront (cart page, checkout, quote-cli)          │   │
//! │  └───────────────┬─────────────────────────────────┬───────────────┘   │
//! │                  │ cart lines                      │ active bundles    │
//! │  ┌───────────────▼─────────────────────────────┐   │                   │
//! │  │          ★ bundle-core (THIS CRATE) ★       │◄──┘                   │
//! │  │                                             │                       │
//! │  │  ┌────────┐ ┌────────┐ ┌────────┐ ┌──────┐  │                       │
//! │  │  │ types  │ │ bundle │ │  cart  │ │money │  │                       │
//! │  │  │CartLine│ │evaluate│ │  Cart  │ │Money │  │                       │
//! │  │  │Bundle..│ │select  │ │ quote  │ │ fmt  │  │                       │
//! │  │  └────────┘ └────────┘ └────────┘ └──────┘  │                       │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS     │                       │
//! │  └─────────────────────────────────────────────┘                       │
//! │                  ▲                                                     │
//! │  ┌───────────────┴─────────────────────────────────────────────────┐   │
//! │  │          bundle-store (SQLite catalog, rate-limit stores)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Cart lines, bundle definitions, engine output
//! - [`bundle`] - Qualification, discount math, greedy selection
//! - [`cart`] - Cart mutations
//! - [`money`] - Integer-cent money
//! - [`currency`] - Display formatting
//! - [`validation`] - Boundary validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bundle_core::{select_best_discounts, BundleDefinition, BundleMember, CartLine, DiscountType, Money};
//! use chrono::Utc;
//!
//! let now = Utc::now();
//! let cart = vec![CartLine::new("P1", Money::from_cents(10000), 2)];
//! let bundles = vec![BundleDefinition {
//!     id: "b1".into(),
//!     name: "Pair deal".into(),
//!     discount_type: DiscountType::Percentage,
//!     discount_value: 1000, // 10%
//!     min_quantity: 2,
//!     max_quantity: None,
//!     is_active: true,
//!     valid_from: now,
//!     valid_until: None,
//!     members: vec![BundleMember::required("P1", 2)],
//! }];
//!
//! let summary = select_best_discounts(&cart, &bundles, now);
//! assert_eq!(summary.total_discount.cents(), 2000);
//! assert_eq!(summary.final_total.cents(), 18000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bundle;
pub mod cart;
pub mod currency;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bundle::{evaluate_bundle, select_best_discounts};
pub use cart::Cart;
pub use currency::{format_price, CurrencyFormatter};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in the cart.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit or sale price, in cents (1,000,000.00).
///
/// With `MAX_ITEM_QUANTITY` and `MAX_CART_ITEMS` this keeps every cart total
/// far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Maximum products a single bundle may reference.
pub const MAX_BUNDLE_MEMBERS: usize = 50;
