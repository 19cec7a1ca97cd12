//! # Domain Types
//!
//! Core domain types for cart pricing and bundle promotions.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Inputs (owned by cart / catalog)        Outputs (computed, transient)  │
//! │  ──────────────────────────────          ─────────────────────────────  │
//! │  ┌──────────────────┐                    ┌──────────────────┐          │
//! │  │    CartLine      │                    │  BundleDiscount  │          │
//! │  │  product_id      │                    │  bundle_id       │          │
//! │  │  unit_price      │                    │  discount_amount │          │
//! │  │  quantity        │                    │  consumed ids    │          │
//! │  └──────────────────┘                    └────────┬─────────┘          │
//! │                                                   │ 0..n               │
//! │  ┌──────────────────┐   1..n  ┌────────────┐      ▼                    │
//! │  │ BundleDefinition │────────►│BundleMember│  ┌──────────────────┐     │
//! │  │  discount_type   │         │ product_id │  │ DiscountSummary  │     │
//! │  │  discount_value  │         │ required_q │  │  total_discount  │     │
//! │  │  min/max qty     │         │ is_required│  │  final_total     │     │
//! │  └──────────────────┘         └────────────┘  └──────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Cart Line
// =============================================================================

/// One product's presence in the cart.
///
/// ## Price Fields
/// - `unit_price_cents`: list price
/// - `sale_price_cents`: product-level markdown, if any
///
/// Every calculation uses [`CartLine::effective_unit_price`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub unit_price_cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price_cents: Option<i64>,
    pub quantity: i64,
}

impl CartLine {
    /// Creates a line at list price.
    pub fn new(product_id: impl Into<String>, unit_price: Money, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            unit_price_cents: unit_price.cents(),
            sale_price_cents: None,
            quantity,
        }
    }

    /// Sets a sale price (builder style).
    pub fn with_sale_price(mut self, sale_price: Money) -> Self {
        self.sale_price_cents = Some(sale_price.cents());
        self
    }

    /// Returns the list price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Sale price if present, else list price.
    #[inline]
    pub fn effective_unit_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents.unwrap_or(self.unit_price_cents))
    }

    /// Effective unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.effective_unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Discount Type
// =============================================================================

/// How a bundle's `discount_value` is interpreted.
///
/// ```text
/// ┌──────────────┬───────────────────────────┬──────────────────────────┐
/// │ Type         │ discount_value            │ Discount                 │
/// ├──────────────┼───────────────────────────┼──────────────────────────┤
/// │ percentage   │ basis points (1000 = 10%) │ eligible × bps / 10000   │
/// │ fixed        │ cents                     │ min(value, eligible)     │
/// │ buy_x_get_y  │ free units per group      │ free units × avg price   │
/// └──────────────┴───────────────────────────┴──────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
    BuyXGetY,
}

impl DiscountType {
    /// All variants, in their wire spelling.
    pub const ALL: [DiscountType; 3] = [
        DiscountType::Percentage,
        DiscountType::Fixed,
        DiscountType::BuyXGetY,
    ];

    /// The stored / serialized spelling.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
            DiscountType::BuyXGetY => "buy_x_get_y",
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiscountType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "discount_type".to_string(),
                allowed: DiscountType::ALL
                    .iter()
                    .map(|kind| kind.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Bundle Definition
// =============================================================================

/// A product that participates in a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BundleMember {
    pub product_id: String,
    /// Units needed for this member to count.
    pub required_quantity: i64,
    /// Required members block qualification when missing; optional ones
    /// only add to the discount when present.
    pub is_required: bool,
}

impl BundleMember {
    pub fn required(product_id: impl Into<String>, quantity: i64) -> Self {
        BundleMember {
            product_id: product_id.into(),
            required_quantity: quantity,
            is_required: true,
        }
    }

    pub fn optional(product_id: impl Into<String>, quantity: i64) -> Self {
        BundleMember {
            product_id: product_id.into(),
            required_quantity: quantity,
            is_required: false,
        }
    }
}

/// A seller-defined promotional bundle.
///
/// Read-only to the engine. Definitions coming from storage have already been
/// checked by [`crate::validation::validate_bundle`].
///
/// ## Preconditions
/// The engine expects a validated definition: `min_quantity ≥ 1`,
/// `max_quantity ≥ min_quantity` when set, and `discount_value` inside the
/// range of its [`DiscountType`]. Anything else is priced without panicking
/// but the result is unspecified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BundleDefinition {
    pub id: String,
    pub name: String,
    pub discount_type: DiscountType,
    /// See [`DiscountType`] for the unit.
    pub discount_value: i64,
    /// Minimum total units across members; also the group size for
    /// `buy_x_get_y`.
    pub min_quantity: i64,
    /// Caps the unit count used by `buy_x_get_y`.
    pub max_quantity: Option<i64>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub valid_from: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub valid_until: Option<DateTime<Utc>>,
    pub members: Vec<BundleMember>,
}

impl BundleDefinition {
    /// Whether the bundle is switched on and not past its end date.
    ///
    /// `valid_from` is not consulted here; the catalog query filters on it.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match self.valid_until {
            Some(until) => now <= until,
            None => true,
        }
    }

    pub fn required_members(&self) -> impl Iterator<Item = &BundleMember> {
        self.members.iter().filter(|m| m.is_required)
    }

    pub fn optional_members(&self) -> impl Iterator<Item = &BundleMember> {
        self.members.iter().filter(|m| !m.is_required)
    }
}

// =============================================================================
// Engine Output
// =============================================================================

/// The discount one bundle would grant against a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BundleDiscount {
    pub bundle_id: String,
    pub bundle_name: String,
    pub discount_amount: Money,
    pub eligible_subtotal: Money,
    pub discounted_subtotal: Money,
    #[ts(as = "Vec<String>")]
    pub consumed_product_ids: BTreeSet<String>,
}

impl BundleDiscount {
    /// Whether this discount spends any product already in `used`.
    pub fn overlaps(&self, used: &BTreeSet<String>) -> bool {
        self.consumed_product_ids.iter().any(|id| used.contains(id))
    }
}

/// Result of selecting the best set of bundles for a cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountSummary {
    pub applied: Vec<BundleDiscount>,
    pub total_discount: Money,
    pub original_total: Money,
    pub final_total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
