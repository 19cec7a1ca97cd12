//! # Cart
//!
//! The set of [`CartLine`]s a shopper is about to pay for.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Shopper Action           Cart Method              Line Change          │
//! │  ──────────────           ───────────              ───────────          │
//! │  Add to cart ───────────► add_line() ────────────► push / qty += n     │
//! │  Change quantity ───────► update_quantity() ─────► qty = n (0 removes) │
//! │  Remove ────────────────► remove_line() ─────────► line dropped        │
//! │  Empty cart ────────────► clear() ───────────────► all dropped         │
//! │  View cart ─────────────► quote() ───────────────► (read only)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product merges)
//! - A merge never changes a line's price
//! - Every stored line has `1..=MAX_ITEM_QUANTITY` units
//! - At most `MAX_CART_ITEMS` lines

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bundle::select_best_discounts;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BundleDefinition, CartLine, DiscountSummary};
use crate::validation::{validate_cart_size, validate_price_cents, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds units of a product, merging with an existing line.
    ///
    /// Merging requires the same unit price; a different one is
    /// [`CoreError::PriceMismatch`].
    pub fn add_line(
        &mut self,
        product_id: &str,
        unit_price: Money,
        quantity: i64,
    ) -> CoreResult<()> {
        validate_quantity(quantity)?;
        validate_price_cents(unit_price.cents())?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            if line.unit_price_cents != unit_price.cents() {
                return Err(CoreError::PriceMismatch {
                    product_id: product_id.to_string(),
                });
            }
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        validate_cart_size(self.lines.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        })?;

        self.lines.push(CartLine::new(product_id, unit_price, quantity));
        Ok(())
    }

    /// Sets or clears a line's sale price.
    pub fn set_sale_price(
        &mut self,
        product_id: &str,
        sale_price: Option<Money>,
    ) -> CoreResult<()> {
        if let Some(price) = sale_price {
            validate_price_cents(price.cents())?;
        }
        let line = self.line_mut(product_id)?;
        line.sale_price_cents = sale_price.map(|p| p.cents());
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_line(product_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        validate_quantity(quantity)?;

        self.line_mut(product_id)?.quantity = quantity;
        Ok(())
    }

    /// Removes a line by product ID.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == initial_len {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of line totals at effective prices, before bundle discounts.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Prices the cart against a bundle catalog.
    pub fn quote(&self, bundles: &[BundleDefinition], now: DateTime<Utc>) -> DiscountSummary {
        select_best_discounts(&self.lines, bundles, now)
    }

    fn line_mut(&mut self, product_id: &str) -> CoreResult<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotInCart(product_id.to_string()))
    }
}

impl TryFrom<Vec<CartLine>> for Cart {
    type Error = CoreError;

    /// Wraps lines received from the cart-state boundary, folding duplicates
    /// and dropping empty lines.
    ///
    /// Duplicates only fold when their unit and sale prices match, and the
    /// folded quantity must stay within `MAX_ITEM_QUANTITY`.
    fn try_from(lines: Vec<CartLine>) -> CoreResult<Self> {
        let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
        for line in lines.into_iter().filter(|l| l.quantity > 0) {
            let Some(existing) = merged.iter_mut().find(|m| m.product_id == line.product_id)
            else {
                merged.push(line);
                continue;
            };

            if existing.unit_price_cents != line.unit_price_cents
                || existing.sale_price_cents != line.sale_price_cents
            {
                return Err(CoreError::PriceMismatch {
                    product_id: line.product_id,
                });
            }

            existing.quantity = existing.quantity.saturating_add(line.quantity);
            if existing.quantity > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: existing.quantity,
                    max: MAX_ITEM_QUANTITY,
                });
            }
        }

        if merged.len() > MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        Ok(Cart { lines: merged })
    }
}
