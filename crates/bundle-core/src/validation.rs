//! # Validation Module
//!
//! Boundary validation for cart input and bundle definitions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Where Validation Runs                              │
//! │                                                                         │
//! │  Cart mutation (add / update)                                          │
//! │  └── validate_quantity, validate_price_cents, validate_cart_size       │
//! │                                                                         │
//! │  Catalog fetch (bundle-store)                                          │
//! │  ├── DiscountType::from_str (closed enum)                              │
//! │  └── validate_bundle ← THIS MODULE                                     │
//! │                                                                         │
//! │  Bundle engine                                                         │
//! │  └── NOTHING: inputs are trusted, the hot path never errors            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bundle_core::validation::{validate_currency_code, validate_quantity};
//!
//! validate_quantity(5).unwrap();
//! assert!(validate_currency_code("usd").is_ok());
//! assert!(validate_currency_code("dollars").is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{BundleDefinition, CartLine, DiscountType};
use crate::{MAX_BUNDLE_MEMBERS, MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Upper bound for a percentage discount, in basis points.
pub const MAX_PERCENTAGE_BPS: i64 = 10_000;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity for a cart mutation.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free items).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_PRICE_CENTS
///
/// ## Example
/// ```rust
/// use bundle_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(100_000_000_000_000_000).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates cart size before adding a new line.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Cart Line
// =============================================================================

/// Validates a cart line received from outside (e.g. a JSON cart).
///
/// A zero quantity is accepted here: such a line simply never satisfies a
/// bundle member.
pub fn validate_cart_line(line: &CartLine) -> ValidationResult<()> {
    if line.product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    validate_price_cents(line.unit_price_cents)?;
    if let Some(sale) = line.sale_price_cents {
        validate_price_cents(sale)?;
    }

    if line.quantity < 0 || line.quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Currency
// =============================================================================

/// Validates an ISO-4217 style currency code (three ASCII letters).
pub fn validate_currency_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "currency".to_string(),
        });
    }

    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a three-letter code".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Bundle Definition
// =============================================================================

/// Validates a bundle definition before it reaches the engine.
///
/// ## Rules
/// - `id` and `name` are non-empty, name at most 200 characters
/// - 1..=MAX_BUNDLE_MEMBERS members, each with `required_quantity ≥ 1`,
///   no product listed twice
/// - `min_quantity ≥ 1`; `max_quantity ≥ min_quantity` when set
/// - `valid_until ≥ valid_from` when set
/// - `discount_value` range depends on [`DiscountType`]:
///   percentage 0..=10000 bps, fixed ≥ 0 cents, buy_x_get_y 1..=999 units
pub fn validate_bundle(bundle: &BundleDefinition) -> ValidationResult<()> {
    if bundle.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "bundle id".to_string(),
        });
    }

    let name = bundle.name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "bundle name".to_string(),
        });
    }
    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "bundle name".to_string(),
            max: 200,
        });
    }

    if bundle.min_quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "min_quantity".to_string(),
        });
    }

    if let Some(max) = bundle.max_quantity {
        if max < bundle.min_quantity {
            return Err(ValidationError::OutOfRange {
                field: "max_quantity".to_string(),
                min: bundle.min_quantity,
                max: i64::MAX,
            });
        }
    }

    if let Some(until) = bundle.valid_until {
        if until < bundle.valid_from {
            return Err(ValidationError::InvalidFormat {
                field: "valid_until".to_string(),
                reason: "must not be before valid_from".to_string(),
            });
        }
    }

    validate_discount_value(bundle.discount_type, bundle.discount_value)?;
    validate_members(bundle)
}

fn validate_discount_value(kind: DiscountType, value: i64) -> ValidationResult<()> {
    let (min, max) = match kind {
        DiscountType::Percentage => (0, MAX_PERCENTAGE_BPS),
        DiscountType::Fixed => (0, i64::MAX),
        DiscountType::BuyXGetY => (1, MAX_ITEM_QUANTITY),
    };

    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: format!("discount_value ({})", kind),
            min,
            max,
        });
    }

    Ok(())
}

fn validate_members(bundle: &BundleDefinition) -> ValidationResult<()> {
    if bundle.members.is_empty() {
        return Err(ValidationError::Required {
            field: "bundle members".to_string(),
        });
    }

    if bundle.members.len() > MAX_BUNDLE_MEMBERS {
        return Err(ValidationError::OutOfRange {
            field: "bundle members".to_string(),
            min: 1,
            max: MAX_BUNDLE_MEMBERS as i64,
        });
    }

    let mut seen = HashSet::new();
    for member in &bundle.members {
        if member.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "member product_id".to_string(),
            });
        }
        if member.required_quantity < 1 {
            return Err(ValidationError::MustBePositive {
                field: format!("required_quantity for {}", member.product_id),
            });
        }
        if !seen.insert(member.product_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "member product_id".to_string(),
                value: member.product_id.clone(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
