//! # Error Types
//!
//! Domain-specific error types for bundle-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bundle-core errors (this file)                                        │
//! │  ├── CoreError        - Cart rule violations                           │
//! │  └── ValidationError  - Input / bundle definition validation failures  │
//! │                                                                         │
//! │  bundle-store errors (separate crate)                                  │
//! │  └── DbError          - Database, cache, and malformed catalog rows    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError / DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The discount engine itself never returns an error: a bundle that does not
//! qualify is simply `None`. Everything that can be wrong with a bundle
//! definition is caught by [`crate::validation`] before evaluation.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Cart and pricing errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The product has no line in the cart.
    #[error("Product {0} not in cart")]
    ProductNotInCart(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    ///
    /// ## When This Occurs
    /// ```text
    /// Cart has 998 × P1
    ///      │
    ///      ▼
    /// add_line(P1, qty: 5)
    ///      │
    ///      ▼
    /// QuantityTooLarge { requested: 1003, max: 999 }
    /// ```
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Two lines for the same product disagree on price.
    ///
    /// Merging them would keep one price and drop the other.
    #[error("Product {product_id} appears with different prices")]
    PriceMismatch { product_id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used at the boundaries: cart mutations and catalog fetches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., the same product listed twice in a bundle).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
