//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    199.99 * 0.15 = 29.998499999999996                                  │
//! │                                                                         │
//! │  A 15% bundle on a $199.99 subtotal has to land on a real cent value.  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    19999 cents × 1500 bps / 10000 = 2999.85 → 3000 cents (half-up)     │
//! │    Every rounding step is explicit and happens exactly once.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bundle_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price * 2;                // 21.98
//! let discount = line.percentage(1000); // 10% → 2.20
//! assert_eq!(discount.cents(), 220);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: subtraction of a discount may dip below zero before
///   it is clamped, and that must be observable rather than wrap
/// - **Saturating arithmetic**: `+`, `-`, `*` and `Sum` stop at the `i64`
///   bounds instead of panicking or wrapping
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Currency-agnostic**: the symbol is applied by [`crate::currency`]
///
/// ## Where Money Flows
/// ```text
/// CartLine.unit_price ──► line total ──► eligible subtotal ──► discount
///                                 │                                │
///                                 └──► original total ──► final total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use bundle_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use bundle_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `bps` basis points of this amount, rounded half-up.
    ///
    /// ## Example
    /// ```rust
    /// use bundle_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(10000); // 100.00
    /// assert_eq!(subtotal.percentage(2000).cents(), 2000); // 20%
    /// ```
    ///
    /// ## Implementation
    /// `(amount * bps + 5000) / 10000` in i128, so large carts cannot overflow.
    pub fn percentage(&self, bps: i64) -> Money {
        let cents = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_i128(cents)
    }

    /// Returns `numerator / denominator` of this amount, rounded half-up.
    ///
    /// Used to price "free units" at the average unit price of a group of
    /// lines without ever materializing a fractional average.
    ///
    /// Returns zero when `denominator` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use bundle_core::money::Money;
    ///
    /// // 1 free unit out of 3 units that cost 10.00 in total
    /// let subtotal = Money::from_cents(1000);
    /// assert_eq!(subtotal.prorate(1, 3).cents(), 333);
    /// ```
    pub fn prorate(&self, numerator: i64, denominator: i64) -> Money {
        if denominator == 0 {
            return Money::zero();
        }
        let scaled = self.0 as i128 * numerator as i128;
        let denominator = denominator as i128;
        let cents = scaled.saturating_mul(2).saturating_add(denominator) / (2 * denominator);
        Money::from_i128(cents)
    }

    fn from_i128(cents: i128) -> Money {
        Money(cents.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    /// Clamps the value into `[min, max]`.
    #[inline]
    pub fn clamp_to(self, min: Money, max: Money) -> Money {
        if self < min {
            min
        } else if self > max {
            max
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain amount with two decimals, no symbol. Use
/// [`crate::currency::format_price`] for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
