//! # Currency Formatting
//!
//! Renders [`Money`] for display.
//!
//! ```text
//! format_price(Money(1099), "USD")  →  "$10.99"
//! format_price(Money(1099), "eur")  →  "€10.99"
//! format_price(Money(1099), "CHF")  →  "CHF 10.99"   (no symbol known)
//! ```
//!
//! The store-wide default code comes from configuration; this module never
//! reads the environment itself.

use crate::money::Money;

/// Code used when configuration does not name one.
pub const DEFAULT_CURRENCY: &str = "USD";

const SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("INR", "₹"),
    ("JPY", "¥"),
    ("CAD", "CA$"),
    ("AUD", "A$"),
    ("NGN", "₦"),
];

/// Looks up the display symbol for a currency code (case-insensitive).
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    let code = code.trim();
    SYMBOLS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, symbol)| *symbol)
}

/// Formats an amount with exactly two decimals.
///
/// Unknown codes fall back to the upper-cased code followed by a space.
///
/// ## Example
/// ```rust
/// use bundle_core::currency::format_price;
/// use bundle_core::Money;
///
/// assert_eq!(format_price(Money::from_cents(18000), "USD"), "$180.00");
/// assert_eq!(format_price(Money::from_cents(-250), "GBP"), "-£2.50");
/// assert_eq!(format_price(Money::from_cents(5), "xyz"), "XYZ 0.05");
/// ```
pub fn format_price(amount: Money, code: &str) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let digits = format!("{}.{:02}", amount.major().abs(), amount.minor());

    match currency_symbol(code) {
        Some(symbol) => format!("{}{}{}", sign, symbol, digits),
        None => format!("{}{} {}", sign, code.trim().to_ascii_uppercase(), digits),
    }
}

/// Formatter bound to a store's default currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormatter {
    default_code: String,
}

impl CurrencyFormatter {
    pub fn new(default_code: impl Into<String>) -> Self {
        CurrencyFormatter {
            default_code: default_code.into().trim().to_ascii_uppercase(),
        }
    }

    pub fn default_code(&self) -> &str {
        &self.default_code
    }

    /// Formats in the default currency.
    pub fn format(&self, amount: Money) -> String {
        format_price(amount, &self.default_code)
    }

    /// Formats in an explicit currency, falling back to the default when
    /// `code` is `None`.
    pub fn format_in(&self, amount: Money, code: Option<&str>) -> String {
        format_price(amount, code.unwrap_or(&self.default_code))
    }
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        CurrencyFormatter::new(DEFAULT_CURRENCY)
    }
}
