//! # Money Module
//!
//! Provides the `Money` type for tax-inclusive prices entered at the till.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Céntimos for every price                         │
//! │    S/ 11.80 → 1180 céntimos                                             │
//! │                                                                         │
//! │  Derived figures that divide by 1.18 (IGV apportionment) are held as   │
//! │  exact decimals and rounded ONCE, when written to the document.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cajero_core::money::Money;
//!
//! let price = Money::from_cents(1180); // S/ 11.80
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 3540);
//! assert_eq!(line.to_string(), "35.40");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (céntimos for PEN).
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► CartItem.unit_price ──► LineItem.unit_price
///                                                  │
///                                                  ▼
///                                   line total (price × qty)
///                                                  │
///                                                  ▼
///                             TaxBreakdown (exact decimals, see tax.rs)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from céntimos.
    ///
    /// ## Example
    /// ```rust
    /// use cajero_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from soles and céntimos.
    ///
    /// ## Example
    /// ```rust
    /// use cajero_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(118, 0).cents(), 11800);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal amount such as `"11.80"` into céntimos.
    ///
    /// Amounts with more than two decimals are rejected rather than rounded,
    /// since a price entered at the till must already be a valid amount.
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let value: Decimal = text.trim().parse().ok()?;
        Self::from_decimal_exact(value)
    }

    /// Converts an exact two-decimal amount into Money.
    pub fn from_decimal_exact(value: Decimal) -> Option<Self> {
        let scaled = value.checked_mul(Decimal::ONE_HUNDRED)?;
        if !scaled.fract().is_zero() {
            return None;
        }
        i64::try_from(scaled.trunc()).ok().map(Money)
    }

    /// Returns the value in céntimos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (soles) portion.
    #[inline]
    pub const fn soles(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use cajero_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns the exact decimal value (`1180` → `11.80`).
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

// =============================================================================
// Fiscal Rounding
// =============================================================================

/// Rounds an exact amount to two decimals, half away from zero.
///
/// This is the single rounding step applied to every monetary figure that
/// reaches a document: `84.745762...` → `84.75`, `0.125` → `0.13`.
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an exact amount with exactly two decimal digits.
///
/// ## Example
/// ```rust
/// use cajero_core::money::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::new(118, 0)), "118.00");
/// assert_eq!(format_amount(Decimal::new(84745762, 6)), "84.75");
/// ```
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = round_amount(value);
    rounded.rescale(2);
    if rounded.is_zero() {
        // -0.00 must never reach a document
        return "0.00".to_string();
    }
    rounded.to_string()
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal rendering (`35.40`), the way amounts appear in the
/// UBL document and the summary payload. Currency symbols are a UI concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.soles().abs(), self.cents_part())
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
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
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

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.soles(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("11.80"), Some(Money::from_cents(1180)));
        assert_eq!(Money::parse_decimal("3"), Some(Money::from_cents(300)));
        assert_eq!(Money::parse_decimal(" 0.5 "), Some(Money::from_cents(50)));
        assert_eq!(Money::parse_decimal("1.005"), None);
        assert_eq!(Money::parse_decimal("abc"), None);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Money::from_cents(11800).to_decimal(), dec!(118.00));
        assert_eq!(Money::from_cents(5).to_decimal(), dec!(0.05));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_amount(dec!(0.125)), dec!(0.13));
        assert_eq!(round_amount(dec!(0.135)), dec!(0.14));
        assert_eq!(round_amount(dec!(-0.125)), dec!(-0.13));
        assert_eq!(round_amount(dec!(84.7457627118)), dec!(84.75));
    }

    #[test]
    fn test_format_amount_always_two_decimals() {
        assert_eq!(format_amount(dec!(118)), "118.00");
        assert_eq!(format_amount(dec!(18.5)), "18.50");
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(-0.001)), "0.00");
        assert_eq!(format_amount(dec!(15.254237288135593220338983051)), "15.25");
    }
}
