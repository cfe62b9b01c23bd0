//! # Money Module
//!
//! Provides the `Money` type for Rupiah amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rupiah has no minor unit in day-to-day retail.                         │
//! │                                                                         │
//! │    price 12.500 × qty 3 = 37.500        (exact, i64)                    │
//! │    revenue / count      = average       (rounded once, explicitly)      │
//! │                                                                         │
//! │  Floats never touch a price, a subtotal or a report total.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use justcani_core::money::Money;
//!
//! let price = Money::from_rupiah(12_500);
//! let total = price * 2 + Money::from_rupiah(1_000);
//! assert_eq!(total.rupiah(), 26_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole Rupiah.
///
/// Serializes as a bare integer so JSON payloads and the stored item list
/// stay readable: `{"price": 12500}`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole Rupiah.
    ///
    /// ## Example
    /// ```rust
    /// use justcani_core::money::Money;
    ///
    /// let price = Money::from_rupiah(3_500);
    /// assert_eq!(price.rupiah(), 3_500);
    /// ```
    #[inline]
    pub const fn from_rupiah(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the value in Rupiah.
    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity, or `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use justcani_core::money::Money;
    ///
    /// let unit_price = Money::from_rupiah(2_500);
    /// assert_eq!(unit_price.checked_multiply(4), Some(Money::from_rupiah(10_000)));
    /// assert_eq!(Money::from_rupiah(i64::MAX).checked_multiply(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Adds two amounts, or `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Average of this total over `count` items, rounded half away from zero.
    ///
    /// Returns zero when `count` is zero so an empty report never divides.
    ///
    /// ## Example
    /// ```rust
    /// use justcani_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupiah(10_000).average_over(3).rupiah(), 3_333);
    /// assert_eq!(Money::from_rupiah(5).average_over(2).rupiah(), 3);
    /// assert_eq!(Money::from_rupiah(10_000).average_over(0), Money::zero());
    /// ```
    pub fn average_over(&self, count: u64) -> Money {
        if count == 0 {
            return Money::zero();
        }

        // i128 keeps `2 * total` from overflowing on very large sums
        let total = self.0 as i128;
        let count = count as i128;
        let rounded = if total >= 0 {
            (2 * total + count) / (2 * count)
        } else {
            -((-2 * total + count) / (2 * count))
        };

        Money(rounded as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================
//
// Operators saturate at the i64 bounds. Checkout totals go through
// `checked_multiply` / `checked_add` instead.

/// Indonesian display format: `Rp12.500`, dots as thousands separators.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp{}", sign, grouped)
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

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_rupiah(0).to_string(), "Rp0");
        assert_eq!(Money::from_rupiah(500).to_string(), "Rp500");
        assert_eq!(Money::from_rupiah(12_500).to_string(), "Rp12.500");
        assert_eq!(Money::from_rupiah(1_250_000).to_string(), "Rp1.250.000");
        assert_eq!(Money::from_rupiah(-7_000).to_string(), "-Rp7.000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_rupiah(10_000);
        let b = Money::from_rupiah(2_500);

        assert_eq!((a + b).rupiah(), 12_500);
        assert_eq!((a - b).rupiah(), 7_500);
        assert_eq!((b * 3).rupiah(), 7_500);

        let mut running = Money::zero();
        running += a;
        running -= b;
        assert_eq!(running.rupiah(), 7_500);
    }

    #[test]
    fn test_checked_arithmetic() {
        let big = Money::from_rupiah(10_000_000_000_000_000);
        assert_eq!(big.checked_multiply(999), None);
        assert_eq!(big.checked_add(big).and_then(|m| m.checked_add(big)), None);
        assert_eq!(
            Money::from_rupiah(1_500).checked_multiply(3),
            Some(Money::from_rupiah(4_500))
        );
    }

    #[test]
    fn test_operators_saturate() {
        let max = Money::from_rupiah(i64::MAX);
        assert_eq!(max + Money::from_rupiah(1), max);
        assert_eq!(max * 2, max);
        let total: Money = [max, max].iter().sum();
        assert_eq!(total, max);
    }

    #[test]
    fn test_sum() {
        let lines = [
            Money::from_rupiah(1_000),
            Money::from_rupiah(2_000),
            Money::from_rupiah(3_000),
        ];
        let by_ref: Money = lines.iter().sum();
        let by_value: Money = lines.into_iter().sum();
        assert_eq!(by_ref.rupiah(), 6_000);
        assert_eq!(by_value, by_ref);
    }

    #[test]
    fn test_average_rounding() {
        assert_eq!(Money::from_rupiah(10).average_over(4).rupiah(), 3); // 2.5 → 3
        assert_eq!(Money::from_rupiah(9).average_over(4).rupiah(), 2); // 2.25 → 2
        assert_eq!(Money::from_rupiah(-10).average_over(4).rupiah(), -3);
        assert_eq!(Money::from_rupiah(30_000).average_over(3).rupiah(), 10_000);
    }

    #[test]
    fn test_average_of_nothing_is_zero() {
        assert!(Money::from_rupiah(0).average_over(0).is_zero());
        assert!(Money::from_rupiah(99_000).average_over(0).is_zero());
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_rupiah(12_500)).unwrap();
        assert_eq!(json, "12500");

        let back: Money = serde_json::from_str("4000").unwrap();
        assert_eq!(back.rupiah(), 4_000);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_rupiah(1).is_positive());
        assert!(Money::from_rupiah(-1).is_negative());
        assert_eq!(Money::from_rupiah(-550).abs().rupiah(), 550);
    }
}
