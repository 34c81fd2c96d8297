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
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a running-balance ledger the error compounds: every entry           │
//! │  captures a before/after balance, so one bad cent poisons every         │
//! │  balance that follows it.                                               │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    All amounts and balances are i64 cents. The database, the            │
//! │    reconciliation fold, and the API all use cents. Only the UI          │
//! │    converts to display units.                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tillbook_core::money::Money;
//!
//! // Create from cents (preferred)
//! let balance = Money::from_cents(100_000); // 1,000.00
//!
//! // Arithmetic operations
//! let after = balance + Money::from_cents(50_000); // 1,500.00
//!
//! // NEVER do this:
//! // let bad = Money::from_float(10.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::EntryDirection;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Channel balances may legitimately go negative
///   (an expense posted against an overdrawn bank account)
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  LedgerEntry.amount ──► Money::applied ──► LedgerEntry.after_balance   │
/// │                                                                         │
/// │  OpeningBalance.amount ──► day fold ──► ClosingBalance per channel     │
/// │                                                                         │
/// │  EVERY monetary value in the ledger flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tillbook_core::money::Money;
    ///
    /// let amount = Money::from_cents(1099); // 10.99
    /// assert_eq!(amount.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use tillbook_core::money::Money;
    ///
    /// let amount = Money::from_major_minor(10, 99); // 10.99
    /// assert_eq!(amount.cents(), 1099);
    ///
    /// let negative = Money::from_major_minor(-5, 50); // -5.50
    /// assert_eq!(negative.cents(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
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

    /// Returns the major unit portion.
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a directional amount to this balance and returns the new
    /// balance.
    ///
    /// This is the single balance rule of the whole ledger:
    /// income adds to the channel, expense subtracts from it.
    ///
    /// ## Example
    /// ```rust
    /// use tillbook_core::money::Money;
    /// use tillbook_core::types::EntryDirection;
    ///
    /// let opening = Money::from_cents(100_000);
    /// let after = opening.applied(EntryDirection::Income, Money::from_cents(50_000));
    /// assert_eq!(after.cents(), 150_000);
    ///
    /// let after = after.applied(EntryDirection::Expense, Money::from_cents(20_000));
    /// assert_eq!(after.cents(), 130_000);
    /// ```
    #[inline]
    pub const fn applied(&self, direction: EntryDirection, amount: Money) -> Money {
        match direction {
            EntryDirection::Income => Money(self.0 + amount.0),
            EntryDirection::Expense => Money(self.0 - amount.0),
        }
    }

    /// Reverses a directional amount from this balance.
    ///
    /// `balance.applied(d, a).unapplied(d, a) == balance` for every
    /// direction and amount. Used when replaying the entry chain backwards.
    #[inline]
    pub const fn unapplied(&self, direction: EntryDirection, amount: Money) -> Money {
        match direction {
            EntryDirection::Income => Money(self.0 - amount.0),
            EntryDirection::Expense => Money(self.0 + amount.0),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Use frontend formatting for actual UI
/// display to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Negation (for presenting expense flows).
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        let money = Money::from_major_minor(10, 99);
        assert_eq!(money.cents(), 1099);

        let negative = Money::from_major_minor(-5, 50);
        assert_eq!(negative.cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-b).cents(), -500);
    }

    #[test]
    fn test_applied_income_adds() {
        let opening = Money::from_cents(100_000);
        let after = opening.applied(EntryDirection::Income, Money::from_cents(50_000));
        assert_eq!(after.cents(), 150_000);
    }

    #[test]
    fn test_applied_expense_subtracts() {
        let opening = Money::from_cents(130_000);
        let after = opening.applied(EntryDirection::Expense, Money::from_cents(20_000));
        assert_eq!(after.cents(), 110_000);
    }

    #[test]
    fn test_applied_unapplied_round_trip() {
        let balance = Money::from_cents(42_37);
        let amount = Money::from_cents(999);

        for direction in [EntryDirection::Income, EntryDirection::Expense] {
            let moved = balance.applied(direction, amount);
            assert_eq!(moved.unapplied(direction, amount), balance);
        }
    }

    /// A balance may go below zero: the ledger records what happened,
    /// it does not enforce overdraft rules.
    #[test]
    fn test_balance_may_go_negative() {
        let opening = Money::from_cents(100);
        let after = opening.applied(EntryDirection::Expense, Money::from_cents(250));
        assert_eq!(after.cents(), -150);
        assert!(after.is_negative());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(positive.is_positive());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }
}
