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
//! │  In a pharmacy selling loose units:                                     │
//! │    $10.99 pack / 6 units = $1.8316666... per unit                       │
//! │    Summed naively over a cart, the drift shows up on receipts          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Line totals divide ONCE, rounding half-up, per derived amount       │
//! │    1099 cents × 4 units / 6 per pack = 733 cents, exactly, every time  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use mortar_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // $10.99
//!
//! // Arithmetic operations
//! let doubled = price * 2;            // $21.98
//! let total = price + Money::from_cents(500); // $15.99
//!
//! // NEVER do this:
//! // let bad = Money::from_float(10.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::discount::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds, corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## User Workflow Context
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Batch.price_cents ──┬──► line gross (prorated) ──► line net           │
/// │                      │                                                  │
/// │                      └──► Displayed as "$10.99" in UI                   │
/// │                                                                         │
/// │  gross subtotal ──► net items ──► order total ──► grand total          │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
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
    /// use mortar_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    ///
    /// ## Why Cents?
    /// Using the smallest unit eliminates all floating-point concerns.
    /// The catalog, calculations, and API all use cents.
    /// Only the UI converts to a display string.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use mortar_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -$5.50, not -$4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        // Handle sign: if major is negative, minor should subtract
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

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
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

    /// Prorates a per-pack amount over a unit count: `self × units / per_pack`,
    /// rounded half-up, in one division.
    ///
    /// This is the single formula behind every line gross: a pack-mode line is
    /// `units = packs × per_pack`, so the division cancels exactly; a unit-mode
    /// line rounds once, here, never per-unit.
    ///
    /// ## Example
    /// ```rust
    /// use mortar_core::money::Money;
    ///
    /// let pack_price = Money::from_cents(1099); // $10.99 per pack of 6
    ///
    /// // 4 loose units: 1099 × 4 / 6 = 732.67 → 733
    /// assert_eq!(pack_price.prorated(4, 6).cents(), 733);
    ///
    /// // 3 whole packs (18 units): divides exactly
    /// assert_eq!(pack_price.prorated(18, 6).cents(), 3297);
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Batch: Panadol Extra, $10.99 per pack of 6
    /// Line: 4 loose units
    ///      │
    ///      ▼
    /// prorated(4, 6) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Gross: $7.33
    /// ```
    pub fn prorated(&self, units: i64, per_pack: i64) -> Money {
        if per_pack <= 0 {
            return Money::zero();
        }
        // Use i128 to prevent overflow on large amounts
        // Formula: price_cents * units / per_pack
        // With rounding: (price_cents * units + per_pack/2) / per_pack
        let cents =
            (self.0 as i128 * units as i128 + per_pack as i128 / 2) / per_pack as i128;
        Money::from_cents(cents as i64)
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// ## Example
    /// ```rust
    /// use mortar_core::money::Money;
    /// use mortar_core::discount::DiscountRate;
    ///
    /// let gross = Money::from_cents(3000);             // $30.00
    /// let net = gross.apply_discount(DiscountRate::from_percent(10));
    /// assert_eq!(net.cents(), 2700);                   // $27.00
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        // Calculate discount amount with rounding, then subtract
        let discount_amount = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(self.0 - discount_amount as i64)
    }

    /// Expresses this amount as a share of `whole`, in basis points,
    /// rounded half-up. Returns zero when `whole` is not positive.
    ///
    /// Used to derive the effective order discount percent from
    /// `totalDiscount / grossSubtotal`.
    ///
    /// ## Example
    /// ```rust
    /// use mortar_core::money::Money;
    ///
    /// let discount = Money::from_cents(300);
    /// let gross = Money::from_cents(3000);
    /// assert_eq!(discount.percent_of(gross).bps(), 1000); // 10%
    /// ```
    pub fn percent_of(&self, whole: Money) -> DiscountRate {
        if whole.0 <= 0 {
            return DiscountRate::zero();
        }
        let bps = (self.0 as i128 * 10000 + whole.0 as i128 / 2) / whole.0 as i128;
        DiscountRate::from_bps(bps.max(0) as u32)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging. Use frontend formatting for actual UI display
/// to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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

/// Multiplication by integer (for whole-pack calculations).
impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Multiplication by i64.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
