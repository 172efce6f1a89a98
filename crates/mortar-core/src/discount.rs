//! # Discount Module
//!
//! The `DiscountRate` type and the line-discount ceiling policy.
//!
//! ## Policy Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Effective Max Discount (per batch)                         │
//! │                                                                         │
//! │  batch.max_discount set and > 0 ──────────────► use the override        │
//! │                                                                         │
//! │  otherwise derive from margin = (price − cost) / price:                 │
//! │                                                                         │
//! │    margin < 20%  ──► floor(margin / 2) in whole percents                │
//! │                      (5% margin → 2% ceiling)                           │
//! │    margin ≥ 20%  ──► flat 10% ceiling                                   │
//! │                                                                         │
//! │  The ceiling is recomputed on every discount edit and batch switch.     │
//! │  It is a cap on requests, never a default applied on its own.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Batch;

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10%; the margin-derived ceilings land on whole percents,
/// but overrides from the catalog may carry fractional percents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a discount rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a discount rate from whole percents (10 → 10%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        DiscountRate(pct * 100)
    }

    /// Creates a discount rate from a fractional percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        DiscountRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Checks if the discount is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Clamps this rate to at most `max`.
    #[inline]
    pub fn clamp_to(&self, max: DiscountRate) -> DiscountRate {
        DiscountRate(self.0.min(max.0))
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

/// Full discount: 100%.
pub const FULL_DISCOUNT: DiscountRate = DiscountRate::from_bps(10_000);

// =============================================================================
// Ceiling Policy
// =============================================================================

/// Computes the effective maximum discount for a line on `batch`.
///
/// If the batch carries an explicit positive override, that wins. Otherwise
/// the ceiling derives from the price/cost margin: thin margins (under 20%)
/// allow half the margin, floored to a whole percent; healthy margins allow
/// a flat 10%. A non-positive price or an upside-down margin yields zero.
///
/// ## Example
/// ```rust
/// use mortar_core::discount::{effective_max_discount, DiscountRate};
/// use mortar_core::types::Batch;
/// use chrono::NaiveDate;
///
/// let mut batch = Batch {
///     id: "b-1".into(),
///     product_name: "Amoxil 500mg".into(),
///     dosage_form: "Capsule".into(),
///     category: "Antibiotic".into(),
///     code: "AMX-500".into(),
///     barcode: None,
///     price_cents: 10_000,
///     cost_cents: 9_500,
///     stock_packs: 10,
///     units_per_pack: 12,
///     expiry: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
///     max_discount: None,
/// };
///
/// // 5% margin → floor(5/2) = 2%
/// assert_eq!(effective_max_discount(&batch), DiscountRate::from_percent(2));
///
/// batch.max_discount = Some(DiscountRate::from_percent(15));
/// assert_eq!(effective_max_discount(&batch), DiscountRate::from_percent(15));
/// ```
pub fn effective_max_discount(batch: &Batch) -> DiscountRate {
    if let Some(cap) = batch.max_discount {
        if !cap.is_zero() {
            return cap;
        }
    }

    if batch.price_cents <= 0 {
        return DiscountRate::zero();
    }

    // Margin in basis points, floored; negative margin (cost above price)
    // clamps to zero so the ceiling never goes below "no discount"
    let margin_bps = ((batch.price_cents - batch.cost_cents) as i128 * 10_000
        / batch.price_cents as i128)
        .max(0) as u32;

    if margin_bps < 2_000 {
        // Half the margin, floored to a whole percent
        DiscountRate::from_bps(margin_bps / 200 * 100)
    } else {
        DiscountRate::from_percent(10)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
