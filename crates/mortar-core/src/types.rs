//! # Domain Types
//!
//! Core domain types used throughout the Mortar engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Batch       │   │   ProductKey    │   │  CustomerRef    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  name           │   │  id             │       │
//! │  │  price_cents    │   │  dosage_form    │   │  name           │       │
//! │  │  stock_packs    │   │                 │   │  phone          │       │
//! │  │  units_per_pack │   │  (grouping key, │   └─────────────────┘       │
//! │  │  expiry         │   │   not stored)   │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    SaleMode     │   │    SaleType     │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Pack           │   │  Counter        │   │  Cash           │       │
//! │  │  Unit           │   │  Delivery       │   │  Card           │       │
//! │  └─────────────────┘   └─────────────────┘   │  Mobile         │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Unit Inventory
//! A batch is stocked in whole packs but may sell by the loose unit;
//! `units_per_pack` converts between the two representations. The engine
//! keeps every quantity internally in **units** so the conversion is exact
//! integer arithmetic; fractional pack counts appear only in display views.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::discount::DiscountRate;
use crate::money::Money;

// =============================================================================
// Product Key
// =============================================================================

/// The conceptual product identity: (name, dosage form).
///
/// Products are not stored entities; the catalog stores batches and a product
/// is whatever group of batches shares this key. "Panadol / Tablet" and
/// "Panadol / Syrup" are distinct products.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductKey {
    pub name: String,
    pub dosage_form: String,
}

impl ProductKey {
    pub fn new(name: impl Into<String>, dosage_form: impl Into<String>) -> Self {
        ProductKey {
            name: name.into(),
            dosage_form: dosage_form.into(),
        }
    }
}

impl fmt::Display for ProductKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.dosage_form)
    }
}

// =============================================================================
// Batch
// =============================================================================

/// A physical stock lot of a product.
///
/// Batches are owned by the external catalog and are immutable from the
/// engine's perspective within a session: the engine only reads price, stock
/// and expiry here; decrementing authoritative stock happens outside, after
/// a sale is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Unique identifier within the catalog.
    pub id: String,

    /// Product name (half of the product identity).
    pub product_name: String,

    /// Dosage form (the other half: Tablet, Syrup, Capsule, ...).
    pub dosage_form: String,

    /// Catalog category (display/grouping only).
    pub category: String,

    /// Internal stock code. Identification only, not used by engine math.
    pub code: String,

    /// Barcode, if the lot is labeled.
    pub barcode: Option<String>,

    /// Sale price per pack, in cents.
    pub price_cents: i64,

    /// Cost per pack, in cents (drives the discount ceiling).
    pub cost_cents: i64,

    /// Stock on hand, in whole packs.
    pub stock_packs: i64,

    /// Units per pack; 1 means the batch has no loose-unit sale mode.
    pub units_per_pack: i64,

    /// Expiry date. FEFO allocation orders batches by this, ascending.
    #[ts(as = "String")]
    pub expiry: NaiveDate,

    /// Explicit discount-ceiling override. `None` or zero means "derive
    /// from margin" (see [`crate::discount::effective_max_discount`]).
    pub max_discount: Option<DiscountRate>,
}

impl Batch {
    /// Returns the pack sale price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the pack cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// The product identity this batch belongs to.
    pub fn product_key(&self) -> ProductKey {
        ProductKey::new(self.product_name.clone(), self.dosage_form.clone())
    }

    /// Total stock expressed in units. The cart's stock invariant compares
    /// committed units against this.
    #[inline]
    pub const fn stock_units(&self) -> i64 {
        self.stock_packs * self.units_per_pack
    }

    /// Whether this batch can sell loose units at all.
    #[inline]
    pub const fn has_unit_sale(&self) -> bool {
        self.units_per_pack > 1
    }
}

// =============================================================================
// Sale Mode
// =============================================================================

/// How a line's quantity is expressed: whole packs or loose units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleMode {
    /// Quantity counts whole packs.
    Pack,
    /// Quantity counts individual units.
    Unit,
}

impl SaleMode {
    /// True for unit mode.
    #[inline]
    pub const fn is_unit(&self) -> bool {
        matches!(self, SaleMode::Unit)
    }

    /// The opposite mode.
    #[inline]
    pub const fn other(&self) -> SaleMode {
        match self {
            SaleMode::Pack => SaleMode::Unit,
            SaleMode::Unit => SaleMode::Pack,
        }
    }

    /// Converts a quantity expressed in this mode to internal units.
    #[inline]
    pub const fn to_units(&self, quantity: i64, units_per_pack: i64) -> i64 {
        match self {
            SaleMode::Pack => quantity * units_per_pack,
            SaleMode::Unit => quantity,
        }
    }

    /// Converts internal units back to this mode's display quantity.
    /// Pack mode may be fractional (7 units of a 6-pack shows 1.1666...).
    #[inline]
    pub fn display_quantity(&self, units: i64, units_per_pack: i64) -> f64 {
        match self {
            SaleMode::Pack => units as f64 / units_per_pack as f64,
            SaleMode::Unit => units as f64,
        }
    }
}

impl fmt::Display for SaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleMode::Pack => write!(f, "pack"),
            SaleMode::Unit => write!(f, "unit"),
        }
    }
}

/// Splits internal units into (whole packs, loose units).
///
/// ## Example
/// ```rust
/// use mortar_core::types::split_units;
///
/// assert_eq!(split_units(14, 6), (2, 2)); // 2 packs + 2 loose
/// assert_eq!(split_units(5, 1), (5, 0));  // no dual mode
/// ```
#[inline]
pub const fn split_units(units: i64, units_per_pack: i64) -> (i64, i64) {
    if units_per_pack <= 1 {
        (units, 0)
    } else {
        (units / units_per_pack, units % units_per_pack)
    }
}

// =============================================================================
// Sale Type
// =============================================================================

/// Where the sale happens; delivery orders carry a fixed surcharge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    /// Walk-in sale at the counter.
    Counter,
    /// Home delivery; checkout adds the configured delivery fee.
    Delivery,
}

impl Default for SaleType {
    fn default() -> Self {
        SaleType::Counter
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Mobile wallet transfer.
    Mobile,
}

// =============================================================================
// Customer Reference
// =============================================================================

/// A lightweight reference to a customer record owned elsewhere.
/// Sessions without one are walk-in sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    /// Id in the external customer registry, if the customer is on file.
    pub id: Option<String>,
    pub name: String,
    pub phone: Option<String>,
}

impl CustomerRef {
    pub fn named(name: impl Into<String>) -> Self {
        CustomerRef {
            id: None,
            name: name.into(),
            phone: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> Batch {
        Batch {
            id: "b-1".to_string(),
            product_name: "Panadol Extra".to_string(),
            dosage_form: "Tablet".to_string(),
            category: "Analgesic".to_string(),
            code: "PAN-X".to_string(),
            barcode: Some("8964000011223".to_string()),
            price_cents: 1099,
            cost_cents: 850,
            stock_packs: 5,
            units_per_pack: 6,
            expiry: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            max_discount: None,
        }
    }

    #[test]
    fn test_batch_accessors() {
        let b = batch();
        assert_eq!(b.price().cents(), 1099);
        assert_eq!(b.cost().cents(), 850);
        assert_eq!(b.stock_units(), 30);
        assert!(b.has_unit_sale());
        assert_eq!(b.product_key(), ProductKey::new("Panadol Extra", "Tablet"));
    }

    #[test]
    fn test_no_dual_mode_batch() {
        let mut b = batch();
        b.units_per_pack = 1;
        b.stock_packs = 7;
        assert!(!b.has_unit_sale());
        assert_eq!(b.stock_units(), 7);
    }

    #[test]
    fn test_sale_mode_conversions() {
        assert_eq!(SaleMode::Pack.to_units(3, 6), 18);
        assert_eq!(SaleMode::Unit.to_units(3, 6), 3);
        assert_eq!(SaleMode::Pack.other(), SaleMode::Unit);
        assert!(SaleMode::Unit.is_unit());

        assert_eq!(SaleMode::Unit.display_quantity(7, 6), 7.0);
        let packs = SaleMode::Pack.display_quantity(7, 6);
        assert!((packs - 7.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_split_units() {
        assert_eq!(split_units(14, 6), (2, 2));
        assert_eq!(split_units(6, 6), (1, 0));
        assert_eq!(split_units(5, 6), (0, 5));
        assert_eq!(split_units(5, 1), (5, 0));
        assert_eq!(split_units(0, 6), (0, 0));
    }

    #[test]
    fn test_product_key_display() {
        let key = ProductKey::new("Panadol Extra", "Tablet");
        assert_eq!(key.to_string(), "Panadol Extra (Tablet)");
    }

    #[test]
    fn test_serde_camel_case() {
        let b = batch();
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["productName"], "Panadol Extra");
        assert_eq!(json["unitsPerPack"], 6);
        assert_eq!(json["expiry"], "2026-03-31");
    }
}
