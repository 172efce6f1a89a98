//! # Batch Allocator
//!
//! Picks which batch (or batches) of a product actually fill a requested
//! quantity. Two entry points:
//!
//! - [`select_for_product`] answers "which single batch should a fresh add
//!   go to" with first-expiry-first-out (FEFO) over unreserved stock.
//! - [`switch_batch_with_auto_split`] rebuilds every cart row of one
//!   product against a newly chosen target batch, spilling overflow into
//!   later-expiring batches.
//!
//! ## Auto-Split
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ switch_batch_with_auto_split(product, target, packs, units)          │
//! │                                                                      │
//! │  1. group  = product's batches, ascending expiry                     │
//! │  2. pull every row of this product out of the cart,                  │
//! │     remembering the first row's position                             │
//! │  3. order  = [target, …rest by expiry]                               │
//! │  4. packs  : take min(needed, batch stock) from each in order        │
//! │  5. units  : take from each batch's stock LEFT AFTER step 4,         │
//! │              (stock_packs − packs_used) × units_per_pack             │
//! │  6. splice the rebuilt rows back in at the remembered position       │
//! │  7. anything unfilled is reported as shortfall, never an error       │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The rebuilt rows always start undiscounted; a batch switch is a new
//! pricing decision.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::cart::{BatchEntry, Cart, LineSlot};
use crate::catalog::BatchCatalog;
use crate::error::{CartOutcome, RejectReason};
use crate::types::{Batch, ProductKey, SaleMode};

// =============================================================================
// Allocation Report
// =============================================================================

/// One line the allocator wrote into the cart: `quantity` is in the mode's
/// own terms (packs for pack mode, loose units for unit mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AllocatedLine {
    pub batch_id: String,
    pub mode: SaleMode,
    pub quantity: i64,
}

/// What an auto-split actually did. The cart mutation itself never fails;
/// callers that want to warn the user about partial fulfillment read the
/// shortfall here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AllocationReport {
    pub product: ProductKey,
    pub target_batch_id: String,
    pub requested_packs: i64,
    pub requested_units: i64,
    pub allocated_packs: i64,
    pub allocated_units: i64,
    pub lines: Vec<AllocatedLine>,
}

impl AllocationReport {
    fn new(product: ProductKey, target_batch_id: &str, packs: i64, units: i64) -> Self {
        AllocationReport {
            product,
            target_batch_id: target_batch_id.to_string(),
            requested_packs: packs,
            requested_units: units,
            allocated_packs: 0,
            allocated_units: 0,
            lines: Vec::new(),
        }
    }

    /// Whole packs that could not be placed.
    pub const fn shortfall_packs(&self) -> i64 {
        self.requested_packs - self.allocated_packs
    }

    /// Loose units that could not be placed.
    pub const fn shortfall_units(&self) -> i64 {
        self.requested_units - self.allocated_units
    }

    /// True when the full request landed in the cart.
    pub const fn is_complete(&self) -> bool {
        self.shortfall_packs() == 0 && self.shortfall_units() == 0
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Stock not yet claimed by this cart, in units.
fn unreserved_units(batch: &Batch, cart: &Cart) -> i64 {
    batch.stock_units() - cart.committed_units(&batch.id)
}

/// Picks the batch a fresh add should go to.
///
/// An explicit batch id wins if it belongs to the product and still has
/// unreserved stock. Otherwise the first batch by ascending expiry with
/// unreserved stock wins (FEFO; catalog order breaks expiry ties). `None`
/// when every batch of the product is exhausted or unknown.
pub fn select_for_product(
    catalog: &dyn BatchCatalog,
    cart: &Cart,
    product: &ProductKey,
    explicit_batch_id: Option<&str>,
) -> Option<Batch> {
    let mut group = catalog.batches_for_product(product);

    if let Some(id) = explicit_batch_id {
        if let Some(batch) = group.iter().find(|b| b.id == id) {
            if unreserved_units(batch, cart) > 0 {
                return Some(batch.clone());
            }
            debug!(batch_id = %id, "Requested batch exhausted, falling back to FEFO");
        }
    }

    group.sort_by_key(|b| b.expiry);
    group.into_iter().find(|b| unreserved_units(b, cart) > 0)
}

/// Adds one pack of the selected batch to the cart. This is the plain
/// "tap a product" path: selection via [`select_for_product`], then a
/// normal validated add.
pub fn add_product(
    cart: &mut Cart,
    catalog: &dyn BatchCatalog,
    product: &ProductKey,
    explicit_batch_id: Option<&str>,
) -> CartOutcome {
    let Some(batch) = select_for_product(catalog, cart, product, explicit_batch_id) else {
        debug!(product = %product, "No batch with unreserved stock");
        return CartOutcome::Rejected(RejectReason::NoAvailableBatch {
            product: product.to_string(),
        });
    };
    cart.add_line(&batch, SaleMode::Pack, 1)
}

// =============================================================================
// Auto-Split
// =============================================================================

fn push_slot(rows: &mut Vec<BatchEntry>, batch_id: &str, mode: SaleMode, units: i64) {
    let idx = match rows.iter().position(|r| r.batch_id == batch_id) {
        Some(i) => i,
        None => {
            rows.push(BatchEntry::new(batch_id));
            rows.len() - 1
        }
    };
    let slot = match mode {
        SaleMode::Pack => &mut rows[idx].pack,
        SaleMode::Unit => &mut rows[idx].unit,
    };
    *slot = Some(LineSlot::new(units));
}

/// Rebuilds every cart row of `product` against `target_batch_id`,
/// spilling quantity the target cannot hold into later-expiring batches.
///
/// The cart ends up holding at most the requested quantities, placed at
/// the position the product's rows previously occupied (appended at the
/// end when the product had no rows). Requests the combined stock cannot
/// cover are partially filled; the gap comes back in the report rather
/// than as an error.
///
/// A target id that does not belong to the product is ignored and the
/// order is pure FEFO. A product with no batches at all leaves the cart
/// untouched.
pub fn switch_batch_with_auto_split(
    cart: &mut Cart,
    catalog: &dyn BatchCatalog,
    product: &ProductKey,
    target_batch_id: &str,
    requested_packs: i64,
    requested_units: i64,
) -> AllocationReport {
    let requested_packs = requested_packs.max(0);
    let requested_units = requested_units.max(0);
    let mut report =
        AllocationReport::new(product.clone(), target_batch_id, requested_packs, requested_units);

    let mut group = catalog.batches_for_product(product);
    if group.is_empty() {
        debug!(product = %product, "Auto-split found no batches, cart untouched");
        return report;
    }
    group.sort_by_key(|b| b.expiry);
    if let Some(pos) = group.iter().position(|b| b.id == target_batch_id) {
        let target = group.remove(pos);
        group.insert(0, target);
    }

    let ids: Vec<&str> = group.iter().map(|b| b.id.as_str()).collect();
    let insert_at = cart.extract_rows(&ids);

    let mut rows: Vec<BatchEntry> = Vec::new();
    let mut packs_used = vec![0i64; group.len()];

    let mut packs_needed = requested_packs;
    for (i, batch) in group.iter().enumerate() {
        if packs_needed == 0 {
            break;
        }
        let take = packs_needed.min(batch.stock_packs);
        if take <= 0 {
            continue;
        }
        packs_used[i] = take;
        packs_needed -= take;
        push_slot(&mut rows, &batch.id, SaleMode::Pack, take * batch.units_per_pack);
        report.lines.push(AllocatedLine {
            batch_id: batch.id.clone(),
            mode: SaleMode::Pack,
            quantity: take,
        });
        debug!(batch_id = %batch.id, packs = take, "Auto-split allocated packs");
    }

    let mut units_needed = requested_units;
    for (i, batch) in group.iter().enumerate() {
        if units_needed == 0 {
            break;
        }
        if !batch.has_unit_sale() {
            continue;
        }
        let available = (batch.stock_packs - packs_used[i]) * batch.units_per_pack;
        let take = units_needed.min(available);
        if take <= 0 {
            continue;
        }
        units_needed -= take;
        push_slot(&mut rows, &batch.id, SaleMode::Unit, take);
        report.lines.push(AllocatedLine {
            batch_id: batch.id.clone(),
            mode: SaleMode::Unit,
            quantity: take,
        });
        debug!(batch_id = %batch.id, units = take, "Auto-split allocated units");
    }

    report.allocated_packs = requested_packs - packs_needed;
    report.allocated_units = requested_units - units_needed;

    cart.insert_rows_at(insert_at, rows);

    if !report.is_complete() {
        debug!(
            product = %product,
            shortfall_packs = report.shortfall_packs(),
            shortfall_units = report.shortfall_units(),
            "Auto-split could not fill the full request"
        );
    }
    report
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn batch_of(
        id: &str,
        name: &str,
        expiry: (i32, u32, u32),
        stock_packs: i64,
        units_per_pack: i64,
    ) -> Batch {
        Batch {
            id: id.to_string(),
            product_name: name.to_string(),
            dosage_form: "Tablet".to_string(),
            category: "General".to_string(),
            code: format!("C-{}", id),
            barcode: None,
            price_cents: 1000,
            cost_cents: 500,
            stock_packs,
            units_per_pack,
            expiry: NaiveDate::from_ymd_opt(expiry.0, expiry.1, expiry.2).unwrap(),
            max_discount: None,
        }
    }

    fn key(name: &str) -> ProductKey {
        ProductKey {
            name: name.to_string(),
            dosage_form: "Tablet".to_string(),
        }
    }

    #[test]
    fn test_select_picks_earliest_expiry() {
        let catalog = vec![
            batch_of("jan25", "Amoxil", (2025, 1, 31), 5, 1),
            batch_of("jun25", "Amoxil", (2025, 6, 30), 5, 1),
            batch_of("dec24", "Amoxil", (2024, 12, 31), 5, 1),
        ];
        let cart = Cart::new();

        let picked = select_for_product(&catalog, &cart, &key("Amoxil"), None).unwrap();
        assert_eq!(picked.id, "dec24");
    }

    #[test]
    fn test_select_honors_explicit_batch_with_stock() {
        let catalog = vec![
            batch_of("early", "Amoxil", (2024, 12, 31), 5, 1),
            batch_of("late", "Amoxil", (2025, 6, 30), 5, 1),
        ];
        let cart = Cart::new();

        let picked = select_for_product(&catalog, &cart, &key("Amoxil"), Some("late")).unwrap();
        assert_eq!(picked.id, "late");
    }

    #[test]
    fn test_select_falls_back_when_explicit_exhausted() {
        let catalog = vec![
            batch_of("early", "Amoxil", (2024, 12, 31), 5, 1),
            batch_of("late", "Amoxil", (2025, 6, 30), 2, 1),
        ];
        let mut cart = Cart::new();
        cart.add_line(&catalog[1], SaleMode::Pack, 2); // drains "late"

        let picked = select_for_product(&catalog, &cart, &key("Amoxil"), Some("late")).unwrap();
        assert_eq!(picked.id, "early");
    }

    #[test]
    fn test_select_skips_cart_reserved_batches() {
        let catalog = vec![
            batch_of("early", "Amoxil", (2024, 12, 31), 1, 6),
            batch_of("late", "Amoxil", (2025, 6, 30), 3, 6),
        ];
        let mut cart = Cart::new();
        cart.add_line(&catalog[0], SaleMode::Unit, 6); // all 6 units of "early"

        let picked = select_for_product(&catalog, &cart, &key("Amoxil"), None).unwrap();
        assert_eq!(picked.id, "late");
    }

    #[test]
    fn test_select_none_when_everything_drained() {
        let catalog = vec![batch_of("only", "Amoxil", (2025, 1, 31), 1, 1)];
        let mut cart = Cart::new();
        cart.add_line(&catalog[0], SaleMode::Pack, 1);

        assert!(select_for_product(&catalog, &cart, &key("Amoxil"), None).is_none());
    }

    #[test]
    fn test_add_product_default_is_one_pack_fefo() {
        let catalog = vec![
            batch_of("late", "Amoxil", (2025, 6, 30), 5, 6),
            batch_of("early", "Amoxil", (2025, 1, 31), 5, 6),
        ];
        let mut cart = Cart::new();

        assert!(add_product(&mut cart, &catalog, &key("Amoxil"), None).took_effect());
        assert_eq!(cart.committed_units("early"), 6);
        assert_eq!(cart.committed_units("late"), 0);
    }

    #[test]
    fn test_add_product_rejects_unknown_product() {
        let catalog: Vec<Batch> = Vec::new();
        let mut cart = Cart::new();

        let outcome = add_product(&mut cart, &catalog, &key("Ghost"), None);
        assert!(matches!(
            outcome,
            CartOutcome::Rejected(RejectReason::NoAvailableBatch { .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_auto_split_spills_into_next_expiry() {
        // A: Jan, 2 packs. B: Mar, 5 packs. Request 4 packs from A → A:2, B:2.
        let catalog = vec![
            batch_of("A", "Panadol", (2025, 1, 31), 2, 1),
            batch_of("B", "Panadol", (2025, 3, 31), 5, 1),
        ];
        let mut cart = Cart::new();

        let report =
            switch_batch_with_auto_split(&mut cart, &catalog, &key("Panadol"), "A", 4, 0);

        assert!(report.is_complete());
        assert_eq!(report.allocated_packs, 4);
        assert_eq!(cart.committed_units("A"), 2);
        assert_eq!(cart.committed_units("B"), 2);
        assert_eq!(
            report.lines,
            vec![
                AllocatedLine {
                    batch_id: "A".to_string(),
                    mode: SaleMode::Pack,
                    quantity: 2
                },
                AllocatedLine {
                    batch_id: "B".to_string(),
                    mode: SaleMode::Pack,
                    quantity: 2
                },
            ]
        );
    }

    #[test]
    fn test_auto_split_reports_shortfall() {
        // 7 packs in the whole group, 10 requested → 3 short, no error.
        let catalog = vec![
            batch_of("A", "Panadol", (2025, 1, 31), 2, 1),
            batch_of("B", "Panadol", (2025, 3, 31), 5, 1),
        ];
        let mut cart = Cart::new();

        let report =
            switch_batch_with_auto_split(&mut cart, &catalog, &key("Panadol"), "A", 10, 0);

        assert!(!report.is_complete());
        assert_eq!(report.allocated_packs, 7);
        assert_eq!(report.shortfall_packs(), 3);
        assert_eq!(cart.committed_units("A") + cart.committed_units("B"), 7);
    }

    #[test]
    fn test_auto_split_target_first_then_fefo() {
        // Target is the LATER batch: it still gets drained first.
        let catalog = vec![
            batch_of("early", "Panadol", (2025, 1, 31), 5, 1),
            batch_of("late", "Panadol", (2025, 6, 30), 3, 1),
        ];
        let mut cart = Cart::new();

        let report =
            switch_batch_with_auto_split(&mut cart, &catalog, &key("Panadol"), "late", 4, 0);

        assert!(report.is_complete());
        assert_eq!(cart.committed_units("late"), 3);
        assert_eq!(cart.committed_units("early"), 1);
    }

    #[test]
    fn test_auto_split_units_use_stock_left_after_packs() {
        // One batch, 2 packs of 10. Request 1 pack + 15 units: the pack
        // uses 10, leaving 10 units; 5 of the unit request go unfilled.
        let catalog = vec![batch_of("A", "Syrup", (2025, 1, 31), 2, 10)];
        let mut cart = Cart::new();

        let report = switch_batch_with_auto_split(&mut cart, &catalog, &key("Syrup"), "A", 1, 15);

        assert_eq!(report.allocated_packs, 1);
        assert_eq!(report.allocated_units, 10);
        assert_eq!(report.shortfall_units(), 5);

        let entry = cart.entry("A").unwrap();
        assert_eq!(entry.pack.as_ref().unwrap().units, 10);
        assert_eq!(entry.unit.as_ref().unwrap().units, 10);
    }

    #[test]
    fn test_auto_split_units_skip_single_unit_packs() {
        // "A" expires first but has no loose-unit mode; units must come from "B".
        let catalog = vec![
            batch_of("A", "Mix", (2025, 1, 31), 5, 1),
            batch_of("B", "Mix", (2025, 6, 30), 2, 6),
        ];
        let mut cart = Cart::new();

        let report = switch_batch_with_auto_split(&mut cart, &catalog, &key("Mix"), "A", 0, 8);

        assert_eq!(report.allocated_units, 8);
        assert_eq!(cart.committed_units("A"), 0);
        assert_eq!(cart.committed_units("B"), 8);
    }

    #[test]
    fn test_auto_split_preserves_row_position() {
        let other1 = batch_of("X", "Other1", (2025, 1, 1), 9, 1);
        let other2 = batch_of("Y", "Other2", (2025, 1, 1), 9, 1);
        let catalog = vec![
            other1.clone(),
            other2.clone(),
            batch_of("P1", "Panadol", (2025, 1, 31), 2, 1),
            batch_of("P2", "Panadol", (2025, 3, 31), 5, 1),
        ];

        let mut cart = Cart::new();
        cart.add_line(&other1, SaleMode::Pack, 1);
        cart.add_line(&catalog[2], SaleMode::Pack, 1); // P1 sits at index 1
        cart.add_line(&other2, SaleMode::Pack, 1);

        switch_batch_with_auto_split(&mut cart, &catalog, &key("Panadol"), "P1", 4, 0);

        let ids: Vec<&str> = cart.entries().iter().map(|e| e.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["X", "P1", "P2", "Y"]);
    }

    #[test]
    fn test_auto_split_appends_when_product_not_in_cart() {
        let other = batch_of("X", "Other", (2025, 1, 1), 9, 1);
        let catalog = vec![other.clone(), batch_of("P", "Panadol", (2025, 3, 31), 5, 1)];

        let mut cart = Cart::new();
        cart.add_line(&other, SaleMode::Pack, 1);

        switch_batch_with_auto_split(&mut cart, &catalog, &key("Panadol"), "P", 2, 0);

        let ids: Vec<&str> = cart.entries().iter().map(|e| e.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["X", "P"]);
    }

    #[test]
    fn test_auto_split_resets_discounts() {
        let catalog = vec![
            batch_of("A", "Panadol", (2025, 1, 31), 5, 1),
            batch_of("B", "Panadol", (2025, 3, 31), 5, 1),
        ];
        let mut cart = Cart::new();
        cart.add_line(&catalog[0], SaleMode::Pack, 2);
        cart.set_line_discount(&catalog[0], SaleMode::Pack, crate::DiscountRate::from_percent(10));

        switch_batch_with_auto_split(&mut cart, &catalog, &key("Panadol"), "B", 2, 0);

        let entry = cart.entry("B").unwrap();
        assert!(entry.pack.as_ref().unwrap().discount.is_zero());
    }

    #[test]
    fn test_auto_split_unknown_target_degrades_to_fefo() {
        let catalog = vec![
            batch_of("early", "Panadol", (2025, 1, 31), 5, 1),
            batch_of("late", "Panadol", (2025, 6, 30), 5, 1),
        ];
        let mut cart = Cart::new();

        let report =
            switch_batch_with_auto_split(&mut cart, &catalog, &key("Panadol"), "ghost", 3, 0);

        assert!(report.is_complete());
        assert_eq!(cart.committed_units("early"), 3);
    }

    #[test]
    fn test_auto_split_no_batches_leaves_cart_alone() {
        let other = batch_of("X", "Other", (2025, 1, 1), 9, 1);
        let catalog = vec![other.clone()];
        let mut cart = Cart::new();
        cart.add_line(&other, SaleMode::Pack, 1);

        let report = switch_batch_with_auto_split(&mut cart, &catalog, &key("Ghost"), "A", 2, 0);

        assert_eq!(report.allocated_packs, 0);
        assert_eq!(cart.entry_count(), 1);
        assert_eq!(cart.committed_units("X"), 1);
    }

    #[test]
    fn test_auto_split_replaces_previous_rows_not_stacks() {
        // Switching twice must not double the committed quantity.
        let catalog = vec![
            batch_of("A", "Panadol", (2025, 1, 31), 5, 1),
            batch_of("B", "Panadol", (2025, 3, 31), 5, 1),
        ];
        let mut cart = Cart::new();
        cart.add_line(&catalog[0], SaleMode::Pack, 3);

        switch_batch_with_auto_split(&mut cart, &catalog, &key("Panadol"), "B", 3, 0);
        switch_batch_with_auto_split(&mut cart, &catalog, &key("Panadol"), "A", 3, 0);

        assert_eq!(cart.committed_units("A") + cart.committed_units("B"), 3);
        assert_eq!(cart.committed_units("A"), 3);
    }
}
