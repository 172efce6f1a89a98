//! # Cart Engine
//!
//! Owns the line items of one order and every rule about mutating them.
//!
//! ## The Two-Slot Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart = ordered rows, one per batch                   │
//! │                                                                         │
//! │   entries: ┌──────────────────────────────────────────────┐             │
//! │            │ BatchEntry "batch-17"                        │             │
//! │            │   pack: Some(LineSlot { units: 12, 0% })     │  ◄── one    │
//! │            │   unit: Some(LineSlot { units: 3,  2% })     │      row    │
//! │            ├──────────────────────────────────────────────┤             │
//! │            │ BatchEntry "batch-02"                        │             │
//! │            │   pack: Some(LineSlot { units: 6, 0% })      │             │
//! │            │   unit: None                                 │             │
//! │            └──────────────────────────────────────────────┘             │
//! │                                                                         │
//! │   At most one pack slot and one unit slot per batch id, by              │
//! │   construction. Quantities are INTERNAL UNITS in both slots;            │
//! │   a pack slot holding 12 units of a 6-per-pack batch displays "2".      │
//! │                                                                         │
//! │   Stock rule, per batch: pack.units + unit.units ≤ stock × per_pack     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Mutation Contract
//! Every operation validates against a snapshot of the current state and
//! either installs the whole new state or changes nothing. Violations are
//! silent no-ops; the returned [`CartOutcome`] says which, for hosts that
//! want to tell the user.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::catalog::BatchCatalog;
use crate::discount::{effective_max_discount, DiscountRate, FULL_DISCOUNT};
use crate::error::{CartOutcome, RejectReason};
use crate::money::Money;
use crate::types::{Batch, SaleMode};

// =============================================================================
// Line Slot
// =============================================================================

/// One addressable line: the quantity and discount of a (batch, mode) pair.
///
/// Quantity is stored in internal units regardless of mode, so pack↔unit
/// conversion never rounds. The mode itself lives in the owning
/// [`BatchEntry`] (which of its two slots this is).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineSlot {
    /// Quantity in internal units.
    pub units: i64,

    /// Line discount; capped by the batch's effective max on every edit.
    pub discount: DiscountRate,
}

impl LineSlot {
    /// A fresh undiscounted slot.
    pub const fn new(units: i64) -> Self {
        LineSlot {
            units,
            discount: DiscountRate::zero(),
        }
    }

    /// Line gross: pack price prorated over this slot's units, one rounding.
    pub fn gross_total(&self, batch: &Batch) -> Money {
        batch.price().prorated(self.units, batch.units_per_pack)
    }

    /// Line net after the line discount. This is the line total shown on
    /// the row and summed into the item total.
    pub fn net_total(&self, batch: &Batch) -> Money {
        self.gross_total(batch).apply_discount(self.discount)
    }
}

// =============================================================================
// Batch Entry
// =============================================================================

/// One cart row: both slots of a single batch id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub batch_id: String,
    pub pack: Option<LineSlot>,
    pub unit: Option<LineSlot>,
}

impl BatchEntry {
    pub(crate) fn new(batch_id: impl Into<String>) -> Self {
        BatchEntry {
            batch_id: batch_id.into(),
            pack: None,
            unit: None,
        }
    }

    /// The slot for `mode`, if present.
    pub fn slot(&self, mode: SaleMode) -> Option<&LineSlot> {
        match mode {
            SaleMode::Pack => self.pack.as_ref(),
            SaleMode::Unit => self.unit.as_ref(),
        }
    }

    fn slot_mut(&mut self, mode: SaleMode) -> Option<&mut LineSlot> {
        match mode {
            SaleMode::Pack => self.pack.as_mut(),
            SaleMode::Unit => self.unit.as_mut(),
        }
    }

    fn slot_opt_mut(&mut self, mode: SaleMode) -> &mut Option<LineSlot> {
        match mode {
            SaleMode::Pack => &mut self.pack,
            SaleMode::Unit => &mut self.unit,
        }
    }

    /// Units committed to this batch across both slots. The stock rule
    /// compares this against `stock × units_per_pack`.
    pub fn committed_units(&self) -> i64 {
        self.pack.as_ref().map_or(0, |s| s.units) + self.unit.as_ref().map_or(0, |s| s.units)
    }

    /// True when both slots are gone (the row should disappear).
    /// Distinct from `committed_units() == 0`: a slot sitting at zero
    /// quantity still occupies the row and blocks checkout.
    fn has_no_slots(&self) -> bool {
        self.pack.is_none() && self.unit.is_none()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart engine for one order.
///
/// ## Invariants
/// - At most one pack slot and one unit slot per batch id (structural)
/// - Per batch: committed units never exceed `stock × units_per_pack`
/// - At most one discount mechanism active: any positive line discount
///   forces the order discount to zero, and vice versa
///
/// Fields are private so every mutation goes through the validating
/// operations; reads go through [`entries`](Cart::entries) and the views.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    entries: Vec<BatchEntry>,
    order_discount: DiscountRate,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            entries: Vec::new(),
            order_discount: DiscountRate::zero(),
        }
    }

    // ===== Reads =====

    /// All rows, in display order.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// The row for a batch id, if present.
    pub fn entry(&self, batch_id: &str) -> Option<&BatchEntry> {
        self.entries.iter().find(|e| e.batch_id == batch_id)
    }

    /// Units committed to a batch across both slots (0 if absent).
    pub fn committed_units(&self, batch_id: &str) -> i64 {
        self.entry(batch_id).map_or(0, |e| e.committed_units())
    }

    /// The active order-level discount.
    pub fn order_discount(&self) -> DiscountRate {
        self.order_discount
    }

    /// Number of rows.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of occupied slots across all rows.
    pub fn line_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.pack.is_some() as usize + e.unit.is_some() as usize)
            .sum()
    }

    /// Checks if the cart has no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checkout eligibility: at least one row, and no row stuck at a
    /// combined quantity of zero.
    pub fn is_checkout_eligible(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| e.committed_units() > 0)
    }

    // ===== Mutations =====

    /// Adds quantity to the (batch, mode) slot, creating row and slot as
    /// needed. Merging into an existing slot keeps that slot's discount.
    ///
    /// Rejects without touching the cart when the quantity is not positive,
    /// when unit mode is requested on a batch with no loose-unit sale, or
    /// when the batch's combined committed units would exceed its stock.
    pub fn add_line(&mut self, batch: &Batch, mode: SaleMode, quantity: i64) -> CartOutcome {
        if quantity <= 0 {
            return CartOutcome::Rejected(RejectReason::NonPositiveQuantity);
        }
        if mode.is_unit() && !batch.has_unit_sale() {
            return CartOutcome::Rejected(RejectReason::UnitModeUnavailable {
                batch_id: batch.id.clone(),
            });
        }

        let add_units = mode.to_units(quantity, batch.units_per_pack);
        let committed = self.committed_units(&batch.id);
        if committed + add_units > batch.stock_units() {
            debug!(
                batch_id = %batch.id,
                requested = add_units,
                available = batch.stock_units() - committed,
                "Add rejected: insufficient stock"
            );
            return CartOutcome::Rejected(RejectReason::InsufficientStock {
                batch_id: batch.id.clone(),
                available_units: batch.stock_units() - committed,
                requested_units: add_units,
            });
        }

        let idx = match self.entries.iter().position(|e| e.batch_id == batch.id) {
            Some(i) => i,
            None => {
                self.entries.push(BatchEntry::new(&batch.id));
                self.entries.len() - 1
            }
        };
        let slot = self.entries[idx].slot_opt_mut(mode);
        match slot {
            Some(line) => line.units += add_units,
            None => *slot = Some(LineSlot::new(add_units)),
        }

        debug!(batch_id = %batch.id, mode = %mode, units = add_units, "Line added");
        CartOutcome::Applied
    }

    /// Deletes exactly one (batch, mode) slot. The row disappears when its
    /// last slot goes.
    pub fn remove_line(&mut self, batch_id: &str, mode: SaleMode) -> CartOutcome {
        let Some(idx) = self.entries.iter().position(|e| e.batch_id == batch_id) else {
            return CartOutcome::Rejected(RejectReason::MissingLine {
                batch_id: batch_id.to_string(),
                mode: mode.to_string(),
            });
        };

        if self.entries[idx].slot_opt_mut(mode).take().is_none() {
            return CartOutcome::Rejected(RejectReason::MissingLine {
                batch_id: batch_id.to_string(),
                mode: mode.to_string(),
            });
        }
        if self.entries[idx].has_no_slots() {
            self.entries.remove(idx);
        }

        debug!(batch_id = %batch_id, mode = %mode, "Line removed");
        CartOutcome::Applied
    }

    /// Deletes the whole row for a batch id, both slots ("delete row" UX).
    pub fn remove_product(&mut self, batch_id: &str) -> CartOutcome {
        let Some(idx) = self.entries.iter().position(|e| e.batch_id == batch_id) else {
            return CartOutcome::Rejected(RejectReason::MissingBatch {
                batch_id: batch_id.to_string(),
            });
        };
        self.entries.remove(idx);
        debug!(batch_id = %batch_id, "Row removed");
        CartOutcome::Applied
    }

    /// Applies a signed delta (in the slot's own mode: packs or units) to
    /// an existing slot.
    ///
    /// ## Floors
    /// - No dual mode (`units_per_pack = 1`): the line cannot decrement
    ///   below 1 pack; removal is a separate action.
    /// - Dual mode: either slot may sit at 0 (the row then blocks checkout
    ///   until removed or refilled).
    ///
    /// The combined-units stock rule is checked against the other slot's
    /// current quantity. Any violation is a no-op.
    pub fn update_quantity(&mut self, batch: &Batch, mode: SaleMode, delta: i64) -> CartOutcome {
        let Some(entry) = self.entries.iter_mut().find(|e| e.batch_id == batch.id) else {
            return CartOutcome::Rejected(RejectReason::MissingLine {
                batch_id: batch.id.clone(),
                mode: mode.to_string(),
            });
        };
        let Some(slot) = entry.slot(mode) else {
            return CartOutcome::Rejected(RejectReason::MissingLine {
                batch_id: batch.id.clone(),
                mode: mode.to_string(),
            });
        };

        let cur_units = slot.units;
        let other_units = entry.slot(mode.other()).map_or(0, |s| s.units);
        let new_units = cur_units + mode.to_units(delta, batch.units_per_pack);

        let floor = if batch.has_unit_sale() { 0 } else { 1 };
        if new_units < floor {
            return CartOutcome::Rejected(RejectReason::BelowMinimumQuantity {
                batch_id: batch.id.clone(),
            });
        }
        if other_units + new_units > batch.stock_units() {
            return CartOutcome::Rejected(RejectReason::InsufficientStock {
                batch_id: batch.id.clone(),
                available_units: batch.stock_units() - other_units,
                requested_units: new_units,
            });
        }

        if let Some(line) = entry.slot_mut(mode) {
            line.units = new_units;
        }
        debug!(batch_id = %batch.id, mode = %mode, units = new_units, "Quantity updated");
        CartOutcome::Applied
    }

    /// Converts a slot to the other representation.
    ///
    /// Internally this moves units between slots, so the quantity is
    /// conserved exactly: pack→unit shows `× units_per_pack`, unit→pack
    /// shows the (possibly fractional) quotient. If the target slot already
    /// exists the units merge into it (keeping the target's discount) and
    /// the source slot is deleted; otherwise the slot is relabeled in place.
    ///
    /// No-op on batches without a loose-unit sale mode: such a batch has
    /// exactly one representation.
    pub fn toggle_unit_mode(&mut self, batch: &Batch, from: SaleMode) -> CartOutcome {
        if !batch.has_unit_sale() {
            return CartOutcome::Rejected(RejectReason::UnitModeUnavailable {
                batch_id: batch.id.clone(),
            });
        }
        let Some(entry) = self.entries.iter_mut().find(|e| e.batch_id == batch.id) else {
            return CartOutcome::Rejected(RejectReason::MissingLine {
                batch_id: batch.id.clone(),
                mode: from.to_string(),
            });
        };
        let Some(source) = entry.slot_opt_mut(from).take() else {
            return CartOutcome::Rejected(RejectReason::MissingLine {
                batch_id: batch.id.clone(),
                mode: from.to_string(),
            });
        };

        let target = entry.slot_opt_mut(from.other());
        match target {
            Some(line) => line.units += source.units,
            None => *target = Some(source),
        }

        debug!(batch_id = %batch.id, from = %from, to = %from.other(), "Line mode toggled");
        CartOutcome::Applied
    }

    /// Sets a line discount, clamped to the batch's effective maximum.
    /// A positive applied value zeroes the order-level discount in the
    /// same update (mutual exclusivity).
    pub fn set_line_discount(
        &mut self,
        batch: &Batch,
        mode: SaleMode,
        requested: DiscountRate,
    ) -> CartOutcome {
        let max = effective_max_discount(batch);
        let applied = requested.clamp_to(max);

        let Some(entry) = self.entries.iter_mut().find(|e| e.batch_id == batch.id) else {
            return CartOutcome::Rejected(RejectReason::MissingLine {
                batch_id: batch.id.clone(),
                mode: mode.to_string(),
            });
        };
        let Some(line) = entry.slot_mut(mode) else {
            return CartOutcome::Rejected(RejectReason::MissingLine {
                batch_id: batch.id.clone(),
                mode: mode.to_string(),
            });
        };

        line.discount = applied;
        if !applied.is_zero() {
            self.order_discount = DiscountRate::zero();
        }

        debug!(
            batch_id = %batch.id,
            mode = %mode,
            requested_bps = requested.bps(),
            applied_bps = applied.bps(),
            "Line discount set"
        );
        if applied == requested {
            CartOutcome::Applied
        } else {
            CartOutcome::Clamped {
                requested_bps: requested.bps(),
                applied_bps: applied.bps(),
            }
        }
    }

    /// Sets the order-level discount, clamped to 100%. A positive applied
    /// value zeroes every line discount in the same update.
    pub fn set_order_discount(&mut self, requested: DiscountRate) -> CartOutcome {
        let applied = requested.clamp_to(FULL_DISCOUNT);
        self.order_discount = applied;

        if !applied.is_zero() {
            for entry in &mut self.entries {
                if let Some(line) = entry.pack.as_mut() {
                    line.discount = DiscountRate::zero();
                }
                if let Some(line) = entry.unit.as_mut() {
                    line.discount = DiscountRate::zero();
                }
            }
        }

        debug!(
            requested_bps = requested.bps(),
            applied_bps = applied.bps(),
            "Order discount set"
        );
        if applied == requested {
            CartOutcome::Applied
        } else {
            CartOutcome::Clamped {
                requested_bps: requested.bps(),
                applied_bps: applied.bps(),
            }
        }
    }

    // ===== Allocator hooks =====

    /// Removes every row whose batch id is in `batch_ids` and returns the
    /// index of the first removed row (the re-insertion point), or the
    /// current length if none matched.
    pub(crate) fn extract_rows(&mut self, batch_ids: &[&str]) -> usize {
        let first = self
            .entries
            .iter()
            .position(|e| batch_ids.contains(&e.batch_id.as_str()))
            .unwrap_or(self.entries.len());
        self.entries
            .retain(|e| !batch_ids.contains(&e.batch_id.as_str()));
        first
    }

    /// Inserts prebuilt rows at `index`, preserving their order.
    pub(crate) fn insert_rows_at(&mut self, index: usize, rows: Vec<BatchEntry>) {
        let index = index.min(self.entries.len());
        self.entries.splice(index..index, rows);
    }

    // ===== Views =====

    /// Order totals, resolved against the catalog.
    ///
    /// Rows whose batch id no longer resolves contribute nothing (the
    /// checkout facade, unlike this read, treats that as a hard error).
    pub fn totals(&self, catalog: &dyn BatchCatalog) -> CartTotals {
        let mut gross = Money::zero();
        let mut net_items = Money::zero();
        let mut line_count = 0usize;

        for entry in &self.entries {
            let Some(batch) = catalog.batch_by_id(&entry.batch_id) else {
                debug!(batch_id = %entry.batch_id, "Batch missing from catalog, skipped in totals");
                continue;
            };
            for slot in [entry.pack.as_ref(), entry.unit.as_ref()].into_iter().flatten() {
                line_count += 1;
                gross += slot.gross_total(&batch);
                net_items += slot.net_total(&batch);
            }
        }

        let order_total = net_items.apply_discount(self.order_discount);
        let total_discount = gross - order_total;
        CartTotals {
            entry_count: self.entries.len(),
            line_count,
            gross_subtotal_cents: gross.cents(),
            net_item_total_cents: net_items.cents(),
            order_total_cents: order_total.cents(),
            total_discount_cents: total_discount.cents(),
            order_discount_bps: total_discount.percent_of(gross).bps(),
        }
    }

    /// The merged-entry projection: one display row per batch id, with
    /// both slots resolved to mode quantities and money.
    pub fn merged_rows(&self, catalog: &dyn BatchCatalog) -> Vec<MergedRow> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let Some(batch) = catalog.batch_by_id(&entry.batch_id) else {
                    debug!(batch_id = %entry.batch_id, "Batch missing from catalog, skipped in view");
                    return None;
                };
                let pack = entry
                    .pack
                    .as_ref()
                    .map(|s| RowSlot::resolve(s, SaleMode::Pack, &batch));
                let unit = entry
                    .unit
                    .as_ref()
                    .map(|s| RowSlot::resolve(s, SaleMode::Unit, &batch));
                let row_total_cents =
                    pack.as_ref().map_or(0, |s| s.total_cents) + unit.as_ref().map_or(0, |s| s.total_cents);
                Some(MergedRow {
                    batch_id: entry.batch_id.clone(),
                    product_name: batch.product_name.clone(),
                    dosage_form: batch.dosage_form.clone(),
                    code: batch.code.clone(),
                    units_per_pack: batch.units_per_pack,
                    expiry: batch.expiry,
                    pack,
                    unit,
                    row_total_cents,
                })
            })
            .collect()
    }
}

// =============================================================================
// View Types
// =============================================================================

/// Cart totals summary for host consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub entry_count: usize,
    pub line_count: usize,
    /// Σ line gross, before any discount.
    pub gross_subtotal_cents: i64,
    /// Σ line net (after line discounts, before the order discount).
    pub net_item_total_cents: i64,
    /// Item total after the order-level discount.
    pub order_total_cents: i64,
    /// `grossSubtotal − orderTotal`.
    pub total_discount_cents: i64,
    /// `totalDiscount / grossSubtotal` in bps (0 on an empty cart).
    pub order_discount_bps: u32,
}

/// One resolved slot inside a [`MergedRow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RowSlot {
    /// Quantity in the slot's own mode; fractional for pack slots holding
    /// a non-multiple of `units_per_pack`.
    pub quantity: f64,
    /// The same quantity in internal units (exact).
    pub units: i64,
    /// Per pack for pack slots; per single unit (rounded) for unit slots.
    pub unit_price_cents: i64,
    pub discount_bps: u32,
    /// Line net.
    pub total_cents: i64,
}

impl RowSlot {
    fn resolve(slot: &LineSlot, mode: SaleMode, batch: &Batch) -> Self {
        let unit_price_cents = match mode {
            SaleMode::Pack => batch.price_cents,
            SaleMode::Unit => batch.price().prorated(1, batch.units_per_pack).cents(),
        };
        RowSlot {
            quantity: mode.display_quantity(slot.units, batch.units_per_pack),
            units: slot.units,
            unit_price_cents,
            discount_bps: slot.discount.bps(),
            total_cents: slot.net_total(batch).cents(),
        }
    }
}

/// The merged pack+unit view of one batch row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MergedRow {
    pub batch_id: String,
    pub product_name: String,
    pub dosage_form: String,
    pub code: String,
    pub units_per_pack: i64,
    #[ts(as = "String")]
    pub expiry: chrono::NaiveDate,
    pub pack: Option<RowSlot>,
    pub unit: Option<RowSlot>,
    pub row_total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
