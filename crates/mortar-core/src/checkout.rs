//! # Checkout Facade
//!
//! Turns an eligible session into an immutable [`OrderSnapshot`] and hands
//! it to the external sale recorder.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  OrderSession ──▶ build_order ──▶ OrderSnapshot ──▶ SaleRecorder   │
//! │                      │                                             │
//! │                      ├─ rejects empty carts                        │
//! │                      ├─ rejects zero-quantity rows                 │
//! │                      ├─ rejects unresolvable batch ids             │
//! │                      └─ adds the delivery fee when                 │
//! │                         sale_type = Delivery                       │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The snapshot freezes everything a receipt or ledger needs: resolved
//! product names and prices, quantities in both representations, and the
//! totals as computed at this instant. Catalog stock is NOT touched here;
//! decrementing it is the recorder's job once it accepts the snapshot.
//! After a successful finalize the caller is expected to close the
//! originating session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::BatchCatalog;
use crate::error::{CheckoutError, CheckoutResult, RecordError};
use crate::session::OrderSession;
use crate::types::{CustomerRef, PaymentMethod, SaleMode, SaleType};
use crate::DEFAULT_DELIVERY_FEE_CENTS;

// =============================================================================
// Configuration
// =============================================================================

/// Construction-time knobs for [`Checkout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    delivery_fee_cents: i64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            delivery_fee_cents: DEFAULT_DELIVERY_FEE_CENTS,
        }
    }
}

impl CheckoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flat surcharge added to delivery orders. Negative values are
    /// treated as zero.
    pub fn with_delivery_fee_cents(mut self, cents: i64) -> Self {
        self.delivery_fee_cents = cents.max(0);
        self
    }

    pub const fn delivery_fee_cents(&self) -> i64 {
        self.delivery_fee_cents
    }
}

// =============================================================================
// Sale Recorder
// =============================================================================

/// The external collaborator that persists an accepted order and
/// decrements authoritative catalog stock.
///
/// The engine only builds snapshots; everything durable happens behind
/// this seam. Implementations signal refusal through [`RecordError`],
/// which [`Checkout::finalize`] passes back to the caller unchanged.
pub trait SaleRecorder {
    fn record_sale(&mut self, snapshot: &OrderSnapshot) -> Result<(), RecordError>;
}

// =============================================================================
// Order Snapshot
// =============================================================================

/// One frozen line of a finalized order. Unlike cart rows, these carry
/// the resolved product identity and prices so the snapshot stays
/// meaningful after the catalog moves on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub batch_id: String,
    pub product_name: String,
    pub dosage_form: String,
    pub mode: SaleMode,
    /// Quantity in the line's own mode; fractional pack quantities survive
    /// here exactly as displayed.
    pub quantity: f64,
    /// The same quantity in internal units.
    pub units: i64,
    pub unit_price_cents: i64,
    pub discount_bps: u32,
    pub line_total_cents: i64,
}

/// The finalized order payload handed to the sale recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    #[ts(as = "String")]
    pub id: Uuid,
    #[ts(as = "String")]
    pub session_id: Uuid,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub customer: Option<CustomerRef>,
    pub payment_method: PaymentMethod,
    pub sale_type: SaleType,
    pub lines: Vec<OrderLine>,
    /// Sum of line gross totals before any discount.
    pub gross_subtotal_cents: i64,
    /// Item total after line and order discounts, before the delivery fee.
    pub subtotal_cents: i64,
    pub total_discount_cents: i64,
    pub order_discount_bps: u32,
    pub delivery_fee_cents: i64,
    /// `subtotal + deliveryFee`; what the customer pays.
    pub grand_total_cents: i64,
}

// =============================================================================
// Checkout
// =============================================================================

/// Builds and finalizes order snapshots. Holds only configuration; all
/// order state comes in through the session argument.
#[derive(Debug, Clone, Default)]
pub struct Checkout {
    config: CheckoutConfig,
}

impl Checkout {
    pub fn new(config: CheckoutConfig) -> Self {
        Checkout { config }
    }

    pub fn config(&self) -> CheckoutConfig {
        self.config
    }

    /// Assembles the frozen snapshot for a session.
    ///
    /// This is checkout's hard-failure path: an empty cart, a row whose
    /// combined quantity is zero, or a batch id the catalog no longer
    /// resolves all refuse to produce a snapshot. Nothing is mutated
    /// either way.
    pub fn build_order(
        &self,
        session: &OrderSession,
        catalog: &dyn BatchCatalog,
        payment_method: PaymentMethod,
        sale_type: SaleType,
    ) -> CheckoutResult<OrderSnapshot> {
        let cart = &session.cart;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if let Some(entry) = cart.entries().iter().find(|e| e.committed_units() == 0) {
            return Err(CheckoutError::ZeroQuantityEntry {
                batch_id: entry.batch_id.clone(),
            });
        }

        let mut lines = Vec::with_capacity(cart.line_count());
        for entry in cart.entries() {
            let batch = catalog.batch_by_id(&entry.batch_id).ok_or_else(|| {
                CheckoutError::BatchMissing {
                    batch_id: entry.batch_id.clone(),
                }
            })?;
            for mode in [SaleMode::Pack, SaleMode::Unit] {
                let Some(slot) = entry.slot(mode) else {
                    continue;
                };
                let unit_price_cents = match mode {
                    SaleMode::Pack => batch.price_cents,
                    SaleMode::Unit => batch.price().prorated(1, batch.units_per_pack).cents(),
                };
                lines.push(OrderLine {
                    batch_id: entry.batch_id.clone(),
                    product_name: batch.product_name.clone(),
                    dosage_form: batch.dosage_form.clone(),
                    mode,
                    quantity: mode.display_quantity(slot.units, batch.units_per_pack),
                    units: slot.units,
                    unit_price_cents,
                    discount_bps: slot.discount.bps(),
                    line_total_cents: slot.net_total(&batch).cents(),
                });
            }
        }

        // Every batch id resolved above, so these totals drop nothing.
        let totals = cart.totals(catalog);
        let delivery_fee_cents = match sale_type {
            SaleType::Delivery => self.config.delivery_fee_cents,
            SaleType::Counter => 0,
        };

        let snapshot = OrderSnapshot {
            id: Uuid::new_v4(),
            session_id: session.id,
            created_at: Utc::now(),
            customer: session.customer.clone(),
            payment_method,
            sale_type,
            lines,
            gross_subtotal_cents: totals.gross_subtotal_cents,
            subtotal_cents: totals.order_total_cents,
            total_discount_cents: totals.total_discount_cents,
            order_discount_bps: totals.order_discount_bps,
            delivery_fee_cents,
            grand_total_cents: totals.order_total_cents + delivery_fee_cents,
        };
        debug!(
            order_id = %snapshot.id,
            lines = snapshot.lines.len(),
            grand_total = snapshot.grand_total_cents,
            "Order snapshot built"
        );
        Ok(snapshot)
    }

    /// Builds the snapshot and hands it to the recorder. The session is
    /// left open; closing it after a successful finalize is the caller's
    /// move (the snapshot is returned for receipts).
    pub fn finalize(
        &self,
        session: &OrderSession,
        catalog: &dyn BatchCatalog,
        payment_method: PaymentMethod,
        sale_type: SaleType,
        recorder: &mut dyn SaleRecorder,
    ) -> CheckoutResult<OrderSnapshot> {
        let snapshot = self.build_order(session, catalog, payment_method, sale_type)?;
        recorder.record_sale(&snapshot)?;
        info!(
            order_id = %snapshot.id,
            session_id = %session.id,
            grand_total = snapshot.grand_total_cents,
            "Sale recorded"
        );
        Ok(snapshot)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::DiscountRate;
    use crate::session::{SessionConfig, SessionManager};
    use crate::types::Batch;
    use chrono::NaiveDate;

    fn test_batch(id: &str, price_cents: i64, stock_packs: i64, units_per_pack: i64) -> Batch {
        Batch {
            id: id.to_string(),
            product_name: format!("Product {}", id),
            dosage_form: "Tablet".to_string(),
            category: "General".to_string(),
            code: format!("C-{}", id),
            barcode: None,
            price_cents,
            cost_cents: price_cents / 2,
            stock_packs,
            units_per_pack,
            expiry: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            max_discount: None,
        }
    }

    fn session_with_cart<F>(fill: F) -> OrderSession
    where
        F: FnOnce(&mut crate::cart::Cart),
    {
        let mut mgr = SessionManager::new(SessionConfig::default());
        mgr.create();
        fill(mgr.active_cart_mut().unwrap());
        mgr.active().unwrap().clone()
    }

    #[derive(Default)]
    struct MemoRecorder {
        seen: Vec<OrderSnapshot>,
    }

    impl SaleRecorder for MemoRecorder {
        fn record_sale(&mut self, snapshot: &OrderSnapshot) -> Result<(), RecordError> {
            self.seen.push(snapshot.clone());
            Ok(())
        }
    }

    struct RefusingRecorder;

    impl SaleRecorder for RefusingRecorder {
        fn record_sale(&mut self, _snapshot: &OrderSnapshot) -> Result<(), RecordError> {
            Err(RecordError::new("ledger offline"))
        }
    }

    #[test]
    fn test_counter_sale_has_no_delivery_fee() {
        let batch = test_batch("b1", 1000, 10, 1);
        let catalog = vec![batch.clone()];
        let session = session_with_cart(|cart| {
            cart.add_line(&batch, SaleMode::Pack, 3);
        });

        let checkout = Checkout::new(CheckoutConfig::default());
        let snapshot = checkout
            .build_order(&session, &catalog, PaymentMethod::Cash, SaleType::Counter)
            .unwrap();

        assert_eq!(snapshot.subtotal_cents, 3000);
        assert_eq!(snapshot.delivery_fee_cents, 0);
        assert_eq!(snapshot.grand_total_cents, 3000);
        assert_eq!(snapshot.session_id, session.id);
    }

    #[test]
    fn test_delivery_sale_adds_fee() {
        let batch = test_batch("b1", 1000, 10, 1);
        let catalog = vec![batch.clone()];
        let session = session_with_cart(|cart| {
            cart.add_line(&batch, SaleMode::Pack, 3);
        });

        let checkout = Checkout::new(CheckoutConfig::default());
        let snapshot = checkout
            .build_order(&session, &catalog, PaymentMethod::Cash, SaleType::Delivery)
            .unwrap();

        assert_eq!(snapshot.delivery_fee_cents, DEFAULT_DELIVERY_FEE_CENTS);
        assert_eq!(snapshot.grand_total_cents, 3000 + DEFAULT_DELIVERY_FEE_CENTS);
    }

    #[test]
    fn test_configured_delivery_fee() {
        let batch = test_batch("b1", 1000, 10, 1);
        let catalog = vec![batch.clone()];
        let session = session_with_cart(|cart| {
            cart.add_line(&batch, SaleMode::Pack, 1);
        });

        let checkout = Checkout::new(CheckoutConfig::new().with_delivery_fee_cents(250));
        let snapshot = checkout
            .build_order(&session, &catalog, PaymentMethod::Card, SaleType::Delivery)
            .unwrap();
        assert_eq!(snapshot.grand_total_cents, 1250);
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let catalog: Vec<Batch> = Vec::new();
        let session = session_with_cart(|_| {});

        let checkout = Checkout::new(CheckoutConfig::default());
        let err = checkout
            .build_order(&session, &catalog, PaymentMethod::Cash, SaleType::Counter)
            .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[test]
    fn test_zero_quantity_row_is_rejected() {
        let batch = test_batch("b1", 1000, 10, 6);
        let catalog = vec![batch.clone()];
        let session = session_with_cart(|cart| {
            cart.add_line(&batch, SaleMode::Unit, 2);
            cart.update_quantity(&batch, SaleMode::Unit, -2); // slot parked at 0
        });

        let checkout = Checkout::new(CheckoutConfig::default());
        let err = checkout
            .build_order(&session, &catalog, PaymentMethod::Cash, SaleType::Counter)
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ZeroQuantityEntry { .. }));
    }

    #[test]
    fn test_unresolvable_batch_is_rejected() {
        let batch = test_batch("b1", 1000, 10, 1);
        let session = session_with_cart(|cart| {
            cart.add_line(&batch, SaleMode::Pack, 1);
        });

        let empty_catalog: Vec<Batch> = Vec::new();
        let checkout = Checkout::new(CheckoutConfig::default());
        let err = checkout
            .build_order(&session, &empty_catalog, PaymentMethod::Cash, SaleType::Counter)
            .unwrap_err();
        assert!(matches!(err, CheckoutError::BatchMissing { .. }));
    }

    #[test]
    fn test_lines_freeze_resolved_product_data() {
        let batch = test_batch("b1", 1099, 10, 6);
        let catalog = vec![batch.clone()];
        let session = session_with_cart(|cart| {
            cart.add_line(&batch, SaleMode::Pack, 2);
            cart.add_line(&batch, SaleMode::Unit, 3);
        });

        let checkout = Checkout::new(CheckoutConfig::default());
        let snapshot = checkout
            .build_order(&session, &catalog, PaymentMethod::Cash, SaleType::Counter)
            .unwrap();

        assert_eq!(snapshot.lines.len(), 2);
        let pack_line = &snapshot.lines[0];
        assert_eq!(pack_line.mode, SaleMode::Pack);
        assert_eq!(pack_line.product_name, "Product b1");
        assert_eq!(pack_line.quantity, 2.0);
        assert_eq!(pack_line.units, 12);
        assert_eq!(pack_line.unit_price_cents, 1099);
        assert_eq!(pack_line.line_total_cents, 2198);

        let unit_line = &snapshot.lines[1];
        assert_eq!(unit_line.mode, SaleMode::Unit);
        assert_eq!(unit_line.units, 3);
        assert_eq!(unit_line.line_total_cents, 550);

        assert_eq!(snapshot.gross_subtotal_cents, 2748);
    }

    #[test]
    fn test_discounts_flow_into_snapshot() {
        let batch = test_batch("b1", 1000, 10, 1);
        let catalog = vec![batch.clone()];
        let session = session_with_cart(|cart| {
            cart.add_line(&batch, SaleMode::Pack, 3);
            cart.set_line_discount(&batch, SaleMode::Pack, DiscountRate::from_percent(10));
        });

        let checkout = Checkout::new(CheckoutConfig::default());
        let snapshot = checkout
            .build_order(&session, &catalog, PaymentMethod::Cash, SaleType::Counter)
            .unwrap();

        assert_eq!(snapshot.gross_subtotal_cents, 3000);
        assert_eq!(snapshot.subtotal_cents, 2700);
        assert_eq!(snapshot.total_discount_cents, 300);
        assert_eq!(snapshot.order_discount_bps, 1000);
        assert_eq!(snapshot.lines[0].discount_bps, 1000);
    }

    #[test]
    fn test_finalize_hands_snapshot_to_recorder() {
        let batch = test_batch("b1", 1000, 10, 1);
        let catalog = vec![batch.clone()];
        let session = session_with_cart(|cart| {
            cart.add_line(&batch, SaleMode::Pack, 2);
        });

        let checkout = Checkout::new(CheckoutConfig::default());
        let mut recorder = MemoRecorder::default();
        let snapshot = checkout
            .finalize(
                &session,
                &catalog,
                PaymentMethod::Mobile,
                SaleType::Counter,
                &mut recorder,
            )
            .unwrap();

        assert_eq!(recorder.seen.len(), 1);
        assert_eq!(recorder.seen[0].id, snapshot.id);
        assert_eq!(recorder.seen[0].payment_method, PaymentMethod::Mobile);
    }

    #[test]
    fn test_finalize_propagates_recorder_refusal() {
        let batch = test_batch("b1", 1000, 10, 1);
        let catalog = vec![batch.clone()];
        let session = session_with_cart(|cart| {
            cart.add_line(&batch, SaleMode::Pack, 1);
        });

        let checkout = Checkout::new(CheckoutConfig::default());
        let err = checkout
            .finalize(
                &session,
                &catalog,
                PaymentMethod::Cash,
                SaleType::Counter,
                &mut RefusingRecorder,
            )
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Recorder(_)));
        assert_eq!(err.to_string(), "sale could not be recorded: ledger offline");
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let batch = test_batch("b1", 1000, 10, 1);
        let catalog = vec![batch.clone()];
        let session = session_with_cart(|cart| {
            cart.add_line(&batch, SaleMode::Pack, 1);
        });

        let checkout = Checkout::new(CheckoutConfig::default());
        let snapshot = checkout
            .build_order(&session, &catalog, PaymentMethod::Cash, SaleType::Counter)
            .unwrap();

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["grandTotalCents"], 1000);
        assert_eq!(json["paymentMethod"], "cash");
        assert!(json["lines"][0]["unitPriceCents"].is_i64());
    }
}
