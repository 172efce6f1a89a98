//! # Sale Log
//!
//! The reference [`SaleRecorder`]: an append-only, in-memory ledger of
//! accepted order snapshots. A production host would swap in a durable
//! recorder behind the same trait; the engine cannot tell the difference.

use mortar_core::{OrderSnapshot, RecordError, SaleRecorder};
use tracing::info;
use uuid::Uuid;

/// Ordered record of every accepted sale.
#[derive(Debug, Clone, Default)]
pub struct SaleLog {
    orders: Vec<OrderSnapshot>,
}

impl SaleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepted snapshots, oldest first.
    pub fn orders(&self) -> &[OrderSnapshot] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn last(&self) -> Option<&OrderSnapshot> {
        self.orders.last()
    }

    pub fn order(&self, id: &Uuid) -> Option<&OrderSnapshot> {
        self.orders.iter().find(|o| o.id == *id)
    }

    /// Sum of grand totals over the whole log.
    pub fn revenue_cents(&self) -> i64 {
        self.orders.iter().map(|o| o.grand_total_cents).sum()
    }
}

impl SaleRecorder for SaleLog {
    fn record_sale(&mut self, snapshot: &OrderSnapshot) -> Result<(), RecordError> {
        if self.orders.iter().any(|o| o.id == snapshot.id) {
            return Err(RecordError::new(format!(
                "order {} already recorded",
                snapshot.id
            )));
        }
        self.orders.push(snapshot.clone());
        info!(
            order_id = %snapshot.id,
            grand_total = snapshot.grand_total_cents,
            recorded = self.orders.len(),
            "Sale appended to log"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
