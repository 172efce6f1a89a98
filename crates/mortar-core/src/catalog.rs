//! # Batch Catalog Interface
//!
//! The read-only catalog the engine consumes. The engine never owns or
//! mutates batch data; it resolves ids and product groups through this trait
//! and leaves stock decrements to the sale-recording collaborator.
//!
//! `Vec<Batch>` and `[Batch]` implement the trait directly, so tests and
//! small hosts can use a plain fixture list; `mortar-catalog` provides the
//! indexed `MemoryCatalog` for real use.

use crate::types::{Batch, ProductKey};

/// Read-only batch lookup, the engine's view of the inventory.
pub trait BatchCatalog {
    /// All batches belonging to one product identity, in catalog order.
    /// Callers that need FEFO order sort by expiry themselves.
    fn batches_for_product(&self, key: &ProductKey) -> Vec<Batch>;

    /// Resolves a single batch by id.
    fn batch_by_id(&self, id: &str) -> Option<Batch>;
}

impl BatchCatalog for [Batch] {
    fn batches_for_product(&self, key: &ProductKey) -> Vec<Batch> {
        self.iter()
            .filter(|b| b.product_name == key.name && b.dosage_form == key.dosage_form)
            .cloned()
            .collect()
    }

    fn batch_by_id(&self, id: &str) -> Option<Batch> {
        self.iter().find(|b| b.id == id).cloned()
    }
}

impl BatchCatalog for Vec<Batch> {
    fn batches_for_product(&self, key: &ProductKey) -> Vec<Batch> {
        self.as_slice().batches_for_product(key)
    }

    fn batch_by_id(&self, id: &str) -> Option<Batch> {
        self.as_slice().batch_by_id(id)
    }
}
