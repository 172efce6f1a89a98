//! # In-Memory Batch Catalog
//!
//! The reference implementation of the catalog seam the engine consumes.
//! Batches are validated on the way in, indexed by id and by product key,
//! and never mutated afterwards; the engine sees a read-only provider.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ MemoryCatalog                                                      │
//! │                                                                    │
//! │   batches: [Batch, Batch, Batch, ...]        (insertion order)     │
//! │   by_id:      "b-17" ─────────────▶ index 0                        │
//! │   by_product: ("Amoxil","Capsule") ▶ [0, 2]  (FEFO tie order)      │
//! │                                                                    │
//! │   insert ──▶ validate ──▶ duplicate check ──▶ index                │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use mortar_core::validation::validate_batch;
use mortar_core::{Batch, BatchCatalog, ProductKey};
use tracing::debug;

use crate::error::{CatalogError, CatalogResult};

/// Validated, indexed, in-memory batch collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    batches: Vec<Batch>,
    by_id: HashMap<String, usize>,
    by_product: HashMap<ProductKey, Vec<usize>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and inserts a JSON array of batches. The first bad batch
    /// aborts the load and no catalog is returned (callers seed from
    /// trusted data, so a partial catalog is never useful).
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let batches: Vec<Batch> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        catalog.insert_all(batches)?;
        Ok(catalog)
    }

    /// Validates and indexes one batch. Rejects structural rule breaks and
    /// duplicate ids with typed errors; the catalog is unchanged on error.
    pub fn insert(&mut self, batch: Batch) -> CatalogResult<()> {
        validate_batch(&batch)?;
        if self.by_id.contains_key(&batch.id) {
            return Err(CatalogError::DuplicateBatch {
                batch_id: batch.id.clone(),
            });
        }

        let index = self.batches.len();
        self.by_id.insert(batch.id.clone(), index);
        self.by_product
            .entry(batch.product_key())
            .or_default()
            .push(index);
        debug!(batch_id = %batch.id, product = %batch.product_key(), "Batch added to catalog");
        self.batches.push(batch);
        Ok(())
    }

    /// Inserts a whole list, returning how many went in.
    pub fn insert_all(&mut self, batches: impl IntoIterator<Item = Batch>) -> CatalogResult<usize> {
        let mut inserted = 0;
        for batch in batches {
            self.insert(batch)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Every batch, in insertion order.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// The distinct products on file, sorted by name then dosage form.
    pub fn products(&self) -> Vec<ProductKey> {
        let mut products: Vec<ProductKey> = self.by_product.keys().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.dosage_form.cmp(&b.dosage_form)));
        products
    }
}

impl BatchCatalog for MemoryCatalog {
    fn batches_for_product(&self, product: &ProductKey) -> Vec<Batch> {
        self.by_product
            .get(product)
            .map(|indexes| indexes.iter().map(|&i| self.batches[i].clone()).collect())
            .unwrap_or_default()
    }

    fn batch_by_id(&self, id: &str) -> Option<Batch> {
        self.by_id.get(id).map(|&i| self.batches[i].clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use mortar_core::ValidationError;

    fn batch(id: &str, name: &str, form: &str) -> Batch {
        Batch {
            id: id.to_string(),
            product_name: name.to_string(),
            dosage_form: form.to_string(),
            category: "General".to_string(),
            code: format!("C-{}", id),
            barcode: None,
            price_cents: 1000,
            cost_cents: 600,
            stock_packs: 10,
            units_per_pack: 6,
            expiry: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            max_discount: None,
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut catalog = MemoryCatalog::new();
        catalog.insert(batch("b1", "Amoxil", "Capsule")).unwrap();
        catalog.insert(batch("b2", "Amoxil", "Capsule")).unwrap();
        catalog.insert(batch("b3", "Amoxil", "Syrup")).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.batch_by_id("b2").unwrap().id, "b2");
        assert!(catalog.batch_by_id("nope").is_none());
    }

    #[test]
    fn test_grouping_is_exact_on_name_and_form() {
        let mut catalog = MemoryCatalog::new();
        catalog.insert(batch("b1", "Amoxil", "Capsule")).unwrap();
        catalog.insert(batch("b2", "Amoxil", "Syrup")).unwrap();
        catalog.insert(batch("b3", "Brufen", "Capsule")).unwrap();

        let group = catalog.batches_for_product(&ProductKey {
            name: "Amoxil".to_string(),
            dosage_form: "Capsule".to_string(),
        });
        assert_eq!(group.len(), 1);
        assert_eq!(group[0].id, "b1");
    }

    #[test]
    fn test_group_preserves_insertion_order() {
        // Equal expiries: the allocator's FEFO sort is stable, so catalog
        // order is the tie-break. It must be insertion order.
        let mut catalog = MemoryCatalog::new();
        catalog.insert(batch("first", "Amoxil", "Capsule")).unwrap();
        catalog.insert(batch("second", "Amoxil", "Capsule")).unwrap();

        let group = catalog.batches_for_product(&ProductKey {
            name: "Amoxil".to_string(),
            dosage_form: "Capsule".to_string(),
        });
        let ids: Vec<&str> = group.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut catalog = MemoryCatalog::new();
        catalog.insert(batch("b1", "Amoxil", "Capsule")).unwrap();

        let err = catalog.insert(batch("b1", "Brufen", "Tablet")).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateBatch { .. }));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_invalid_batch_rejected() {
        let mut catalog = MemoryCatalog::new();

        let mut bad = batch("b1", "Amoxil", "Capsule");
        bad.units_per_pack = 0;
        let err = catalog.insert(bad).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Invalid(ValidationError::OutOfRange { .. })
        ));

        let mut bad = batch("b2", "Amoxil", "Capsule");
        bad.stock_packs = -1;
        assert!(catalog.insert(bad).is_err());

        assert!(catalog.is_empty());
    }

    #[test]
    fn test_from_json_seeding() {
        let json = r#"[
            {
                "id": "b1",
                "productName": "Panadol Extra",
                "dosageForm": "Tablet",
                "category": "Analgesic",
                "code": "PAN-X",
                "barcode": "8964000011223",
                "priceCents": 1099,
                "costCents": 850,
                "stockPacks": 5,
                "unitsPerPack": 6,
                "expiry": "2026-03-31"
            },
            {
                "id": "b2",
                "productName": "Panadol Extra",
                "dosageForm": "Tablet",
                "category": "Analgesic",
                "code": "PAN-X",
                "priceCents": 1099,
                "costCents": 850,
                "stockPacks": 12,
                "unitsPerPack": 6,
                "expiry": "2026-09-30",
                "maxDiscount": 500
            }
        ]"#;

        let catalog = MemoryCatalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);

        let b2 = catalog.batch_by_id("b2").unwrap();
        assert_eq!(b2.stock_packs, 12);
        assert_eq!(b2.max_discount.unwrap().bps(), 500);
        assert!(catalog.batch_by_id("b1").unwrap().max_discount.is_none());

        let group = catalog.batches_for_product(&ProductKey {
            name: "Panadol Extra".to_string(),
            dosage_form: "Tablet".to_string(),
        });
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_from_json_bad_payload() {
        assert!(matches!(
            MemoryCatalog::from_json("not json").unwrap_err(),
            CatalogError::Parse(_)
        ));
    }

    #[test]
    fn test_products_sorted() {
        let mut catalog = MemoryCatalog::new();
        catalog.insert(batch("b1", "Brufen", "Tablet")).unwrap();
        catalog.insert(batch("b2", "Amoxil", "Syrup")).unwrap();
        catalog.insert(batch("b3", "Amoxil", "Capsule")).unwrap();

        let products = catalog.products();
        let names: Vec<String> = products
            .iter()
            .map(|p| format!("{}/{}", p.name, p.dosage_form))
            .collect();
        assert_eq!(names, vec!["Amoxil/Capsule", "Amoxil/Syrup", "Brufen/Tablet"]);
    }
}
