//! # Validation Module
//!
//! Input validation utilities for the Mortar engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Structural rules on data entering the engine                      │
//! │  └── Used by the catalog on insert and the manager on rename           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine invariants (cart/allocator)                           │
//! │  └── Stock and quantity rules, enforced as silent no-ops               │
//! │                                                                         │
//! │  Defense in depth: validation errors are loud (typed Err);             │
//! │  invariant violations are quiet (rejected outcome)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use mortar_core::validation::{validate_quantity, validate_discount_bps};
//!
//! // Validate a raw quantity before a cart operation
//! validate_quantity(5).unwrap();
//!
//! // Validate a discount override before seeding a batch
//! validate_discount_bps(1500).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::Batch;
use crate::{MAX_LINE_UNITS, MAX_UNITS_PER_PACK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a batch id.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 64 characters (catalog ids are opaque strings,
///   not necessarily UUIDs)
pub fn validate_batch_id(id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "batch id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "batch id".to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates a session title.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Maximum 60 characters
///
/// ## Returns
/// The trimmed title.
pub fn validate_session_title(title: &str) -> ValidationResult<String> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.len() > 60 {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: 60,
        });
    }

    Ok(title.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a raw quantity argument.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_UNITS (catches fat-finger entries like
///   10000 instead of 10 before the stock rule even runs)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_UNITS {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_UNITS,
        });
    }

    Ok(())
}

/// Validates a discount in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Batch Validator
// =============================================================================

/// Validates a full batch record before it enters a catalog.
///
/// ## Rules
/// - id, product name, dosage form and code must be non-empty
/// - product name at most 200 characters
/// - `units_per_pack` between 1 and MAX_UNITS_PER_PACK
/// - stock, price and cost non-negative
/// - discount override, if set, within 0-100%
pub fn validate_batch(batch: &Batch) -> ValidationResult<()> {
    validate_batch_id(&batch.id)?;

    let name = batch.product_name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "product_name".to_string(),
        });
    }
    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "product_name".to_string(),
            max: 200,
        });
    }

    if batch.dosage_form.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "dosage_form".to_string(),
        });
    }

    if batch.code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if batch.units_per_pack < 1 || batch.units_per_pack > MAX_UNITS_PER_PACK {
        return Err(ValidationError::OutOfRange {
            field: "units_per_pack".to_string(),
            min: 1,
            max: MAX_UNITS_PER_PACK,
        });
    }

    if batch.stock_packs < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock_packs".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if batch.price_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if batch.cost_cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "cost".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    if let Some(cap) = batch.max_discount {
        validate_discount_bps(cap.bps())?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::DiscountRate;
    use chrono::NaiveDate;

    fn valid_batch() -> Batch {
        Batch {
            id: "b-1".to_string(),
            product_name: "Panadol Extra".to_string(),
            dosage_form: "Tablet".to_string(),
            category: "Analgesic".to_string(),
            code: "PAN-X".to_string(),
            barcode: None,
            price_cents: 1099,
            cost_cents: 850,
            stock_packs: 5,
            units_per_pack: 6,
            expiry: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            max_discount: None,
        }
    }

    #[test]
    fn test_validate_batch_id() {
        assert!(validate_batch_id("b-1").is_ok());
        assert!(validate_batch_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_batch_id("").is_err());
        assert!(validate_batch_id("   ").is_err());
        assert!(validate_batch_id(&"x".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_session_title() {
        assert_eq!(validate_session_title("  Walk-in 2  ").unwrap(), "Walk-in 2");
        assert!(validate_session_title("").is_err());
        assert!(validate_session_title(&"t".repeat(61)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_UNITS).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_LINE_UNITS + 1).is_err());
    }

    #[test]
    fn test_validate_discount_bps() {
        assert!(validate_discount_bps(0).is_ok());
        assert!(validate_discount_bps(250).is_ok());
        assert!(validate_discount_bps(10_000).is_ok());
        assert!(validate_discount_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_batch() {
        assert!(validate_batch(&valid_batch()).is_ok());

        let mut b = valid_batch();
        b.units_per_pack = 0;
        assert!(validate_batch(&b).is_err());

        let mut b = valid_batch();
        b.stock_packs = -1;
        assert!(validate_batch(&b).is_err());

        let mut b = valid_batch();
        b.product_name = "  ".to_string();
        assert!(validate_batch(&b).is_err());

        let mut b = valid_batch();
        b.max_discount = Some(DiscountRate::from_bps(20_000));
        assert!(validate_batch(&b).is_err());

        // A zero-price batch is allowed (donations, samples)
        let mut b = valid_batch();
        b.price_cents = 0;
        assert!(validate_batch(&b).is_ok());
    }
}
