//! # Error Types
//!
//! Domain error types for mortar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mortar-core errors (this file)                                        │
//! │  ├── ValidationError  - Input data that fails business rules           │
//! │  └── CheckoutError    - The one hard failure: bad checkout attempt     │
//! │                                                                         │
//! │  mortar-catalog errors (separate crate)                                │
//! │  └── CatalogError     - Seeding/insert failures                        │
//! │                                                                         │
//! │  NOT errors: rejected cart mutations. Quantity and discount             │
//! │  violations are silent no-ops by design; they surface as               │
//! │  CartOutcome::Rejected (also defined here), never as Err.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (batch id, field, limits)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps to a user-facing message

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised when data entering the engine (catalog batches, titles, raw
/// quantities) breaks a structural rule, before any business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Checkout failures, the engine's only hard error path.
///
/// Every other violation no-ops; building an order snapshot from an
/// ineligible or unresolvable cart must fail loudly instead of emitting a
/// partial snapshot.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines at all.
    #[error("cannot build an order from an empty cart")]
    EmptyCart,

    /// A batch row is present but its combined pack+unit quantity is zero.
    #[error("batch {batch_id} has zero combined quantity; remove it or set a quantity")]
    ZeroQuantityEntry { batch_id: String },

    /// A cart line references a batch the catalog no longer resolves.
    #[error("batch {batch_id} is no longer in the catalog")]
    BatchMissing { batch_id: String },

    /// The sale-recording collaborator refused the snapshot.
    #[error(transparent)]
    Recorder(#[from] RecordError),
}

/// Convenience alias for checkout results.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Failure reported by a [`SaleRecorder`](crate::checkout::SaleRecorder)
/// implementation. The engine does not interpret the reason, it only
/// carries it back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sale could not be recorded: {reason}")]
pub struct RecordError {
    pub reason: String,
}

impl RecordError {
    pub fn new(reason: impl Into<String>) -> Self {
        RecordError {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Cart Outcomes
// =============================================================================

/// Why a cart mutation was rejected.
///
/// Rejections are not `Err`s: the engine's contract is silent no-op on
/// violation, and this reason rides along for hosts that want to warn the
/// user. The Display text is the warning.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    /// The requested units would push the batch past its stock.
    #[error("insufficient stock for batch {batch_id}: {available_units} units available, {requested_units} requested")]
    InsufficientStock {
        batch_id: String,
        available_units: i64,
        requested_units: i64,
    },

    /// A decrement would take the slot under its floor (1 pack when the
    /// batch has no dual mode, 0 otherwise).
    #[error("quantity for batch {batch_id} cannot go below its minimum")]
    BelowMinimumQuantity { batch_id: String },

    /// Unit-mode request on a batch with no loose-unit sale.
    #[error("batch {batch_id} does not sell loose units")]
    UnitModeUnavailable { batch_id: String },

    /// The addressed (batch, mode) slot does not exist in the cart.
    #[error("no {mode} line for batch {batch_id} in the cart")]
    MissingLine { batch_id: String, mode: String },

    /// The batch has no row in the cart at all.
    #[error("batch {batch_id} is not in the cart")]
    MissingBatch { batch_id: String },

    /// Quantity arguments must be positive.
    #[error("quantity must be positive")]
    NonPositiveQuantity,

    /// No batch of the product has unreserved stock left.
    #[error("no batch of {product} has stock available")]
    NoAvailableBatch { product: String },

    /// The session manager has no active session to operate on.
    #[error("no active order session")]
    NoActiveSession,
}

/// Tagged result of a cart mutation.
///
/// `Applied` and `Clamped` changed state; `Rejected` left the cart exactly
/// as it was. Hosts that ignore the value get the legacy silent behavior,
/// hosts that inspect it can tell the user what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum CartOutcome {
    /// The change took effect as requested.
    Applied,
    /// The change took effect, but the requested value was capped.
    Clamped { requested_bps: u32, applied_bps: u32 },
    /// The change was a no-op.
    Rejected(RejectReason),
}

impl CartOutcome {
    /// True when the cart state changed (applied or clamped).
    #[inline]
    pub const fn took_effect(&self) -> bool {
        !matches!(self, CartOutcome::Rejected(_))
    }

    /// True when the mutation was a no-op.
    #[inline]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, CartOutcome::Rejected(_))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "product_name".to_string(),
        };
        assert_eq!(err.to_string(), "product_name is required");

        let err = ValidationError::OutOfRange {
            field: "units_per_pack".to_string(),
            min: 1,
            max: 1000,
        };
        assert_eq!(err.to_string(), "units_per_pack must be between 1 and 1000");
    }

    #[test]
    fn test_checkout_error_messages() {
        let err = CheckoutError::BatchMissing {
            batch_id: "b-7".to_string(),
        };
        assert_eq!(err.to_string(), "batch b-7 is no longer in the catalog");
    }

    #[test]
    fn test_reject_reason_messages() {
        let reason = RejectReason::InsufficientStock {
            batch_id: "b-1".to_string(),
            available_units: 4,
            requested_units: 9,
        };
        assert_eq!(
            reason.to_string(),
            "insufficient stock for batch b-1: 4 units available, 9 requested"
        );
    }

    #[test]
    fn test_outcome_predicates() {
        assert!(CartOutcome::Applied.took_effect());
        assert!(CartOutcome::Clamped {
            requested_bps: 1000,
            applied_bps: 200
        }
        .took_effect());

        let rejected = CartOutcome::Rejected(RejectReason::NonPositiveQuantity);
        assert!(rejected.is_rejected());
        assert!(!rejected.took_effect());
    }
}
