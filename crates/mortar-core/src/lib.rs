//! # mortar-core: Pure Order Engine for Mortar POS
//!
//! This crate is the **heart** of Mortar POS. It contains the entire order
//! cart / batch-allocation engine as pure logic with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mortar POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        Host / Frontend                          │   │
//! │  │    Search UI ──► Tab Strip ──► Cart Table ──► Checkout Modal    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ UI events in, views out                │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mortar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐ │   │
//! │  │   │  session  │──►│   cart    │◄──│ allocator │   │ checkout │ │   │
//! │  │   │ tab list  │   │ two-slot  │   │ FEFO +    │   │ snapshot │ │   │
//! │  │   │ + active  │   │ rows      │   │ auto-split│   │ builder  │ │   │
//! │  │   └───────────┘   └─────┬─────┘   └─────┬─────┘   └────┬─────┘ │   │
//! │  │                         │               │              │       │   │
//! │  │   ┌───────────┐   ┌─────▼─────┐   ┌─────▼─────┐        │       │   │
//! │  │   │   money   │   │ discount  │   │  catalog  │        │       │   │
//! │  │   │  cents    │   │  policy   │   │  (trait)  │        │       │   │
//! │  │   └───────────┘   └───────────┘   └───────────┘        │       │   │
//! │  │                                                        │       │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE LOGIC       │       │   │
//! │  └────────────────────────────────────────────────────────┼───────┘   │
//! │                                                           │           │
//! │  ┌────────────────────────────────────────────────────────▼───────┐   │
//! │  │            External Collaborators (mortar-catalog etc.)        │   │
//! │  │       read-only batch catalog  •  sale recorder / ledger       │   │
//! │  └────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Batch, ProductKey, SaleMode, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`discount`] - Basis-point rates and the margin-derived discount cap
//! - [`cart`] - The per-order cart engine: two-slot rows, stock invariant
//! - [`allocator`] - FEFO batch selection and cross-batch auto-split
//! - [`session`] - Bounded, isolated order sessions ("tabs")
//! - [`checkout`] - Snapshot assembly and the sale-recorder seam
//! - [`catalog`] - The read-only batch catalog trait the engine consumes
//! - [`error`] - Domain error types and the cart outcome enum
//! - [`validation`] - Structural input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Logic**: Every operation is deterministic and synchronous;
//!    database, network and file access are FORBIDDEN here
//! 2. **Integer Arithmetic**: Money is cents (i64), discounts are basis
//!    points (u32), quantities are internal units (i64) - fractional packs
//!    exist only at the display boundary
//! 3. **Atomic Mutations**: Every cart operation fully applies or leaves
//!    the cart untouched; violations are silent no-ops with a tagged
//!    outcome, never panics or partial states
//! 4. **Explicit Errors**: The one hard failure path (checkout) is typed;
//!    nothing is stringly-typed or thrown
//!
//! ## Example Usage
//!
//! ```rust
//! use mortar_core::money::Money;
//! use mortar_core::discount::DiscountRate;
//!
//! // Prices are integer cents (never floats!)
//! let pack_price = Money::from_cents(1099); // $10.99 per 6-tablet pack
//!
//! // Selling 4 loose tablets prorates the pack price with one rounding
//! let four_units = pack_price.prorated(4, 6);
//! assert_eq!(four_units.cents(), 733);
//!
//! // Discounts are basis points, applied half-up
//! let net = four_units.apply_discount(DiscountRate::from_percent(10));
//! assert_eq!(net.cents(), 660);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod discount;
pub mod error;
pub mod money;
pub mod session;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mortar_core::Cart` instead of
// `use mortar_core::cart::Cart`

pub use allocator::{
    add_product, select_for_product, switch_batch_with_auto_split, AllocatedLine, AllocationReport,
};
pub use cart::{BatchEntry, Cart, CartTotals, LineSlot, MergedRow, RowSlot};
pub use catalog::BatchCatalog;
pub use checkout::{Checkout, CheckoutConfig, OrderLine, OrderSnapshot, SaleRecorder};
pub use discount::{effective_max_discount, DiscountRate, FULL_DISCOUNT};
pub use error::{
    CartOutcome, CheckoutError, CheckoutResult, RecordError, RejectReason, ValidationError,
};
pub use money::Money;
pub use session::{OrderSession, SessionConfig, SessionManager, SessionSummary};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default cap on simultaneously open order sessions.
///
/// ## Business Reason
/// A register with dozens of half-finished orders is a register with
/// forgotten orders. Eight tabs covers the busiest observed counter flow;
/// hosts can raise it per install via [`SessionConfig`].
pub const DEFAULT_MAX_OPEN_TABS: usize = 8;

/// Maximum internal units a single cart line may hold.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
/// and keeps every money computation far away from i64 overflow.
pub const MAX_LINE_UNITS: i64 = 9_999;

/// Maximum believable units-per-pack for a catalog batch.
///
/// ## Business Reason
/// Nothing on a pharmacy shelf splits into more than a thousand sellable
/// units; anything larger is a data-entry error and is rejected at the
/// catalog boundary.
pub const MAX_UNITS_PER_PACK: i64 = 1_000;

/// Default flat delivery surcharge, in cents.
///
/// ## Business Reason
/// Delivery orders carry a fixed handling fee rather than a percentage;
/// configurable per install via [`CheckoutConfig`].
pub const DEFAULT_DELIVERY_FEE_CENTS: i64 = 500;
