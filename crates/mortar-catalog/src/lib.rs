//! # mortar-catalog: Collaborator Reference Implementations
//!
//! The engine in `mortar-core` touches the outside world through two seams:
//! it *consumes* a read-only batch catalog and *produces* order snapshots
//! to a sale recorder. This crate provides working in-memory
//! implementations of both, plus the shared-state wrapper hosts mount.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mortar POS Data Flow                             │
//! │                                                                         │
//! │  Host command (add product, switch batch, checkout)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  mortar-catalog (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │ MemoryCatalog │    │    SaleLog    │    │ EngineState  │   │   │
//! │  │   │  (memory.rs)  │    │ (sale_log.rs) │    │  (state.rs)  │   │   │
//! │  │   │               │    │               │    │              │   │   │
//! │  │   │ BatchCatalog  │    │ SaleRecorder  │    │ Arc<Mutex<   │   │   │
//! │  │   │ impl, indexed │    │ impl, append- │    │  SessionMgr>>│   │   │
//! │  │   │ + validated   │    │ only ledger   │    │ accessors    │   │   │
//! │  │   └───────┬───────┘    └───────▲───────┘    └──────┬───────┘   │   │
//! │  │           │                    │                   │           │   │
//! │  └───────────┼────────────────────┼───────────────────┼───────────┘   │
//! │              │ reads              │ snapshots         │ drives        │
//! │  ┌───────────▼────────────────────┴───────────────────▼───────────┐   │
//! │  │                    mortar-core (pure engine)                   │   │
//! │  │        sessions ─ carts ─ allocator ─ discounts ─ checkout     │   │
//! │  └────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`memory`] - Validated, indexed in-memory batch catalog with JSON seeding
//! - [`sale_log`] - Append-only in-memory sale recorder
//! - [`state`] - `Arc<Mutex<SessionManager>>` wrapper for threaded hosts
//! - [`error`] - Catalog error types
//!
//! ## Usage
//!
//! ```rust
//! use mortar_catalog::{MemoryCatalog, SaleLog};
//! use mortar_core::{Batch, BatchCatalog, ProductKey};
//! # use chrono::NaiveDate;
//!
//! let mut catalog = MemoryCatalog::new();
//! catalog.insert(Batch {
//!     id: "b-1".to_string(),
//!     product_name: "Panadol Extra".to_string(),
//!     dosage_form: "Tablet".to_string(),
//!     category: "Analgesic".to_string(),
//!     code: "PAN-X".to_string(),
//!     barcode: None,
//!     price_cents: 1099,
//!     cost_cents: 850,
//!     stock_packs: 5,
//!     units_per_pack: 6,
//!     expiry: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
//!     max_discount: None,
//! }).unwrap();
//!
//! let group = catalog.batches_for_product(&ProductKey {
//!     name: "Panadol Extra".to_string(),
//!     dosage_form: "Tablet".to_string(),
//! });
//! assert_eq!(group.len(), 1);
//!
//! let ledger = SaleLog::new();
//! assert!(ledger.is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod memory;
pub mod sale_log;
pub mod state;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CatalogError, CatalogResult};
pub use memory::MemoryCatalog;
pub use sale_log::SaleLog;
pub use state::EngineState;
