//! # Order Session Manager
//!
//! The "tabs" of the register: a bounded, ordered list of open orders,
//! each owning a fully independent [`Cart`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ SessionManager (cap = config.max_open)                              │
//! │                                                                     │
//! │   ┌─ Order 1 ──────┐ ┌─ Walk-in ● ────┐ ┌─ Mrs. Khan 📌 ─┐          │
//! │   │ cart: 3 rows   │ │ cart: 1 row    │ │ cart: 7 rows   │   ...    │
//! │   │ customer: None │ │ customer: None │ │ customer: Some │          │
//! │   └────────────────┘ └────────────────┘ └────────────────┘          │
//! │                            ▲ active                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing leaks between sessions: closing one discards its cart,
//! customer and search state without touching any other. Closing the
//! active session hands activation to the session that slid into its
//! position (or the new last one).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use crate::allocator::{self, AllocationReport};
use crate::cart::Cart;
use crate::catalog::BatchCatalog;
use crate::error::{CartOutcome, RejectReason};
use crate::types::{CustomerRef, ProductKey};
use crate::validation::validate_session_title;
use crate::DEFAULT_MAX_OPEN_TABS;

// =============================================================================
// Configuration
// =============================================================================

/// Construction-time knobs for a [`SessionManager`]. Passed in explicitly
/// so independent manager instances never share hidden state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    max_open: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            max_open: DEFAULT_MAX_OPEN_TABS,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps how many sessions may be open at once. Clamped to at least 1.
    pub fn with_max_open(mut self, max_open: usize) -> Self {
        self.max_open = max_open.max(1);
        self
    }

    pub const fn max_open(&self) -> usize {
        self.max_open
    }
}

// =============================================================================
// Order Session
// =============================================================================

/// One open order tab. The cart, customer and search context live and die
/// with the session; closing it discards them irrecoverably.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSession {
    #[ts(as = "String")]
    pub id: Uuid,
    pub title: String,
    /// Pinned sessions survive bulk close.
    pub pinned: bool,
    /// `None` is a walk-in sale.
    pub customer: Option<CustomerRef>,
    /// Product search text the host restores when the tab regains focus.
    pub search_query: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub cart: Cart,
}

impl OrderSession {
    fn new(title: String) -> Self {
        OrderSession {
            id: Uuid::new_v4(),
            title,
            pinned: false,
            customer: None,
            search_query: String::new(),
            created_at: Utc::now(),
            cart: Cart::new(),
        }
    }
}

/// Lightweight per-session row for tab strips and pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    #[ts(as = "String")]
    pub id: Uuid,
    pub title: String,
    pub pinned: bool,
    pub active: bool,
    pub line_count: usize,
    pub order_total_cents: i64,
}

// =============================================================================
// Session Manager
// =============================================================================

/// Owns every open [`OrderSession`] and the notion of which one is active.
///
/// All lifecycle operations follow the engine's silent-rejection policy:
/// an impossible request (cap reached, unknown id, bad index) returns a
/// `false`/`None` outcome and changes nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManager {
    config: SessionConfig,
    sessions: Vec<OrderSession>,
    active_id: Option<Uuid>,
    next_order_number: u64,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        SessionManager {
            config,
            sessions: Vec::new(),
            active_id: None,
            next_order_number: 0,
        }
    }

    // ===== Reads =====

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Open sessions in display order.
    pub fn sessions(&self) -> &[OrderSession] {
        &self.sessions
    }

    pub fn session(&self, id: &Uuid) -> Option<&OrderSession> {
        self.sessions.iter().find(|s| s.id == *id)
    }

    fn session_mut(&mut self, id: &Uuid) -> Option<&mut OrderSession> {
        self.sessions.iter_mut().find(|s| s.id == *id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn at_capacity(&self) -> bool {
        self.sessions.len() >= self.config.max_open
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active_id
    }

    pub fn active(&self) -> Option<&OrderSession> {
        self.active_id.and_then(|id| self.session(&id))
    }

    fn active_mut(&mut self) -> Option<&mut OrderSession> {
        let id = self.active_id?;
        self.session_mut(&id)
    }

    /// Mutable access to the active session's cart, for the per-line
    /// operations the host drives directly.
    pub fn active_cart_mut(&mut self) -> Option<&mut Cart> {
        self.active_mut().map(|s| &mut s.cart)
    }

    /// One row per session, resolved against the catalog for live totals.
    pub fn summaries(&self, catalog: &dyn BatchCatalog) -> Vec<SessionSummary> {
        self.sessions
            .iter()
            .map(|s| SessionSummary {
                id: s.id,
                title: s.title.clone(),
                pinned: s.pinned,
                active: self.active_id == Some(s.id),
                line_count: s.cart.line_count(),
                order_total_cents: s.cart.totals(catalog).order_total_cents,
            })
            .collect()
    }

    // ===== Lifecycle =====

    /// Opens a new session and makes it active. `None` once the cap is
    /// reached (the request is dropped, nothing changes).
    pub fn create(&mut self) -> Option<Uuid> {
        if self.at_capacity() {
            debug!(max_open = self.config.max_open, "Session cap reached, create ignored");
            return None;
        }
        self.next_order_number += 1;
        let session = OrderSession::new(format!("Order {}", self.next_order_number));
        let id = session.id;
        self.sessions.push(session);
        self.active_id = Some(id);
        info!(session_id = %id, open = self.sessions.len(), "Session created");
        Some(id)
    }

    /// Closes a session and discards its state. When the active session
    /// closes, activation falls to the session now occupying its position
    /// (or the new last one); an emptied manager has no active session.
    pub fn close(&mut self, id: &Uuid) -> bool {
        let Some(idx) = self.sessions.iter().position(|s| s.id == *id) else {
            return false;
        };
        let was_active = self.active_id == Some(*id);
        self.sessions.remove(idx);

        if was_active {
            self.active_id = if self.sessions.is_empty() {
                None
            } else {
                Some(self.sessions[idx.min(self.sessions.len() - 1)].id)
            };
        }
        info!(session_id = %id, open = self.sessions.len(), "Session closed");
        true
    }

    /// Bulk close sparing pinned sessions. Returns how many closed.
    pub fn close_unpinned(&mut self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.pinned);
        let closed = before - self.sessions.len();

        if closed > 0 {
            let still_open = self
                .active_id
                .is_some_and(|id| self.sessions.iter().any(|s| s.id == id));
            if !still_open {
                self.active_id = self.sessions.first().map(|s| s.id);
            }
            info!(closed, remaining = self.sessions.len(), "Closed unpinned sessions");
        }
        closed
    }

    pub fn set_active(&mut self, id: &Uuid) -> bool {
        if self.session(id).is_none() {
            return false;
        }
        self.active_id = Some(*id);
        debug!(session_id = %id, "Session activated");
        true
    }

    /// Renames a session; the title is trimmed and validated, and an
    /// invalid one leaves the old title in place.
    pub fn rename(&mut self, id: &Uuid, title: &str) -> bool {
        let Ok(title) = validate_session_title(title) else {
            return false;
        };
        let Some(session) = self.session_mut(id) else {
            return false;
        };
        session.title = title;
        true
    }

    pub fn set_pinned(&mut self, id: &Uuid, pinned: bool) -> bool {
        let Some(session) = self.session_mut(id) else {
            return false;
        };
        session.pinned = pinned;
        true
    }

    pub fn set_customer(&mut self, id: &Uuid, customer: Option<CustomerRef>) -> bool {
        let Some(session) = self.session_mut(id) else {
            return false;
        };
        session.customer = customer;
        true
    }

    pub fn set_search_query(&mut self, id: &Uuid, query: impl Into<String>) -> bool {
        let Some(session) = self.session_mut(id) else {
            return false;
        };
        session.search_query = query.into();
        true
    }

    /// Moves the session at `from` to position `to`. A pure list
    /// permutation: activation and per-session state are untouched.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.sessions.len() || to >= self.sessions.len() {
            return false;
        }
        let session = self.sessions.remove(from);
        self.sessions.insert(to, session);
        true
    }

    // ===== Active-cart operations =====

    /// Adds one pack of `product` to the active session's cart, batch
    /// chosen FEFO (or the explicit id when it still has stock).
    pub fn add_product(
        &mut self,
        catalog: &dyn BatchCatalog,
        product: &ProductKey,
        explicit_batch_id: Option<&str>,
    ) -> CartOutcome {
        let Some(session) = self.active_mut() else {
            return CartOutcome::Rejected(RejectReason::NoActiveSession);
        };
        allocator::add_product(&mut session.cart, catalog, product, explicit_batch_id)
    }

    /// Runs the auto-split batch switch against the active session's cart.
    /// `None` when no session is active.
    pub fn switch_batch(
        &mut self,
        catalog: &dyn BatchCatalog,
        product: &ProductKey,
        target_batch_id: &str,
        requested_packs: i64,
        requested_units: i64,
    ) -> Option<AllocationReport> {
        let session = self.active_mut()?;
        Some(allocator::switch_batch_with_auto_split(
            &mut session.cart,
            catalog,
            product,
            target_batch_id,
            requested_packs,
            requested_units,
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
