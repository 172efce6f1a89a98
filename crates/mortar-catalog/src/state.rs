//! # Shared Engine State
//!
//! The engine itself is synchronous and `&mut self`-based; it owns no
//! locks. Hosts whose command handlers can run on multiple threads mount
//! the session manager behind this wrapper so every operation is one
//! exclusive critical section.

use std::sync::{Arc, Mutex};

use mortar_core::{SessionConfig, SessionManager};

/// Host-managed engine state.
///
/// ## Thread Safety
/// Uses `Arc<Mutex<SessionManager>>` because:
/// - `Arc`: Allows shared ownership across threads
/// - `Mutex`: Ensures only one thread mutates the sessions at a time
///
/// ## Why Not RwLock?
/// Session operations are quick and most of them mutate (adds, switches,
/// quantity edits). A RwLock would add complexity with minimal benefit.
#[derive(Debug, Clone)]
pub struct EngineState {
    sessions: Arc<Mutex<SessionManager>>,
}

impl EngineState {
    /// Creates shared state around a fresh session manager.
    pub fn new(config: SessionConfig) -> Self {
        EngineState {
            sessions: Arc::new(Mutex::new(SessionManager::new(config))),
        }
    }

    /// Executes a function with read access to the sessions.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let open = state.with_sessions(|mgr| mgr.len());
    /// ```
    pub fn with_sessions<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SessionManager) -> R,
    {
        let sessions = self.sessions.lock().expect("Session mutex poisoned");
        f(&sessions)
    }

    /// Executes a function with write access to the sessions.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// state.with_sessions_mut(|mgr| mgr.create());
    /// ```
    pub fn with_sessions_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SessionManager) -> R,
    {
        let mut sessions = self.sessions.lock().expect("Session mutex poisoned");
        f(&mut sessions)
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
