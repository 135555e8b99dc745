//! Stream sessions and cooperative cancellation.
//!
//! Every stream gets a [`SessionGuard`] from the [`SessionTable`]. The table
//! maps session IDs to a shared `active` flag; clearing the flag asks the
//! stream to stop at its next check point. Dropping the guard removes the
//! session, so cleanup happens on every exit path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifier of one streaming call. Never reused within a table.
pub type SessionId = u64;

type Sessions = HashMap<SessionId, Arc<AtomicBool>>;

/// Set of live stream sessions.
///
/// Cheap to clone; clones share the same sessions and ID counter.
#[derive(Debug, Clone)]
pub struct SessionTable {
    sessions: Arc<Mutex<Sessions>>,
    next_id: Arc<AtomicU64>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new active session.
    pub fn open(&self) -> SessionGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        self.lock().insert(id, active.clone());
        tracing::debug!(session = id, "Stream session opened");

        SessionGuard {
            id,
            active,
            table: self.clone(),
        }
    }

    /// Clear the active flag of a session.
    ///
    /// Returns `false` if no live session has this ID.
    pub fn stop(&self, id: SessionId) -> bool {
        match self.lock().get(&id) {
            Some(active) => {
                active.store(false, Ordering::Release);
                tracing::debug!(session = id, "Stream session cancelled");
                true
            }
            None => {
                tracing::warn!(session = id, "Stop requested for unknown stream session");
                false
            }
        }
    }

    /// Whether a session is still tracked (cancelled or not).
    pub fn contains(&self, id: SessionId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn remove(&self, id: SessionId) {
        if self.lock().remove(&id).is_some() {
            tracing::debug!(session = id, "Stream session closed");
        }
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Ownership of one tracked session. Removes it from the table on drop.
#[derive(Debug)]
pub struct SessionGuard {
    id: SessionId,
    active: Arc<AtomicBool>,
    table: SessionTable,
}

impl SessionGuard {
    #[inline]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// A handle that can cancel this session from elsewhere.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            id: self.id,
            active: self.active.clone(),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.table.remove(self.id);
    }
}

/// Cancellation token for one stream, passed alongside it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    id: SessionId,
    active: Arc<AtomicBool>,
}

impl CancelHandle {
    #[inline]
    pub fn session_id(&self) -> SessionId {
        self.id
    }

    /// Request the stream to stop at its next check point.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        !self.active.load(Ordering::Acquire)
    }
}
