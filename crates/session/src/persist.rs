//! Durable snapshot of in-flight engine state.
//!
//! One authoritative store, written after every state-mutating operation
//! and read once at startup. Pending confirmations are deliberately
//! absent: their timers cannot survive a restart, and no locks exist at
//! propose time, so dropping them unwinds cleanly.

use auction_core::{LockManager, LotRuntime, PointsCache};
use serde::{Deserialize, Serialize};
use types::{CompletedLot, Lot, Timestamp};

use crate::coordinator::SessionStats;

/// Everything needed to resume a session after a process restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Remaining queue, in order.
    pub queue: Vec<Lot>,
    /// Runtime state of the lot being auctioned, if any. On restore, an
    /// active lot's timers are rescheduled against this persisted
    /// deadline, never restarted from scratch.
    pub active: Option<LotRuntime>,
    /// Current point holds.
    pub locks: LockManager,
    /// Balance snapshot in effect when the state was saved.
    pub cache: Option<PointsCache>,
    /// Completed lots of the in-flight session.
    pub history: Vec<CompletedLot>,
    /// Session metadata; None when no session is active.
    pub session_started_at: Option<Timestamp>,
    pub session_label: Option<String>,
    pub stats: SessionStats,
    /// Next lot id to assign.
    pub next_lot_id: u64,
}

/// Error from the snapshot store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("snapshot store: {0}")]
pub struct StoreError(pub String);

/// Durable snapshot store.
///
/// The store is a crash-recovery fallback, never a second writer: the
/// coordinator is the only component that saves, and it saves the whole
/// document each time.
pub trait SnapshotStore: Send {
    /// Persist the full state document.
    fn save(&self, state: &PersistedState) -> Result<(), StoreError>;

    /// Load the last saved document, if any.
    fn load(&self) -> Result<Option<PersistedState>, StoreError>;

    /// Drop the saved document (safe reset / clean shutdown).
    fn clear(&self) -> Result<(), StoreError>;

    /// Append a completed lot to the durable results log.
    fn record_result(&self, completed: &CompletedLot) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_empty() {
        let state = PersistedState::default();
        assert!(state.queue.is_empty());
        assert!(state.active.is_none());
        assert!(state.locks.is_empty());
        assert!(state.session_started_at.is_none());
    }
}
