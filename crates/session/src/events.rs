//! Outbound state-change events and the observer seam.
//!
//! Hooks receive owned event data and cannot reach back into engine state,
//! so a notification surface (chat bridge, console, metrics) plugs in
//! without the engine depending on it.

use std::sync::Arc;

use auction_core::MilestoneKind;
use types::{
    CompletedLot, ConfirmationId, DurationMs, Lot, LotId, MemberId, MemberName, MemberSpend,
    Points, Timestamp,
};

use crate::coordinator::SessionStats;

/// State-change events emitted by the session coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum AuctionEvent {
    /// A session began driving the queue.
    SessionStarted { lots: usize, label: String },
    /// A lot was announced; bidding opens after the preview delay.
    LotPreview {
        lot: Lot,
        position: usize,
        total: usize,
        opens_in_ms: DurationMs,
    },
    /// Bidding opened on the lot.
    LotActive {
        lot_id: LotId,
        label: String,
        current_bid: Points,
        deadline: Timestamp,
    },
    /// A milestone announcement fired.
    Milestone {
        lot_id: LotId,
        kind: MilestoneKind,
        current_bid: Points,
        leader: Option<MemberName>,
        remaining_ms: DurationMs,
    },
    /// A proposal was accepted and awaits confirm or cancel.
    ConfirmRequired {
        id: ConfirmationId,
        bidder: MemberId,
        name: MemberName,
        amount: Points,
        needed: Points,
        is_self: bool,
        expires_at: Timestamp,
    },
    /// A bid confirmed as the new high.
    HighBid {
        lot_id: LotId,
        name: MemberName,
        amount: Points,
        previous_bid: Points,
        remaining_ms: DurationMs,
    },
    /// The previous leader lost the lead.
    Outbid {
        member: MemberId,
        name: MemberName,
        label: String,
        new_amount: Points,
    },
    /// A pending confirmation expired unanswered.
    ConfirmationExpired {
        id: ConfirmationId,
        bidder: MemberId,
        name: MemberName,
    },
    /// A pending confirmation was canceled by its proposer.
    ConfirmationCanceled {
        id: ConfirmationId,
        bidder: MemberId,
        name: MemberName,
    },
    /// A late confirm pushed the deadline out.
    DeadlineExtended {
        lot_id: LotId,
        new_deadline: Timestamp,
        extension_count: u32,
    },
    /// The lot sold to one or more winners.
    LotSold { result: CompletedLot },
    /// The lot closed without bids.
    LotUnsold { lot: Lot, will_requeue: bool },
    /// The next lot starts after the inter-lot delay.
    NextLot {
        label: String,
        start_price: Points,
        starts_in_ms: DurationMs,
    },
    /// The countdown was suspended.
    SessionPaused { remaining_ms: DurationMs },
    /// The countdown resumed with a recomputed deadline.
    SessionResumed { deadline: Timestamp },
    /// The balance snapshot was refreshed mid-session.
    CacheRefreshed { members: usize },
    /// The session finalized; `results` is the full per-member spend set.
    SessionFinalized {
        stats: SessionStats,
        results: Vec<MemberSpend>,
    },
    /// Result submission failed after retries. The result set must be
    /// reconciled manually; locks and cache were cleared regardless.
    SubmissionFailed {
        results: Vec<MemberSpend>,
        error: String,
    },
    /// In-flight state was recovered after a restart.
    StateRestored {
        queued: usize,
        holds: usize,
        active_lot: Option<String>,
    },
}

/// Observer of session lifecycle events.
///
/// Hooks are called in registration order and receive borrowed events;
/// clone what you need to keep. They must not block for long — they run
/// inside the coordinator's critical sections.
pub trait SessionHook: Send + Sync {
    /// Hook name for diagnostics.
    fn name(&self) -> &str;

    /// Called for every emitted event.
    fn on_event(&self, event: &AuctionEvent);
}

/// Ordered collection of registered hooks.
#[derive(Default)]
pub struct HookRunner {
    hooks: Vec<Arc<dyn SessionHook>>,
}

impl HookRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook.
    pub fn add(&mut self, hook: Arc<dyn SessionHook>) {
        self.hooks.push(hook);
    }

    /// Fan an event out to every hook.
    pub fn emit(&self, event: &AuctionEvent) {
        for hook in &self.hooks {
            hook.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl SessionHook for Recorder {
        fn name(&self) -> &str {
            "Recorder"
        }

        fn on_event(&self, event: &AuctionEvent) {
            if let AuctionEvent::SessionStarted { label, .. } = event {
                self.seen.lock().unwrap().push(label.clone());
            }
        }
    }

    #[test]
    fn test_hooks_receive_events_in_order() {
        let mut runner = HookRunner::new();
        let first = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let second = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        runner.add(first.clone());
        runner.add(second.clone());
        assert_eq!(runner.len(), 2);

        runner.emit(&AuctionEvent::SessionStarted {
            lots: 3,
            label: "test".into(),
        });

        assert_eq!(*first.seen.lock().unwrap(), vec!["test"]);
        assert_eq!(*second.seen.lock().unwrap(), vec!["test"]);
    }
}
