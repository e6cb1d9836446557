//! Per-lot runtime state: high bid, leader, history, deadline, extensions,
//! and milestone announcement flags.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::{Bid, DurationMs, Lot, LotStatus, MemberName, Points, Timestamp};

use crate::error::{BidError, Result};

/// The three escalating announcements fired before a lot's deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneKind {
    GoingOnce,
    GoingTwice,
    FinalCall,
}

impl MilestoneKind {
    /// Human label used by notification surfaces.
    pub fn label(self) -> &'static str {
        match self {
            MilestoneKind::GoingOnce => "GOING ONCE",
            MilestoneKind::GoingTwice => "GOING TWICE",
            MilestoneKind::FinalCall => "FINAL CALL",
        }
    }
}

/// Idempotency flags so a rescheduled timer set cannot double-announce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct MilestoneFlags {
    going_once: bool,
    going_twice: bool,
    final_call: bool,
}

impl MilestoneFlags {
    fn get(&self, kind: MilestoneKind) -> bool {
        match kind {
            MilestoneKind::GoingOnce => self.going_once,
            MilestoneKind::GoingTwice => self.going_twice,
            MilestoneKind::FinalCall => self.final_call,
        }
    }

    fn set(&mut self, kind: MilestoneKind) {
        match kind {
            MilestoneKind::GoingOnce => self.going_once = true,
            MilestoneKind::GoingTwice => self.going_twice = true,
            MilestoneKind::FinalCall => self.final_call = true,
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Runtime state of the lot currently being auctioned.
///
/// Created when a lot leaves the queue, archived into a `CompletedLot`
/// when it ends. The immutable lot definition rides along; everything else
/// here is mutated only through the engine's protocol operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotRuntime {
    /// The immutable lot definition.
    pub lot: Lot,
    /// Current lifecycle state.
    pub status: LotStatus,
    /// Current high bid (the start price until the first confirm).
    pub current_bid: Points,
    /// Current leader, if any confirmed bid exists.
    pub leader: Option<Bid>,
    /// Full ordered bid history.
    pub bids: Vec<Bid>,
    /// Absolute end deadline while active.
    pub deadline: Timestamp,
    /// Remaining countdown captured at pause time.
    paused_remaining: Option<DurationMs>,
    /// Anti-snipe extensions applied so far.
    pub extension_count: u32,
    /// Which milestone announcements have fired for the current deadline.
    milestones: MilestoneFlags,
}

impl LotRuntime {
    /// Create runtime state for a lot entering preview.
    pub fn preview(lot: Lot) -> Self {
        let current_bid = lot.start_price;
        Self {
            lot,
            status: LotStatus::Preview,
            current_bid,
            leader: None,
            bids: Vec::new(),
            deadline: 0,
            paused_remaining: None,
            extension_count: 0,
            milestones: MilestoneFlags::default(),
        }
    }

    /// Open bidding: sets the deadline from the lot duration.
    pub fn activate(&mut self, now: Timestamp) -> Result<Timestamp> {
        if self.status != LotStatus::Preview {
            return Err(BidError::InvalidTransition {
                reason: "only a previewed lot can activate",
            });
        }
        self.status = LotStatus::Active;
        self.deadline = now + self.lot.duration_ms;
        Ok(self.deadline)
    }

    /// Suspend the countdown, preserving remaining time.
    pub fn pause(&mut self, now: Timestamp) -> Result<DurationMs> {
        if self.status != LotStatus::Active {
            return Err(BidError::InvalidTransition {
                reason: "only an active lot can pause",
            });
        }
        let remaining = self.deadline.saturating_sub(now);
        self.status = LotStatus::Paused;
        self.paused_remaining = Some(remaining);
        Ok(remaining)
    }

    /// Resume the countdown. The new deadline is `now + remaining`, floored
    /// so a lot never resumes straight into the snipe window.
    pub fn resume(&mut self, now: Timestamp, floor_ms: DurationMs) -> Result<Timestamp> {
        if self.status != LotStatus::Paused {
            return Err(BidError::InvalidTransition {
                reason: "only a paused lot can resume",
            });
        }
        let remaining = self.paused_remaining.take().unwrap_or(0).max(floor_ms);
        self.status = LotStatus::Active;
        self.deadline = now + remaining;
        Ok(self.deadline)
    }

    /// Close the lot.
    pub fn end(&mut self) {
        self.status = LotStatus::Ended;
    }

    /// Time left until the deadline.
    pub fn remaining(&self, now: Timestamp) -> DurationMs {
        self.deadline.saturating_sub(now)
    }

    /// Record a confirmed bid as the new high.
    pub fn record_bid(&mut self, bid: Bid) {
        self.current_bid = bid.amount;
        self.leader = Some(bid.clone());
        self.bids.push(bid);
    }

    /// Mark a milestone as announced. Returns false when it already fired
    /// for the current deadline, so a stale timer discards itself.
    pub fn mark_milestone(&mut self, kind: MilestoneKind) -> bool {
        if self.milestones.get(kind) {
            return false;
        }
        self.milestones.set(kind);
        true
    }

    /// Whether a milestone already fired for the current deadline.
    pub fn milestone_fired(&self, kind: MilestoneKind) -> bool {
        self.milestones.get(kind)
    }

    /// Push the deadline out by one extension and re-arm the milestone
    /// announcements for the new deadline. Returns the new deadline, or
    /// None when the extension cap is reached.
    pub fn extend(&mut self, extension_ms: DurationMs, max_extensions: u32) -> Option<Timestamp> {
        if self.extension_count >= max_extensions {
            return None;
        }
        self.deadline += extension_ms;
        self.extension_count += 1;
        self.milestones.reset();
        Some(self.deadline)
    }

    /// Current leader's display name, if any.
    pub fn leader_name(&self) -> Option<&MemberName> {
        self.leader.as_ref().map(|bid| &bid.name)
    }

    /// Determine the winning bids for this lot.
    ///
    /// Single-winner lots yield the current leader. Batch lots rank every
    /// bidder's best bid by amount descending (earliest confirmation wins a
    /// tie) and take the top `quantity` distinct bidders, each at their own
    /// bid amount. This is a sealed-ranking rule, not a clearing price.
    pub fn winning_bids(&self) -> Vec<Bid> {
        if self.lot.quantity <= 1 {
            return self.leader.clone().into_iter().collect();
        }

        let mut best: HashMap<MemberName, Bid> = HashMap::new();
        for bid in &self.bids {
            let key = bid.name.to_lowercase();
            match best.get(&key) {
                Some(held) if held.amount >= bid.amount => {}
                _ => {
                    best.insert(key, bid.clone());
                }
            }
        }

        let mut ranked: Vec<Bid> = best.into_values().collect();
        ranked.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.at.cmp(&b.at)));
        ranked.truncate(self.lot.quantity as usize);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Lot, LotId, MemberId, Provenance};

    fn lot(quantity: u32) -> Lot {
        Lot::new(
            LotId(1),
            "Sigil",
            Points(100),
            90_000,
            quantity,
            Provenance::Catalog,
        )
    }

    fn bid(member: u64, name: &str, amount: i64, at: Timestamp) -> Bid {
        Bid {
            bidder: MemberId(member),
            name: name.to_string(),
            amount: Points(amount),
            at,
        }
    }

    #[test]
    fn test_activate_sets_deadline() {
        let mut runtime = LotRuntime::preview(lot(1));
        assert_eq!(runtime.status, LotStatus::Preview);
        let deadline = runtime.activate(10_000).unwrap();
        assert_eq!(deadline, 100_000);
        assert_eq!(runtime.status, LotStatus::Active);
        assert!(runtime.activate(10_000).is_err());
    }

    #[test]
    fn test_pause_preserves_remaining_and_resume_floors() {
        let mut runtime = LotRuntime::preview(lot(1));
        runtime.activate(0).unwrap();

        let remaining = runtime.pause(60_000).unwrap();
        assert_eq!(remaining, 30_000);
        assert_eq!(runtime.status, LotStatus::Paused);

        // 30s remaining is below the 60s floor; resume pushes to the floor.
        let deadline = runtime.resume(200_000, 60_000).unwrap();
        assert_eq!(deadline, 260_000);
        assert_eq!(runtime.status, LotStatus::Active);
    }

    #[test]
    fn test_milestones_fire_once_until_extension() {
        let mut runtime = LotRuntime::preview(lot(1));
        runtime.activate(0).unwrap();

        assert!(runtime.mark_milestone(MilestoneKind::GoingOnce));
        assert!(!runtime.mark_milestone(MilestoneKind::GoingOnce));

        runtime.extend(60_000, 15).unwrap();
        // Extension re-arms the announcements for the new deadline.
        assert!(runtime.mark_milestone(MilestoneKind::GoingOnce));
    }

    #[test]
    fn test_extension_cap() {
        let mut runtime = LotRuntime::preview(lot(1));
        runtime.activate(0).unwrap();

        for _ in 0..15 {
            assert!(runtime.extend(60_000, 15).is_some());
        }
        assert!(runtime.extend(60_000, 15).is_none());
        assert_eq!(runtime.extension_count, 15);
    }

    #[test]
    fn test_single_winner_is_leader() {
        let mut runtime = LotRuntime::preview(lot(1));
        runtime.activate(0).unwrap();
        runtime.record_bid(bid(1, "ayla", 150, 10));
        runtime.record_bid(bid(2, "bren", 200, 20));

        let winners = runtime.winning_bids();
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].name, "bren");
        assert_eq!(winners[0].amount, Points(200));
    }

    #[test]
    fn test_no_bids_no_winner() {
        let runtime = LotRuntime::preview(lot(1));
        assert!(runtime.winning_bids().is_empty());
    }

    #[test]
    fn test_batch_ranking_with_tie_break() {
        let mut runtime = LotRuntime::preview(lot(2));
        runtime.bids = vec![
            bid(1, "ayla", 300, 40),
            bid(2, "bren", 250, 10),
            bid(3, "cato", 250, 20),
            bid(4, "dara", 100, 5),
        ];

        let winners = runtime.winning_bids();
        assert_eq!(winners.len(), 2);
        assert_eq!(winners[0].name, "ayla");
        assert_eq!(winners[0].amount, Points(300));
        // Equal amounts: the earlier confirmation wins.
        assert_eq!(winners[1].name, "bren");
        assert_eq!(winners[1].amount, Points(250));
    }

    #[test]
    fn test_batch_counts_each_bidder_once() {
        let mut runtime = LotRuntime::preview(lot(2));
        runtime.bids = vec![
            bid(1, "ayla", 150, 10),
            bid(1, "ayla", 300, 30),
            bid(2, "bren", 200, 20),
        ];

        let winners = runtime.winning_bids();
        assert_eq!(winners.len(), 2);
        assert_eq!(winners[0].name, "ayla");
        assert_eq!(winners[0].amount, Points(300));
        assert_eq!(winners[1].name, "bren");
    }
}
