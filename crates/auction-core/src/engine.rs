//! The two-phase bid protocol: propose, then confirm or cancel.
//!
//! All lock mutation happens inside `confirm`; propose, cancel, and expiry
//! never touch holds, so an unconfirmed proposal unwinds with no side
//! effects. Races between competing proposals resolve by amount: the
//! highest pending proposal wins, regardless of which confirmation
//! arrives first.

use types::{Bid, BidRules, DurationMs, Lot, MemberId, Points, Timestamp};

use crate::confirm::{ConfirmationBook, PendingConfirmation, RateLimiter};
use crate::error::{BidError, Result};
use crate::locks::LockManager;
use crate::lot::LotRuntime;
use crate::points::PointsCache;

/// Receipt returned to a proposer, to be echoed by the confirmation surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposeReceipt {
    pub id: types::ConfirmationId,
    pub bidder: MemberId,
    pub name: String,
    pub amount: Points,
    /// Newly-available points required (delta for a self-overbid).
    pub needed: Points,
    pub is_self: bool,
    pub expires_at: Timestamp,
    /// Points left available if this bid confirms.
    pub available_after: Points,
}

/// Result of a successful confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmOutcome {
    /// The newly confirmed high bid.
    pub bid: Bid,
    /// The outbid previous leader, absent on a self-overbid.
    pub previous_leader: Option<Bid>,
    /// The high bid before this confirm.
    pub previous_bid: Points,
    pub is_self: bool,
    /// Whether this confirm triggered an anti-snipe extension.
    pub extended: bool,
    pub deadline: Timestamp,
    pub remaining_ms: DurationMs,
    pub extension_count: u32,
}

/// Engine state for the bidding path: balance snapshot, holds, pending
/// confirmations, rate limits, and the active lot runtime.
///
/// Owned by the session coordinator; constructed per process lifetime with
/// all mutation routed through these methods.
#[derive(Debug, Default)]
pub struct BidEngine {
    rules: BidRules,
    cache: Option<PointsCache>,
    locks: LockManager,
    book: ConfirmationBook,
    rate: RateLimiter,
    active: Option<LotRuntime>,
}

/// Lock entries are keyed by lower-cased member name so a member whose
/// display casing drifts between bids still holds a single entry.
fn lock_key(name: &str) -> String {
    name.to_lowercase()
}

impl BidEngine {
    /// Create an engine with the given protocol rules.
    pub fn new(rules: BidRules) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    pub fn rules(&self) -> &BidRules {
        &self.rules
    }

    /// Install a fresh balance snapshot (session start or periodic refresh).
    pub fn replace_cache(&mut self, cache: PointsCache) {
        self.cache = Some(cache);
    }

    pub fn cache(&self) -> Option<&PointsCache> {
        self.cache.as_ref()
    }

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    /// Restore holds from a persisted snapshot.
    pub fn restore_locks(&mut self, locks: LockManager) {
        self.locks = locks;
    }

    pub fn active(&self) -> Option<&LotRuntime> {
        self.active.as_ref()
    }

    /// Restore a persisted lot runtime (crash recovery).
    pub fn restore_active(&mut self, runtime: LotRuntime) {
        self.active = Some(runtime);
    }

    /// Number of unresolved confirmations.
    pub fn pending_count(&self) -> usize {
        self.book.len()
    }

    // =========================================================================
    // Lot lifecycle
    // =========================================================================

    /// Move a dequeued lot into preview.
    pub fn start_preview(&mut self, lot: Lot) -> Result<&LotRuntime> {
        if self.active.is_some() {
            return Err(BidError::InvalidTransition {
                reason: "a lot is already in progress",
            });
        }
        self.active = Some(LotRuntime::preview(lot));
        Ok(self.active.as_ref().expect("just set"))
    }

    /// Open bidding on the previewed lot; returns the deadline.
    pub fn activate(&mut self, now: Timestamp) -> Result<Timestamp> {
        self.active
            .as_mut()
            .ok_or(BidError::NoActiveLot)?
            .activate(now)
    }

    /// Suspend the active countdown; returns the preserved remaining time.
    pub fn pause(&mut self, now: Timestamp) -> Result<DurationMs> {
        self.active.as_mut().ok_or(BidError::NoActiveLot)?.pause(now)
    }

    /// Resume a paused countdown; returns the recomputed deadline.
    pub fn resume(&mut self, now: Timestamp, floor_ms: DurationMs) -> Result<Timestamp> {
        self.active
            .as_mut()
            .ok_or(BidError::NoActiveLot)?
            .resume(now, floor_ms)
    }

    /// Operator extension: push the deadline out by `extra_ms`.
    pub fn extend_deadline(&mut self, extra_ms: DurationMs) -> Result<Timestamp> {
        let runtime = self.active.as_mut().ok_or(BidError::NoActiveLot)?;
        runtime.deadline += extra_ms;
        Ok(runtime.deadline)
    }

    /// Mark a milestone announcement. Returns false if it already fired.
    pub fn mark_milestone(&mut self, kind: crate::lot::MilestoneKind) -> Result<bool> {
        Ok(self
            .active
            .as_mut()
            .ok_or(BidError::NoActiveLot)?
            .mark_milestone(kind))
    }

    /// Close the active lot and determine winners.
    ///
    /// Sold lots convert the running leader hold into per-winner holds at
    /// each winner's own amount, so holds equal committed spend until the
    /// session finalizes. Unsold lots touch no locks. Pending
    /// confirmations are discarded either way.
    pub fn close(&mut self, now: Timestamp) -> Result<types::CompletedLot> {
        let mut runtime = self.active.take().ok_or(BidError::NoActiveLot)?;
        runtime.end();
        self.book.clear();

        let winners = runtime.winning_bids();
        if let Some(leader) = &runtime.leader {
            self.locks.unlock(&lock_key(&leader.name), runtime.current_bid);
        }
        for winner in &winners {
            self.locks.lock(&lock_key(&winner.name), winner.amount);
        }

        Ok(types::CompletedLot {
            total_bids: runtime.bids.len(),
            lot: runtime.lot,
            winners,
            ended_at: now,
        })
    }

    /// Clear all per-session state: holds, snapshot, cooldowns, pendings.
    /// Runs unconditionally at finalization so stale locks never outlive a
    /// session.
    pub fn clear_session(&mut self) {
        self.locks.clear();
        self.cache = None;
        self.rate.clear();
        self.book.clear();
        self.active = None;
    }

    // =========================================================================
    // Bid protocol
    // =========================================================================

    /// Propose a bid. Rejected outright (no state created) unless the lot
    /// is active, the amount strictly exceeds the current high bid, the
    /// member is inside no cooldown, and the required delta is available.
    pub fn propose(
        &mut self,
        now: Timestamp,
        bidder: MemberId,
        name: &str,
        amount: Points,
    ) -> Result<ProposeReceipt> {
        let runtime = match &self.active {
            Some(runtime) if runtime.status == types::LotStatus::Active => runtime,
            _ => return Err(BidError::NoActiveLot),
        };
        let cache = self.cache.as_ref().ok_or(BidError::CacheNotLoaded)?;

        if let Err(wait_ms) = self.rate.check(bidder, now, self.rules.rate_limit_ms) {
            return Err(BidError::RateLimited { wait_ms });
        }

        if !amount.is_positive() {
            return Err(BidError::InvalidAmount);
        }
        if amount <= runtime.current_bid {
            return Err(BidError::BidTooLow {
                current: runtime.current_bid,
            });
        }

        let total = cache.balance(name);
        if !total.is_positive() {
            return Err(BidError::NoPoints);
        }

        let is_self = runtime
            .leader_name()
            .is_some_and(|leader| leader.eq_ignore_ascii_case(name));
        let locked = self.locks.locked_of(&lock_key(name));
        let needed = if is_self {
            amount.saturating_sub(locked)
        } else {
            amount
        };
        let available = total.saturating_sub(locked);

        if needed > available {
            return Err(BidError::InsufficientPoints {
                needed,
                available,
                total,
                locked,
            });
        }

        let expires_at = now + self.rules.confirm_timeout_ms;
        let id = self.book.insert(
            bidder,
            name.to_string(),
            amount,
            needed,
            is_self,
            now,
            expires_at,
        );
        self.rate.record(bidder, now);

        Ok(ProposeReceipt {
            id,
            bidder,
            name: name.to_string(),
            amount,
            needed,
            is_self,
            expires_at,
            available_after: available.saturating_sub(needed),
        })
    }

    /// Confirm a pending bid.
    ///
    /// The confirming identity must match the proposer unless it carries an
    /// administrative override. A confirmation loses the race, and is
    /// invalidated on the spot, when a higher proposal from another member
    /// is still pending or a competing bid already confirmed at or above
    /// this amount.
    pub fn confirm(
        &mut self,
        now: Timestamp,
        id: types::ConfirmationId,
        identity: MemberId,
        admin_override: bool,
    ) -> Result<ConfirmOutcome> {
        let pending = self.book.get(id).ok_or(BidError::UnknownConfirmation)?;
        if pending.bidder != identity && !admin_override {
            return Err(BidError::NotProposer);
        }
        let pending = pending.clone();

        let Some(runtime) = self
            .active
            .as_mut()
            .filter(|r| r.status == types::LotStatus::Active)
        else {
            self.book.remove(id);
            return Err(BidError::NoActiveLot);
        };

        // Highest pending amount wins the race, not first-to-confirm.
        if let Some(rival) = self.book.highest_rival(id, pending.bidder) {
            if rival.amount > pending.amount {
                let winning_amount = rival.amount;
                self.book.remove(id);
                return Err(BidError::RaceLost { winning_amount });
            }
        }

        // A competing confirm may have landed since the propose.
        if pending.amount <= runtime.current_bid {
            let winning_amount = runtime.current_bid;
            self.book.remove(id);
            return Err(BidError::RaceLost { winning_amount });
        }

        // Recompute the delta against the leader as of *now*; the proposer
        // may have been outbid (and unlocked) since they proposed.
        let cache = self.cache.as_ref().ok_or(BidError::CacheNotLoaded)?;
        let is_self = runtime
            .leader_name()
            .is_some_and(|leader| leader.eq_ignore_ascii_case(&pending.name));
        let key = lock_key(&pending.name);
        let locked = self.locks.locked_of(&key);
        let needed = if is_self {
            pending.amount.saturating_sub(locked)
        } else {
            pending.amount
        };
        let total = cache.balance(&pending.name);
        let available = total.saturating_sub(locked);
        if needed > available {
            self.book.remove(id);
            return Err(BidError::InsufficientPoints {
                needed,
                available,
                total,
                locked,
            });
        }

        // Unwind the outbid leader's hold before locking the new amount.
        let previous_bid = runtime.current_bid;
        let previous_leader = runtime.leader.clone();
        if let Some(prev) = &previous_leader {
            if !is_self {
                self.locks.unlock(&lock_key(&prev.name), previous_bid);
            }
        }
        self.locks.lock(&key, needed);

        let bid = Bid {
            bidder: pending.bidder,
            name: pending.name.clone(),
            amount: pending.amount,
            at: now,
        };
        runtime.record_bid(bid.clone());

        // Anti-snipe: a confirm landing inside the window pushes the
        // deadline out, up to the per-lot cap.
        let mut extended = false;
        if runtime.remaining(now) < self.rules.snipe_window_ms
            && runtime
                .extend(self.rules.extension_ms, self.rules.max_extensions)
                .is_some()
        {
            extended = true;
        }

        let deadline = runtime.deadline;
        let remaining_ms = runtime.remaining(now);
        let extension_count = runtime.extension_count;
        self.book.remove(id);

        Ok(ConfirmOutcome {
            bid,
            previous_leader: if is_self { None } else { previous_leader },
            previous_bid,
            is_self,
            extended,
            deadline,
            remaining_ms,
            extension_count,
        })
    }

    /// Cancel a pending bid. No lock mutation occurs; none was made at
    /// propose time.
    pub fn cancel(
        &mut self,
        id: types::ConfirmationId,
        identity: MemberId,
        admin_override: bool,
    ) -> Result<PendingConfirmation> {
        let pending = self.book.get(id).ok_or(BidError::UnknownConfirmation)?;
        if pending.bidder != identity && !admin_override {
            return Err(BidError::NotProposer);
        }
        Ok(self.book.remove(id).expect("checked above"))
    }

    /// Expire a pending confirmation by handle. Returns None when it was
    /// already resolved; a stale expiry timer is harmless.
    pub fn expire(&mut self, id: types::ConfirmationId) -> Option<PendingConfirmation> {
        self.book.remove(id)
    }

    /// Sweep every confirmation past its expiry.
    pub fn expire_due(&mut self, now: Timestamp) -> Vec<PendingConfirmation> {
        self.book.expire_due(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use types::{ConfirmationId, Lot, LotId, Provenance};

    const AYLA: MemberId = MemberId(1);
    const BREN: MemberId = MemberId(2);
    const CATO: MemberId = MemberId(3);

    fn engine_with_active_lot(quantity: u32) -> BidEngine {
        let mut engine = BidEngine::new(BidRules::default());
        let balances = HashMap::from([
            ("Ayla".to_string(), Points(500)),
            ("Bren".to_string(), Points(400)),
            ("Cato".to_string(), Points(250)),
        ]);
        engine.replace_cache(PointsCache::new(balances, 0));
        let lot = Lot::new(
            LotId(1),
            "Sigil",
            Points(100),
            90_000,
            quantity,
            Provenance::Catalog,
        );
        engine.start_preview(lot).unwrap();
        engine.activate(0).unwrap();
        engine
    }

    /// Propose-and-confirm in one step, spacing proposals past the rate limit.
    fn place_bid(
        engine: &mut BidEngine,
        now: Timestamp,
        member: MemberId,
        name: &str,
        amount: i64,
    ) -> ConfirmOutcome {
        let receipt = engine.propose(now, member, name, Points(amount)).unwrap();
        engine.confirm(now, receipt.id, member, false).unwrap()
    }

    fn invariant_locked_within_balance(engine: &BidEngine) {
        let cache = engine.cache().expect("cache loaded");
        for (name, held) in engine.locks().iter() {
            assert!(
                held <= cache.balance(name),
                "{} holds {} over balance {}",
                name,
                held,
                cache.balance(name)
            );
        }
    }

    #[test]
    fn test_propose_requires_active_lot() {
        let mut engine = BidEngine::new(BidRules::default());
        engine.replace_cache(PointsCache::new(HashMap::new(), 0));
        assert_eq!(
            engine.propose(0, AYLA, "Ayla", Points(100)),
            Err(BidError::NoActiveLot)
        );
    }

    #[test]
    fn test_propose_rejects_non_positive_and_ties() {
        let mut engine = engine_with_active_lot(1);
        assert_eq!(
            engine.propose(0, AYLA, "Ayla", Points(0)),
            Err(BidError::InvalidAmount)
        );
        // The start price itself is a tie with the opening "current bid".
        assert_eq!(
            engine.propose(0, AYLA, "Ayla", Points(100)),
            Err(BidError::BidTooLow {
                current: Points(100)
            })
        );
        place_bid(&mut engine, 1_000, AYLA, "Ayla", 150);
        assert_eq!(
            engine.propose(10_000, BREN, "Bren", Points(150)),
            Err(BidError::BidTooLow {
                current: Points(150)
            })
        );
    }

    #[test]
    fn test_propose_rejects_insufficient_points() {
        let mut engine = engine_with_active_lot(1);
        let err = engine.propose(0, CATO, "Cato", Points(300)).unwrap_err();
        assert_eq!(
            err,
            BidError::InsufficientPoints {
                needed: Points(300),
                available: Points(250),
                total: Points(250),
                locked: Points::ZERO,
            }
        );
        // Rejected proposals create no pending state.
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn test_propose_rate_limited() {
        let mut engine = engine_with_active_lot(1);
        engine.propose(1_000, AYLA, "Ayla", Points(150)).unwrap();
        assert_eq!(
            engine.propose(2_000, AYLA, "Ayla", Points(200)),
            Err(BidError::RateLimited { wait_ms: 2_000 })
        );
        assert!(engine.propose(4_000, AYLA, "Ayla", Points(200)).is_ok());
    }

    #[test]
    fn test_confirm_locks_and_outbid_unlocks() {
        let mut engine = engine_with_active_lot(1);

        let outcome = place_bid(&mut engine, 1_000, AYLA, "Ayla", 150);
        assert_eq!(outcome.previous_leader, None);
        assert_eq!(engine.locks().locked_of("ayla"), Points(150));
        invariant_locked_within_balance(&engine);

        let outcome = place_bid(&mut engine, 5_000, BREN, "Bren", 200);
        assert_eq!(outcome.previous_leader.unwrap().name, "Ayla");
        assert_eq!(outcome.previous_bid, Points(150));
        // Exactly one confirmed hold at a time: the old leader's hold is
        // unwound before the new one is taken.
        assert_eq!(engine.locks().locked_of("ayla"), Points::ZERO);
        assert_eq!(engine.locks().locked_of("bren"), Points(200));
        invariant_locked_within_balance(&engine);
    }

    #[test]
    fn test_self_overbid_locks_only_delta() {
        let mut engine = engine_with_active_lot(1);
        place_bid(&mut engine, 1_000, AYLA, "Ayla", 150);

        let receipt = engine.propose(5_000, AYLA, "Ayla", Points(200)).unwrap();
        assert!(receipt.is_self);
        assert_eq!(receipt.needed, Points(50));

        let outcome = engine.confirm(5_000, receipt.id, AYLA, false).unwrap();
        assert!(outcome.is_self);
        assert_eq!(outcome.previous_leader, None);
        assert_eq!(engine.locks().locked_of("ayla"), Points(200));
        invariant_locked_within_balance(&engine);
    }

    #[test]
    fn test_highest_pending_wins_regardless_of_confirm_order() {
        let mut engine = engine_with_active_lot(1);

        let low = engine.propose(1_000, AYLA, "Ayla", Points(150)).unwrap();
        let high = engine.propose(1_500, BREN, "Bren", Points(300)).unwrap();

        // The lower proposal confirms first but loses to the pending 300.
        assert_eq!(
            engine.confirm(2_000, low.id, AYLA, false),
            Err(BidError::RaceLost {
                winning_amount: Points(300)
            })
        );
        // The race loss invalidated the pending entry immediately.
        assert_eq!(
            engine.confirm(2_500, low.id, AYLA, false),
            Err(BidError::UnknownConfirmation)
        );

        // The higher proposal confirms fine, with no lock residue from the loser.
        let outcome = engine.confirm(3_000, high.id, BREN, false).unwrap();
        assert_eq!(outcome.bid.amount, Points(300));
        assert_eq!(engine.locks().locked_of("ayla"), Points::ZERO);
        assert_eq!(engine.locks().locked_of("bren"), Points(300));
    }

    #[test]
    fn test_confirm_after_losing_confirmed_race() {
        let mut engine = engine_with_active_lot(1);

        let low = engine.propose(1_000, AYLA, "Ayla", Points(150)).unwrap();
        place_bid(&mut engine, 1_500, BREN, "Bren", 200);

        // Bren confirmed 200 in the interim; Ayla's 150 no longer exceeds it.
        assert_eq!(
            engine.confirm(2_000, low.id, AYLA, false),
            Err(BidError::RaceLost {
                winning_amount: Points(200)
            })
        );
    }

    #[test]
    fn test_confirm_identity_checks() {
        let mut engine = engine_with_active_lot(1);
        let receipt = engine.propose(1_000, AYLA, "Ayla", Points(150)).unwrap();

        assert_eq!(
            engine.confirm(1_500, receipt.id, BREN, false),
            Err(BidError::NotProposer)
        );
        // An unauthorized attempt leaves the pending untouched.
        assert_eq!(engine.pending_count(), 1);

        // An administrative override may resolve it.
        assert!(engine.confirm(2_000, receipt.id, BREN, true).is_ok());
    }

    #[test]
    fn test_cancel_and_expiry_leave_no_locks() {
        let mut engine = engine_with_active_lot(1);

        let receipt = engine.propose(1_000, AYLA, "Ayla", Points(150)).unwrap();
        engine.cancel(receipt.id, AYLA, false).unwrap();
        assert!(engine.locks().is_empty());

        let receipt = engine.propose(5_000, AYLA, "Ayla", Points(150)).unwrap();
        let expired = engine.expire_due(receipt.expires_at);
        assert_eq!(expired.len(), 1);
        assert!(engine.locks().is_empty());
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn test_unknown_confirmation() {
        let mut engine = engine_with_active_lot(1);
        assert_eq!(
            engine.confirm(0, ConfirmationId(99), AYLA, false),
            Err(BidError::UnknownConfirmation)
        );
        assert_eq!(
            engine.cancel(ConfirmationId(99), AYLA, false),
            Err(BidError::UnknownConfirmation)
        );
    }

    #[test]
    fn test_snipe_confirm_extends_once_per_confirm() {
        let mut engine = engine_with_active_lot(1);
        // Deadline is at 90_000; confirming at 55s remaining triggers the
        // extension and re-arms the milestones.
        let receipt = engine.propose(35_000, AYLA, "Ayla", Points(150)).unwrap();
        let outcome = engine.confirm(35_000, receipt.id, AYLA, false).unwrap();

        assert!(outcome.extended);
        assert_eq!(outcome.deadline, 150_000);
        assert_eq!(outcome.extension_count, 1);

        // A confirm outside the window does not extend.
        let receipt = engine.propose(40_000, BREN, "Bren", Points(200)).unwrap();
        let outcome = engine.confirm(40_000, receipt.id, BREN, false).unwrap();
        assert!(!outcome.extended);
        assert_eq!(outcome.extension_count, 1);
    }

    #[test]
    fn test_extension_cap_stops_late_extensions() {
        let rules = BidRules::default()
            .with_max_extensions(2)
            .with_extension(60_000, 1_000)
            .with_rate_limit_ms(0);
        let mut engine = BidEngine::new(rules);
        engine.replace_cache(PointsCache::new(
            HashMap::from([("Ayla".to_string(), Points(100_000))]),
            0,
        ));
        let lot = Lot::new(LotId(1), "Sigil", Points(100), 30_000, 1, Provenance::Catalog);
        engine.start_preview(lot).unwrap();
        engine.activate(0).unwrap();

        // Every confirm lands inside the snipe window (deadline 30s away).
        let mut amount = 200;
        let mut extended = 0;
        for i in 0..4 {
            let now = 1_000 + i * 1_000;
            let receipt = engine.propose(now, AYLA, "Ayla", Points(amount)).unwrap();
            let outcome = engine.confirm(now, receipt.id, AYLA, false).unwrap();
            if outcome.extended {
                extended += 1;
            }
            amount += 100;
        }
        assert_eq!(extended, 2);
        assert_eq!(engine.active().unwrap().extension_count, 2);
    }

    #[test]
    fn test_close_single_keeps_winner_hold() {
        let mut engine = engine_with_active_lot(1);
        place_bid(&mut engine, 1_000, AYLA, "Ayla", 150);
        place_bid(&mut engine, 5_000, BREN, "Bren", 200);

        let completed = engine.close(90_000).unwrap();
        assert!(completed.is_sold());
        assert_eq!(completed.winners[0].name, "Bren");
        assert_eq!(completed.total_bids, 2);
        assert_eq!(engine.locks().locked_of("bren"), Points(200));
        assert_eq!(engine.locks().locked_of("ayla"), Points::ZERO);
        assert!(engine.active().is_none());
    }

    #[test]
    fn test_close_batch_holds_each_winner() {
        let mut engine = engine_with_active_lot(2);
        place_bid(&mut engine, 1_000, CATO, "Cato", 120);
        place_bid(&mut engine, 5_000, BREN, "Bren", 150);
        place_bid(&mut engine, 9_000, AYLA, "Ayla", 300);

        let completed = engine.close(90_000).unwrap();
        assert_eq!(completed.winners.len(), 2);
        assert_eq!(completed.winners[0].name, "Ayla");
        assert_eq!(completed.winners[1].name, "Bren");

        // Each batch winner holds their own winning amount.
        assert_eq!(engine.locks().locked_of("ayla"), Points(300));
        assert_eq!(engine.locks().locked_of("bren"), Points(150));
        assert_eq!(engine.locks().locked_of("cato"), Points::ZERO);
        invariant_locked_within_balance(&engine);
    }

    #[test]
    fn test_close_without_bids_touches_no_locks() {
        let mut engine = engine_with_active_lot(1);
        let completed = engine.close(90_000).unwrap();
        assert!(!completed.is_sold());
        assert_eq!(completed.total_bids, 0);
        assert!(engine.locks().is_empty());
    }

    #[test]
    fn test_close_discards_pending_confirmations() {
        let mut engine = engine_with_active_lot(1);
        let receipt = engine.propose(1_000, AYLA, "Ayla", Points(150)).unwrap();
        engine.close(90_000).unwrap();

        assert_eq!(engine.pending_count(), 0);
        assert_eq!(
            engine.confirm(2_000, receipt.id, AYLA, false),
            Err(BidError::UnknownConfirmation)
        );
    }

    #[test]
    fn test_clear_session_drops_all_state() {
        let mut engine = engine_with_active_lot(1);
        place_bid(&mut engine, 1_000, AYLA, "Ayla", 150);
        engine.clear_session();

        assert!(engine.locks().is_empty());
        assert!(engine.cache().is_none());
        assert!(engine.active().is_none());
    }
}
