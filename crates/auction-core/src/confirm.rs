//! Pending bid confirmations and the proposal rate limiter.

use std::collections::HashMap;
use types::{ConfirmationId, DurationMs, MemberId, MemberName, Points, Timestamp};

/// A proposed bid awaiting explicit confirm or cancel.
///
/// Created on a successful propose, destroyed on confirm, cancel, or
/// expiry. No points are locked while a confirmation is pending; locks are
/// only touched at confirm time, so expiry unwinds with no side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    /// Confirmation handle handed to the proposer.
    pub id: ConfirmationId,
    /// Proposing member's identity.
    pub bidder: MemberId,
    /// Proposer's display name (ledger key).
    pub name: MemberName,
    /// Proposed bid amount.
    pub amount: Points,
    /// Newly-available points required (the delta for a self-overbid).
    pub needed: Points,
    /// Whether the proposer was the current leader at propose time.
    pub is_self: bool,
    /// When the proposal was made.
    pub created_at: Timestamp,
    /// When the proposal expires unconfirmed.
    pub expires_at: Timestamp,
}

/// Book of unresolved confirmations for the active lot.
#[derive(Debug, Default)]
pub struct ConfirmationBook {
    pending: HashMap<ConfirmationId, PendingConfirmation>,
    next_id: u64,
}

impl ConfirmationBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new pending confirmation and return its handle.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        bidder: MemberId,
        name: MemberName,
        amount: Points,
        needed: Points,
        is_self: bool,
        created_at: Timestamp,
        expires_at: Timestamp,
    ) -> ConfirmationId {
        self.next_id += 1;
        let id = ConfirmationId(self.next_id);
        self.pending.insert(
            id,
            PendingConfirmation {
                id,
                bidder,
                name,
                amount,
                needed,
                is_self,
                created_at,
                expires_at,
            },
        );
        id
    }

    pub fn get(&self, id: ConfirmationId) -> Option<&PendingConfirmation> {
        self.pending.get(&id)
    }

    /// Remove a confirmation (confirm, cancel, or race invalidation).
    pub fn remove(&mut self, id: ConfirmationId) -> Option<PendingConfirmation> {
        self.pending.remove(&id)
    }

    /// The highest competing proposal from a *different* member, if any.
    ///
    /// Competing proposals race on amount, not confirmation order: as long
    /// as a higher one is unresolved, lower ones must not confirm.
    pub fn highest_rival(&self, id: ConfirmationId, bidder: MemberId) -> Option<&PendingConfirmation> {
        self.pending
            .values()
            .filter(|p| p.id != id && p.bidder != bidder)
            .max_by_key(|p| p.amount)
    }

    /// Remove and return every confirmation past its expiry.
    pub fn expire_due(&mut self, now: Timestamp) -> Vec<PendingConfirmation> {
        let due: Vec<ConfirmationId> = self
            .pending
            .values()
            .filter(|p| p.expires_at <= now)
            .map(|p| p.id)
            .collect();
        due.into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Discard every pending confirmation (lot closed or session ended).
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Per-member proposal cooldown.
#[derive(Debug, Default)]
pub struct RateLimiter {
    last_proposal: HashMap<MemberId, Timestamp>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a member may propose at `now`; returns the remaining
    /// wait on rejection.
    pub fn check(&self, member: MemberId, now: Timestamp, cooldown_ms: DurationMs) -> Result<(), DurationMs> {
        match self.last_proposal.get(&member) {
            Some(last) if now.saturating_sub(*last) < cooldown_ms => {
                Err(cooldown_ms - now.saturating_sub(*last))
            }
            _ => Ok(()),
        }
    }

    /// Record a successful proposal.
    pub fn record(&mut self, member: MemberId, now: Timestamp) {
        self.last_proposal.insert(member, now);
    }

    pub fn clear(&mut self) {
        self.last_proposal.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with(entries: &[(u64, &str, i64)]) -> (ConfirmationBook, Vec<ConfirmationId>) {
        let mut book = ConfirmationBook::new();
        let ids = entries
            .iter()
            .map(|(member, name, amount)| {
                book.insert(
                    MemberId(*member),
                    name.to_string(),
                    Points(*amount),
                    Points(*amount),
                    false,
                    0,
                    10_000,
                )
            })
            .collect();
        (book, ids)
    }

    #[test]
    fn test_insert_and_remove() {
        let (mut book, ids) = book_with(&[(1, "ayla", 100)]);
        assert_eq!(book.len(), 1);
        let pending = book.remove(ids[0]).unwrap();
        assert_eq!(pending.amount, Points(100));
        assert!(book.is_empty());
        assert!(book.remove(ids[0]).is_none());
    }

    #[test]
    fn test_highest_rival_excludes_self_and_own() {
        let (book, ids) = book_with(&[(1, "ayla", 100), (2, "bren", 150), (1, "ayla", 200)]);

        // Ayla's 100 races Bren's 150, not her own 200.
        let rival = book.highest_rival(ids[0], MemberId(1)).unwrap();
        assert_eq!(rival.amount, Points(150));

        // Bren's 150 races Ayla's 200.
        let rival = book.highest_rival(ids[1], MemberId(2)).unwrap();
        assert_eq!(rival.amount, Points(200));
    }

    #[test]
    fn test_no_rival_when_alone() {
        let (book, ids) = book_with(&[(1, "ayla", 100)]);
        assert!(book.highest_rival(ids[0], MemberId(1)).is_none());
    }

    #[test]
    fn test_expiry_sweep() {
        let mut book = ConfirmationBook::new();
        book.insert(MemberId(1), "ayla".into(), Points(100), Points(100), false, 0, 5_000);
        book.insert(MemberId(2), "bren".into(), Points(120), Points(120), false, 0, 9_000);

        let expired = book.expire_due(5_000);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].name, "ayla");
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_rate_limiter_cooldown() {
        let mut limiter = RateLimiter::new();
        limiter.record(MemberId(1), 1_000);

        assert_eq!(limiter.check(MemberId(1), 2_000, 3_000), Err(2_000));
        assert!(limiter.check(MemberId(1), 4_000, 3_000).is_ok());
        // Other members are unaffected.
        assert!(limiter.check(MemberId(2), 1_001, 3_000).is_ok());
    }
}
