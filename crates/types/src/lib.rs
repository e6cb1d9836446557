//! Core types for the points auction engine.
//!
//! This crate provides all shared data types used across the engine:
//! identifier newtypes, the point-value newtype, lot definitions, bids,
//! completed-lot results, and the bidding rule set.

use derive_more::{Add, AddAssign, From, Into, Sub, SubAssign, Sum};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Core ID Types (Newtypes for type safety)
// =============================================================================

/// Unique identifier for members (stable numeric identity from the
/// confirmation surface; display names may collide or change case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Member({})", self.0)
    }
}

/// Unique identifier for lots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct LotId(pub u64);

impl fmt::Display for LotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lot({})", self.0)
    }
}

/// Handle for a pending bid confirmation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ConfirmationId(pub u64);

impl fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Confirm({})", self.0)
    }
}

// =============================================================================
// Name and Time Types
// =============================================================================

/// Member display name. The external ledger keys balances by name, so
/// lookups fall back to case-insensitive comparison.
pub type MemberName = String;

/// Wall clock timestamp in milliseconds since epoch.
pub type Timestamp = u64;

/// Duration in milliseconds.
pub type DurationMs = u64;

// =============================================================================
// Points (Newtype for point balances)
// =============================================================================

/// A point amount (bid, balance, hold, or spend).
///
/// Points are indivisible integers; there is no fractional unit.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    Sum,
    From,
    Into,
)]
pub struct Points(pub i64);

impl Points {
    pub const ZERO: Points = Points(0);

    /// Raw internal value.
    #[inline]
    pub fn raw(self) -> i64 {
        self.0
    }

    /// Check if the amount is strictly positive.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Check if zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Subtraction clamped at zero.
    #[inline]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Points((self.0 - rhs.0).max(0))
    }

    /// Maximum of two amounts.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Points(self.0.max(other.0))
    }
}

impl fmt::Debug for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Points({})", self.0)
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Allow `points == 50` comparisons
impl PartialEq<i64> for Points {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// Lot Types
// =============================================================================

/// Where a lot came from. Determines the unsold-lot policy: catalog lots
/// are retained for the next session, manual lots are only recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Provenance {
    /// Recurring catalog entry.
    #[default]
    Catalog,
    /// One-off manual queue entry.
    Manual,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Catalog => write!(f, "catalog"),
            Provenance::Manual => write!(f, "manual"),
        }
    }
}

/// Lifecycle state of a lot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LotStatus {
    /// Waiting in the queue.
    #[default]
    Queued,
    /// Announced, bidding not yet open.
    Preview,
    /// Bidding open.
    Active,
    /// Countdown suspended; remaining time preserved.
    Paused,
    /// Closed.
    Ended,
}

/// A single item up for auction.
///
/// Immutable once an auction begins; runtime fields live in the lot
/// runtime state owned by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Unique lot identifier.
    pub id: LotId,
    /// Item label shown to members.
    pub label: String,
    /// Opening price; the first bid must strictly exceed it.
    pub start_price: Points,
    /// Bidding window length once active.
    pub duration_ms: DurationMs,
    /// 1 = single winner, >1 = batch top-K.
    pub quantity: u32,
    /// Catalog or manual entry.
    pub provenance: Provenance,
}

impl Lot {
    /// Create a new lot.
    pub fn new(
        id: LotId,
        label: impl Into<String>,
        start_price: Points,
        duration_ms: DurationMs,
        quantity: u32,
        provenance: Provenance,
    ) -> Self {
        Self {
            id,
            label: label.into(),
            start_price,
            duration_ms,
            quantity,
            provenance,
        }
    }

    /// Check whether this is a multi-winner batch lot.
    pub fn is_batch(&self) -> bool {
        self.quantity > 1
    }
}

impl fmt::Display for Lot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_batch() {
            write!(f, "{} x{}", self.label, self.quantity)
        } else {
            write!(f, "{}", self.label)
        }
    }
}

// =============================================================================
// Bid and Result Types
// =============================================================================

/// A confirmed bid in a lot's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    /// Confirming member's identity.
    pub bidder: MemberId,
    /// Display name at confirmation time (ledger key).
    pub name: MemberName,
    /// Bid amount.
    pub amount: Points,
    /// Confirmation timestamp.
    pub at: Timestamp,
}

/// Outcome of a closed lot.
///
/// `winners` is empty for an unsold lot. Batch lots carry one entry per
/// winning bidder, each at their own bid amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedLot {
    /// The lot that was auctioned.
    pub lot: Lot,
    /// Winning bids, highest first.
    pub winners: Vec<Bid>,
    /// Total confirmed bids over the lot's lifetime.
    pub total_bids: usize,
    /// When the lot closed.
    pub ended_at: Timestamp,
}

impl CompletedLot {
    /// Check whether the lot sold.
    pub fn is_sold(&self) -> bool {
        !self.winners.is_empty()
    }

    /// Sum of winning amounts.
    pub fn revenue(&self) -> Points {
        self.winners.iter().map(|w| w.amount).sum()
    }
}

/// One row of the session result set submitted to the ledger.
///
/// The full set carries one entry per member known to the balance
/// snapshot, zero for non-winners, so the ledger record is auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSpend {
    /// Member display name (ledger key).
    pub member: MemberName,
    /// Total won-lot spend this session.
    pub total_spent: Points,
}

// =============================================================================
// Bidding Rules
// =============================================================================

/// Timing and limit rules for the bid confirmation protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRules {
    /// How long a proposed bid waits for confirm/cancel before expiring.
    pub confirm_timeout_ms: DurationMs,
    /// Cooldown between proposals from the same member.
    pub rate_limit_ms: DurationMs,
    /// A confirm landing with less than this remaining triggers an extension.
    pub snipe_window_ms: DurationMs,
    /// How much each anti-snipe extension adds to the deadline.
    pub extension_ms: DurationMs,
    /// Cap on extensions per lot.
    pub max_extensions: u32,
    /// Milestone announcement offsets before the deadline, descending.
    pub going_once_offset_ms: DurationMs,
    pub going_twice_offset_ms: DurationMs,
    pub final_call_offset_ms: DurationMs,
}

impl Default for BidRules {
    fn default() -> Self {
        Self {
            confirm_timeout_ms: 10_000,
            rate_limit_ms: 3_000,
            snipe_window_ms: 60_000,
            extension_ms: 60_000,
            max_extensions: 15,
            going_once_offset_ms: 60_000,
            going_twice_offset_ms: 30_000,
            final_call_offset_ms: 10_000,
        }
    }
}

impl BidRules {
    /// Set the confirmation timeout.
    pub fn with_confirm_timeout_ms(mut self, ms: DurationMs) -> Self {
        self.confirm_timeout_ms = ms;
        self
    }

    /// Set the proposal rate limit.
    pub fn with_rate_limit_ms(mut self, ms: DurationMs) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    /// Set the anti-snipe window and extension amount.
    pub fn with_extension(mut self, window_ms: DurationMs, extension_ms: DurationMs) -> Self {
        self.snipe_window_ms = window_ms;
        self.extension_ms = extension_ms;
        self
    }

    /// Set the extension cap.
    pub fn with_max_extensions(mut self, max: u32) -> Self {
        self.max_extensions = max;
        self
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_arithmetic() {
        let a = Points(100);
        let b = Points(30);

        assert_eq!(a + b, Points(130));
        assert_eq!(a - b, Points(70));
        assert_eq!(b.saturating_sub(a), Points::ZERO);
        assert!(a.is_positive());
        assert!(!Points::ZERO.is_positive());
    }

    #[test]
    fn test_points_sum() {
        let total: Points = [Points(10), Points(20), Points(30)].into_iter().sum();
        assert_eq!(total, Points(60));
    }

    #[test]
    fn test_lot_batch_detection() {
        let single = Lot::new(LotId(1), "Sword", Points(100), 60_000, 1, Provenance::Catalog);
        let batch = Lot::new(LotId(2), "Potion", Points(10), 60_000, 3, Provenance::Manual);

        assert!(!single.is_batch());
        assert!(batch.is_batch());
        assert_eq!(single.to_string(), "Sword");
        assert_eq!(batch.to_string(), "Potion x3");
    }

    #[test]
    fn test_completed_lot_revenue() {
        let lot = Lot::new(LotId(1), "Helm", Points(50), 60_000, 2, Provenance::Catalog);
        let completed = CompletedLot {
            lot,
            winners: vec![
                Bid {
                    bidder: MemberId(1),
                    name: "ayla".into(),
                    amount: Points(300),
                    at: 10,
                },
                Bid {
                    bidder: MemberId(2),
                    name: "bren".into(),
                    amount: Points(250),
                    at: 20,
                },
            ],
            total_bids: 5,
            ended_at: 100,
        };

        assert!(completed.is_sold());
        assert_eq!(completed.revenue(), Points(550));
    }

    #[test]
    fn test_unsold_lot() {
        let lot = Lot::new(LotId(1), "Ring", Points(50), 60_000, 1, Provenance::Manual);
        let completed = CompletedLot {
            lot,
            winners: Vec::new(),
            total_bids: 0,
            ended_at: 100,
        };

        assert!(!completed.is_sold());
        assert_eq!(completed.revenue(), Points::ZERO);
    }

    #[test]
    fn test_default_rules() {
        let rules = BidRules::default();
        assert_eq!(rules.confirm_timeout_ms, 10_000);
        assert_eq!(rules.rate_limit_ms, 3_000);
        assert_eq!(rules.max_extensions, 15);
        assert!(rules.going_once_offset_ms > rules.going_twice_offset_ms);
        assert!(rules.going_twice_offset_ms > rules.final_call_offset_ms);
    }
}
