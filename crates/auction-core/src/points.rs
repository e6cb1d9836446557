//! Cached snapshot of the external points ledger.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::{MemberName, Points, Timestamp};

/// Immutable snapshot of every member's total point balance.
///
/// Fetched once at session start and periodically refreshed while a session
/// is active. Refreshing replaces the snapshot wholesale; individual
/// balances are never edited in place. The bidding path only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsCache {
    balances: HashMap<MemberName, Points>,
    taken_at: Timestamp,
}

impl PointsCache {
    /// Build a snapshot from ledger balances.
    pub fn new(balances: HashMap<MemberName, Points>, taken_at: Timestamp) -> Self {
        Self { balances, taken_at }
    }

    /// Total balance for a member: exact name match first, then a
    /// case-insensitive scan (the ledger is hand-maintained and casing
    /// drifts), zero for unknown members.
    pub fn balance(&self, name: &str) -> Points {
        if let Some(points) = self.balances.get(name) {
            return *points;
        }

        let lower = name.to_lowercase();
        self.balances
            .iter()
            .find(|(known, _)| known.to_lowercase() == lower)
            .map(|(_, points)| *points)
            .unwrap_or(Points::ZERO)
    }

    /// Iterate over every known member name.
    pub fn members(&self) -> impl Iterator<Item = &MemberName> {
        self.balances.keys()
    }

    /// Number of members in the snapshot.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Check if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// When the snapshot was taken.
    pub fn taken_at(&self) -> Timestamp {
        self.taken_at
    }
}
