//! Point holds for unresolved and winning bids.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::{MemberName, Points};

/// Tracks points currently reserved per member.
///
/// This is the sole mutator of hold state: every lock and unlock in the
/// engine goes through here, one mutation at a time. Entries are removed
/// when they reach zero, and an unlock can never drive a hold negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockManager {
    locked: HashMap<MemberName, Points>,
}

impl LockManager {
    /// Create an empty lock manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `amount` points for a member.
    pub fn lock(&mut self, name: &str, amount: Points) {
        if !amount.is_positive() {
            return;
        }
        *self
            .locked
            .entry(name.to_string())
            .or_insert(Points::ZERO) += amount;
    }

    /// Release up to `amount` points for a member. The entry is dropped
    /// once the hold reaches zero.
    pub fn unlock(&mut self, name: &str, amount: Points) {
        if let Some(held) = self.locked.get_mut(name) {
            *held = held.saturating_sub(amount);
            if held.is_zero() {
                self.locked.remove(name);
            }
        }
    }

    /// Points currently held for a member.
    pub fn locked_of(&self, name: &str) -> Points {
        self.locked.get(name).copied().unwrap_or(Points::ZERO)
    }

    /// Available points given a member's total balance.
    pub fn available(&self, name: &str, total: Points) -> Points {
        total.saturating_sub(self.locked_of(name))
    }

    /// Sum of all holds.
    pub fn total_locked(&self) -> Points {
        self.locked.values().copied().sum()
    }

    /// Number of members with a nonzero hold.
    pub fn len(&self) -> usize {
        self.locked.len()
    }

    /// Check if no holds exist.
    pub fn is_empty(&self) -> bool {
        self.locked.is_empty()
    }

    /// Iterate over all holds.
    pub fn iter(&self) -> impl Iterator<Item = (&MemberName, Points)> {
        self.locked.iter().map(|(name, points)| (name, *points))
    }

    /// Drop every hold. Used at session finalization.
    pub fn clear(&mut self) {
        self.locked.clear();
    }
}
