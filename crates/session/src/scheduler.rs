//! Generation-counted timer schedule.
//!
//! One scheduler owns every timer in a session. Timers tied to the active
//! lot carry a generation stamp; any reschedule (activation, extension,
//! pause/resume, recovery) bumps the generation, and stale entries discard
//! themselves when they surface. This replaces manual cancel/reschedule
//! bookkeeping and cannot leave a dangling timer firing against a lot
//! state it no longer belongs to.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use types::{ConfirmationId, Timestamp};

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Preview elapsed; open bidding.
    PreviewEnd,
    /// Milestone announcements for the active lot.
    GoingOnce,
    GoingTwice,
    FinalCall,
    /// The active lot's deadline.
    LotEnd,
    /// A pending confirmation timed out.
    ConfirmExpiry(ConfirmationId),
    /// Inter-lot delay elapsed; start the next lot (or finalize).
    NextLot,
    /// Periodic balance snapshot refresh.
    CacheRefresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    fire_at: Timestamp,
    seq: u64,
    /// Generation stamp for lot-scoped timers; None for global timers.
    generation: Option<u64>,
    kind: TimerKind,
}

// Min-heap on (fire_at, seq): BinaryHeap is a max-heap, so compare reversed.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The session's timer queue.
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: BinaryHeap<Entry>,
    lot_generation: u64,
    seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a global timer (confirm expiry, next lot, cache refresh).
    pub fn schedule_at(&mut self, fire_at: Timestamp, kind: TimerKind) {
        self.seq += 1;
        self.entries.push(Entry {
            fire_at,
            seq: self.seq,
            generation: None,
            kind,
        });
    }

    /// Schedule a timer scoped to the current lot generation.
    pub fn schedule_lot_at(&mut self, fire_at: Timestamp, kind: TimerKind) {
        self.seq += 1;
        self.entries.push(Entry {
            fire_at,
            seq: self.seq,
            generation: Some(self.lot_generation),
            kind,
        });
    }

    /// Invalidate every outstanding lot-scoped timer. The four lot timers
    /// are always cancelled and recreated together through this.
    pub fn bump_lot_generation(&mut self) {
        self.lot_generation += 1;
    }

    /// Current lot generation (diagnostics).
    pub fn lot_generation(&self) -> u64 {
        self.lot_generation
    }

    /// Pop every timer due at `now`, in firing order, dropping stale
    /// lot-scoped entries from older generations.
    pub fn due(&mut self, now: Timestamp) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        while let Some(entry) = self.entries.peek() {
            if entry.fire_at > now {
                break;
            }
            let entry = self.entries.pop().expect("peeked");
            match entry.generation {
                Some(generation) if generation != self.lot_generation => continue,
                _ => fired.push(entry.kind),
            }
        }
        fired
    }

    /// When the next live timer fires, if any.
    pub fn next_fire_at(&self) -> Option<Timestamp> {
        self.entries
            .iter()
            .filter(|e| e.generation.is_none_or(|g| g == self.lot_generation))
            .map(|e| e.fire_at)
            .min()
    }

    /// Number of queued entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every timer. Used at session finalization.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_time_order() {
        let mut sched = Scheduler::new();
        sched.schedule_at(3_000, TimerKind::NextLot);
        sched.schedule_at(1_000, TimerKind::CacheRefresh);
        sched.schedule_at(2_000, TimerKind::LotEnd);

        assert_eq!(sched.due(500), vec![]);
        assert_eq!(
            sched.due(3_000),
            vec![TimerKind::CacheRefresh, TimerKind::LotEnd, TimerKind::NextLot]
        );
        assert!(sched.is_empty());
    }

    #[test]
    fn test_same_instant_fires_in_schedule_order() {
        let mut sched = Scheduler::new();
        sched.schedule_lot_at(1_000, TimerKind::FinalCall);
        sched.schedule_lot_at(1_000, TimerKind::LotEnd);
        assert_eq!(sched.due(1_000), vec![TimerKind::FinalCall, TimerKind::LotEnd]);
    }

    #[test]
    fn test_stale_generation_discards_itself() {
        let mut sched = Scheduler::new();
        sched.schedule_lot_at(1_000, TimerKind::GoingOnce);
        sched.schedule_lot_at(2_000, TimerKind::LotEnd);

        // A reschedule invalidates the old set and installs a new one.
        sched.bump_lot_generation();
        sched.schedule_lot_at(5_000, TimerKind::LotEnd);

        assert_eq!(sched.due(2_000), vec![]);
        assert_eq!(sched.due(5_000), vec![TimerKind::LotEnd]);
    }

    #[test]
    fn test_global_timers_survive_generation_bumps() {
        let mut sched = Scheduler::new();
        sched.schedule_at(1_000, TimerKind::ConfirmExpiry(ConfirmationId(7)));
        sched.bump_lot_generation();
        assert_eq!(
            sched.due(1_000),
            vec![TimerKind::ConfirmExpiry(ConfirmationId(7))]
        );
    }

    #[test]
    fn test_next_fire_at_skips_stale() {
        let mut sched = Scheduler::new();
        sched.schedule_lot_at(1_000, TimerKind::GoingOnce);
        sched.schedule_at(4_000, TimerKind::NextLot);
        assert_eq!(sched.next_fire_at(), Some(1_000));

        sched.bump_lot_generation();
        assert_eq!(sched.next_fire_at(), Some(4_000));
    }

    #[test]
    fn test_clear() {
        let mut sched = Scheduler::new();
        sched.schedule_at(1_000, TimerKind::NextLot);
        sched.clear();
        assert!(sched.is_empty());
        assert_eq!(sched.next_fire_at(), None);
    }
}
