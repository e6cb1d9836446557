//! The session coordinator: pulls lots from the queue one at a time,
//! drives each through the auction state machine, and finalizes the
//! session against the ledger.
//!
//! All engine state lives in this struct, constructed per process
//! lifetime; every mutation routes through its methods. Callers pump
//! `tick(now)` to fire due timers and route inbound confirmation-surface
//! signals to `propose_bid` / `confirm_bid` / `cancel_bid`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use auction_core::{BidEngine, BidError, ConfirmOutcome, MilestoneKind, PointsCache, ProposeReceipt};
use types::{
    CompletedLot, ConfirmationId, DurationMs, Lot, LotId, LotStatus, MemberId, MemberSpend, Points,
    Provenance, Timestamp,
};

use crate::config::SessionConfig;
use crate::events::{AuctionEvent, HookRunner, SessionHook};
use crate::guard::StartGuard;
use crate::ledger::{LedgerError, LedgerService, with_retry};
use crate::persist::{PersistedState, SnapshotStore, StoreError};
use crate::scheduler::{Scheduler, TimerKind};

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Lots closed this session.
    pub lots_run: u32,
    /// Lots that sold.
    pub lots_sold: u32,
    /// Lots that closed without bids.
    pub lots_unsold: u32,
    /// Sum of all winning amounts.
    pub total_revenue: Points,
    /// Bids confirmed across all lots.
    pub bids_confirmed: u32,
    /// Anti-snipe extensions granted.
    pub extensions: u32,
}

/// Errors from session-level operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("a session is already active")]
    AlreadyActive,

    #[error("a session start is already in progress")]
    StartInProgress,

    #[error("the auction queue is empty")]
    EmptyQueue,

    #[error("no session is active")]
    NotActive,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of startup state recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreReport {
    /// No snapshot existed.
    Fresh,
    /// State was recovered.
    Resumed {
        queued: usize,
        holds: usize,
        active_lot: Option<String>,
    },
    /// The snapshot could not be reconstructed; in-flight auction state
    /// was cleared rather than guessed at. The ledger-side record is
    /// untouched.
    Reset { reason: String },
}

/// Per-session bookkeeping.
#[derive(Debug)]
struct SessionState {
    started_at: Timestamp,
    label: String,
    history: Vec<CompletedLot>,
    total_lots: usize,
    position: usize,
    stats: SessionStats,
}

/// Owns the queue, the bid engine, the timer schedule, and the external
/// seams.
pub struct SessionCoordinator {
    config: SessionConfig,
    engine: BidEngine,
    queue: VecDeque<Lot>,
    scheduler: Scheduler,
    hooks: HookRunner,
    ledger: Box<dyn LedgerService>,
    store: Option<Box<dyn SnapshotStore>>,
    guard: StartGuard,
    session: Option<SessionState>,
    next_lot_id: u64,
}

impl SessionCoordinator {
    /// Create a coordinator against a ledger service.
    pub fn new(config: SessionConfig, ledger: Box<dyn LedgerService>) -> Self {
        let engine = BidEngine::new(config.rules.clone());
        Self {
            config,
            engine,
            queue: VecDeque::new(),
            scheduler: Scheduler::new(),
            hooks: HookRunner::new(),
            ledger,
            store: None,
            guard: StartGuard::new(),
            session: None,
            next_lot_id: 1,
        }
    }

    /// Attach the durable snapshot store.
    pub fn with_store(mut self, store: Box<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register a notification hook.
    pub fn add_hook(&mut self, hook: Arc<dyn SessionHook>) {
        self.hooks.add(hook);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a session is currently running.
    pub fn session_active(&self) -> bool {
        self.session.is_some()
    }

    /// Stats for the in-flight session.
    pub fn stats(&self) -> Option<SessionStats> {
        self.session.as_ref().map(|s| s.stats)
    }

    /// Read access to the engine (active lot, locks, cache).
    pub fn engine(&self) -> &BidEngine {
        &self.engine
    }

    // =========================================================================
    // Queue management
    // =========================================================================

    /// Add a lot to the queue.
    pub fn enqueue(
        &mut self,
        label: impl Into<String>,
        start_price: Points,
        duration_ms: DurationMs,
        quantity: u32,
        provenance: Provenance,
    ) -> LotId {
        let id = LotId(self.next_lot_id);
        self.next_lot_id += 1;
        self.queue.push_back(Lot::new(
            id,
            label,
            start_price,
            duration_ms,
            quantity.max(1),
            provenance,
        ));
        self.persist();
        id
    }

    /// Remove the first queued lot matching a label, case-insensitively.
    pub fn remove_queued(&mut self, label: &str) -> Option<Lot> {
        let index = self
            .queue
            .iter()
            .position(|lot| lot.label.eq_ignore_ascii_case(label))?;
        let removed = self.queue.remove(index);
        self.persist();
        removed
    }

    /// Drop every queued lot; returns how many were removed.
    pub fn clear_queue(&mut self) -> usize {
        let count = self.queue.len();
        self.queue.clear();
        self.persist();
        count
    }

    /// Queued lots, in auction order.
    pub fn queued(&self) -> impl Iterator<Item = &Lot> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Start a session: load the balance snapshot (fail-closed), then
    /// begin driving lots sequentially.
    pub fn start_session(&mut self, now: Timestamp, label: &str) -> Result<(), SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyActive);
        }
        // Released on every exit path below, including the error returns.
        let _token = self.guard.try_acquire().ok_or(SessionError::StartInProgress)?;

        if self.queue.is_empty() {
            return Err(SessionError::EmptyQueue);
        }

        let balances = with_retry(
            self.config.submit_attempts,
            self.config.submit_backoff_ms,
            "balance load",
            || self.ledger.fetch_balances(),
        )?;
        info!(members = balances.len(), label, "session starting");
        self.engine.replace_cache(PointsCache::new(balances, now));

        self.session = Some(SessionState {
            started_at: now,
            label: label.to_string(),
            history: Vec::new(),
            total_lots: self.queue.len(),
            position: 0,
            stats: SessionStats::default(),
        });

        self.hooks.emit(&AuctionEvent::SessionStarted {
            lots: self.queue.len(),
            label: label.to_string(),
        });

        self.scheduler
            .schedule_at(now + self.config.inter_lot_delay_ms, TimerKind::NextLot);
        self.scheduler
            .schedule_at(now + self.config.cache_refresh_ms, TimerKind::CacheRefresh);
        self.persist();
        Ok(())
    }

    /// Fire every timer due at `now`. The caller pumps this from its
    /// event loop; between calls the engine is quiescent.
    pub fn tick(&mut self, now: Timestamp) {
        loop {
            let due = self.scheduler.due(now);
            if due.is_empty() {
                return;
            }
            for kind in due {
                self.handle_timer(kind, now);
            }
        }
    }

    /// When the next timer fires, for callers that sleep between ticks.
    pub fn next_fire_at(&self) -> Option<Timestamp> {
        self.scheduler.next_fire_at()
    }

    fn handle_timer(&mut self, kind: TimerKind, now: Timestamp) {
        match kind {
            TimerKind::NextLot => self.start_next_lot(now),
            TimerKind::PreviewEnd => self.open_bidding(now),
            TimerKind::GoingOnce => self.announce(MilestoneKind::GoingOnce, now),
            TimerKind::GoingTwice => self.announce(MilestoneKind::GoingTwice, now),
            TimerKind::FinalCall => self.announce(MilestoneKind::FinalCall, now),
            TimerKind::LotEnd => {
                if let Err(err) = self.close_current(now) {
                    debug!(%err, "stale lot-end timer");
                }
            }
            TimerKind::ConfirmExpiry(id) => {
                if let Some(pending) = self.engine.expire(id) {
                    debug!(bidder = %pending.bidder, amount = %pending.amount, "confirmation expired");
                    self.hooks.emit(&AuctionEvent::ConfirmationExpired {
                        id,
                        bidder: pending.bidder,
                        name: pending.name,
                    });
                }
            }
            TimerKind::CacheRefresh => self.refresh_cache(now),
        }
    }

    fn start_next_lot(&mut self, now: Timestamp) {
        let Some(lot) = self.queue.pop_front() else {
            self.finalize(now);
            return;
        };

        let (position, total) = match self.session.as_mut() {
            Some(state) => {
                state.position += 1;
                (state.position, state.total_lots)
            }
            None => (1, 1),
        };

        info!(lot = %lot, position, total, "lot preview");
        if let Err(err) = self.engine.start_preview(lot.clone()) {
            error!(%err, "could not start lot preview");
            self.queue.push_front(lot);
            return;
        }

        self.scheduler.bump_lot_generation();
        self.scheduler
            .schedule_lot_at(now + self.config.preview_ms, TimerKind::PreviewEnd);
        self.hooks.emit(&AuctionEvent::LotPreview {
            lot,
            position,
            total,
            opens_in_ms: self.config.preview_ms,
        });
        self.persist();
    }

    fn open_bidding(&mut self, now: Timestamp) {
        let deadline = match self.engine.activate(now) {
            Ok(deadline) => deadline,
            Err(err) => {
                debug!(%err, "stale preview-end timer");
                return;
            }
        };

        let (lot_id, label, current_bid) = {
            let runtime = self.engine.active().expect("just activated");
            (runtime.lot.id, runtime.lot.label.clone(), runtime.current_bid)
        };
        info!(%lot_id, deadline, "bidding open");
        self.hooks.emit(&AuctionEvent::LotActive {
            lot_id,
            label,
            current_bid,
            deadline,
        });
        self.schedule_lot_timers(now, deadline);
        self.persist();
    }

    /// Cancel and recreate the lot timer set against `deadline`.
    ///
    /// Milestones that already fired for this deadline, or whose offset
    /// has already passed, are not scheduled.
    fn schedule_lot_timers(&mut self, now: Timestamp, deadline: Timestamp) {
        self.scheduler.bump_lot_generation();
        let Some(runtime) = self.engine.active() else {
            return;
        };

        let rules = &self.config.rules;
        let milestones = [
            (rules.going_once_offset_ms, MilestoneKind::GoingOnce, TimerKind::GoingOnce),
            (rules.going_twice_offset_ms, MilestoneKind::GoingTwice, TimerKind::GoingTwice),
            (rules.final_call_offset_ms, MilestoneKind::FinalCall, TimerKind::FinalCall),
        ];
        let mut to_schedule = Vec::new();
        for (offset, milestone, timer) in milestones {
            let fire_at = deadline.saturating_sub(offset);
            if fire_at > now && !runtime.milestone_fired(milestone) {
                to_schedule.push((fire_at, timer));
            }
        }
        for (fire_at, timer) in to_schedule {
            self.scheduler.schedule_lot_at(fire_at, timer);
        }
        self.scheduler.schedule_lot_at(deadline, TimerKind::LotEnd);
    }

    fn announce(&mut self, kind: MilestoneKind, now: Timestamp) {
        let fired = matches!(self.engine.mark_milestone(kind), Ok(true));
        if !fired {
            return;
        }
        let Some(runtime) = self.engine.active() else {
            return;
        };
        if runtime.status != LotStatus::Active {
            return;
        }
        self.hooks.emit(&AuctionEvent::Milestone {
            lot_id: runtime.lot.id,
            kind,
            current_bid: runtime.current_bid,
            leader: runtime.leader_name().cloned(),
            remaining_ms: runtime.remaining(now),
        });
        self.persist();
    }

    /// Close the lot being auctioned, determine winners, and advance to
    /// the next lot (or finalize when the queue is empty).
    pub fn close_current(&mut self, now: Timestamp) -> Result<CompletedLot, BidError> {
        let completed = self.engine.close(now)?;
        self.scheduler.bump_lot_generation();

        if let Some(store) = &self.store {
            if let Err(err) = store.record_result(&completed) {
                warn!(%err, "failed to log lot result");
            }
        }

        let will_requeue = !completed.is_sold()
            && completed.lot.provenance == Provenance::Catalog
            && self.config.requeue_unsold_catalog;

        if let Some(state) = self.session.as_mut() {
            state.stats.lots_run += 1;
            if completed.is_sold() {
                state.stats.lots_sold += 1;
                state.stats.total_revenue += completed.revenue();
            } else {
                state.stats.lots_unsold += 1;
            }
            state.history.push(completed.clone());
        }

        if completed.is_sold() {
            info!(lot = %completed.lot, winners = completed.winners.len(), revenue = %completed.revenue(), "lot sold");
            self.hooks.emit(&AuctionEvent::LotSold {
                result: completed.clone(),
            });
        } else {
            info!(lot = %completed.lot, "lot closed without bids");
            self.hooks.emit(&AuctionEvent::LotUnsold {
                lot: completed.lot.clone(),
                will_requeue,
            });
        }

        match self.queue.front() {
            Some(next) => {
                self.hooks.emit(&AuctionEvent::NextLot {
                    label: next.label.clone(),
                    start_price: next.start_price,
                    starts_in_ms: self.config.inter_lot_delay_ms,
                });
                self.scheduler
                    .schedule_at(now + self.config.inter_lot_delay_ms, TimerKind::NextLot);
                self.persist();
            }
            None => self.finalize(now),
        }

        Ok(completed)
    }

    /// Finalize: aggregate spend, submit to the ledger with retry, then
    /// clear session state, locks, and the cache *regardless* of
    /// submission success — stale locks must never outlive a session.
    fn finalize(&mut self, _now: Timestamp) {
        let Some(state) = self.session.take() else {
            return;
        };

        let results = self.build_results(&state.history);
        let submission = with_retry(
            self.config.submit_attempts,
            self.config.submit_backoff_ms,
            "result submission",
            || self.ledger.submit_results(&results, &state.label),
        );
        if let Err(err) = submission {
            error!(%err, "result submission exhausted retries; manual reconciliation required");
            self.hooks.emit(&AuctionEvent::SubmissionFailed {
                results: results.clone(),
                error: err.to_string(),
            });
        }

        info!(
            lots = state.stats.lots_run,
            sold = state.stats.lots_sold,
            revenue = %state.stats.total_revenue,
            "session finalized"
        );
        self.hooks.emit(&AuctionEvent::SessionFinalized {
            stats: state.stats,
            results,
        });

        // Unsold catalog lots roll over to the next session.
        if self.config.requeue_unsold_catalog {
            for completed in &state.history {
                if !completed.is_sold() && completed.lot.provenance == Provenance::Catalog {
                    self.queue.push_back(completed.lot.clone());
                }
            }
        }

        self.engine.clear_session();
        self.scheduler.clear();
        self.persist();
    }

    /// Full result set: one row per member known to the snapshot, zero
    /// for non-winners, aggregated by lower-cased name.
    fn build_results(&self, history: &[CompletedLot]) -> Vec<MemberSpend> {
        let mut spent: HashMap<String, Points> = HashMap::new();
        for completed in history {
            for winner in &completed.winners {
                *spent
                    .entry(winner.name.to_lowercase())
                    .or_insert(Points::ZERO) += winner.amount;
            }
        }

        let mut results: Vec<MemberSpend> = self
            .engine
            .cache()
            .map(|cache| {
                cache
                    .members()
                    .map(|member| MemberSpend {
                        member: member.clone(),
                        total_spent: spent
                            .get(&member.to_lowercase())
                            .copied()
                            .unwrap_or(Points::ZERO),
                    })
                    .collect()
            })
            .unwrap_or_default();
        results.sort_by(|a, b| a.member.cmp(&b.member));
        results
    }

    fn refresh_cache(&mut self, now: Timestamp) {
        if self.session.is_none() {
            return;
        }
        match self.ledger.fetch_balances() {
            Ok(balances) => {
                let members = balances.len();
                self.engine.replace_cache(PointsCache::new(balances, now));
                debug!(members, "balance snapshot refreshed");
                self.hooks.emit(&AuctionEvent::CacheRefreshed { members });
            }
            // Keep bidding against the previous snapshot; only the
            // fail-closed load at session start aborts.
            Err(err) => warn!(%err, "balance refresh failed, keeping previous snapshot"),
        }
        self.scheduler
            .schedule_at(now + self.config.cache_refresh_ms, TimerKind::CacheRefresh);
    }

    // =========================================================================
    // Inbound bid signals
    // =========================================================================

    /// Propose a bid on the active lot.
    pub fn propose_bid(
        &mut self,
        now: Timestamp,
        bidder: MemberId,
        name: &str,
        amount: Points,
    ) -> Result<ProposeReceipt, BidError> {
        let receipt = self.engine.propose(now, bidder, name, amount)?;
        self.scheduler
            .schedule_at(receipt.expires_at, TimerKind::ConfirmExpiry(receipt.id));
        self.hooks.emit(&AuctionEvent::ConfirmRequired {
            id: receipt.id,
            bidder: receipt.bidder,
            name: receipt.name.clone(),
            amount: receipt.amount,
            needed: receipt.needed,
            is_self: receipt.is_self,
            expires_at: receipt.expires_at,
        });
        Ok(receipt)
    }

    /// Confirm a pending bid.
    pub fn confirm_bid(
        &mut self,
        now: Timestamp,
        id: ConfirmationId,
        identity: MemberId,
        admin_override: bool,
    ) -> Result<ConfirmOutcome, BidError> {
        let outcome = self.engine.confirm(now, id, identity, admin_override)?;

        let (lot_id, label) = {
            let runtime = self.engine.active().expect("confirm requires an active lot");
            (runtime.lot.id, runtime.lot.label.clone())
        };
        if let Some(state) = self.session.as_mut() {
            state.stats.bids_confirmed += 1;
            if outcome.extended {
                state.stats.extensions += 1;
            }
        }

        if let Some(previous) = &outcome.previous_leader {
            self.hooks.emit(&AuctionEvent::Outbid {
                member: previous.bidder,
                name: previous.name.clone(),
                label: label.clone(),
                new_amount: outcome.bid.amount,
            });
        }
        info!(%lot_id, bidder = %outcome.bid.name, amount = %outcome.bid.amount, "new high bid");
        self.hooks.emit(&AuctionEvent::HighBid {
            lot_id,
            name: outcome.bid.name.clone(),
            amount: outcome.bid.amount,
            previous_bid: outcome.previous_bid,
            remaining_ms: outcome.remaining_ms,
        });

        if outcome.extended {
            self.schedule_lot_timers(now, outcome.deadline);
            self.hooks.emit(&AuctionEvent::DeadlineExtended {
                lot_id,
                new_deadline: outcome.deadline,
                extension_count: outcome.extension_count,
            });
        }
        self.persist();
        Ok(outcome)
    }

    /// Cancel a pending bid.
    pub fn cancel_bid(
        &mut self,
        id: ConfirmationId,
        identity: MemberId,
        admin_override: bool,
    ) -> Result<(), BidError> {
        let pending = self.engine.cancel(id, identity, admin_override)?;
        self.hooks.emit(&AuctionEvent::ConfirmationCanceled {
            id,
            bidder: pending.bidder,
            name: pending.name,
        });
        Ok(())
    }

    // =========================================================================
    // Manual controls
    // =========================================================================

    /// Suspend the active lot's countdown, preserving remaining time.
    pub fn pause(&mut self, now: Timestamp) -> Result<DurationMs, BidError> {
        let remaining_ms = self.engine.pause(now)?;
        self.scheduler.bump_lot_generation();
        info!(remaining_ms, "session paused");
        self.hooks.emit(&AuctionEvent::SessionPaused { remaining_ms });
        self.persist();
        Ok(remaining_ms)
    }

    /// Resume a paused countdown. The deadline becomes `now + remaining`,
    /// floored so the lot never resumes directly into the snipe window.
    pub fn resume(&mut self, now: Timestamp) -> Result<Timestamp, BidError> {
        let deadline = self.engine.resume(now, self.config.resume_floor_ms)?;
        self.schedule_lot_timers(now, deadline);
        info!(deadline, "session resumed");
        self.hooks.emit(&AuctionEvent::SessionResumed { deadline });
        self.persist();
        Ok(deadline)
    }

    /// Operator extension of the current lot.
    pub fn extend_current(&mut self, now: Timestamp, extra_ms: DurationMs) -> Result<Timestamp, BidError> {
        let deadline = self.engine.extend_deadline(extra_ms)?;
        self.schedule_lot_timers(now, deadline);
        let (lot_id, extension_count) = {
            let runtime = self.engine.active().expect("extend requires an active lot");
            (runtime.lot.id, runtime.extension_count)
        };
        self.hooks.emit(&AuctionEvent::DeadlineExtended {
            lot_id,
            new_deadline: deadline,
            extension_count,
        });
        self.persist();
        Ok(deadline)
    }

    // =========================================================================
    // Persistence and recovery
    // =========================================================================

    /// Build the durable state document.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            queue: self.queue.iter().cloned().collect(),
            active: self.engine.active().cloned(),
            locks: self.engine.locks().clone(),
            cache: self.engine.cache().cloned(),
            history: self
                .session
                .as_ref()
                .map(|s| s.history.clone())
                .unwrap_or_default(),
            session_started_at: self.session.as_ref().map(|s| s.started_at),
            session_label: self.session.as_ref().map(|s| s.label.clone()),
            stats: self.session.as_ref().map(|s| s.stats).unwrap_or_default(),
            next_lot_id: self.next_lot_id,
        }
    }

    /// Save after a state-mutating operation. Persistence failures are
    /// logged, not propagated; the live session keeps running.
    fn persist(&self) {
        if let Some(store) = &self.store {
            if let Err(err) = store.save(&self.snapshot()) {
                warn!(%err, "state snapshot save failed");
            }
        }
    }

    /// Load persisted state at startup. An active lot has its timers
    /// rescheduled relative to its *persisted* deadline; a snapshot that
    /// cannot be reconstructed is cleared (safe reset) rather than
    /// guessed at.
    pub fn restore(&mut self, now: Timestamp) -> RestoreReport {
        let Some(store) = &self.store else {
            return RestoreReport::Fresh;
        };

        let state = match store.load() {
            Ok(Some(state)) => state,
            Ok(None) => return RestoreReport::Fresh,
            Err(err) => {
                warn!(%err, "persisted state unreadable, resetting");
                let _ = store.clear();
                return RestoreReport::Reset {
                    reason: err.to_string(),
                };
            }
        };

        if state.active.is_some() && state.session_started_at.is_none() {
            warn!("persisted lot without session metadata, resetting");
            let _ = store.clear();
            return RestoreReport::Reset {
                reason: "active lot without session metadata".into(),
            };
        }

        self.queue = state.queue.into_iter().collect();
        self.next_lot_id = state.next_lot_id.max(1);
        self.engine.restore_locks(state.locks);
        if let Some(cache) = state.cache {
            self.engine.replace_cache(cache);
        }

        let mut active_label = None;
        if let Some(started_at) = state.session_started_at {
            let active_count = usize::from(state.active.is_some());
            self.session = Some(SessionState {
                started_at,
                label: state.session_label.unwrap_or_default(),
                total_lots: state.stats.lots_run as usize + self.queue.len() + active_count,
                position: state.stats.lots_run as usize + active_count,
                history: state.history,
                stats: state.stats,
            });
            self.scheduler
                .schedule_at(now + self.config.cache_refresh_ms, TimerKind::CacheRefresh);

            if let Some(runtime) = state.active {
                active_label = Some(runtime.lot.label.clone());
                let status = runtime.status;
                let deadline = runtime.deadline;
                self.engine.restore_active(runtime);
                match status {
                    // Reschedule against the persisted deadline; if it
                    // already passed, the lot closes on the next tick.
                    LotStatus::Active => self.schedule_lot_timers(now, deadline),
                    // A restart mid-preview restarts the preview window.
                    LotStatus::Preview => {
                        self.scheduler.bump_lot_generation();
                        self.scheduler
                            .schedule_lot_at(now + self.config.preview_ms, TimerKind::PreviewEnd);
                    }
                    // Stays paused until an operator resumes.
                    LotStatus::Paused => {}
                    LotStatus::Queued | LotStatus::Ended => {}
                }
            } else {
                // Between lots: pick the queue back up after the usual gap.
                self.scheduler
                    .schedule_at(now + self.config.inter_lot_delay_ms, TimerKind::NextLot);
            }
        }

        let report = RestoreReport::Resumed {
            queued: self.queue.len(),
            holds: self.engine.locks().len(),
            active_lot: active_label.clone(),
        };
        info!(
            queued = self.queue.len(),
            holds = self.engine.locks().len(),
            ?active_label,
            "state restored"
        );
        self.hooks.emit(&AuctionEvent::StateRestored {
            queued: self.queue.len(),
            holds: self.engine.locks().len(),
            active_lot: active_label,
        });
        report
    }
}
