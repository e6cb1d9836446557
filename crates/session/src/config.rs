//! Session configuration options.

use types::{BidRules, DurationMs};

/// Configuration for a session coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Bid protocol rules (timeouts, rate limit, anti-snipe).
    pub rules: BidRules,

    /// Preview delay between a lot's announcement and bidding opening.
    pub preview_ms: DurationMs,

    /// Gap between one lot closing and the next starting.
    pub inter_lot_delay_ms: DurationMs,

    /// How often the balance snapshot refreshes while a session is active.
    pub cache_refresh_ms: DurationMs,

    /// Minimum remaining time when resuming a paused lot, so a resume
    /// never lands straight inside the snipe window.
    pub resume_floor_ms: DurationMs,

    /// Whether unsold catalog lots re-enqueue for the next session.
    /// Unsold manual lots are recorded but never re-queued.
    pub requeue_unsold_catalog: bool,

    /// Ledger retry attempts (balance load and result submission).
    pub submit_attempts: u32,

    /// Base backoff between ledger retries; the wait multiplies by the
    /// attempt number.
    pub submit_backoff_ms: DurationMs,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rules: BidRules::default(),
            preview_ms: 20_000,
            inter_lot_delay_ms: 20_000,
            cache_refresh_ms: 30 * 60 * 1_000,
            resume_floor_ms: 60_000,
            requeue_unsold_catalog: true,
            submit_attempts: 3,
            submit_backoff_ms: 2_000,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with custom bid rules.
    pub fn new(rules: BidRules) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    /// Set the preview delay.
    pub fn with_preview_ms(mut self, ms: DurationMs) -> Self {
        self.preview_ms = ms;
        self
    }

    /// Set the inter-lot delay.
    pub fn with_inter_lot_delay_ms(mut self, ms: DurationMs) -> Self {
        self.inter_lot_delay_ms = ms;
        self
    }

    /// Set the cache refresh interval.
    pub fn with_cache_refresh_ms(mut self, ms: DurationMs) -> Self {
        self.cache_refresh_ms = ms;
        self
    }

    /// Set the resume floor.
    pub fn with_resume_floor_ms(mut self, ms: DurationMs) -> Self {
        self.resume_floor_ms = ms;
        self
    }

    /// Set the unsold-catalog requeue policy.
    pub fn with_requeue_unsold_catalog(mut self, requeue: bool) -> Self {
        self.requeue_unsold_catalog = requeue;
        self
    }

    /// Set submission retry behavior.
    pub fn with_submit_retry(mut self, attempts: u32, backoff_ms: DurationMs) -> Self {
        self.submit_attempts = attempts;
        self.submit_backoff_ms = backoff_ms;
        self
    }
}
