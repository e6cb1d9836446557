//! Core auction mechanics: the points cache, lock manager, pending
//! confirmations, per-lot runtime state, and the two-phase bid protocol.
//!
//! This crate is deliberately free of timers, I/O, and scheduling. Every
//! operation takes an explicit `now` timestamp and returns plain data; the
//! session layer owns the clock, the timer schedule, and all external
//! surfaces. That keeps the protocol's critical sections short, synchronous,
//! and directly unit-testable.

mod confirm;
mod engine;
mod error;
mod locks;
mod lot;
mod points;

pub use confirm::{ConfirmationBook, PendingConfirmation, RateLimiter};
pub use engine::{BidEngine, ConfirmOutcome, ProposeReceipt};
pub use error::{BidError, Result};
pub use locks::LockManager;
pub use lot::{LotRuntime, MilestoneKind};
pub use points::PointsCache;
