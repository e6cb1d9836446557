//! Error types for bid protocol operations.

use std::fmt;
use types::{DurationMs, Points};

/// Result type for bid protocol operations.
pub type Result<T> = std::result::Result<T, BidError>;

/// Errors that can occur while proposing, confirming, or canceling bids.
///
/// Validation, insufficient-funds, and race-lost errors are terminal at the
/// failed call and reported to the proposer only; none of them mutate any
/// lock state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidError {
    /// No lot is currently open for bidding.
    NoActiveLot,
    /// No balance snapshot is loaded; bidding is fail-closed without one.
    CacheNotLoaded,
    /// Bid amount is not a positive integer.
    InvalidAmount,
    /// Bid does not strictly exceed the current high bid (ties rejected).
    BidTooLow { current: Points },
    /// Member has no points at all in the snapshot.
    NoPoints,
    /// Available points fall short of the required delta.
    InsufficientPoints {
        needed: Points,
        available: Points,
        total: Points,
        locked: Points,
    },
    /// Member proposed again inside the cooldown window.
    RateLimited { wait_ms: DurationMs },
    /// The confirmation handle does not exist (resolved or expired).
    UnknownConfirmation,
    /// The confirming identity is not the proposer or an authorized override.
    NotProposer,
    /// A competing bid pre-empted this one; the highest pending amount wins
    /// the race, not the first to confirm.
    RaceLost { winning_amount: Points },
    /// The lot is not in the state the operation requires.
    InvalidTransition { reason: &'static str },
}

impl fmt::Display for BidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidError::NoActiveLot => write!(f, "no active lot"),
            BidError::CacheNotLoaded => write!(f, "balance snapshot not loaded"),
            BidError::InvalidAmount => write!(f, "bid must be a positive integer"),
            BidError::BidTooLow { current } => {
                write!(f, "bid must exceed the current high bid of {}", current)
            }
            BidError::NoPoints => write!(f, "member has no points"),
            BidError::InsufficientPoints {
                needed, available, ..
            } => write!(
                f,
                "insufficient points: need {}, {} available",
                needed, available
            ),
            BidError::RateLimited { wait_ms } => {
                write!(f, "rate limited, wait {}ms", wait_ms)
            }
            BidError::UnknownConfirmation => write!(f, "unknown or resolved confirmation"),
            BidError::NotProposer => write!(f, "only the proposer may resolve this bid"),
            BidError::RaceLost { winning_amount } => {
                write!(f, "outraced by a higher bid of {}", winning_amount)
            }
            BidError::InvalidTransition { reason } => write!(f, "invalid lot state: {}", reason),
        }
    }
}

impl std::error::Error for BidError {}
