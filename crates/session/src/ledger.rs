//! The external points ledger, consumed as an opaque balance/commit
//! service.

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;
use types::{DurationMs, MemberName, MemberSpend, Points};

/// Errors from the ledger boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The service could not be reached or timed out.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The service answered but refused the request.
    #[error("ledger rejected request: {0}")]
    Rejected(String),
}

/// The authoritative balance/commit service.
///
/// The engine never writes balances directly; it reads a snapshot at
/// session start (and on refresh) and submits one aggregate result set at
/// finalization.
pub trait LedgerService: Send {
    /// Fetch every member's total point balance.
    fn fetch_balances(&self) -> Result<HashMap<MemberName, Points>, LedgerError>;

    /// Durably record the session's aggregate spend. One row per known
    /// member, zero for non-winners.
    fn submit_results(
        &self,
        results: &[MemberSpend],
        session_label: &str,
    ) -> Result<(), LedgerError>;
}

/// Run a ledger operation with bounded backoff.
///
/// Retries up to `attempts` times, sleeping `backoff_ms × attempt` between
/// tries. Exhaustion returns the last error; the caller decides whether
/// that aborts (balance load) or surfaces for manual follow-up (result
/// submission).
pub fn with_retry<T>(
    attempts: u32,
    backoff_ms: DurationMs,
    what: &str,
    mut op: impl FnMut() -> Result<T, LedgerError>,
) -> Result<T, LedgerError> {
    let mut last = None;
    for attempt in 1..=attempts.max(1) {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(attempt, %err, "{} failed", what);
                last = Some(err);
                if attempt < attempts {
                    std::thread::sleep(Duration::from_millis(backoff_ms * attempt as u64));
                }
            }
        }
    }
    Err(last.expect("at least one attempt"))
}
