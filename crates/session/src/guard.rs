//! Concurrency guard for session start.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Prevents two session starts from racing.
///
/// The guard hands out at most one [`StartToken`] at a time; the token
/// releases on drop, so every exit path from a failed start — error
/// returns and panics alike — clears the flag and cannot wedge the system.
#[derive(Debug, Default)]
pub struct StartGuard {
    starting: Arc<AtomicBool>,
}

impl StartGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the guard. Returns None if a start is already underway.
    pub fn try_acquire(&self) -> Option<StartToken> {
        self.starting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| StartToken {
                starting: Arc::clone(&self.starting),
            })
    }

    /// Whether a start is currently in flight.
    pub fn is_held(&self) -> bool {
        self.starting.load(Ordering::Acquire)
    }
}

/// RAII token for an in-flight session start.
#[derive(Debug)]
pub struct StartToken {
    starting: Arc<AtomicBool>,
}

impl Drop for StartToken {
    fn drop(&mut self) {
        self.starting.store(false, Ordering::Release);
    }
}
