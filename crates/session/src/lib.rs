//! Session layer: drives lots through the auction state machine.
//!
//! The [`SessionCoordinator`] owns the queue, the bid engine, and a single
//! generation-counted [`Scheduler`]. Callers pump it with `tick(now)` and
//! route inbound propose/confirm/cancel signals to it; everything outbound
//! flows through [`SessionHook`] observers as owned [`AuctionEvent`] values.
//!
//! External collaborators are trait seams: the authoritative points ledger
//! ([`LedgerService`]) and the crash-recovery snapshot store
//! ([`SnapshotStore`]). Neither is implemented here.

pub mod config;
pub mod coordinator;
pub mod events;
pub mod guard;
pub mod ledger;
pub mod persist;
pub mod scheduler;

pub use config::SessionConfig;
pub use coordinator::{RestoreReport, SessionCoordinator, SessionError, SessionStats};
pub use events::{AuctionEvent, HookRunner, SessionHook};
pub use guard::{StartGuard, StartToken};
pub use ledger::{LedgerError, LedgerService, with_retry};
pub use persist::{PersistedState, SnapshotStore, StoreError};
pub use scheduler::{Scheduler, TimerKind};
