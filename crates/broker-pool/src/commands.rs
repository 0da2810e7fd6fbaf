//! Messages accepted by the pool actor. Every variant that produces a result
//! carries a `oneshot::Sender` reply channel; the actor never blocks handling
//! any of these — blocking acquire is built by the handle layering a wait on
//! top of [`BeginAcquire`](PoolCmd::BeginAcquire).

use broker_core::ConnectionDescriptor;
use tokio::sync::oneshot;

use crate::error::PoolError;
use crate::snapshot::Snapshot;

/// What `BeginAcquire` hands back: either a connection immediately, or a
/// receiver that resolves once some later release/sweep hands one over.
pub enum WaitOutcome {
    Ready(ConnectionDescriptor),
    Pending {
        waiter_id: u64,
        rx: oneshot::Receiver<ConnectionDescriptor>,
    },
}

pub enum PoolCmd {
    /// Enter the acquire wait step (§4.2 step 1-2). Always increments Waiting;
    /// decrements it again immediately if a connection is already available.
    BeginAcquire {
        reply: oneshot::Sender<WaitOutcome>,
    },
    /// A waiter's cancellation fired before it was woken. No-op if the waiter
    /// was already handed a connection (lost the race); the reply reports
    /// whether the waiter was still queued (`true`) or had already been
    /// popped by a hand-off (`false`), so the caller knows whether to expect
    /// a connection sitting unread in its own oneshot receiver.
    CancelWait {
        waiter_id: u64,
        reply: oneshot::Sender<bool>,
    },
    /// Reset failed for a connection taken via `BeginAcquire`; return it
    /// (possibly straight to another waiter) without ever having leased it.
    ReturnUnleased {
        connection: ConnectionDescriptor,
        reply: oneshot::Sender<()>,
    },
    /// Reset succeeded; record the lease and complete the acquire.
    CommitLease {
        connection: ConnectionDescriptor,
        tag: String,
        reply: oneshot::Sender<()>,
    },
    Release {
        connection: ConnectionDescriptor,
        reply: oneshot::Sender<Result<(), PoolError>>,
    },
    ForceRelease {
        connection: ConnectionDescriptor,
        reply: oneshot::Sender<()>,
    },
    ReleaseByTag {
        tag: String,
        reply: oneshot::Sender<usize>,
    },
    /// Force-release every lease older than `max_age_secs`, used by the
    /// expiry sweeper. Returns the connections it reclaimed for logging.
    SweepExpired {
        max_age_secs: u64,
        reply: oneshot::Sender<Vec<ConnectionDescriptor>>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
}
