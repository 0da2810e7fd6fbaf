//! The pool actor: the single owner of (Available, Leased, Waiting).
//!
//! Every command below completes without ever awaiting external I/O, so the
//! actor loop never stalls on a release for one connection while a waiter
//! for another is pending, and never holds the lease table across a
//! suspension point. The reset driver is invoked by callers (see
//! `broker-pool::handle::PoolHandle::acquire`), never by the actor itself.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use broker_core::{ConnectionDescriptor, PoolDefinition};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::commands::{PoolCmd, WaitOutcome};
use crate::error::PoolError;
use crate::handle::PoolHandle;
use crate::snapshot::{LeaseView, Snapshot};

struct LeaseRecord {
    tag: String,
    acquired_at: Instant,
    acquired_at_wall: chrono::DateTime<Utc>,
}

/// A waiter parked in `BeginAcquire` with no connection available yet.
struct Waiter {
    id: u64,
    tx: oneshot::Sender<ConnectionDescriptor>,
}

pub struct PoolActor {
    rx: mpsc::Receiver<PoolCmd>,
    definition: PoolDefinition,
    available: VecDeque<ConnectionDescriptor>,
    leased: HashMap<ConnectionDescriptor, LeaseRecord>,
    waiting: u64,
    waiters: VecDeque<Waiter>,
    next_waiter_id: u64,
    publisher: Option<mpsc::Sender<Snapshot>>,
    publisher_dead: bool,
}

impl PoolActor {
    /// Spawns the actor and returns a handle to it. `publisher` is the
    /// state-publisher's sending half (§4.7); it is optional per §6.
    pub fn start(definition: PoolDefinition, publisher: Option<mpsc::Sender<Snapshot>>) -> PoolHandle {
        let (tx, rx) = mpsc::channel(1024);
        let available = definition.iter().cloned().collect();
        let actor = Self {
            rx,
            definition,
            available,
            leased: HashMap::new(),
            waiting: 0,
            waiters: VecDeque::new(),
            next_waiter_id: 0,
            publisher,
            publisher_dead: false,
        };
        tokio::spawn(actor.run());
        PoolHandle::new(tx)
    }

    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                PoolCmd::BeginAcquire { reply } => {
                    let _ = reply.send(self.begin_acquire());
                }
                PoolCmd::CancelWait { waiter_id, reply } => {
                    let removed = self.cancel_wait(waiter_id);
                    let _ = reply.send(removed);
                }
                PoolCmd::ReturnUnleased { connection, reply } => {
                    self.return_connection(connection);
                    self.publish();
                    let _ = reply.send(());
                }
                PoolCmd::CommitLease { connection, tag, reply } => {
                    self.commit_lease(connection, tag);
                    self.publish();
                    let _ = reply.send(());
                }
                PoolCmd::Release { connection, reply } => {
                    let result = self.release(&connection);
                    if result.is_ok() {
                        self.publish();
                    }
                    let _ = reply.send(result);
                }
                PoolCmd::ForceRelease { connection, reply } => {
                    if self.leased.remove(&connection).is_some() {
                        self.return_connection(connection);
                        self.publish();
                    }
                    let _ = reply.send(());
                }
                PoolCmd::ReleaseByTag { tag, reply } => {
                    let matched: Vec<ConnectionDescriptor> = self
                        .leased
                        .iter()
                        .filter(|(_, rec)| rec.tag == tag)
                        .map(|(c, _)| c.clone())
                        .collect();
                    for c in &matched {
                        self.leased.remove(c);
                    }
                    for c in matched.iter().cloned() {
                        self.return_connection(c);
                    }
                    if !matched.is_empty() {
                        self.publish();
                    }
                    let _ = reply.send(matched.len());
                }
                PoolCmd::SweepExpired { max_age_secs, reply } => {
                    let now = Instant::now();
                    let expired: Vec<ConnectionDescriptor> = self
                        .leased
                        .iter()
                        .filter(|(_, rec)| now.duration_since(rec.acquired_at).as_secs() >= max_age_secs)
                        .map(|(c, _)| c.clone())
                        .collect();
                    for c in &expired {
                        self.leased.remove(c);
                    }
                    for c in expired.iter().cloned() {
                        self.return_connection(c);
                    }
                    if !expired.is_empty() {
                        self.publish();
                    }
                    let _ = reply.send(expired);
                }
                PoolCmd::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
            }
        }
    }

    fn begin_acquire(&mut self) -> WaitOutcome {
        self.waiting += 1;
        self.publish();
        if let Some(connection) = self.available.pop_front() {
            self.waiting -= 1;
            self.publish();
            return WaitOutcome::Ready(connection);
        }
        let id = self.next_waiter_id;
        self.next_waiter_id += 1;
        let (tx, rx) = oneshot::channel();
        self.waiters.push_back(Waiter { id, tx });
        WaitOutcome::Pending { waiter_id: id, rx }
    }

    /// Returns `true` if the waiter was still queued and was removed,
    /// `false` if it had already been popped by `return_connection` (and so
    /// may have a connection waiting in its oneshot channel).
    fn cancel_wait(&mut self, waiter_id: u64) -> bool {
        let before = self.waiters.len();
        self.waiters.retain(|w| w.id != waiter_id);
        let removed = self.waiters.len() != before;
        if removed {
            self.waiting = self.waiting.saturating_sub(1);
            self.publish();
        }
        removed
    }

    fn commit_lease(&mut self, connection: ConnectionDescriptor, tag: String) {
        let now_wall = Utc::now();
        self.leased.insert(
            connection,
            LeaseRecord {
                tag,
                acquired_at: Instant::now(),
                acquired_at_wall: now_wall,
            },
        );
    }

    fn release(&mut self, connection: &ConnectionDescriptor) -> Result<(), PoolError> {
        if !self.definition.contains(connection) {
            return Err(PoolError::UnknownConnection(connection.as_str().to_string()));
        }
        if self.leased.remove(connection).is_none() {
            return Err(PoolError::NotLeased(connection.as_str().to_string()));
        }
        self.return_connection(connection.clone());
        Ok(())
    }

    /// Hand `connection` directly to the oldest pending waiter if one
    /// exists, otherwise append it to Available. Either way the connection
    /// is never left unreachable.
    fn return_connection(&mut self, connection: ConnectionDescriptor) {
        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.tx.send(connection.clone()) {
                Ok(()) => {
                    self.waiting = self.waiting.saturating_sub(1);
                    debug!(connection = %connection, waiter_id = waiter.id, "handed connection to waiter");
                    return;
                }
                Err(_) => {
                    // Waiter's acquire call was dropped (e.g. cancelled
                    // concurrently with this hand-off); the pending decrement
                    // was already accounted for by `cancel_wait`. Try the
                    // next waiter with the same connection.
                    continue;
                }
            }
        }
        self.available.push_back(connection);
    }

    fn snapshot(&self) -> Snapshot {
        let mut leases: Vec<LeaseView> = self
            .leased
            .iter()
            .map(|(c, rec)| LeaseView {
                connection: c.clone(),
                tag: rec.tag.clone(),
                acquired_at: rec.acquired_at_wall,
                age_seconds: Instant::now().duration_since(rec.acquired_at).as_secs(),
            })
            .collect();
        leases.sort_by(|a, b| a.acquired_at.cmp(&b.acquired_at));
        Snapshot {
            total: self.definition.len(),
            leased: self.leased.len(),
            free: self.available.len(),
            waiting: self.waiting,
            leases,
        }
    }

    fn publish(&mut self) {
        if self.publisher_dead {
            return;
        }
        let Some(publisher) = &self.publisher else {
            return;
        };
        match publisher.try_send(self.snapshot()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("state publisher subscriber dropped; further snapshots will be silently skipped");
                self.publisher_dead = true;
            }
        }
    }
}
