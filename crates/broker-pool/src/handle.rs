//! Handle for communicating with the [`PoolActor`](crate::actor::PoolActor).
//!
//! `acquire` is the one method that does real work outside the actor: it
//! drives the wait, invokes the reset driver, and tells the actor how things
//! turned out. Every other method is a single round trip to the actor.

use std::future::Future;
use std::sync::Arc;

use broker_core::ConnectionDescriptor;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::commands::{PoolCmd, WaitOutcome};
use crate::error::PoolError;
use crate::reset_driver::ResetDriver;
use crate::snapshot::Snapshot;

#[derive(Clone)]
pub struct PoolHandle {
    tx: mpsc::Sender<PoolCmd>,
}

impl PoolHandle {
    pub(crate) fn new(tx: mpsc::Sender<PoolCmd>) -> Self {
        Self { tx }
    }

    /// Blocking acquire (§4.2). `cancel` resolves when the caller's
    /// cancellation fires (client disconnect or timeout); it is only
    /// consulted while this call is actually suspended waiting for a
    /// connection to become available, not during the reset that follows.
    pub async fn acquire(
        &self,
        tag: impl Into<String>,
        reset: &Arc<dyn ResetDriver>,
        cancel: impl Future<Output = ()>,
    ) -> Result<ConnectionDescriptor, PoolError> {
        let tag = tag.into();
        let connection = self.wait_for_connection(cancel).await?;

        match reset.reset(&connection).await {
            Ok(()) => {
                let (reply, rx) = oneshot::channel();
                self.tx
                    .send(PoolCmd::CommitLease {
                        connection: connection.clone(),
                        tag,
                        reply,
                    })
                    .await
                    .map_err(|_| PoolError::Internal("pool actor unavailable".into()))?;
                rx.await.map_err(|_| PoolError::Internal("pool actor dropped reply".into()))?;
                info!(connection = %connection, "acquire completed");
                Ok(connection)
            }
            Err(reason) => {
                warn!(connection = %connection, reason, "reset failed; returning connection to pool");
                let (reply, rx) = oneshot::channel();
                self.tx
                    .send(PoolCmd::ReturnUnleased {
                        connection: connection.clone(),
                        reply,
                    })
                    .await
                    .map_err(|_| PoolError::Internal("pool actor unavailable".into()))?;
                let _ = rx.await;
                Err(PoolError::ResetFailed(reason))
            }
        }
    }

    async fn wait_for_connection(
        &self,
        cancel: impl Future<Output = ()>,
    ) -> Result<ConnectionDescriptor, PoolError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PoolCmd::BeginAcquire { reply })
            .await
            .map_err(|_| PoolError::Internal("pool actor unavailable".into()))?;
        let outcome = rx.await.map_err(|_| PoolError::Internal("pool actor dropped reply".into()))?;

        match outcome {
            WaitOutcome::Ready(connection) => Ok(connection),
            WaitOutcome::Pending { waiter_id, mut rx } => {
                tokio::select! {
                    biased;
                    res = &mut rx => res.map_err(|_| PoolError::Internal("waiter channel dropped".into())),
                    _ = cancel => {
                        // A connection may have been handed to us in the
                        // instant before the cancellation was observed; if
                        // so, honor the handoff rather than discard it (a
                        // dropped, unread oneshot value would leak the
                        // connection out of both Available and Leased).
                        match rx.try_recv() {
                            Ok(connection) => Ok(connection),
                            Err(_) => {
                                let (reply, ack) = oneshot::channel();
                                let _ = self.tx.send(PoolCmd::CancelWait { waiter_id, reply }).await;
                                let removed = ack.await.unwrap_or(true);
                                if removed {
                                    Err(PoolError::Cancelled)
                                } else {
                                    // The actor had already popped this waiter
                                    // and handed it a connection (return_connection
                                    // races CancelWait through the command queue);
                                    // by the time the ack above arrived that send
                                    // has completed, so it must be sitting in `rx`.
                                    match rx.try_recv() {
                                        Ok(connection) => Ok(connection),
                                        Err(_) => Err(PoolError::Internal(
                                            "waiter removed by hand-off but no connection received".into(),
                                        )),
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    pub async fn release(&self, connection: ConnectionDescriptor) -> Result<(), PoolError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PoolCmd::Release { connection, reply })
            .await
            .map_err(|_| PoolError::Internal("pool actor unavailable".into()))?;
        rx.await.map_err(|_| PoolError::Internal("pool actor dropped reply".into()))?
    }

    pub async fn force_release(&self, connection: ConnectionDescriptor) {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(PoolCmd::ForceRelease { connection, reply }).await.is_ok() {
            let _ = rx.await;
        }
    }

    pub async fn release_by_tag(&self, tag: impl Into<String>) -> Result<usize, PoolError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(PoolError::EmptyTag);
        }
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PoolCmd::ReleaseByTag { tag, reply })
            .await
            .map_err(|_| PoolError::Internal("pool actor unavailable".into()))?;
        rx.await.map_err(|_| PoolError::Internal("pool actor dropped reply".into()))
    }

    /// Used by the expiry sweeper (§4.6); returns the connections reclaimed.
    pub async fn sweep_expired(&self, max_age_secs: u64) -> Vec<ConnectionDescriptor> {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(PoolCmd::SweepExpired { max_age_secs, reply })
            .await
            .is_ok()
        {
            rx.await.unwrap_or_default()
        } else {
            Vec::new()
        }
    }

    pub async fn snapshot(&self) -> Result<Snapshot, PoolError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PoolCmd::Snapshot { reply })
            .await
            .map_err(|_| PoolError::Internal("pool actor unavailable".into()))?;
        rx.await.map_err(|_| PoolError::Internal("pool actor dropped reply".into()))
    }
}
