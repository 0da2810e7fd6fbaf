//! The expiry sweeper (C6, §4.6): a periodic task that force-releases leases
//! older than a configured TTL. It never resets the reclaimed database — the
//! next acquirer does that — and it never touches Waiting.

use std::time::Duration;

use broker_pool::PoolHandle;
use tokio::sync::watch;
use tracing::info;

pub struct SweeperConfig {
    pub ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl From<&broker_core::config::ExpiryConfig> for SweeperConfig {
    fn from(cfg: &broker_core::config::ExpiryConfig) -> Self {
        Self {
            ttl_seconds: cfg.ttl_seconds,
            sweep_interval_seconds: cfg.sweep_interval_seconds,
        }
    }
}

/// Runs until `shutdown` is set to `true`. Intended to be spawned as its own
/// task alongside the server accept loop.
pub async fn run(pool: PoolHandle, config: SweeperConfig, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(config.sweep_interval_seconds.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep_once(&pool, config.ttl_seconds).await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}

async fn sweep_once(pool: &PoolHandle, ttl_seconds: u64) {
    let reclaimed = pool.sweep_expired(ttl_seconds).await;
    if !reclaimed.is_empty() {
        info!(count = reclaimed.len(), ttl_seconds, "expiry sweeper reclaimed leases");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_core::{ConnectionDescriptor, PoolDefinition};
    use broker_pool::{NoopResetDriver, PoolActor};
    use std::sync::Arc;

    #[tokio::test]
    async fn sweep_once_reclaims_expired_lease() {
        let definition = PoolDefinition::new(vec![ConnectionDescriptor::new("postgres://t@h:5432/db_0")]).unwrap();
        let pool = PoolActor::start(definition, None);
        let reset: Arc<dyn broker_pool::ResetDriver> = Arc::new(NoopResetDriver);
        pool.acquire("slow", &reset, std::future::pending()).await.unwrap();

        sweep_once(&pool, 0).await;

        let snap = pool.snapshot().await.unwrap();
        assert_eq!(snap.leased, 0);
        assert_eq!(snap.free, 1);
    }

    #[tokio::test]
    async fn sweep_once_leaves_fresh_leases_alone() {
        let definition = PoolDefinition::new(vec![ConnectionDescriptor::new("postgres://t@h:5432/db_0")]).unwrap();
        let pool = PoolActor::start(definition, None);
        let reset: Arc<dyn broker_pool::ResetDriver> = Arc::new(NoopResetDriver);
        pool.acquire("fresh", &reset, std::future::pending()).await.unwrap();

        sweep_once(&pool, 3600).await;

        let snap = pool.snapshot().await.unwrap();
        assert_eq!(snap.leased, 1);
        assert_eq!(snap.free, 0);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let definition = PoolDefinition::new(vec![ConnectionDescriptor::new("postgres://t@h:5432/db_0")]).unwrap();
        let pool = PoolActor::start(definition, None);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let sweeper = tokio::spawn(run(
            pool,
            SweeperConfig {
                ttl_seconds: 600,
                sweep_interval_seconds: 1,
            },
            shutdown_rx,
        ));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), sweeper)
            .await
            .expect("sweeper did not stop after shutdown signal")
            .unwrap();
    }
}
