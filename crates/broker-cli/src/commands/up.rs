//! `brokerctl up` — starts engines, builds the pool, starts the broker
//! daemon in-process, and renders the operator dashboard until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use broker_client::BrokerClient;
use broker_core::config::default_config_path;
use broker_core::{BrokerConfig, ConnectionDescriptor, PoolDefinition};
use broker_engine::{EngineDescriptor, EngineTable};
use broker_pool::{PoolActor, ResetDriver};
use broker_reset::PostgresResetDriver;
use broker_server::ServerConfig;
use broker_sweeper::SweeperConfig;
use tokio::sync::watch;
use tracing::info;

use super::configure::engine_descriptor_path;

const DASHBOARD_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub async fn up(instances_override: Option<u32>, databases_per_instance_override: Option<u32>) -> Result<()> {
    let config_path = default_config_path();
    let mut config = BrokerConfig::from_file(&config_path).context("loading broker config")?;
    if let Some(i) = instances_override {
        config.pool.instances = i;
    }
    if let Some(d) = databases_per_instance_override {
        config.pool.databases_per_instance = d;
    }
    let dot_dir = config_path.parent().expect("config path has a parent").to_path_buf();

    let mut descriptors: Vec<EngineDescriptor> = Vec::new();
    for instance in 0..config.pool.instances {
        let path = engine_descriptor_path(&dot_dir, instance);
        descriptors.push(EngineDescriptor::load(&path)?);
    }

    let mut engines = EngineTable::new();
    engines.start_all(descriptors).await?;
    info!(count = config.pool.instances, "engines started");

    let connection_descriptors: Vec<ConnectionDescriptor> =
        config.connection_strings().into_iter().map(ConnectionDescriptor::new).collect();
    let pool_definition = PoolDefinition::new(connection_descriptors).map_err(anyhow::Error::from)?;

    let (snapshot_tx, _snapshot_rx) = tokio::sync::mpsc::channel(16);
    let pool = PoolActor::start(pool_definition, Some(snapshot_tx));
    let reset: Arc<dyn ResetDriver> = Arc::new(PostgresResetDriver::new(config.reset.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server_config = ServerConfig {
        bind_address: config.server.bind_address.clone(),
        port: config.server.port,
        secret: config.auth.secret.clone(),
    };
    let server_handle = tokio::spawn(broker_server::run(server_config, pool.clone(), reset, shutdown_rx.clone()));

    let sweeper_handle = tokio::spawn(broker_sweeper::run(
        pool.clone(),
        SweeperConfig {
            ttl_seconds: config.expiry.ttl_seconds,
            sweep_interval_seconds: config.expiry.sweep_interval_seconds,
        },
        shutdown_rx.clone(),
    ));

    let client = BrokerClient::new(
        format!("{}:{}", config.server.bind_address, config.server.port),
        config.auth.secret.clone(),
    );
    let dashboard_handle = tokio::spawn(broker_dashboard::run(client, DASHBOARD_POLL_INTERVAL, shutdown_rx));

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);

    server_handle.await??;
    sweeper_handle.await?;
    dashboard_handle.await?;

    engines.stop_all().await?;
    info!("all engines stopped");
    Ok(())
}
