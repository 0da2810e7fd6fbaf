//! brokerd — the pool broker daemon.
//!
//! Assembles the pool actor, reset driver, expiry sweeper, and TCP server
//! into one process.
//!
//! # Usage
//!
//! ```text
//! brokerd serve --config .broker/config.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use broker_core::{BrokerConfig, ConnectionDescriptor, PoolDefinition};
use broker_pool::{PoolActor, PoolHandle, ResetDriver};
use broker_reset::PostgresResetDriver;
use broker_server::ServerConfig;
use broker_sweeper::SweeperConfig;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(name = "brokerd", about = "Pool broker daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the broker, serving requests until interrupted.
    Serve {
        #[arg(long, default_value = ".broker/config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,brokerd=debug,broker_pool=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { config } => run_serve(config).await,
    }
}

async fn run_serve(config_path: PathBuf) -> anyhow::Result<()> {
    let config = BrokerConfig::from_file(&config_path)?;
    info!(path = %config_path.display(), "loaded broker configuration");

    let descriptors: Vec<ConnectionDescriptor> =
        config.connection_strings().into_iter().map(ConnectionDescriptor::new).collect();
    let definition = PoolDefinition::new(descriptors).map_err(anyhow::Error::from)?;
    info!(size = definition.len(), "pool definition built");

    let (snapshot_tx, _snapshot_rx) = tokio::sync::mpsc::channel(16);
    let pool: PoolHandle = PoolActor::start(definition, Some(snapshot_tx));

    let reset: Arc<dyn ResetDriver> = Arc::new(PostgresResetDriver::new(config.reset.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper_pool = pool.clone();
    let sweeper_shutdown = shutdown_rx.clone();
    let sweeper_handle = tokio::spawn(broker_sweeper::run(
        sweeper_pool,
        SweeperConfig {
            ttl_seconds: config.expiry.ttl_seconds,
            sweep_interval_seconds: config.expiry.sweep_interval_seconds,
        },
        sweeper_shutdown,
    ));

    let server_config = ServerConfig {
        bind_address: config.server.bind_address.clone(),
        port: config.server.port,
        secret: config.auth.secret.clone(),
    };

    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("interrupt received; shutting down");
        let _ = ctrl_c_shutdown.send(true);
    });

    broker_server::run(server_config, pool, reset, shutdown_rx).await?;
    let _ = shutdown_tx.send(true);
    sweeper_handle.await?;

    info!("brokerd stopped");
    Ok(())
}
