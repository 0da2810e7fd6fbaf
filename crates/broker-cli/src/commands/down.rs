//! `brokerctl down` — stops engines via the lifecycle shim.

use anyhow::{Context, Result};
use broker_core::config::default_config_path;
use broker_engine::EngineDescriptor;
use tracing::info;

use super::configure::engine_descriptor_path;

pub async fn down() -> Result<()> {
    let config_path = default_config_path();
    let config = broker_core::BrokerConfig::from_file(&config_path).context("loading broker config")?;
    let dot_dir = config_path.parent().expect("config path has a parent");

    for instance in 0..config.pool.instances {
        let path = engine_descriptor_path(dot_dir, instance);
        let descriptor = EngineDescriptor::load(&path)?;
        broker_engine::engine::stop_by_data_dir(&descriptor).await?;
        info!(instance, "engine stopped");
    }

    Ok(())
}
