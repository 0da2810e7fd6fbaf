//! `brokerctl build` — prepares each engine's data directory.

use anyhow::{Context, Result};
use broker_core::config::default_config_path;
use broker_engine::EngineTable;
use tracing::info;

use super::configure::engine_descriptor_path;

pub fn build() -> Result<()> {
    let config_path = default_config_path();
    let config = broker_core::BrokerConfig::from_file(&config_path).context("loading broker config")?;
    let dot_dir = config_path.parent().expect("config path has a parent");

    let mut descriptors = Vec::new();
    for instance in 0..config.pool.instances {
        let path = engine_descriptor_path(dot_dir, instance);
        descriptors.push(broker_engine::EngineDescriptor::load(&path).with_context(|| {
            format!("loading engine descriptor {}; did you run `brokerctl configure`?", path.display())
        })?);
    }

    EngineTable::build_all(&descriptors)?;
    info!(count = descriptors.len(), "prepared all engine data directories");
    Ok(())
}
