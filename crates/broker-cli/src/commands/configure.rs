//! `brokerctl configure` — writes `.broker/config.toml` and one engine
//! descriptor file per configured instance.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use broker_core::config::default_config_path;
use broker_core::BrokerConfig;
use broker_engine::EngineDescriptor;
use sha2::{Digest, Sha256};
use tracing::info;

pub fn configure(instances: u32, databases_per_instance: u32) -> Result<()> {
    let config_path = default_config_path();
    let dot_dir = config_path.parent().unwrap_or_else(|| Path::new(".broker"));
    std::fs::create_dir_all(dot_dir).with_context(|| format!("creating {}", dot_dir.display()))?;

    let secret = generate_secret();
    let config = BrokerConfig::scaffold(instances, databases_per_instance, secret);
    config.save(&config_path).context("writing broker config")?;
    info!(path = %config_path.display(), "wrote broker configuration");

    for instance in 0..instances {
        let port = config.pool.port_base + instance as u16;
        let descriptor = EngineDescriptor {
            instance,
            data_dir: dot_dir.join(format!("engine-{instance}")),
            host: config.pool.host.clone(),
            port,
            superuser: "postgres".to_string(),
        };
        let descriptor_path = engine_descriptor_path(dot_dir, instance);
        descriptor.save(&descriptor_path)?;
        info!(instance, path = %descriptor_path.display(), "wrote engine descriptor");
    }

    Ok(())
}

pub fn engine_descriptor_path(dot_dir: &Path, instance: u32) -> PathBuf {
    dot_dir.join(format!("engine-{instance}.toml"))
}

/// Not cryptographically random: a hash of the current time and process id,
/// good enough to avoid an empty or guessable default secret without adding
/// a dependency on an RNG crate.
fn generate_secret() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let pid = std::process::id();
    let mut hasher = Sha256::new();
    hasher.update(nanos.to_le_bytes());
    hasher.update(pid.to_le_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}
