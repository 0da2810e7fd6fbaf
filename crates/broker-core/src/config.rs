//! `.broker/config.toml` parser, mirroring the scaffold/from_file/to_toml_string
//! shape used elsewhere in this repository's configuration types.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub pool: PoolConfig,
    pub auth: AuthConfig,
    pub expiry: ExpiryConfig,
    pub reset: ResetConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Explicit connection descriptors. When absent, `instances` x `databases_per_instance`
    /// generate descriptors against `host`/`port_base` (see `broker-cli configure`).
    pub connections: Option<Vec<String>>,
    pub instances: u32,
    pub databases_per_instance: u32,
    pub host: String,
    pub port_base: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryConfig {
    pub ttl_seconds: u64,
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConfig {
    pub admin_database: String,
    pub template: String,
    pub tenant_role: String,
    pub encoding: String,
    pub locale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub read_write_deadline_seconds: u64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 600,
            sweep_interval_seconds: 60,
        }
    }
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            admin_database: "postgres".to_string(),
            template: "template0".to_string(),
            tenant_role: "tenant".to_string(),
            encoding: "UTF8".to_string(),
            locale: "en_US.UTF-8".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 6432,
            read_write_deadline_seconds: 300,
        }
    }
}

impl BrokerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Write(path.display().to_string(), e.to_string()))?;
        }
        std::fs::write(path, self.to_toml_string()?)
            .map_err(|e| ConfigError::Write(path.display().to_string(), e.to_string()))
    }

    /// Scaffold a minimal config for `instances` engines carrying `databases_per_instance`
    /// databases each, with a random-looking but deterministic-enough default secret.
    pub fn scaffold(instances: u32, databases_per_instance: u32, secret: impl Into<String>) -> Self {
        Self {
            pool: PoolConfig {
                connections: None,
                instances,
                databases_per_instance,
                host: "127.0.0.1".to_string(),
                port_base: 55432,
            },
            auth: AuthConfig {
                secret: secret.into(),
            },
            expiry: ExpiryConfig::default(),
            reset: ResetConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Expand `pool.connections`, or synthesize them from `instances` x
    /// `databases_per_instance` against `host`/`port_base` if none were given.
    pub fn connection_strings(&self) -> Vec<String> {
        if let Some(explicit) = &self.pool.connections {
            return explicit.clone();
        }
        let mut out = Vec::with_capacity((self.pool.instances * self.pool.databases_per_instance) as usize);
        for instance in 0..self.pool.instances {
            let port = self.pool.port_base + instance as u16;
            for db in 0..self.pool.databases_per_instance {
                out.push(format!(
                    "postgres://{role}@{host}:{port}/pool_{instance}_{db}",
                    role = self.reset.tenant_role,
                    host = self.pool.host,
                ));
            }
        }
        out
    }
}

/// Default location for the broker's configuration file, relative to the
/// operator's working directory.
pub fn default_config_path() -> std::path::PathBuf {
    std::path::PathBuf::from(".broker/config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffold_round_trips_through_toml() {
        let config = BrokerConfig::scaffold(2, 3, "shh");
        let toml_str = config.to_toml_string().unwrap();
        let parsed: BrokerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.pool.instances, 2);
        assert_eq!(parsed.pool.databases_per_instance, 3);
        assert_eq!(parsed.auth.secret, "shh");
    }

    #[test]
    fn connection_strings_are_synthesized_when_absent() {
        let config = BrokerConfig::scaffold(2, 2, "shh");
        let conns = config.connection_strings();
        assert_eq!(conns.len(), 4);
        assert!(conns[0].starts_with("postgres://tenant@127.0.0.1:55432/"));
        assert!(conns[2].contains(":55433/"));
    }

    #[test]
    fn explicit_connections_are_used_verbatim() {
        let mut config = BrokerConfig::scaffold(1, 1, "shh");
        config.pool.connections = Some(vec!["postgres://x@h:1/db".to_string()]);
        assert_eq!(config.connection_strings(), vec!["postgres://x@h:1/db"]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = BrokerConfig::scaffold(1, 1, "shh");
        config.save(&path).unwrap();
        let loaded = BrokerConfig::from_file(&path).unwrap();
        assert_eq!(loaded.pool.instances, 1);
    }

    #[test]
    fn from_file_missing_path_is_an_error() {
        let err = BrokerConfig::from_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_, _)));
    }
}
