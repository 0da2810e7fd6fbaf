use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One configured `postgres` instance: where its data directory lives and
/// where it should listen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDescriptor {
    pub instance: u32,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub superuser: String,
}

impl EngineDescriptor {
    pub fn admin_connection_string(&self) -> String {
        format!(
            "host={} port={} user={} dbname=postgres",
            self.host, self.port, self.superuser
        )
    }

    pub fn save(&self, path: &Path) -> Result<(), crate::error::EngineError> {
        let toml_str = toml::to_string_pretty(self)
            .map_err(|e| crate::error::EngineError::Build(path.display().to_string(), e.to_string()))?;
        std::fs::write(path, toml_str)
            .map_err(|e| crate::error::EngineError::Build(path.display().to_string(), e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, crate::error::EngineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::EngineError::Build(path.display().to_string(), e.to_string()))?;
        toml::from_str(&content).map_err(|e| crate::error::EngineError::Build(path.display().to_string(), e.to_string()))
    }
}
