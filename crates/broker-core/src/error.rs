//! Configuration error taxonomy, in the style used across this workspace's
//! per-crate `thiserror` enums.

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {0}: {1}")]
    Read(String, String),

    #[error("failed to write config to {0}: {1}")]
    Write(String, String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to serialize config: {0}")]
    Serialize(String),
}
