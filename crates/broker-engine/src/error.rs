#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to prepare data directory {0}: {1}")]
    Build(String, String),
    #[error("failed to spawn postgres process for instance {0}: {1}")]
    Spawn(u32, String),
    #[error("instance {0} did not become ready within {1:?}")]
    ReadinessTimeout(u32, std::time::Duration),
    #[error("failed to stop instance {0}: {1}")]
    Stop(u32, String),
    #[error("no engine registered for instance {0}")]
    UnknownInstance(u32),
}
