//! Reset driver errors. These carry which step failed for logging; at the
//! pool boundary they all collapse to `PoolError::ResetFailed`.

#[derive(Debug, thiserror::Error)]
pub enum ResetError {
    #[error("failed to connect to admin database {0}: {1}")]
    AdminConnect(String, String),

    #[error("failed to terminate existing sessions on {0}: {1}")]
    TerminateSessions(String, String),

    #[error("failed to drop database {0}: {1}")]
    Drop(String, String),

    #[error("failed to create database {0} from template {1}: {2}")]
    Create(String, String, String),

    #[error("failed to transfer ownership of database {0} to role {1}: {2}")]
    AlterOwner(String, String, String),

    #[error("failed to connect to {0} to transfer schema ownership: {1}")]
    TargetConnect(String, String),

    #[error("failed to transfer ownership of schema public in {0} to role {1}: {2}")]
    AlterSchemaOwner(String, String, String),

    #[error("connection descriptor could not be parsed: {0}")]
    MalformedDescriptor(String),
}
