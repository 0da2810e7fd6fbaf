//! Pool-level error taxonomy (the subset of the wire error kinds that the
//! pool actor itself can produce; authentication errors are a server concern).

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("acquire cancelled before a connection was delivered")]
    Cancelled,

    #[error("reset failed for the acquired connection: {0}")]
    ResetFailed(String),

    #[error("connection is not a member of the pool: {0}")]
    UnknownConnection(String),

    #[error("connection is not currently leased: {0}")]
    NotLeased(String),

    #[error("release-by-tag target tag must not be empty")]
    EmptyTag,

    #[error("internal pool actor error: {0}")]
    Internal(String),
}

impl PoolError {
    pub fn to_wire_kind(&self) -> broker_core::WireErrorKind {
        use broker_core::WireErrorKind::*;
        match self {
            PoolError::Cancelled => Cancelled,
            PoolError::ResetFailed(_) => ResetFailed,
            PoolError::UnknownConnection(_) => UnknownConnection,
            PoolError::NotLeased(_) => NotLeased,
            PoolError::EmptyTag => BadRequest,
            PoolError::Internal(_) => Internal,
        }
    }
}
