//! The seam between the pool and the reset driver (C5). Defined here, not in
//! `broker-reset`, so the pool crate has no dependency on how resets are
//! actually performed.

use async_trait::async_trait;
use broker_core::ConnectionDescriptor;

#[async_trait]
pub trait ResetDriver: Send + Sync + 'static {
    async fn reset(&self, connection: &ConnectionDescriptor) -> Result<(), String>;
}

/// A reset driver that always succeeds without doing anything, useful for
/// unit tests that exercise pool bookkeeping without a real database engine.
pub struct NoopResetDriver;

#[async_trait]
impl ResetDriver for NoopResetDriver {
    async fn reset(&self, _connection: &ConnectionDescriptor) -> Result<(), String> {
        Ok(())
    }
}

/// A reset driver that always fails, for testing the `ResetFailed` path.
pub struct AlwaysFailResetDriver;

#[async_trait]
impl ResetDriver for AlwaysFailResetDriver {
    async fn reset(&self, _connection: &ConnectionDescriptor) -> Result<(), String> {
        Err("reset driver configured to always fail".to_string())
    }
}
