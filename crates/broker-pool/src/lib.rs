//! The pool actor: owns the available queue, lease table, and waiter count
//! (C1-C4, C7) and blocking acquire (§4.2) built on top of it.

pub mod actor;
pub mod commands;
pub mod error;
pub mod handle;
pub mod reset_driver;
pub mod snapshot;

pub use actor::PoolActor;
pub use error::PoolError;
pub use handle::PoolHandle;
pub use reset_driver::{AlwaysFailResetDriver, NoopResetDriver, ResetDriver};
pub use snapshot::{LeaseView, Snapshot};
