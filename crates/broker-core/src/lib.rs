//! Shared types for the pool broker: connection descriptors, the immutable
//! pool definition, on-disk configuration, and the wire-visible error kinds.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod wire_error;

pub use config::{BrokerConfig, ResetConfig};
pub use descriptor::{ConnectionDescriptor, ConnectionParts, PoolDefinition};
pub use error::ConfigError;
pub use wire_error::{WireError, WireErrorKind};
