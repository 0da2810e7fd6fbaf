pub mod build_phase;
pub mod execute_phase;
pub mod manifest;
pub mod summary;

pub use build_phase::{build_target, BuildOutcome};
pub use execute_phase::{run_binary, BrokerEndpoint, RunOutcome};
pub use manifest::{Manifest, TestTarget};
