//! Engine lifecycle shim (A4): spawns and stops local `postgres` processes
//! backing the pool definition. Not a container runtime — a process handle
//! table, a readiness probe, and a stop routine.

pub mod descriptor;
pub mod engine;
pub mod error;
pub mod table;

pub use descriptor::EngineDescriptor;
pub use engine::EngineHandle;
pub use error::EngineError;
pub use table::EngineTable;
