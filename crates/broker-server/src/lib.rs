//! The broker's TCP front end: request handler (C8) and accept loop (C9).

pub mod handler;
pub mod server;

pub use handler::{handle, HandlerConfig};
pub use server::{run, ServerConfig};
