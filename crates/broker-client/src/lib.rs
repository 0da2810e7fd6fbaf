//! Client helper library (A7): dials the broker's TCP endpoint and exposes
//! one async method per wire operation.

pub mod client;

pub use client::{BrokerClient, Lease};
