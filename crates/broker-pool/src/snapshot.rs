//! The point-in-time pool summary published on every state change and
//! returned directly by the health operation.

use broker_core::ConnectionDescriptor;
use chrono::{DateTime, Utc};

/// One leased connection's public view: connection, tag, and age.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaseView {
    pub connection: ConnectionDescriptor,
    pub tag: String,
    pub acquired_at: DateTime<Utc>,
    pub age_seconds: u64,
}

/// A read-only, value-typed summary of pool state: never a reference into
/// the mutable triple the actor owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub total: usize,
    pub leased: usize,
    pub free: usize,
    pub waiting: u64,
    /// Sorted by `acquired_at` ascending.
    pub leases: Vec<LeaseView>,
}

impl Snapshot {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": "ok",
            "total": self.total,
            "locked": self.leased,
            "free": self.free,
            "waiting": self.waiting,
            "leases": self.leases.iter().map(|l| serde_json::json!({
                "connection": l.connection.as_str(),
                "tag": l.tag,
                "acquired_at": l.acquired_at.to_rfc3339(),
                "age_seconds": l.age_seconds,
            })).collect::<Vec<_>>(),
        })
    }
}
