//! Renders a health snapshot JSON value into a human-readable table.
//!
//! Purpose-built for the snapshot shape in `broker_pool::Snapshot::to_json`:
//! pre-formatted strings, no knowledge of the pool's internal types.

use std::fmt::Write as _;

pub fn render(snapshot: &serde_json::Value) -> String {
    let total = snapshot["total"].as_u64().unwrap_or(0);
    let locked = snapshot["locked"].as_u64().unwrap_or(0);
    let free = snapshot["free"].as_u64().unwrap_or(0);
    let waiting = snapshot["waiting"].as_u64().unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "pool: total={total} leased={locked} free={free} waiting={waiting}");

    let leases = snapshot["leases"].as_array().cloned().unwrap_or_default();
    if leases.is_empty() {
        let _ = writeln!(out, "  (no active leases)");
        return out;
    }

    let _ = writeln!(out, "{:<40} {:<20} {:>10}", "connection", "tag", "age_seconds");
    for lease in &leases {
        let connection = lease["connection"].as_str().unwrap_or("?");
        let tag = lease["tag"].as_str().unwrap_or("?");
        let age = lease["age_seconds"].as_u64().unwrap_or(0);
        let _ = writeln!(out, "{connection:<40} {tag:<20} {age:>10}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_summary_line_with_no_leases() {
        let snapshot = serde_json::json!({"status":"ok","total":3,"locked":0,"free":3,"waiting":0,"leases":[]});
        let rendered = render(&snapshot);
        assert!(rendered.contains("total=3 leased=0 free=3 waiting=0"));
        assert!(rendered.contains("no active leases"));
    }

    #[test]
    fn renders_a_lease_row() {
        let snapshot = serde_json::json!({
            "status": "ok", "total": 1, "locked": 1, "free": 0, "waiting": 0,
            "leases": [{"connection": "postgres://t@h:5432/db_0", "tag": "TestA", "acquired_at": "2024-01-01T00:00:00Z", "age_seconds": 12}],
        });
        let rendered = render(&snapshot);
        assert!(rendered.contains("TestA"));
        assert!(rendered.contains("12"));
    }
}
