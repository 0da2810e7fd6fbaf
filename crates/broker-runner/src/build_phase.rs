//! Build phase: compiles each target's test binaries without running them.
//!
//! A failing target does not stop the others; every target is attempted and
//! its outcome recorded for the summary table.

use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::manifest::TestTarget;

#[derive(Debug)]
pub struct BuildOutcome {
    pub target: String,
    pub success: bool,
    pub binaries: Vec<PathBuf>,
    pub log: String,
    pub duration: Duration,
}

/// Runs `cargo test --no-run` for a single target and collects the paths of
/// the test binaries it produced from cargo's JSON build output.
pub fn build_target(target: &TestTarget) -> BuildOutcome {
    let started = Instant::now();
    let mut cmd = Command::new("cargo");
    cmd.arg("test").arg("--no-run").arg("--message-format=json").arg("-p").arg(&target.crate_name);
    if !target.features.is_empty() {
        cmd.arg("--features").arg(target.features.join(","));
    }

    let output = match cmd.output() {
        Ok(output) => output,
        Err(e) => {
            return BuildOutcome {
                target: target.crate_name.clone(),
                success: false,
                binaries: Vec::new(),
                log: format!("failed to execute cargo: {e}"),
                duration: started.elapsed(),
            }
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    let binaries = parse_test_executables(&stdout);
    let mut log = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        warn!(target = %target.crate_name, "test build failed");
    } else if binaries.is_empty() {
        log.push_str("\nbuild succeeded but produced no test binaries");
    }

    BuildOutcome {
        target: target.crate_name.clone(),
        success: output.status.success() && !binaries.is_empty(),
        binaries,
        log,
        duration: started.elapsed(),
    }
}

/// Scans cargo's `--message-format=json` stdout for `compiler-artifact`
/// messages whose profile is a test build, returning each executable path.
fn parse_test_executables(stdout: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for line in stdout.lines() {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else { continue };
        if value.get("reason").and_then(|v| v.as_str()) != Some("compiler-artifact") {
            continue;
        }
        let is_test = value.get("profile").and_then(|p| p.get("test")).and_then(|v| v.as_bool()).unwrap_or(false);
        if !is_test {
            continue;
        }
        if let Some(executable) = value.get("executable").and_then(|v| v.as_str()) {
            paths.push(PathBuf::from(executable));
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_executable_from_test_artifact() {
        let stdout = r#"{"reason":"compiler-artifact","profile":{"test":true},"executable":"/tmp/target/debug/deps/broker_pool-abc123"}
{"reason":"compiler-artifact","profile":{"test":false},"executable":"/tmp/target/debug/broker_pool"}
{"reason":"build-finished","success":true}"#;
        let paths = parse_test_executables(stdout);
        assert_eq!(paths, vec![PathBuf::from("/tmp/target/debug/deps/broker_pool-abc123")]);
    }

    #[test]
    fn ignores_malformed_lines() {
        let stdout = "not json\n{\"reason\":\"compiler-artifact\"}\n";
        assert!(parse_test_executables(stdout).is_empty());
    }
}
