//! Execute phase: runs each successfully built test binary as a child
//! process, optionally pointed at a live broker via environment variables.

use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct BrokerEndpoint {
    pub addr: String,
    pub secret: String,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub binary: String,
    pub passed: bool,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

pub fn run_binary(binary: &Path, endpoint: Option<&BrokerEndpoint>) -> RunOutcome {
    let started = Instant::now();
    let mut cmd = Command::new(binary);
    if let Some(endpoint) = endpoint {
        cmd.env("BROKER_ADDR", &endpoint.addr);
        cmd.env("BROKER_SECRET", &endpoint.secret);
    }

    let name = binary.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| binary.display().to_string());

    match cmd.output() {
        Ok(output) => RunOutcome {
            binary: name,
            passed: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: started.elapsed(),
        },
        Err(e) => RunOutcome {
            binary: name,
            passed: false,
            stdout: String::new(),
            stderr: format!("failed to execute: {e}"),
            duration: started.elapsed(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_reported_as_a_failed_run_not_a_panic() {
        let outcome = run_binary(Path::new("/nonexistent/binary-that-does-not-exist"), None);
        assert!(!outcome.passed);
        assert!(outcome.stderr.contains("failed to execute"));
    }

    #[test]
    fn endpoint_env_vars_reach_the_child_process() {
        let endpoint = BrokerEndpoint { addr: "127.0.0.1:9999".to_string(), secret: "s3cr3t".to_string() };
        let outcome = run_binary(Path::new("/usr/bin/env"), Some(&endpoint));
        assert!(outcome.passed);
        assert!(outcome.stdout.contains("BROKER_ADDR=127.0.0.1:9999"));
        assert!(outcome.stdout.contains("BROKER_SECRET=s3cr3t"));
    }
}
