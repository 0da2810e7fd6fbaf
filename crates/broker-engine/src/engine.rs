//! `build`/`up`/`down` for a single local `postgres` instance.
//!
//! This is not a container runtime: it prepares a data directory with
//! `initdb`, spawns `postgres` as a child process, and probes readiness by
//! retrying a connection rather than parsing server log output.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::descriptor::EngineDescriptor;
use crate::error::EngineError;

const READINESS_TIMEOUT: Duration = Duration::from_secs(30);
const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub struct EngineHandle {
    pub descriptor: EngineDescriptor,
    child: Child,
}

impl EngineHandle {
    pub fn instance(&self) -> u32 {
        self.descriptor.instance
    }
}

/// Runs `initdb` against the descriptor's data directory. A no-op if the
/// directory already contains a `PG_VERSION` marker file.
pub fn build(descriptor: &EngineDescriptor) -> Result<(), EngineError> {
    if descriptor.data_dir.join("PG_VERSION").is_file() {
        debug!(instance = descriptor.instance, "data directory already initialized");
        return Ok(());
    }

    std::fs::create_dir_all(&descriptor.data_dir)
        .map_err(|e| EngineError::Build(descriptor.data_dir.display().to_string(), e.to_string()))?;

    let status = std::process::Command::new("initdb")
        .arg("-D")
        .arg(&descriptor.data_dir)
        .arg("-U")
        .arg(&descriptor.superuser)
        .arg("--no-sync")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .status()
        .map_err(|e| EngineError::Build(descriptor.data_dir.display().to_string(), e.to_string()))?;

    if !status.success() {
        return Err(EngineError::Build(
            descriptor.data_dir.display().to_string(),
            format!("initdb exited with {status}"),
        ));
    }

    info!(instance = descriptor.instance, dir = %descriptor.data_dir.display(), "initialized data directory");
    Ok(())
}

/// Spawns `postgres` against an already-built data directory and blocks
/// until it accepts connections or the readiness timeout elapses.
pub async fn start(descriptor: EngineDescriptor) -> Result<EngineHandle, EngineError> {
    let child = Command::new("postgres")
        .arg("-D")
        .arg(&descriptor.data_dir)
        .arg("-p")
        .arg(descriptor.port.to_string())
        .arg("-h")
        .arg(&descriptor.host)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| EngineError::Spawn(descriptor.instance, e.to_string()))?;

    wait_ready(&descriptor).await?;
    info!(instance = descriptor.instance, port = descriptor.port, "engine ready");
    Ok(EngineHandle { descriptor, child })
}

async fn wait_ready(descriptor: &EngineDescriptor) -> Result<(), EngineError> {
    let deadline = Instant::now() + READINESS_TIMEOUT;
    let conn_str = descriptor.admin_connection_string();

    while Instant::now() < deadline {
        if tokio_postgres::connect(&conn_str, tokio_postgres::NoTls).await.is_ok() {
            return Ok(());
        }
        tokio::time::sleep(READINESS_POLL_INTERVAL).await;
    }

    Err(EngineError::ReadinessTimeout(descriptor.instance, READINESS_TIMEOUT))
}

/// Sends `SIGTERM` and waits for the process to exit.
pub async fn stop(mut handle: EngineHandle) -> Result<(), EngineError> {
    let instance = handle.instance();
    if let Some(pid) = handle.child.id() {
        // SAFETY: `pid` is our own child's pid, read moments earlier from
        // `Child::id`; sending it SIGTERM cannot affect unrelated processes.
        let result = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if result != 0 {
            warn!(instance, "SIGTERM delivery failed; falling back to kill");
            let _ = handle.child.start_kill();
        }
    }

    handle
        .child
        .wait()
        .await
        .map_err(|e| EngineError::Stop(instance, e.to_string()))?;
    Ok(())
}

/// Stops an engine started by a different process, using the pid `postgres`
/// itself records in `postmaster.pid`. Used by `brokerctl down`, which runs
/// as a fresh process with no [`EngineHandle`] from the `up` invocation.
pub async fn stop_by_data_dir(descriptor: &EngineDescriptor) -> Result<(), EngineError> {
    let pidfile = descriptor.data_dir.join("postmaster.pid");
    let content = match std::fs::read_to_string(&pidfile) {
        Ok(c) => c,
        Err(_) => {
            debug!(instance = descriptor.instance, "no postmaster.pid; assuming already stopped");
            return Ok(());
        }
    };
    let pid: i32 = content
        .lines()
        .next()
        .and_then(|l| l.trim().parse().ok())
        .ok_or_else(|| EngineError::Stop(descriptor.instance, "malformed postmaster.pid".to_string()))?;

    // SAFETY: `pid` is read from this instance's own data directory's
    // pidfile, which `postgres` writes for exactly the process it started.
    if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
        debug!(instance = descriptor.instance, "SIGTERM to stale pid failed; assuming already stopped");
        return Ok(());
    }

    let deadline = Instant::now() + READINESS_TIMEOUT;
    while pidfile.exists() && Instant::now() < deadline {
        tokio::time::sleep(READINESS_POLL_INTERVAL).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_is_a_noop_when_already_initialized() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("PG_VERSION"), "16\n").unwrap();

        let descriptor = EngineDescriptor {
            instance: 0,
            data_dir: dir.path().to_path_buf(),
            host: "127.0.0.1".to_string(),
            port: 55432,
            superuser: "postgres".to_string(),
        };

        build(&descriptor).unwrap();
    }
}
