//! `brokerctl connect <port> <dbname>` — opens an interactive `psql` session
//! against one engine/database.

use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use broker_core::config::default_config_path;

pub fn connect(port: u16, dbname: &str) -> Result<()> {
    let config_path = default_config_path();
    let config = broker_core::BrokerConfig::from_file(&config_path).context("loading broker config")?;

    let status = Command::new("psql")
        .arg("-h")
        .arg(&config.pool.host)
        .arg("-p")
        .arg(port.to_string())
        .arg("-U")
        .arg(&config.reset.tenant_role)
        .arg(dbname)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .context("failed to execute 'psql'. Is the PostgreSQL client installed?")?;

    if !status.success() {
        let code = status.code().unwrap_or(-1);
        bail!("psql exited with code {code}");
    }

    Ok(())
}
