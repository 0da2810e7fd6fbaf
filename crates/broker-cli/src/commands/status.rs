//! `brokerctl status` — prints engine reachability and broker health.

use anyhow::{Context, Result};
use broker_client::BrokerClient;
use broker_core::config::default_config_path;

pub async fn status() -> Result<()> {
    let config_path = default_config_path();
    let config = broker_core::BrokerConfig::from_file(&config_path).context("loading broker config")?;

    for instance in 0..config.pool.instances {
        let port = config.pool.port_base + instance as u16;
        let conn_str = format!("host={} port={} user=postgres dbname=postgres", config.pool.host, port);
        match tokio_postgres::connect(&conn_str, tokio_postgres::NoTls).await {
            Ok(_) => println!("engine {instance} (port {port}): reachable"),
            Err(_) => println!("engine {instance} (port {port}): unreachable"),
        }
    }

    let client = BrokerClient::new(
        format!("{}:{}", config.server.bind_address, config.server.port),
        config.auth.secret.clone(),
    );
    match client.health().await {
        Ok(snapshot) => println!("{}", broker_dashboard::view::render(&snapshot)),
        Err(_) => println!("broker: not running"),
    }

    Ok(())
}
