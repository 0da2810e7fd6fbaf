//! Accept loop (C9): binds a TCP listener, spawns a handler task per
//! connection, and drains in-flight connections before returning on
//! shutdown.

use std::sync::Arc;

use broker_pool::{PoolHandle, ResetDriver};
use broker_proto::{Request, Response};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::handler::{handle, HandlerConfig};

pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub secret: String,
}

/// Runs the accept loop until `shutdown` fires, then waits for already
/// accepted connections to finish their single request before returning.
pub async fn run(
    config: ServerConfig,
    pool: PoolHandle,
    reset: Arc<dyn ResetDriver>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "broker server listening");

    let handler_config = Arc::new(HandlerConfig { secret: config.secret });
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };
                let pool = pool.clone();
                let reset = reset.clone();
                let handler_config = handler_config.clone();
                connections.spawn(async move {
                    if let Err(e) = serve_connection(stream, pool, reset, handler_config).await {
                        debug!(%peer, error = %e, "connection ended with an error");
                    }
                });
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("shutdown signal received; draining in-flight connections");
                    break;
                }
            }
        }
    }

    while connections.join_next().await.is_some() {}
    info!("broker server stopped");
    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    pool: PoolHandle,
    reset: Arc<dyn ResetDriver>,
    config: Arc<HandlerConfig>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).await?;
    if bytes_read == 0 {
        return Ok(());
    }

    let response = match Request::parse(&line) {
        Ok(request) => handle(request, &pool, &reset, &config, &mut reader).await,
        Err(e) => Response::err(broker_core::WireErrorKind::BadRequest, e.to_string()),
    };

    write_half.write_all(response.encode().as_bytes()).await?;
    write_half.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_core::{ConnectionDescriptor, PoolDefinition};
    use broker_pool::{NoopResetDriver, PoolActor};
    use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpStream;

    fn definition(n: usize) -> PoolDefinition {
        let descriptors = (0..n)
            .map(|i| ConnectionDescriptor::new(format!("postgres://t@h:5432/db_{i}")))
            .collect();
        PoolDefinition::new(descriptors).unwrap()
    }

    #[tokio::test]
    async fn health_round_trips_over_a_real_socket() {
        let pool = PoolActor::start(definition(2), None);
        let reset: Arc<dyn ResetDriver> = Arc::new(NoopResetDriver);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let server = tokio::spawn(run(
            ServerConfig {
                bind_address: addr.ip().to_string(),
                port: addr.port(),
                secret: "shh".to_string(),
            },
            pool,
            reset,
            shutdown_rx,
        ));

        // Give the listener a moment to bind.
        for _ in 0..50 {
            if TcpStream::connect(addr).await.is_ok() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"HEALTH\n").await.unwrap();
        stream.shutdown().await.unwrap_or(());

        let mut reader = BufReader::new(stream);
        let mut response_line = String::new();
        reader.read_line(&mut response_line).await.unwrap();
        assert!(response_line.starts_with("OK "));
        assert!(response_line.contains("\"total\":2"));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(2), server)
            .await
            .expect("server did not stop after shutdown signal")
            .unwrap()
            .unwrap();
    }
}
