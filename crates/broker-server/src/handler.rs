//! Request handler (C8): parses one request, authenticates, dispatches to a
//! pool operation, and renders a response. Stateless across requests — a
//! connection carries exactly one.

use std::sync::Arc;

use broker_core::{ConnectionDescriptor, WireErrorKind};
use broker_pool::{PoolError, PoolHandle, ResetDriver};
use broker_proto::{Request, Response};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

pub struct HandlerConfig {
    pub secret: String,
}

/// Dispatches one parsed request. `disconnect` is polled by the acquire
/// operation's cancellation branch, completing as soon as the peer closes
/// its write half or the connection errors (see `serve_connection`).
pub async fn handle<R>(
    request: Request,
    pool: &PoolHandle,
    reset: &Arc<dyn ResetDriver>,
    config: &HandlerConfig,
    disconnect: &mut R,
) -> Response
where
    R: tokio::io::AsyncRead + Unpin,
{
    match request {
        Request::Acquire { secret, tag } => {
            if secret != config.secret || tag.is_empty() {
                return Response::err(WireErrorKind::AuthFailed, "bad secret or empty tag");
            }
            let cancel = async {
                let mut buf = [0u8; 1];
                let _ = disconnect.read(&mut buf).await;
            };
            match pool.acquire(tag.clone(), reset, cancel).await {
                Ok(connection) => {
                    info!(%connection, tag, "acquire granted");
                    Response::ok_body(connection.as_str())
                }
                Err(e) => pool_error_response(e),
            }
        }
        Request::Release { secret, connection } => {
            if secret != config.secret {
                return Response::err(WireErrorKind::AuthFailed, "bad secret");
            }
            match pool.release(connection).await {
                Ok(()) => Response::ok_empty(),
                Err(e) => pool_error_response(e),
            }
        }
        Request::ForceRelease { secret, connection } => {
            if secret != config.secret {
                return Response::err(WireErrorKind::AuthFailed, "bad secret");
            }
            pool.force_release(connection).await;
            Response::ok_empty()
        }
        Request::ReleaseByTag { secret, tag } => {
            if secret != config.secret {
                return Response::err(WireErrorKind::AuthFailed, "bad secret");
            }
            match pool.release_by_tag(tag).await {
                Ok(count) => Response::ok_body(count.to_string()),
                Err(e) => pool_error_response(e),
            }
        }
        Request::Health => match pool.snapshot().await {
            Ok(snapshot) => Response::ok_body(snapshot.to_json().to_string()),
            Err(e) => {
                warn!(error = %e, "health check failed to read pool snapshot");
                Response::err(WireErrorKind::Internal, e.to_string())
            }
        },
    }
}

fn pool_error_response(err: PoolError) -> Response {
    let kind = err.to_wire_kind();
    Response::err(kind, err.to_string())
}

/// Used by `broker-dashboard` and anywhere else that needs a connection
/// descriptor to reject malformed input early, before touching the pool.
pub fn validate_connection(connection: &ConnectionDescriptor) -> Result<(), Response> {
    if connection.as_str().is_empty() {
        return Err(Response::err(WireErrorKind::BadRequest, "empty connection field"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_core::PoolDefinition;
    use broker_pool::{NoopResetDriver, PoolActor};

    fn definition(n: usize) -> PoolDefinition {
        let descriptors = (0..n)
            .map(|i| ConnectionDescriptor::new(format!("postgres://t@h:5432/db_{i}")))
            .collect();
        PoolDefinition::new(descriptors).unwrap()
    }

    #[tokio::test]
    async fn acquire_with_wrong_secret_is_auth_failed() {
        let pool = PoolActor::start(definition(1), None);
        let reset: Arc<dyn ResetDriver> = Arc::new(NoopResetDriver);
        let config = HandlerConfig { secret: "shh".to_string() };
        let mut disconnect = tokio::io::empty();

        let response = handle(
            Request::Acquire { secret: "wrong".to_string(), tag: "t".to_string() },
            &pool,
            &reset,
            &config,
            &mut disconnect,
        )
        .await;

        assert_eq!(response, Response::err(WireErrorKind::AuthFailed, "bad secret or empty tag"));
    }

    #[tokio::test]
    async fn acquire_with_empty_tag_is_auth_failed() {
        let pool = PoolActor::start(definition(1), None);
        let reset: Arc<dyn ResetDriver> = Arc::new(NoopResetDriver);
        let config = HandlerConfig { secret: "shh".to_string() };
        let mut disconnect = tokio::io::empty();

        let response = handle(
            Request::Acquire { secret: "shh".to_string(), tag: String::new() },
            &pool,
            &reset,
            &config,
            &mut disconnect,
        )
        .await;

        assert_eq!(response, Response::err(WireErrorKind::AuthFailed, "bad secret or empty tag"));
    }

    #[tokio::test]
    async fn acquire_then_release_round_trips() {
        let pool = PoolActor::start(definition(1), None);
        let reset: Arc<dyn ResetDriver> = Arc::new(NoopResetDriver);
        let config = HandlerConfig { secret: "shh".to_string() };
        let mut disconnect = tokio::io::empty();

        let response = handle(
            Request::Acquire { secret: "shh".to_string(), tag: "t".to_string() },
            &pool,
            &reset,
            &config,
            &mut disconnect,
        )
        .await;
        let Response::Ok(Some(connection)) = response else {
            panic!("expected OK body, got {response:?}");
        };

        let mut disconnect = tokio::io::empty();
        let response = handle(
            Request::Release {
                secret: "shh".to_string(),
                connection: ConnectionDescriptor::new(connection),
            },
            &pool,
            &reset,
            &config,
            &mut disconnect,
        )
        .await;
        assert_eq!(response, Response::ok_empty());
    }

    #[tokio::test]
    async fn health_reports_live_snapshot() {
        let pool = PoolActor::start(definition(2), None);
        let reset: Arc<dyn ResetDriver> = Arc::new(NoopResetDriver);
        let config = HandlerConfig { secret: "shh".to_string() };
        let mut disconnect = tokio::io::empty();

        let response = handle(Request::Health, &pool, &reset, &config, &mut disconnect).await;
        let Response::Ok(Some(body)) = response else {
            panic!("expected OK body, got {response:?}");
        };
        assert!(body.contains("\"total\":2"));
    }
}
