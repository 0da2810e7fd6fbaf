//! Dials the broker's TCP endpoint and speaks the line protocol in
//! `broker-proto`. One request per connection, matching the server's
//! stateless-per-connection design.

use std::time::Duration;

use broker_core::{ConnectionDescriptor, WireError, WireErrorKind};
use broker_proto::{Request, Response};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::warn;

#[derive(Clone, Debug)]
pub struct BrokerClient {
    addr: String,
    secret: String,
}

impl BrokerClient {
    pub fn new(addr: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            secret: secret.into(),
        }
    }

    /// Blocks until a connection is granted, the broker reports cancellation
    /// or failure, or `deadline` elapses (in which case the TCP connection is
    /// simply dropped, which the server observes as a disconnect).
    pub async fn acquire(&self, tag: impl Into<String>, deadline: Option<Duration>) -> Result<Lease, WireError> {
        let tag = tag.into();
        let request = Request::Acquire {
            secret: self.secret.clone(),
            tag,
        };

        let call = self.roundtrip(request);
        let body = match deadline {
            Some(d) => timeout(d, call)
                .await
                .map_err(|_| WireError::new(WireErrorKind::Cancelled, "client-side acquire timeout"))??,
            None => call.await?,
        };

        let connection = body.ok_or_else(|| WireError::new(WireErrorKind::Internal, "acquire returned no body"))?;
        Ok(Lease {
            client: self.clone(),
            connection: ConnectionDescriptor::new(connection),
            released: false,
        })
    }

    pub async fn release(&self, connection: ConnectionDescriptor) -> Result<(), WireError> {
        self.roundtrip(Request::Release {
            secret: self.secret.clone(),
            connection,
        })
        .await?;
        Ok(())
    }

    pub async fn force_release(&self, connection: ConnectionDescriptor) -> Result<(), WireError> {
        self.roundtrip(Request::ForceRelease {
            secret: self.secret.clone(),
            connection,
        })
        .await?;
        Ok(())
    }

    pub async fn release_by_tag(&self, tag: impl Into<String>) -> Result<usize, WireError> {
        let body = self
            .roundtrip(Request::ReleaseByTag {
                secret: self.secret.clone(),
                tag: tag.into(),
            })
            .await?;
        body.and_then(|b| b.parse().ok())
            .ok_or_else(|| WireError::new(WireErrorKind::Internal, "release-by-tag returned no count"))
    }

    pub async fn health(&self) -> Result<serde_json::Value, WireError> {
        let body = self.roundtrip(Request::Health).await?;
        let body = body.ok_or_else(|| WireError::new(WireErrorKind::Internal, "health returned no body"))?;
        serde_json::from_str(&body).map_err(|e| WireError::new(WireErrorKind::Internal, e.to_string()))
    }

    async fn roundtrip(&self, request: Request) -> Result<Option<String>, WireError> {
        let mut stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| WireError::new(WireErrorKind::Internal, format!("connect failed: {e}")))?;

        stream
            .write_all(request.encode().as_bytes())
            .await
            .map_err(|e| WireError::new(WireErrorKind::Internal, format!("write failed: {e}")))?;

        // Requests are newline-terminated, so the server never needs a FIN to
        // know the request is complete. Leaving the write half open matters for
        // a blocking acquire: the server treats a half-close as a disconnect and
        // cancels the wait (see broker-server's handler), so shutting down here
        // would turn every blocking acquire into a spurious cancellation.
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader
            .read_line(&mut line)
            .await
            .map_err(|e| WireError::new(WireErrorKind::Internal, format!("read failed: {e}")))?;

        let response = Response::parse(&line).map_err(|e| WireError::new(WireErrorKind::Internal, e.to_string()))?;
        response.into_result()
    }
}

/// An acquired connection. Calling [`Lease::release`] is the normal path;
/// dropping without releasing issues a best-effort release in the
/// background, not a correctness guarantee of the broker itself.
#[derive(Debug)]
pub struct Lease {
    client: BrokerClient,
    connection: ConnectionDescriptor,
    released: bool,
}

impl Lease {
    pub fn connection(&self) -> &ConnectionDescriptor {
        &self.connection
    }

    pub async fn release(mut self) -> Result<(), WireError> {
        self.released = true;
        self.client.release(self.connection.clone()).await
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let client = self.client.clone();
            let connection = self.connection.clone();
            handle.spawn(async move {
                if let Err(e) = client.release(connection).await {
                    warn!(error = %e, "best-effort release on drop failed");
                }
            });
        }
    }
}
