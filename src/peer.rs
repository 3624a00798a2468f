//! The peer client: the outbound half of talking to a single remote node.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::error::{Error, Result};
use crate::protocol::{read_reply, write_request, ErrorCode, Reply, Request};
use crate::transport::PeerTransport;

/// Maintains the outbound connection to one remote node: address caching,
/// stream acquisition, and request/reply exchange.
///
/// Stateless between operations beyond the addresses registered with the
/// transport; there is no request pipelining on a single stream.
pub struct PeerClient {
    identity: String,
    transport: Arc<dyn PeerTransport>,
    protocol_id: String,
}

impl PeerClient {
    /// Creates a client for `identity`, registering `addresses` with
    /// `transport` for later dialing.
    pub async fn new(
        identity: impl Into<String>,
        addresses: Vec<String>,
        transport: Arc<dyn PeerTransport>,
        protocol_id: impl Into<String>,
    ) -> Result<Self> {
        let identity = identity.into();
        transport
            .register_addresses(&identity, addresses)
            .await?;
        Ok(Self {
            identity,
            transport,
            protocol_id: protocol_id.into(),
        })
    }

    /// The identity of the remote node this client talks to.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[instrument(skip(self, request), fields(peer = %self.identity))]
    async fn send(&self, request: Request) -> Result<Reply> {
        let mut stream = self.transport.dial(&self.identity, &self.protocol_id).await?;

        write_request(&mut stream, &request)
            .await
            .map_err(|err| Error::TransportError {
                message: err.to_string(),
            })?;

        read_reply(&mut stream)
            .await
            .map_err(|err| Error::TransportError {
                message: err.to_string(),
            })
    }

    fn check_ok(reply: Reply) -> Result<Reply> {
        match reply.code {
            ErrorCode::Ok => Ok(reply),
            ErrorCode::NotFound => Err(Error::KeyNotFound),
            ErrorCode::Other => Err(Error::RemoteError { msg: reply.msg }),
        }
    }

    /// Fetches the value stored under `key` on the remote node.
    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let reply = Self::check_ok(self.send(Request::get(key)).await?)?;
        reply.value.ok_or_else(|| Error::ProtocolViolation {
            message: "GET reply missing value".to_string(),
        })
    }

    /// Stores `value` under `key` on the remote node.
    pub async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        Self::check_ok(self.send(Request::put(key, value)).await?)?;
        Ok(())
    }

    /// Reports whether `key` exists on the remote node.
    pub async fn has(&self, key: &str) -> Result<bool> {
        let reply = Self::check_ok(self.send(Request::has(key)).await?)?;
        reply.exists.ok_or_else(|| Error::ProtocolViolation {
            message: "HAS reply missing exists flag".to_string(),
        })
    }

    /// Removes `key` on the remote node. Idempotent.
    pub async fn delete(&self, key: &str) -> Result<()> {
        Self::check_ok(self.send(Request::delete(key)).await?)?;
        Ok(())
    }

    /// Returns the byte size of the value stored under `key`, without
    /// transferring it.
    pub async fn get_size(&self, key: &str) -> Result<u64> {
        let reply = Self::check_ok(self.send(Request::get_size(key)).await?)?;
        let size = reply.size.ok_or_else(|| Error::ProtocolViolation {
            message: "GETSIZE reply missing size".to_string(),
        })?;
        u64::try_from(size).map_err(|_| {
            warn!(size, "server returned a negative size");
            Error::ProtocolViolation {
                message: format!("server returned negative size {size}"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::StorageServer;
    use crate::store::MemoryStore;
    use crate::transport::TcpTransport;
    use tokio::net::TcpListener;

    const PROTOCOL_ID: &str = "/ds-cluster/store/1.0.0";

    async fn spawn_server() -> (String, Arc<MemoryStore>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(MemoryStore::new());
        let server = StorageServer::new(Arc::clone(&store));
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });
        (addr.to_string(), store)
    }

    async fn connected_client() -> PeerClient {
        let (addr, _store) = spawn_server().await;
        let transport: Arc<dyn PeerTransport> = Arc::new(TcpTransport::new());
        PeerClient::new("node-a", vec![addr], transport, PROTOCOL_ID)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let client = connected_client().await;
        client.put("/x", vec![1, 2, 3]).await.unwrap();
        assert_eq!(client.get("/x").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_missing_key_is_key_not_found() {
        let client = connected_client().await;
        let err = client.get("/missing").await.unwrap_err();
        assert!(matches!(err, Error::KeyNotFound));
    }

    #[tokio::test]
    async fn test_has_and_delete() {
        let client = connected_client().await;
        assert!(!client.has("/x").await.unwrap());
        client.put("/x", vec![1]).await.unwrap();
        assert!(client.has("/x").await.unwrap());
        client.delete("/x").await.unwrap();
        assert!(!client.has("/x").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_size() {
        let client = connected_client().await;
        client.put("/x", vec![1, 2, 3, 4]).await.unwrap();
        assert_eq!(client.get_size("/x").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_dial_failure_is_unreachable() {
        let transport: Arc<dyn PeerTransport> = Arc::new(TcpTransport::new());
        let client = PeerClient::new("node-a", vec![], transport, PROTOCOL_ID)
            .await
            .unwrap();
        let err = client.get("/x").await.unwrap_err();
        assert!(matches!(err, Error::Unreachable { .. }));
    }
}
