//! The transport capability: dialing a peer identity and opening a
//! bidirectional byte stream to it.
//!
//! The protocol layer is written against [`PeerTransport`] so that the
//! TCP-backed implementation here can be swapped for a real peer-to-peer
//! host without touching the peer client or storage server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// A bidirectional byte stream to a peer, opened for one request/reply pair.
pub trait PeerStream: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> PeerStream for T {}

/// Dials remote identities and opens byte streams to them.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Records `addresses` as dialable locations for `identity`.
    async fn register_addresses(&self, identity: &str, addresses: Vec<String>) -> Result<()>;

    /// Opens a fresh bidirectional stream to `identity` over `protocol_id`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Unreachable` if no address is known for `identity` or
    /// dialing every known address fails.
    async fn dial(
        &self,
        identity: &str,
        protocol_id: &str,
    ) -> Result<Box<dyn PeerStream>>;
}

/// A `PeerTransport` backed by plain TCP: an address book of
/// `identity → Vec<SocketAddr>`, dialed with `TcpStream::connect`.
#[derive(Debug, Default, Clone)]
pub struct TcpTransport {
    addresses: Arc<RwLock<HashMap<String, Vec<SocketAddr>>>>,
}

impl TcpTransport {
    /// Creates a transport with an empty address book.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PeerTransport for TcpTransport {
    async fn register_addresses(&self, identity: &str, addresses: Vec<String>) -> Result<()> {
        let mut parsed = Vec::with_capacity(addresses.len());
        for address in &addresses {
            let addr: SocketAddr = address.parse().map_err(|_| Error::Unreachable {
                peer_id: identity.to_string(),
                message: format!("invalid socket address: {address}"),
            })?;
            parsed.push(addr);
        }

        self.addresses
            .write()
            .await
            .entry(identity.to_string())
            .or_default()
            .extend(parsed);
        Ok(())
    }

    async fn dial(&self, identity: &str, _protocol_id: &str) -> Result<Box<dyn PeerStream>> {
        let addresses = self
            .addresses
            .read()
            .await
            .get(identity)
            .cloned()
            .ok_or_else(|| Error::Unreachable {
                peer_id: identity.to_string(),
                message: "no addresses registered for peer".to_string(),
            })?;

        let mut last_error = None;
        for addr in &addresses {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(Box::new(stream)),
                Err(err) => last_error = Some(err.to_string()),
            }
        }

        Err(Error::Unreachable {
            peer_id: identity.to_string(),
            message: last_error.unwrap_or_else(|| "no addresses registered for peer".to_string()),
        })
    }
}
