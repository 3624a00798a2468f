//! The storage server: accepts inbound streams, dispatches one request per
//! stream against a local datastore, and writes back exactly one reply.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::error::{Error, Result};
use crate::protocol::{read_request, write_reply, Action, Reply, Request};
use crate::store::Datastore;

/// Serves the storage protocol over inbound streams, dispatching each
/// request to a backing [`Datastore`].
///
/// One request, one reply, per stream; concurrency comes from accepting
/// many streams in parallel, not from pipelining within one.
pub struct StorageServer<D: Datastore + 'static> {
    store: Arc<D>,
}

impl<D: Datastore + 'static> StorageServer<D> {
    /// Creates a server dispatching against `store`.
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }

    /// Accepts connections on `listener` forever, spawning one task per
    /// inbound stream. Returns only if accepting itself fails.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer_addr) = listener.accept().await?;
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                if let Err(err) = Self::handle_stream(stream, store).await {
                    error!(%peer_addr, error = %err, "stream handling failed");
                }
            });
        }
    }

    /// Handles exactly one request/reply exchange on `stream`, then closes
    /// it unconditionally.
    #[instrument(skip(stream, store))]
    pub async fn handle_stream<S>(mut stream: S, store: Arc<D>) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin,
    {
        let result = Self::dispatch(&mut stream, &store).await;

        match &result {
            Ok(()) => info!("request handled"),
            Err(err) => error!(error = %err, "request dispatch failed"),
        }

        result
    }

    async fn dispatch<S>(stream: &mut S, store: &D) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin,
    {
        let request = read_request(stream).await?;
        info!(action = ?request.action, key = %request.key, "req action");

        let reply = Self::execute(store, request).await;
        write_reply(stream, &reply).await
    }

    async fn execute(store: &D, request: Request) -> Reply {
        match request.action {
            Action::Get => match store.get(&request.key).await {
                Ok(value) => Reply::ok_value(value),
                Err(Error::KeyNotFound) => Reply::not_found("key not found"),
                Err(err) => Reply::other(err.to_string()),
            },
            Action::Put => {
                let value = request.value.unwrap_or_default();
                info!(key = %request.key, size = value.len(), "put");
                match store.put(&request.key, value).await {
                    Ok(()) => Reply::ok(),
                    Err(err) => Reply::other(err.to_string()),
                }
            }
            Action::Has => match store.has(&request.key).await {
                Ok(exists) => Reply::ok_exists(exists),
                Err(Error::KeyNotFound) => Reply::not_found("key not found"),
                Err(err) => Reply::other(err.to_string()),
            },
            Action::Delete => match store.delete(&request.key).await {
                Ok(()) => Reply::ok(),
                Err(err) => Reply::other(err.to_string()),
            },
            Action::GetSize => match store.get_size(&request.key).await {
                Ok(size) => Reply::ok_size(size as i64),
                Err(Error::KeyNotFound) => Reply::not_found("key not found"),
                Err(err) => Reply::other(err.to_string()),
            },
        }
    }
}
