//! The cluster client: implements the datastore capability by routing each
//! operation to the peer client owning the key's slot.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::manager::SlotManager;
use crate::peer::PeerClient;
use crate::slot::slot_of;
use crate::store::Datastore;
use crate::transport::PeerTransport;

/// Routes every operation via the slot manager to the peer client owning
/// the key's node. Contains no retry logic: a transient `TransportError` or
/// `Unreachable` is the caller's concern to retry.
pub struct ClusterClient {
    slot_manager: SlotManager,
    peers: HashMap<String, PeerClient>,
    self_id: Option<String>,
    self_store: Option<Arc<dyn Datastore>>,
}

impl ClusterClient {
    /// Builds a cluster client from `config`'s persisted node list (the
    /// restoration path: `config.nodes`'s ranges are authoritative),
    /// eagerly creating one peer client per node.
    ///
    /// If `self_store` is given and its owner's identity
    /// (`config.identity.peer_id`) matches one of the configured nodes,
    /// operations routed to that node bypass the network and call
    /// `self_store` directly.
    pub async fn connect(
        config: &Config,
        transport: Arc<dyn PeerTransport>,
        protocol_id: impl Into<String>,
        self_store: Option<Arc<dyn Datastore>>,
    ) -> Result<Self> {
        let protocol_id = protocol_id.into();
        let slot_manager = SlotManager::restore(config.node_list())?;

        let mut peers = HashMap::with_capacity(slot_manager.nodes().len());
        for node in slot_manager.nodes() {
            let peer = PeerClient::new(
                node.id.clone(),
                node.addresses.clone(),
                Arc::clone(&transport),
                protocol_id.clone(),
            )
            .await?;
            peers.insert(node.id.clone(), peer);
        }

        let self_id = if config.identity.peer_id.is_empty() {
            None
        } else {
            Some(config.identity.peer_id.clone())
        };

        Ok(Self {
            slot_manager,
            peers,
            self_id,
            self_store,
        })
    }

    fn is_self(&self, node_id: &str) -> bool {
        matches!(&self.self_id, Some(id) if id == node_id) && self.self_store.is_some()
    }

    fn peer_for(&self, node_id: &str) -> Result<&PeerClient> {
        self.peers.get(node_id).ok_or_else(|| Error::RoutingError {
            message: format!("no peer client for node {node_id}"),
        })
    }

    /// Returns the node that owns `key`'s slot.
    pub fn node_for_key(&self, key: &str) -> Result<&crate::node::Node> {
        self.slot_manager.node_by_key(key)
    }
}

#[async_trait]
impl Datastore for ClusterClient {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let node = self.slot_manager.node_by_key(key)?;
        if self.is_self(&node.id) {
            return self.self_store.as_ref().unwrap().put(key, value).await;
        }
        self.peer_for(&node.id)?.put(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let node = self.slot_manager.node_by_key(key)?;
        if self.is_self(&node.id) {
            return self.self_store.as_ref().unwrap().get(key).await;
        }
        self.peer_for(&node.id)?.get(key).await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        let node = self.slot_manager.node_by_key(key)?;
        if self.is_self(&node.id) {
            return self.self_store.as_ref().unwrap().has(key).await;
        }
        self.peer_for(&node.id)?.has(key).await
    }

    async fn get_size(&self, key: &str) -> Result<u64> {
        let node = self.slot_manager.node_by_key(key)?;
        if self.is_self(&node.id) {
            return self.self_store.as_ref().unwrap().get_size(key).await;
        }
        self.peer_for(&node.id)?.get_size(key).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let node = self.slot_manager.node_by_key(key)?;
        if self.is_self(&node.id) {
            return self.self_store.as_ref().unwrap().delete(key).await;
        }
        self.peer_for(&node.id)?.delete(key).await
    }
}

/// Exposed for callers that want to compute routing without going through
/// the `Datastore` trait (e.g. to decide which node to dial before an
/// ingestion batch).
pub fn route(slot_manager: &SlotManager, key: &str) -> Result<&crate::node::Node> {
    slot_manager.node_by_slot(slot_of(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Addresses, Identity, NodeConfig};
    use crate::server::StorageServer;
    use crate::store::MemoryStore;
    use crate::transport::TcpTransport;
    use tokio::net::TcpListener;

    const PROTOCOL_ID: &str = "/ds-cluster/store/1.0.0";

    async fn spawn_node() -> (String, Arc<MemoryStore>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(MemoryStore::new());
        let server = StorageServer::new(Arc::clone(&store));
        tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });
        (addr.to_string(), store)
    }

    async fn two_node_cluster() -> (ClusterClient, Arc<MemoryStore>, Arc<MemoryStore>) {
        let (addr_a, store_a) = spawn_node().await;
        let (addr_b, store_b) = spawn_node().await;

        let config = Config {
            identity: Identity {
                peer_id: "client".to_string(),
                sk: String::new(),
            },
            addresses: Addresses::default(),
            conf_path: String::new(),
            nodes: vec![
                NodeConfig {
                    id: "node-a".to_string(),
                    slots: crate::node::SlotsRange::new(0, 8191),
                    swarm: vec![addr_a],
                },
                NodeConfig {
                    id: "node-b".to_string(),
                    slots: crate::node::SlotsRange::new(8192, 16383),
                    swarm: vec![addr_b],
                },
            ],
        };

        let transport: Arc<dyn PeerTransport> = Arc::new(TcpTransport::new());
        let client = ClusterClient::connect(&config, transport, PROTOCOL_ID, None)
            .await
            .unwrap();

        (client, store_a, store_b)
    }

    #[tokio::test]
    async fn test_routes_put_get_to_correct_node() {
        let (client, store_a, store_b) = two_node_cluster().await;

        let key_in_a = "k1";
        let key_in_b = "k2";
        let node_a = client.node_for_key(key_in_a).unwrap().id.clone();
        let node_b = client.node_for_key(key_in_b).unwrap().id.clone();
        assert_ne!(node_a, node_b, "fixture keys must hash to different nodes");

        client.put(key_in_a, vec![1]).await.unwrap();
        client.put(key_in_b, vec![2]).await.unwrap();

        assert_eq!(client.get(key_in_a).await.unwrap(), vec![1]);
        assert_eq!(client.get(key_in_b).await.unwrap(), vec![2]);

        let seen_in_a = store_a.has(key_in_a).await.unwrap() || store_b.has(key_in_a).await.unwrap();
        assert!(seen_in_a);
    }

    #[tokio::test]
    async fn test_get_missing_key_propagates_key_not_found() {
        let (client, _a, _b) = two_node_cluster().await;
        let err = client.get("nonexistent").await.unwrap_err();
        assert!(matches!(err, Error::KeyNotFound));
    }

    #[tokio::test]
    async fn test_full_round_trip_scenario() {
        let (client, _a, _b) = two_node_cluster().await;

        client.put("/x", vec![0x01, 0x02, 0x03]).await.unwrap();
        assert_eq!(client.get("/x").await.unwrap(), vec![0x01, 0x02, 0x03]);
        assert!(client.has("/x").await.unwrap());
        assert_eq!(client.get_size("/x").await.unwrap(), 3);
        client.delete("/x").await.unwrap();
        assert!(!client.has("/x").await.unwrap());
        assert!(matches!(client.get("/x").await.unwrap_err(), Error::KeyNotFound));
    }
}
