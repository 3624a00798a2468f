//! Cluster configuration: the JSON schema loaded at process start.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::node::{Node, SlotsRange};

/// This process's own identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub peer_id: String,
    /// Base64-encoded private key material. Opaque to this crate; handed to
    /// the transport layer.
    pub sk: String,
}

/// Transport addresses this process listens on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addresses {
    #[serde(default)]
    pub swarm: Vec<String>,
}

/// One entry in the persisted, authoritative slot mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub slots: SlotsRange,
    #[serde(default)]
    pub swarm: Vec<String>,
}

impl From<NodeConfig> for Node {
    fn from(config: NodeConfig) -> Self {
        Node {
            id: config.id,
            slots: config.slots,
            addresses: config.swarm,
        }
    }
}

/// The cluster configuration, matching the reference `config.json` schema.
///
/// `conf_path` is not part of the file; it is filled in by [`Config::load`]
/// after parsing, mirroring the original loader's behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub identity: Identity,
    #[serde(default)]
    pub addresses: Addresses,
    #[serde(default)]
    pub conf_path: String,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

impl Config {
    /// Reads and parses `path` as a `config.json`, filling `conf_path` with
    /// `path` after deserializing the rest of the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_json::from_str(&contents)?;
        config.conf_path = path.display().to_string();
        Ok(config)
    }

    /// Converts `nodes` into the cluster membership list used to build a
    /// [`crate::manager::SlotManager`].
    pub fn node_list(&self) -> Vec<Node> {
        self.nodes.iter().cloned().map(Node::from).collect()
    }
}
