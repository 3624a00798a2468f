//! Error taxonomy for the cluster core.
//!
//! Mirrors the shape of a typical connection-oriented client: one
//! `thiserror`-derived enum with struct-like variants, `#[from]`
//! conversions for the IO and serialization errors that cross the
//! wire boundary, and a single domain-level variant (`KeyNotFound`)
//! that callers are expected to match on explicitly.

use thiserror::Error;

/// Result type alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while routing, encoding, or serving cluster operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An IO error occurred on the underlying stream.
    #[error("IO error: {source}")]
    Io {
        /// The underlying IO error.
        #[from]
        source: std::io::Error,
    },

    /// The requested key does not exist.
    ///
    /// This is the domain-level "absent" signal: it is surfaced unchanged
    /// so that composed consumers can distinguish "absent" from "broken".
    #[error("key not found")]
    KeyNotFound,

    /// The remote node reported a non-NOT_FOUND failure for the request.
    #[error("remote error: {msg}")]
    RemoteError {
        /// The message the remote node attached to its reply.
        msg: String,
    },

    /// A codec or stream failure occurred while talking to a peer.
    #[error("transport error: {message}")]
    TransportError {
        /// Description of the failure.
        message: String,
    },

    /// Dialing a peer failed before any bytes were exchanged.
    #[error("peer {peer_id} unreachable: {message}")]
    Unreachable {
        /// The identity of the peer that could not be dialed.
        peer_id: String,
        /// Description of the dial failure.
        message: String,
    },

    /// The slot manager resolved a key to a node with no corresponding peer client.
    ///
    /// This indicates a construction-time bug: it must not happen if the
    /// cluster client's peer map was built from the same node list as the
    /// slot manager.
    #[error("routing error: {message}")]
    RoutingError {
        /// Description of the inconsistency.
        message: String,
    },

    /// Slot-range validation failed at construction time.
    #[error("invalid slot configuration: {message}")]
    InvalidSlotConfiguration {
        /// Description of the invariant that was violated.
        message: String,
    },

    /// A slot index was out of the `0..16384` universe.
    #[error("slot {slot} is out of range")]
    SlotOutOfRange {
        /// The offending slot index.
        slot: u32,
    },

    /// A frame violated the wire protocol (oversized or truncated).
    #[error("protocol violation: {message}")]
    ProtocolViolation {
        /// Description of the violation.
        message: String,
    },

    /// Loading or parsing a configuration file failed.
    #[error("config error: {message}")]
    Config {
        /// Description of the failure.
        message: String,
    },
}

impl From<bincode::Error> for Error {
    fn from(source: bincode::Error) -> Self {
        Error::ProtocolViolation {
            message: format!("frame decode failed: {source}"),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Config {
            message: format!("invalid config: {source}"),
        }
    }
}
