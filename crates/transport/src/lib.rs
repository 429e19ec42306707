//! Mesh transport abstraction.
//!
//! The gateway never talks to a radio directly; it consumes a
//! [`MeshTransport`]: something that accepts outbound text sends, exposes
//! a connection flag and a live (possibly stale) node table, and hands out
//! a stream of inbound [`Packet`]s at connect time.
//!
//! Two implementations live here:
//!
//! - [`TcpTransport`]: a framed TCP link to the radio adapter process.
//! - [`MemoryTransport`]: an in-process pair used by tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use meshgate_primitives::{NodeId, UserInfo};

mod error;
mod memory;
mod tcp;
mod wire;

pub use error::TransportError;
pub use memory::MemoryTransport;
pub use tcp::TcpTransport;
pub use wire::WireFrame;

/// Where an outbound text message goes: a broadcast channel or a single
/// node. The two are mutually exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendTarget {
    /// Broadcast on a channel index (0 is the primary channel).
    Channel(u32),
    /// Direct to a specific node.
    Node(NodeId),
}

/// What the transport knows about a peer node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeEntry {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub hw_model: Option<String>,
}

/// Live node table maintained by the transport from observed node-info
/// traffic. Reads are snapshot-style: cheap, non-blocking, and allowed to
/// be stale or incomplete, and a miss is not an error.
#[derive(Debug, Clone, Default)]
pub struct NodeTable {
    inner: Arc<RwLock<HashMap<NodeId, NodeEntry>>>,
}

impl NodeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Short display name for a node, if known.
    pub fn short_name(&self, id: NodeId) -> Option<String> {
        self.inner.read().get(&id).and_then(|e| e.short_name.clone())
    }

    /// Full entry for a node, if known.
    pub fn get(&self, id: NodeId) -> Option<NodeEntry> {
        self.inner.read().get(&id).cloned()
    }

    /// Number of known nodes.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if no nodes have been observed yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Merge a node-info broadcast into the table.
    pub fn observe(&self, id: NodeId, info: &UserInfo) {
        let mut table = self.inner.write();
        let entry = table.entry(id).or_default();
        if info.short_name.is_some() {
            entry.short_name = info.short_name.clone();
        }
        if info.long_name.is_some() {
            entry.long_name = info.long_name.clone();
        }
        if info.hw_model.is_some() {
            entry.hw_model = info.hw_model.clone();
        }
    }
}

/// Abstraction over the link that delivers mesh packets and accepts
/// outbound sends.
///
/// Callers must not assume sends are safe to issue concurrently; the
/// outbound dispatcher is the single serialization point and owns the
/// ordering discipline. Implementations still guard their writer so a
/// misuse cannot interleave partial frames.
#[async_trait]
pub trait MeshTransport: Send + Sync + 'static {
    /// Send a text message onto the mesh.
    async fn send_text(&self, text: &str, target: SendTarget) -> Result<(), TransportError>;

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;

    /// The live node table.
    fn node_table(&self) -> &NodeTable;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_table_observe_merges_fields() {
        let table = NodeTable::new();
        let id = NodeId::new(7);

        table.observe(
            id,
            &UserInfo {
                short_name: Some("MIDO".into()),
                ..Default::default()
            },
        );
        table.observe(
            id,
            &UserInfo {
                long_name: Some("Midoluz Base".into()),
                ..Default::default()
            },
        );

        let entry = table.get(id).unwrap();
        assert_eq!(entry.short_name.as_deref(), Some("MIDO"));
        assert_eq!(entry.long_name.as_deref(), Some("Midoluz Base"));
    }

    #[test]
    fn node_table_miss_is_none() {
        let table = NodeTable::new();
        assert_eq!(table.short_name(NodeId::new(1)), None);
        assert!(table.is_empty());
    }
}
