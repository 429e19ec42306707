//! Peer identity rendering.

use meshgate_primitives::NodeId;
use meshgate_transport::NodeTable;

/// Broadcast alias accepted in string-form node references.
const BROADCAST_REF: &str = "^all";

/// Resolves node identifiers to display labels.
///
/// Backed by the transport's live node table, which is a snapshot view:
/// it may be stale or incomplete, and a miss simply falls back to the
/// canonical `!xxxxxxxx` form, which is deterministic and losslessly
/// parseable back to the id.
#[derive(Debug, Clone)]
pub struct NodeDirectory {
    nodes: NodeTable,
}

impl NodeDirectory {
    /// Create a directory over a transport's node table.
    pub fn new(nodes: NodeTable) -> Self {
        Self { nodes }
    }

    /// Display label for a node id.
    pub fn resolve(&self, id: NodeId) -> String {
        if id.is_broadcast() {
            return "ALL".to_string();
        }
        self.nodes
            .short_name(id)
            .unwrap_or_else(|| id.to_string())
    }

    /// Display label for a string-form node reference (`!xxxxxxxx`, bare
    /// hex, or `^all`). Unparseable references are returned unchanged.
    pub fn resolve_str(&self, raw: &str) -> String {
        if raw == BROADCAST_REF {
            return "ALL".to_string();
        }
        match raw.parse::<NodeId>() {
            Ok(id) => self.resolve(id),
            Err(_) => raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgate_primitives::UserInfo;

    fn directory_with(id: NodeId, short_name: &str) -> NodeDirectory {
        let table = NodeTable::new();
        table.observe(
            id,
            &UserInfo {
                short_name: Some(short_name.to_string()),
                ..Default::default()
            },
        );
        NodeDirectory::new(table)
    }

    #[test]
    fn broadcast_resolves_to_all() {
        let dir = NodeDirectory::new(NodeTable::new());
        assert_eq!(dir.resolve(NodeId::BROADCAST), "ALL");
        assert_eq!(dir.resolve_str("^all"), "ALL");
    }

    #[test]
    fn known_node_resolves_to_short_name() {
        let id = NodeId::new(0xabcd1234);
        let dir = directory_with(id, "MIDO");
        assert_eq!(dir.resolve(id), "MIDO");
        assert_eq!(dir.resolve_str("!abcd1234"), "MIDO");
    }

    #[test]
    fn unknown_node_falls_back_to_hex_form() {
        let dir = NodeDirectory::new(NodeTable::new());
        let id = NodeId::new(0x0badf00d);
        assert_eq!(dir.resolve(id), "!0badf00d");
        // Deterministic and lossless: the fallback parses back to the id.
        assert_eq!(dir.resolve(id).parse::<NodeId>(), Ok(id));
        assert_eq!(dir.resolve(id), dir.resolve(id));
    }

    #[test]
    fn unparseable_reference_is_returned_unchanged() {
        let dir = NodeDirectory::new(NodeTable::new());
        assert_eq!(dir.resolve_str("not-a-node"), "not-a-node");
    }
}
