//! Core primitive types for the meshgate gateway.
//!
//! This crate provides the fundamental types shared across the stack,
//! kept separate to avoid circular dependencies: node identifiers, the
//! application-port enumeration, and the decoded packet shapes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod packet;

pub use packet::{DeviceMetrics, Packet, PacketBody, Position, TelemetrySnapshot, UserInfo};

/// Maximum length (in characters) of a single outbound text message.
///
/// Longer text must be rejected or truncated at the boundary, never
/// handed to the radio unbounded.
pub const MAX_TEXT_CHARS: usize = 200;

/// Identifier of a node on the mesh.
///
/// Canonical text form is `!xxxxxxxx` (8 lowercase hex digits), which is
/// lossless: parsing the rendered form always yields the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The broadcast sentinel (`^all` in mesh parlance).
    pub const BROADCAST: NodeId = NodeId(0xffff_ffff);

    /// Create a node id from its raw numeric form.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw numeric identifier.
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Returns true if this is the broadcast sentinel.
    pub const fn is_broadcast(&self) -> bool {
        self.0 == Self::BROADCAST.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "!{:08x}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Error parsing a node id from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node id {input:?}: expected `!` followed by up to 8 hex digits")]
pub struct ParseNodeIdError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    /// Parses `!xxxxxxxx` as well as the bare hex form without the prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('!').unwrap_or(s);
        if hex.is_empty() || hex.len() > 8 {
            return Err(ParseNodeIdError { input: s.to_string() });
        }
        u32::from_str_radix(hex, 16)
            .map(NodeId)
            .map_err(|_| ParseNodeIdError { input: s.to_string() })
    }
}

/// Application-level purpose of a packet.
///
/// Closed enumeration: the classifier matches exhaustively on this, so a
/// new port is a compile-time visible change. The rendered names follow
/// the on-air port naming so stored rows stay comparable across tools.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum PortNum {
    /// Plain text messages, the only port carrying commands.
    #[serde(rename = "TEXT_MESSAGE_APP")]
    #[strum(serialize = "TEXT_MESSAGE_APP")]
    TextMessage,
    /// GPS position reports.
    #[serde(rename = "POSITION_APP")]
    #[strum(serialize = "POSITION_APP")]
    Position,
    /// Node identity broadcasts (names, hardware).
    #[serde(rename = "NODEINFO_APP")]
    #[strum(serialize = "NODEINFO_APP")]
    NodeInfo,
    /// Device/environment telemetry.
    #[serde(rename = "TELEMETRY_APP")]
    #[strum(serialize = "TELEMETRY_APP")]
    Telemetry,
    /// Mesh routing control traffic.
    #[serde(rename = "ROUTING_APP")]
    #[strum(serialize = "ROUTING_APP")]
    Routing,
    /// Range test sequence packets.
    #[serde(rename = "RANGE_TEST_APP")]
    #[strum(serialize = "RANGE_TEST_APP")]
    RangeTest,
    /// Detection sensor triggers.
    #[serde(rename = "DETECTION_SENSOR_APP")]
    #[strum(serialize = "DETECTION_SENSOR_APP")]
    DetectionSensor,
    /// Remote admin configuration packets.
    #[serde(rename = "ADMIN_APP")]
    #[strum(serialize = "ADMIN_APP")]
    Admin,
    /// Anything this gateway does not field-parse.
    #[serde(rename = "UNKNOWN_APP")]
    #[strum(serialize = "UNKNOWN_APP")]
    Unknown,
}

/// Truncate a string to at most `max` characters, on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display_is_canonical_hex() {
        assert_eq!(NodeId::new(0xabcd1234).to_string(), "!abcd1234");
        assert_eq!(NodeId::new(0x5).to_string(), "!00000005");
    }

    #[test]
    fn node_id_roundtrips_through_display() {
        let id = NodeId::new(0xdeadbeef);
        assert_eq!(id.to_string().parse::<NodeId>(), Ok(id));
    }

    #[test]
    fn node_id_parses_bare_hex() {
        assert_eq!("abcd1234".parse::<NodeId>(), Ok(NodeId::new(0xabcd1234)));
    }

    #[test]
    fn node_id_rejects_garbage() {
        assert!("".parse::<NodeId>().is_err());
        assert!("!".parse::<NodeId>().is_err());
        assert!("!abcd12345".parse::<NodeId>().is_err());
        assert!("!xyz".parse::<NodeId>().is_err());
    }

    #[test]
    fn broadcast_sentinel() {
        assert!(NodeId::BROADCAST.is_broadcast());
        assert!(!NodeId::new(1).is_broadcast());
    }

    #[test]
    fn port_names_match_on_air_form() {
        assert_eq!(PortNum::TextMessage.to_string(), "TEXT_MESSAGE_APP");
        assert_eq!(PortNum::DetectionSensor.to_string(), "DETECTION_SENSOR_APP");
        assert_eq!("TELEMETRY_APP".parse(), Ok(PortNum::Telemetry));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("hola", 200), "hola");
        assert_eq!(truncate_chars("hola", 2), "ho");
        // multibyte: never split a char
        assert_eq!(truncate_chars("⚡⚡⚡", 2), "⚡⚡");
    }
}
