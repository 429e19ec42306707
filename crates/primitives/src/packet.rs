//! Decoded packet shapes as they arrive from the mesh transport.
//!
//! A [`Packet`] is constructed once by the transport and consumed exactly
//! once by the classifier; nothing mutates it after arrival. Fields the
//! radio did not report are `None`; an absent altitude is not a zero
//! altitude, and that distinction is preserved all the way into storage.

use serde::{Deserialize, Serialize};

use crate::{NodeId, PortNum};

/// One inbound unit of mesh traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Application port this packet was addressed to.
    pub port: PortNum,
    /// Originating node.
    pub from: NodeId,
    /// Destination node, possibly [`NodeId::BROADCAST`].
    pub to: NodeId,
    /// Port-dependent decoded payload.
    pub body: PacketBody,
}

impl Packet {
    /// Convenience constructor for a text-message packet.
    pub fn text(from: NodeId, to: NodeId, text: impl Into<String>) -> Self {
        Self {
            port: PortNum::TextMessage,
            from,
            to,
            body: PacketBody::Text { text: text.into() },
        }
    }

    /// Convenience constructor for a position packet.
    pub fn position(from: NodeId, to: NodeId, position: Position) -> Self {
        Self {
            port: PortNum::Position,
            from,
            to,
            body: PacketBody::Position(position),
        }
    }
}

/// Port-dependent decoded payload of a packet.
///
/// Ports the gateway does not field-parse arrive as [`PacketBody::Opaque`]
/// carrying the string rendering of whatever the transport decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PacketBody {
    /// A text message.
    Text {
        /// The message text as received (untrimmed).
        text: String,
    },
    /// A position report.
    Position(Position),
    /// A node identity broadcast.
    NodeInfo(UserInfo),
    /// A telemetry report.
    Telemetry(TelemetrySnapshot),
    /// Raw rendering for ports logged opaquely.
    Opaque {
        /// String form of the decoded structure.
        raw: String,
    },
}

/// A decoded position report. Every field is optional; the radio only
/// reports what it has a fix for.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters above sea level.
    pub altitude: Option<i32>,
    pub satellite_count: Option<u32>,
    pub pdop: Option<f32>,
}

/// Node identity information, passed through to storage as given.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Canonical node id string (`!xxxxxxxx`).
    pub id: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub hw_model: Option<String>,
    pub role: Option<String>,
}

/// A telemetry report. Only the device-metrics category is carried;
/// environment and power metrics are not extracted by this gateway.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub device_metrics: Option<DeviceMetrics>,
}

/// Device health metrics reported over the telemetry port.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetrics {
    pub voltage: Option<f32>,
    /// Battery percentage, 101 meaning powered.
    pub battery_level: Option<u32>,
    pub channel_utilization: Option<f32>,
    pub air_util_tx: Option<f32>,
    pub uptime_seconds: Option<u64>,
}
