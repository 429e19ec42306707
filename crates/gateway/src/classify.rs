//! Packet classification.
//!
//! [`classify`] is pure: it never fails and never touches anything but
//! its inputs. Routing the result to the event logger and the command
//! interpreter is the ingestion loop's job.

use serde_json::{Map, Value};

use meshgate_primitives::{NodeId, Packet, PacketBody, PortNum};

use crate::directory::NodeDirectory;

/// A classified packet, normalized for storage.
///
/// The payload is a plain JSON object: every value is already a
/// primitive, string, map, or sequence thereof. Anything the source
/// structure could not represent that way was stringified at
/// classification time, so serialization downstream can never fail.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// The application port.
    pub kind: PortNum,
    /// Originating node.
    pub sender_id: NodeId,
    /// Display label of the sender at classification time.
    pub sender_label: String,
    /// Destination node (possibly broadcast).
    pub dest_id: NodeId,
    /// Port-specific normalized payload.
    pub payload: Map<String, Value>,
}

/// Classify a packet into its normalized event record.
pub fn classify(packet: &Packet, directory: &NodeDirectory) -> EventRecord {
    let payload = match &packet.body {
        PacketBody::Text { text } => {
            let mut map = Map::new();
            map.insert("text".into(), Value::from(text.trim()));
            map
        }
        PacketBody::Position(pos) => {
            // Absent fields stay null: a missing altitude is not a
            // reported zero.
            let mut map = Map::new();
            map.insert("latitude".into(), opt(pos.latitude));
            map.insert("longitude".into(), opt(pos.longitude));
            map.insert("altitude".into(), opt(pos.altitude));
            map.insert("satellite_count".into(), opt(pos.satellite_count));
            map.insert("pdop".into(), opt(pos.pdop));
            map
        }
        PacketBody::NodeInfo(info) => as_object(serde_json::to_value(info), || {
            format!("{info:?}")
        }),
        PacketBody::Telemetry(telemetry) => match &telemetry.device_metrics {
            // Only the device-metrics category is extracted.
            Some(metrics) => as_object(serde_json::to_value(metrics), || {
                format!("{metrics:?}")
            }),
            None => Map::new(),
        },
        PacketBody::Opaque { raw } => {
            let mut map = Map::new();
            map.insert("raw".into(), Value::from(raw.as_str()));
            map
        }
    };

    EventRecord {
        kind: packet.port,
        sender_id: packet.from,
        sender_label: directory.resolve(packet.from),
        dest_id: packet.to,
        payload,
    }
}

/// Optional field to JSON, null when absent.
fn opt<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

/// Coerce a serialized structure to a JSON object, degrading to a
/// `{"raw": ...}` rendering rather than ever failing.
fn as_object(
    value: Result<Value, serde_json::Error>,
    render: impl FnOnce() -> String,
) -> Map<String, Value> {
    match value {
        Ok(Value::Object(map)) => map,
        _ => {
            let mut map = Map::new();
            map.insert("raw".into(), Value::from(render()));
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgate_primitives::{DeviceMetrics, Position, TelemetrySnapshot, UserInfo};
    use meshgate_transport::NodeTable;

    fn directory() -> NodeDirectory {
        NodeDirectory::new(NodeTable::new())
    }

    fn packet(port: PortNum, body: PacketBody) -> Packet {
        Packet {
            port,
            from: NodeId::new(0x11),
            to: NodeId::BROADCAST,
            body,
        }
    }

    #[test]
    fn text_payload_is_trimmed() {
        let record = classify(
            &packet(
                PortNum::TextMessage,
                PacketBody::Text {
                    text: "  /ping  ".into(),
                },
            ),
            &directory(),
        );
        assert_eq!(record.kind, PortNum::TextMessage);
        assert_eq!(record.payload.len(), 1);
        assert_eq!(record.payload["text"], "/ping");
    }

    #[test]
    fn position_missing_altitude_is_null_not_zero() {
        let record = classify(
            &packet(
                PortNum::Position,
                PacketBody::Position(Position {
                    latitude: Some(-34.6037),
                    longitude: Some(-58.3816),
                    altitude: None,
                    satellite_count: Some(8),
                    pdop: None,
                }),
            ),
            &directory(),
        );

        let keys: Vec<_> = record.payload.keys().cloned().collect();
        assert_eq!(
            keys,
            ["altitude", "latitude", "longitude", "pdop", "satellite_count"]
        );
        assert!(record.payload["altitude"].is_null());
        assert!(record.payload["pdop"].is_null());
        assert_eq!(record.payload["satellite_count"], 8);
    }

    #[test]
    fn node_info_passes_through_unchanged() {
        let record = classify(
            &packet(
                PortNum::NodeInfo,
                PacketBody::NodeInfo(UserInfo {
                    id: Some("!00000011".into()),
                    long_name: Some("Estacion Base".into()),
                    short_name: Some("BASE".into()),
                    hw_model: Some("HELTEC_V3".into()),
                    role: None,
                }),
            ),
            &directory(),
        );
        assert_eq!(record.payload["longName"], "Estacion Base");
        assert_eq!(record.payload["hwModel"], "HELTEC_V3");
        assert!(record.payload["role"].is_null());
    }

    #[test]
    fn telemetry_extracts_device_metrics_only() {
        let record = classify(
            &packet(
                PortNum::Telemetry,
                PacketBody::Telemetry(TelemetrySnapshot {
                    device_metrics: Some(DeviceMetrics {
                        voltage: Some(3.92),
                        battery_level: Some(87),
                        ..Default::default()
                    }),
                }),
            ),
            &directory(),
        );
        assert_eq!(record.payload["batteryLevel"], 87);
        assert!(record.payload["uptimeSeconds"].is_null());
    }

    #[test]
    fn telemetry_without_device_metrics_is_empty() {
        let record = classify(
            &packet(
                PortNum::Telemetry,
                PacketBody::Telemetry(TelemetrySnapshot {
                    device_metrics: None,
                }),
            ),
            &directory(),
        );
        assert!(record.payload.is_empty());
    }

    #[test]
    fn opaque_ports_carry_raw_rendering() {
        for port in [
            PortNum::Routing,
            PortNum::RangeTest,
            PortNum::DetectionSensor,
            PortNum::Admin,
            PortNum::Unknown,
        ] {
            let record = classify(
                &packet(
                    port,
                    PacketBody::Opaque {
                        raw: "want_response: true".into(),
                    },
                ),
                &directory(),
            );
            assert_eq!(record.kind, port);
            assert_eq!(record.payload["raw"], "want_response: true");
        }
    }

    #[test]
    fn every_record_serializes_to_json() {
        let bodies = [
            PacketBody::Text { text: "hola".into() },
            PacketBody::Position(Position::default()),
            PacketBody::NodeInfo(UserInfo::default()),
            PacketBody::Telemetry(TelemetrySnapshot::default()),
            PacketBody::Opaque { raw: "x".into() },
        ];
        for body in bodies {
            let record = classify(&packet(PortNum::Unknown, body), &directory());
            serde_json::to_string(&record.payload).unwrap();
        }
    }

    #[test]
    fn sender_label_uses_directory() {
        let table = NodeTable::new();
        table.observe(
            NodeId::new(0x11),
            &UserInfo {
                short_name: Some("MIDO".into()),
                ..Default::default()
            },
        );
        let record = classify(
            &packet(PortNum::TextMessage, PacketBody::Text { text: "hi".into() }),
            &NodeDirectory::new(table),
        );
        assert_eq!(record.sender_label, "MIDO");
    }
}
