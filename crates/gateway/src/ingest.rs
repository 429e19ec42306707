//! Packet ingestion loop.
//!
//! One task consumes the transport's packet stream sequentially: each
//! packet is classified, logged, queued for storage, and, when it is a
//! text message carrying the command prefix, handed to the interpreter
//! on a spawned task so provider latency and reply pacing never stall
//! the feed.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use meshgate_primitives::{Packet, PacketBody};

use crate::classify::{classify, EventRecord};
use crate::commands::CommandInterpreter;
use crate::directory::NodeDirectory;
use crate::providers::ContentProviders;

/// The inbound half of the gateway.
pub struct IngestService<P> {
    packet_rx: mpsc::Receiver<Packet>,
    directory: NodeDirectory,
    record_tx: mpsc::UnboundedSender<EventRecord>,
    interpreter: Arc<CommandInterpreter<P>>,
}

impl<P: ContentProviders> IngestService<P> {
    /// Create the ingestion service.
    pub fn new(
        packet_rx: mpsc::Receiver<Packet>,
        directory: NodeDirectory,
        record_tx: mpsc::UnboundedSender<EventRecord>,
        interpreter: Arc<CommandInterpreter<P>>,
    ) -> Self {
        Self {
            packet_rx,
            directory,
            record_tx,
            interpreter,
        }
    }

    /// Run until the packet stream ends.
    pub async fn run(mut self) {
        info!("Listening on the mesh");
        while let Some(packet) = self.packet_rx.recv().await {
            self.process(packet);
        }
        info!("Packet stream ended, ingestion stopping");
    }

    fn process(&self, packet: Packet) {
        metrics::counter!("meshgate_packets_total").increment(1);

        let record = classify(&packet, &self.directory);
        let dest_label = self.directory.resolve(packet.to);
        log_packet(&record, &dest_label);

        if self.record_tx.send(record).is_err() {
            warn!("Event logger gone, record dropped");
        }

        if let PacketBody::Text { text } = &packet.body {
            let trimmed = text.trim();
            if trimmed.starts_with('/') {
                let interpreter = self.interpreter.clone();
                let text = trimmed.to_string();
                let sender = packet.from;
                // Command handling runs off the ingestion task: provider
                // lookups and reply pacing must not block the feed.
                tokio::spawn(async move {
                    interpreter.handle(&text, sender).await;
                });
            }
        }
    }
}

/// One structured line per observed packet, in the record's terms.
fn log_packet(record: &EventRecord, dest_label: &str) {
    let from = record.sender_label.as_str();
    match record.kind {
        meshgate_primitives::PortNum::TextMessage => {
            let text = record.payload.get("text").and_then(|v| v.as_str()).unwrap_or("");
            info!(%from, to = %dest_label, %text, "Text message");
        }
        meshgate_primitives::PortNum::Position => {
            info!(
                %from,
                to = %dest_label,
                lat = ?record.payload.get("latitude"),
                lon = ?record.payload.get("longitude"),
                alt = ?record.payload.get("altitude"),
                "Position"
            );
        }
        meshgate_primitives::PortNum::NodeInfo => {
            info!(
                %from,
                to = %dest_label,
                name = ?record.payload.get("longName"),
                hw = ?record.payload.get("hwModel"),
                "Node info"
            );
        }
        meshgate_primitives::PortNum::Telemetry => {
            info!(
                %from,
                to = %dest_label,
                voltage = ?record.payload.get("voltage"),
                battery = ?record.payload.get("batteryLevel"),
                "Telemetry"
            );
        }
        meshgate_primitives::PortNum::Routing => {
            debug!(%from, to = %dest_label, "Mesh routing packet");
        }
        meshgate_primitives::PortNum::RangeTest => {
            info!(%from, to = %dest_label, "Range test");
        }
        meshgate_primitives::PortNum::DetectionSensor => {
            warn!(%from, to = %dest_label, "Sensor triggered");
        }
        meshgate_primitives::PortNum::Admin => {
            info!(%from, to = %dest_label, "Admin config packet");
        }
        meshgate_primitives::PortNum::Unknown => {
            debug!(%from, to = %dest_label, kind = %record.kind, "Unclassified packet");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use meshgate_primitives::{NodeId, PortNum, Position};
    use meshgate_transport::{MemoryTransport, MeshTransport, SendTarget};

    use super::*;
    use crate::dispatch::spawn_dispatcher;
    use crate::providers::{ContentProviders, ProviderError};

    struct NoProviders;

    #[async_trait]
    impl ContentProviders for NoProviders {
        async fn outage_report(&self) -> Result<Vec<String>, ProviderError> {
            Ok(vec![])
        }
        async fn demand_summary(&self) -> Result<String, ProviderError> {
            Ok(String::new())
        }
        async fn transit_status(&self) -> Result<String, ProviderError> {
            Ok(String::new())
        }
    }

    fn service(
        transport: &Arc<MemoryTransport>,
        packet_rx: mpsc::Receiver<Packet>,
    ) -> (IngestService<NoProviders>, mpsc::UnboundedReceiver<EventRecord>) {
        let dispatcher = spawn_dispatcher(transport.clone());
        let interpreter = Arc::new(CommandInterpreter::new(
            Arc::new(NoProviders),
            dispatcher,
            Duration::from_secs(5),
        ));
        let directory = NodeDirectory::new(transport.node_table().clone());
        let (record_tx, record_rx) = mpsc::unbounded_channel();
        (
            IngestService::new(packet_rx, directory, record_tx, interpreter),
            record_rx,
        )
    }

    #[tokio::test]
    async fn every_packet_is_classified_and_queued() {
        let (transport, packet_rx) = MemoryTransport::new();
        let (ingest, mut record_rx) = service(&transport, packet_rx);

        transport.inject(Packet::text(NodeId::new(1), NodeId::BROADCAST, "hola"));
        transport.inject(Packet::position(
            NodeId::new(2),
            NodeId::BROADCAST,
            Position::default(),
        ));
        transport.close_inbound();

        ingest.run().await;

        let first = record_rx.recv().await.unwrap();
        assert_eq!(first.kind, PortNum::TextMessage);
        let second = record_rx.recv().await.unwrap();
        assert_eq!(second.kind, PortNum::Position);
    }

    #[tokio::test]
    async fn command_text_triggers_a_reply_without_blocking_the_loop() {
        let (transport, packet_rx) = MemoryTransport::new();
        let (ingest, mut record_rx) = service(&transport, packet_rx);

        transport.inject(Packet::text(NodeId::new(7), NodeId::new(1), "/ping"));
        transport.inject(Packet::text(NodeId::new(8), NodeId::BROADCAST, "just chatting"));

        let ingest_task = tokio::spawn(ingest.run());

        // Both packets are recorded even while the command is handled.
        assert_eq!(record_rx.recv().await.unwrap().kind, PortNum::TextMessage);
        assert_eq!(record_rx.recv().await.unwrap().kind, PortNum::TextMessage);

        // The spawned command eventually replies to the sender.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if transport
                .sent()
                .contains(&("pong".to_string(), SendTarget::Node(NodeId::new(7))))
            {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "no pong reply seen");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        transport.close_inbound();
        ingest_task.await.unwrap();
    }

    #[tokio::test]
    async fn non_command_text_is_logged_but_not_replied() {
        let (transport, packet_rx) = MemoryTransport::new();
        let (ingest, mut record_rx) = service(&transport, packet_rx);

        transport.inject(Packet::text(NodeId::new(7), NodeId::BROADCAST, "hola mesh"));
        transport.close_inbound();
        ingest.run().await;

        assert_eq!(record_rx.recv().await.unwrap().kind, PortNum::TextMessage);
        assert!(transport.sent_texts().is_empty());
    }
}
