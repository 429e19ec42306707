//! In-process transport used by tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use meshgate_primitives::{Packet, PacketBody};

use crate::{MeshTransport, NodeTable, SendTarget, TransportError};

/// A mesh transport backed by in-process channels.
///
/// Sends are recorded instead of transmitted; inbound packets are
/// injected by the test. An optional artificial send latency plus an
/// overlap detector make serialization violations observable.
pub struct MemoryTransport {
    connected: AtomicBool,
    nodes: NodeTable,
    sent: Mutex<Vec<(String, SendTarget)>>,
    packet_tx: Mutex<Option<mpsc::Sender<Packet>>>,
    send_delay: Mutex<Option<Duration>>,
    in_flight: AtomicBool,
    overlapped: AtomicBool,
}

impl MemoryTransport {
    /// Create a connected transport and its inbound packet stream.
    pub fn new() -> (Arc<Self>, mpsc::Receiver<Packet>) {
        let (packet_tx, packet_rx) = mpsc::channel(256);
        let transport = Arc::new(Self {
            connected: AtomicBool::new(true),
            nodes: NodeTable::new(),
            sent: Mutex::new(Vec::new()),
            packet_tx: Mutex::new(Some(packet_tx)),
            send_delay: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
        });
        (transport, packet_rx)
    }

    /// Inject an inbound packet, as if observed on the mesh.
    pub fn inject(&self, packet: Packet) {
        if let PacketBody::NodeInfo(info) = &packet.body {
            self.nodes.observe(packet.from, info);
        }
        let guard = self.packet_tx.lock();
        let Some(tx) = guard.as_ref() else {
            panic!("memory transport inbound side closed");
        };
        tx.try_send(packet)
            .unwrap_or_else(|_| panic!("memory transport inbound buffer full"));
    }

    /// End the inbound packet stream, as if the link closed.
    pub fn close_inbound(&self) {
        self.packet_tx.lock().take();
    }

    /// Flip the connection flag.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Make every send take `delay` before completing.
    pub fn set_send_delay(&self, delay: Duration) {
        *self.send_delay.lock() = Some(delay);
    }

    /// Everything sent so far, in completion order.
    pub fn sent(&self) -> Vec<(String, SendTarget)> {
        self.sent.lock().clone()
    }

    /// Text of everything sent so far.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    /// True if two sends were ever in flight at the same time.
    pub fn saw_overlapping_sends(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MeshTransport for MemoryTransport {
    async fn send_text(&self, text: &str, target: SendTarget) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }

        let delay = *self.send_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.sent.lock().push((text.to_string(), target));
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn node_table(&self) -> &NodeTable {
        &self.nodes
    }
}
