//! Framed TCP link to the radio adapter.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tracing::{debug, info, warn};

use meshgate_primitives::{Packet, PacketBody};

use crate::wire::WireFrame;
use crate::{MeshTransport, NodeTable, SendTarget, TransportError};

/// Inbound packet buffer between the reader task and the ingestion loop.
const INBOUND_BUFFER: usize = 256;

/// Mesh transport over a TCP connection to the radio adapter.
///
/// A background reader task feeds the packet channel returned by
/// [`connect`](TcpTransport::connect) and keeps the node table current
/// from observed node-info broadcasts. When the link drops, the connected
/// flag flips and every subsequent send fails with
/// [`TransportError::NotConnected`].
pub struct TcpTransport {
    writer: Mutex<FramedWrite<OwnedWriteHalf, LengthDelimitedCodec>>,
    connected: Arc<AtomicBool>,
    nodes: NodeTable,
}

impl TcpTransport {
    /// Connect to the radio adapter and start the reader task.
    ///
    /// Returns the transport handle together with the inbound packet
    /// stream. The stream ends when the link closes.
    pub async fn connect(addr: &str) -> Result<(Arc<Self>, mpsc::Receiver<Packet>), TransportError> {
        info!(%addr, "Connecting to radio adapter");
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        let connected = Arc::new(AtomicBool::new(true));
        let nodes = NodeTable::new();
        let (packet_tx, packet_rx) = mpsc::channel(INBOUND_BUFFER);

        tokio::spawn(read_loop(
            FramedRead::new(read_half, LengthDelimitedCodec::new()),
            packet_tx,
            nodes.clone(),
            connected.clone(),
        ));

        let transport = Arc::new(Self {
            writer: Mutex::new(FramedWrite::new(write_half, LengthDelimitedCodec::new())),
            connected,
            nodes,
        });

        Ok((transport, packet_rx))
    }
}

#[async_trait]
impl MeshTransport for TcpTransport {
    async fn send_text(&self, text: &str, target: SendTarget) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }

        let frame = WireFrame::Outbound {
            text: text.to_string(),
            target,
        };
        let bytes = frame.encode()?;

        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.send(bytes.into()).await {
            self.connected.store(false, Ordering::SeqCst);
            return Err(TransportError::Io(e));
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn node_table(&self) -> &NodeTable {
        &self.nodes
    }
}

/// Reader task: decode inbound frames, maintain the node table, forward
/// packets until the link closes.
async fn read_loop(
    mut reader: FramedRead<OwnedReadHalf, LengthDelimitedCodec>,
    packet_tx: mpsc::Sender<Packet>,
    nodes: NodeTable,
    connected: Arc<AtomicBool>,
) {
    while let Some(frame) = reader.next().await {
        let bytes = match frame {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Adapter link read failed");
                break;
            }
        };

        let packet = match WireFrame::decode(&bytes) {
            Ok(WireFrame::Inbound(packet)) => packet,
            Ok(other) => {
                debug!(?other, "Ignoring unexpected frame from adapter");
                continue;
            }
            Err(e) => {
                // A malformed frame is dropped, not fatal to the link.
                warn!(error = %e, "Dropping undecodable adapter frame");
                continue;
            }
        };

        if let PacketBody::NodeInfo(info) = &packet.body {
            nodes.observe(packet.from, info);
        }

        if packet_tx.send(packet).await.is_err() {
            debug!("Packet consumer gone, stopping adapter reader");
            break;
        }
    }

    connected.store(false, Ordering::SeqCst);
    info!("Adapter link closed");
}
