//! Dispatch service actor (runs in its own tokio task).

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use meshgate_primitives::MAX_TEXT_CHARS;
use meshgate_transport::MeshTransport;

use crate::dispatch::{DispatchError, SendRequest};

/// Commands from handles to the service.
#[derive(Debug)]
pub enum DispatchCommand {
    /// Transmit one message.
    Send {
        /// The outbound request.
        request: SendRequest,
        /// Channel to send the result.
        response_tx: oneshot::Sender<Result<(), DispatchError>>,
    },
}

/// Processes send requests one at a time over the shared transport.
pub struct DispatchService {
    /// Receive commands from handles.
    command_rx: mpsc::UnboundedReceiver<DispatchCommand>,
    /// The single shared send path onto the mesh.
    transport: Arc<dyn MeshTransport>,
}

impl DispatchService {
    /// Create a new dispatch service.
    pub fn new(
        command_rx: mpsc::UnboundedReceiver<DispatchCommand>,
        transport: Arc<dyn MeshTransport>,
    ) -> Self {
        Self {
            command_rx,
            transport,
        }
    }

    /// Run the service loop until all handles are dropped.
    ///
    /// Requests are awaited to completion before the next is popped,
    /// which serializes transport access across every origin.
    pub async fn run(mut self) {
        while let Some(command) = self.command_rx.recv().await {
            match command {
                DispatchCommand::Send {
                    request,
                    response_tx,
                } => {
                    let result = self.transmit(&request).await;
                    if let Err(e) = &result {
                        metrics::counter!("meshgate_send_failures_total").increment(1);
                        warn!(origin = %request.origin, error = %e, "Outbound send failed");
                    } else {
                        metrics::counter!("meshgate_sends_total").increment(1);
                    }
                    // A caller that gave up is not an error.
                    let _ = response_tx.send(result);
                }
            }
        }
        debug!("Dispatch service shutting down");
    }

    async fn transmit(&self, request: &SendRequest) -> Result<(), DispatchError> {
        let len = request.text.chars().count();
        if len > MAX_TEXT_CHARS {
            return Err(DispatchError::TextTooLong {
                len,
                max: MAX_TEXT_CHARS,
            });
        }

        if !self.transport.is_connected() {
            return Err(DispatchError::NotConnected);
        }

        debug!(origin = %request.origin, target = ?request.target, chars = len, "Transmitting");
        self.transport
            .send_text(&request.text, request.target)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use meshgate_primitives::NodeId;
    use meshgate_transport::{MemoryTransport, SendTarget};

    use super::*;
    use crate::dispatch::{spawn_dispatcher, SendOrigin};

    fn request(text: &str, target: SendTarget, origin: SendOrigin) -> SendRequest {
        SendRequest {
            text: text.into(),
            target,
            origin,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_sends_never_interleave() {
        let (transport, _rx) = MemoryTransport::new();
        transport.set_send_delay(Duration::from_millis(50));
        let handle = spawn_dispatcher(transport.clone());

        let a = handle.send(request(
            "from the callback",
            SendTarget::Node(NodeId::new(1)),
            SendOrigin::CommandReply,
        ));
        let b = handle.send(request(
            "from rest",
            SendTarget::Channel(0),
            SendOrigin::Rest,
        ));
        let (ra, rb) = tokio::join!(a, b);

        ra.unwrap();
        rb.unwrap();
        assert!(!transport.saw_overlapping_sends());
        assert_eq!(transport.sent_texts(), vec!["from the callback", "from rest"]);
    }

    #[tokio::test]
    async fn oversize_text_is_rejected_and_never_sent() {
        let (transport, _rx) = MemoryTransport::new();
        let handle = spawn_dispatcher(transport.clone());

        let err = handle
            .send(request(
                &"x".repeat(201),
                SendTarget::Channel(0),
                SendOrigin::Rest,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::TextTooLong { len: 201, max: 200 }));
        assert!(transport.sent_texts().is_empty());
    }

    #[tokio::test]
    async fn exactly_200_chars_is_accepted() {
        let (transport, _rx) = MemoryTransport::new();
        let handle = spawn_dispatcher(transport.clone());

        handle
            .send(request(
                &"x".repeat(200),
                SendTarget::Channel(0),
                SendOrigin::Rest,
            ))
            .await
            .unwrap();
        assert_eq!(transport.sent_texts().len(), 1);
    }

    #[tokio::test]
    async fn disconnected_transport_yields_not_connected() {
        let (transport, _rx) = MemoryTransport::new();
        transport.set_connected(false);
        let handle = spawn_dispatcher(transport.clone());

        let err = handle
            .send(request(
                "pong",
                SendTarget::Node(NodeId::new(1)),
                SendOrigin::CommandReply,
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::NotConnected));
        assert!(transport.sent_texts().is_empty());
    }

    #[tokio::test]
    async fn sends_preserve_arrival_order() {
        let (transport, _rx) = MemoryTransport::new();
        let handle = spawn_dispatcher(transport.clone());

        for i in 0..5 {
            handle
                .send(request(
                    &format!("msg {i}"),
                    SendTarget::Channel(0),
                    SendOrigin::Rest,
                ))
                .await
                .unwrap();
        }

        assert_eq!(
            transport.sent_texts(),
            vec!["msg 0", "msg 1", "msg 2", "msg 3", "msg 4"]
        );
    }
}
