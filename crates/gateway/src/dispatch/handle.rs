//! Cloneable handle for submitting sends to the dispatch service.

use tokio::sync::{mpsc, oneshot};

use crate::dispatch::service::DispatchCommand;
use crate::dispatch::{DispatchError, SendRequest};

/// Cloneable handle for requesting outbound sends.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    command_tx: mpsc::UnboundedSender<DispatchCommand>,
}

impl DispatcherHandle {
    /// Create a new handle from a command sender.
    pub fn new(command_tx: mpsc::UnboundedSender<DispatchCommand>) -> Self {
        Self { command_tx }
    }

    /// Submit a send and wait for it to complete or fail.
    ///
    /// Requests from concurrent callers are processed strictly one at a
    /// time, in arrival order.
    pub async fn send(&self, request: SendRequest) -> Result<(), DispatchError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(DispatchCommand::Send {
                request,
                response_tx,
            })
            .map_err(|_| DispatchError::ServiceStopped)?;

        response_rx.await.map_err(|_| DispatchError::ServiceStopped)?
    }
}
