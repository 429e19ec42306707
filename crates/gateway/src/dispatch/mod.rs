//! Outbound dispatch actor.
//!
//! Every transmission onto the mesh passes through one
//! [`DispatchService`] task, whether it started life as a command reply
//! inside the packet callback or as a REST request on some HTTP worker.
//! The service owns the transport's send half and processes one request
//! at a time, ordered by arrival, which is the whole concurrency story:
//! at most one send in flight, no interleaving, no reordering.
//!
//! Handle+Service pattern: [`DispatcherHandle`] is cheap to clone and
//! safe to call from any task; the service stops when every handle is
//! dropped.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use meshgate_transport::{MeshTransport, SendTarget};

mod error;
mod handle;
mod service;

pub use error::DispatchError;
pub use handle::DispatcherHandle;
pub use service::{DispatchCommand, DispatchService};

/// One unit of outbound work.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    /// Message text, at most 200 characters.
    pub text: String,
    /// Channel or node destination (mutually exclusive by type).
    pub target: SendTarget,
    /// Who asked for this send. Observability only.
    pub origin: SendOrigin,
}

/// Origin tag for an outbound send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOrigin {
    /// Generated by the command interpreter.
    CommandReply,
    /// Injected through the REST ingress.
    Rest,
}

impl fmt::Display for SendOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOrigin::CommandReply => f.write_str("command-reply"),
            SendOrigin::Rest => f.write_str("rest"),
        }
    }
}

/// Spawn the dispatch service over a transport and return its handle.
pub fn spawn_dispatcher(transport: Arc<dyn MeshTransport>) -> DispatcherHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    tokio::spawn(DispatchService::new(command_rx, transport).run());
    DispatcherHandle::new(command_tx)
}
