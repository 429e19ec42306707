//! Dispatch error type.

use meshgate_transport::TransportError;

/// Failures surfaced to a dispatch caller.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The text exceeds the outbound bound. Nothing was sent.
    #[error("message exceeds {max} characters (got {len})")]
    TextTooLong {
        /// Characters in the rejected text.
        len: usize,
        /// The enforced bound.
        max: usize,
    },

    /// The transport is not connected. Nothing was sent.
    #[error("transport is not connected")]
    NotConnected,

    /// The transport accepted the request but the send failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The dispatch service is gone.
    #[error("dispatch service stopped")]
    ServiceStopped,
}
