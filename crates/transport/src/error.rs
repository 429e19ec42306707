//! Transport error type.

use thiserror::Error;

/// Failures surfaced by a mesh transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The link is not (or no longer) established.
    #[error("transport is not connected")]
    NotConnected,

    /// The peer closed the link mid-operation.
    #[error("transport link closed")]
    Closed,

    /// Underlying socket failure.
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame could not be encoded or decoded.
    #[error("wire codec error: {0}")]
    Codec(#[from] postcard::Error),
}
