//! Wire frames exchanged with the radio adapter.
//!
//! The adapter link is a plain TCP stream carrying length-delimited
//! postcard frames. The adapter owns radio-specific concerns (serial
//! framing, protobuf decode, retransmission); by the time a frame reaches
//! this side it is already a decoded [`Packet`].

use serde::{Deserialize, Serialize};

use meshgate_primitives::Packet;

use crate::{SendTarget, TransportError};

/// One frame on the adapter link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WireFrame {
    /// A packet observed on the mesh, adapter → gateway.
    Inbound(Packet),
    /// A text send request, gateway → adapter.
    Outbound {
        /// Message text.
        text: String,
        /// Channel or node destination.
        target: SendTarget,
    },
}

impl WireFrame {
    /// Encode to the postcard body of a length-delimited frame.
    pub fn encode(&self) -> Result<Vec<u8>, TransportError> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Decode from the postcard body of a length-delimited frame.
    pub fn decode(bytes: &[u8]) -> Result<Self, TransportError> {
        Ok(postcard::from_bytes(bytes)?)
    }
}
