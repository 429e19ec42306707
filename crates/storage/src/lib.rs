//! Event sink abstraction and backends.
//!
//! The gateway hands every classified packet to an [`EventSink`] as a flat
//! [`EventRow`]. Sink failures are the caller's problem to tolerate, never
//! to propagate back into packet processing.

use serde::{Deserialize, Serialize};

mod memory;
mod redb_log;

pub use memory::MemorySink;
pub use redb_log::RedbEventLog;

/// The flat shape an event takes in durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    /// Packet type, in on-air port naming (`TEXT_MESSAGE_APP`, ...).
    pub kind: String,
    /// Canonical sender id (`!xxxxxxxx`).
    pub sender_id: String,
    /// Display label of the sender at observation time.
    pub sender_label: String,
    /// Canonical destination id, or the broadcast form.
    pub dest_id: String,
    /// JSON-encoded payload.
    pub payload_json: String,
}

/// Destination for event rows.
///
/// `append` is a blocking call; async callers are expected to move it off
/// their task (the event logger uses a blocking task for this).
pub trait EventSink: Send + Sync + 'static {
    /// Persist one row.
    fn append(&self, row: EventRow) -> Result<(), SinkError>;
}

/// Failures writing to an event sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The store could not be opened or created.
    #[error("failed to open event store: {0}")]
    Open(String),

    /// A write was rejected or the store is unavailable.
    #[error("failed to write event: {0}")]
    Write(String),

    /// The row could not be encoded.
    #[error("failed to encode event: {0}")]
    Encode(#[from] postcard::Error),
}
