//! Event logger task.
//!
//! Sits between the ingestion loop and the event sink: records arrive
//! over a channel, get flattened to rows, and are written from a
//! blocking task. A sink failure is reported and the event dropped;
//! logging is best-effort, never transactional with packet processing.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use meshgate_storage::{EventRow, EventSink};

use crate::classify::EventRecord;

/// Consumes event records and writes them to the sink.
pub struct EventLogger<S> {
    record_rx: mpsc::UnboundedReceiver<EventRecord>,
    sink: Arc<S>,
}

impl<S: EventSink> EventLogger<S> {
    /// Create a logger over a record channel and a sink.
    pub fn new(record_rx: mpsc::UnboundedReceiver<EventRecord>, sink: Arc<S>) -> Self {
        Self { record_rx, sink }
    }

    /// Run until the record channel closes.
    pub async fn run(mut self) {
        while let Some(record) = self.record_rx.recv().await {
            let row = to_row(&record);
            let sink = self.sink.clone();

            // Sink writes are blocking (database file I/O); keep them off
            // the async workers.
            match tokio::task::spawn_blocking(move || sink.append(row)).await {
                Ok(Ok(())) => {
                    metrics::counter!("meshgate_events_stored_total").increment(1);
                }
                Ok(Err(e)) => {
                    metrics::counter!("meshgate_events_dropped_total").increment(1);
                    error!(error = %e, kind = %record.kind, "Event store write failed, dropping event");
                }
                Err(e) => {
                    metrics::counter!("meshgate_events_dropped_total").increment(1);
                    error!(error = %e, "Event store writer panicked, dropping event");
                }
            }
        }
        debug!("Event logger shutting down");
    }
}

/// Flatten a record into the sink's row shape.
fn to_row(record: &EventRecord) -> EventRow {
    EventRow {
        kind: record.kind.to_string(),
        sender_id: record.sender_id.to_string(),
        sender_label: record.sender_label.clone(),
        dest_id: record.dest_id.to_string(),
        payload_json: serde_json::to_string(&record.payload)
            .unwrap_or_else(|_| "{}".to_string()),
    }
}
