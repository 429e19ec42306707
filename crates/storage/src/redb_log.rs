//! redb-backed event log.

use std::path::Path;

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use tracing::info;

use crate::{EventRow, EventSink, SinkError};

/// Append-only event table: monotonic sequence number → postcard row.
const EVENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("events");

/// Durable event log backed by a single-file redb database.
pub struct RedbEventLog {
    db: Database,
}

impl RedbEventLog {
    /// Open (or create) the event log at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(|e| SinkError::Open(e.to_string()))?;

        // Make sure the table exists so first reads don't error.
        let txn = db
            .begin_write()
            .map_err(|e| SinkError::Open(e.to_string()))?;
        txn.open_table(EVENTS)
            .map_err(|e| SinkError::Open(e.to_string()))?;
        txn.commit().map_err(|e| SinkError::Open(e.to_string()))?;

        info!(path = %path.display(), "Event log open");
        Ok(Self { db })
    }

    /// Number of stored events.
    pub fn len(&self) -> Result<u64, SinkError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| SinkError::Write(e.to_string()))?;
        let table = txn
            .open_table(EVENTS)
            .map_err(|e| SinkError::Write(e.to_string()))?;
        table.len().map_err(|e| SinkError::Write(e.to_string()))
    }

    /// Returns true if no events are stored.
    pub fn is_empty(&self) -> Result<bool, SinkError> {
        Ok(self.len()? == 0)
    }

    /// Read every stored row in sequence order.
    pub fn rows(&self) -> Result<Vec<EventRow>, SinkError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| SinkError::Write(e.to_string()))?;
        let table = txn
            .open_table(EVENTS)
            .map_err(|e| SinkError::Write(e.to_string()))?;

        let mut rows = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| SinkError::Write(e.to_string()))?
        {
            let (_, value) = entry.map_err(|e| SinkError::Write(e.to_string()))?;
            rows.push(postcard::from_bytes(value.value())?);
        }
        Ok(rows)
    }
}

impl EventSink for RedbEventLog {
    fn append(&self, row: EventRow) -> Result<(), SinkError> {
        let bytes = postcard::to_allocvec(&row)?;

        let txn = self
            .db
            .begin_write()
            .map_err(|e| SinkError::Write(e.to_string()))?;
        {
            let mut table = txn
                .open_table(EVENTS)
                .map_err(|e| SinkError::Write(e.to_string()))?;
            let next = table
                .last()
                .map_err(|e| SinkError::Write(e.to_string()))?
                .map(|(key, _)| key.value() + 1)
                .unwrap_or(0);
            table
                .insert(next, bytes.as_slice())
                .map_err(|e| SinkError::Write(e.to_string()))?;
        }
        txn.commit().map_err(|e| SinkError::Write(e.to_string()))?;
        Ok(())
    }
}
