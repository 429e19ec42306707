//! In-memory sink used by tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::{EventRow, EventSink, SinkError};

/// An event sink that collects rows in memory and can be told to fail,
/// for exercising the logger's best-effort behavior.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Mutex<Vec<EventRow>>,
    fail_next: AtomicUsize,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every row appended so far.
    pub fn rows(&self) -> Vec<EventRow> {
        self.rows.lock().clone()
    }

    /// Make the next `n` appends fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }
}

impl EventSink for MemorySink {
    fn append(&self, row: EventRow) -> Result<(), SinkError> {
        if self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SinkError::Write("sink unavailable".into()));
        }
        self.rows.lock().push(row);
        Ok(())
    }
}
