use std::sync::{Arc, Mutex};

use crate::sim::state::LogRecord;

/// Append-only per-run log of tick records, shared between the runner thread
/// and the console/plot consumers.
///
/// Appends and drains take the same lock, so a drain sees a consistent prefix
/// of the appended records and a concurrent append either lands in the drain
/// or after it; nothing is lost or duplicated.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: LogRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// Copy of all records accumulated so far, in append order.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Take all accumulated records, leaving the buffer empty.
    pub fn drain(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.lock().unwrap())
    }

    pub fn clear(&self) {
        self.records.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
