//! In-memory retention of every record logged through a logger.

use std::collections::HashSet;
use std::sync::Arc;

use crate::log_record::LogRecord;

/// Insertion-ordered set of records keyed by `Arc` identity.
///
/// Two records with identical contents are distinct entries; inserting the
/// same `Arc` twice keeps a single entry. Nothing is ever removed.
#[derive(Debug, Default)]
pub struct LogStore {
    records: Vec<Arc<LogRecord>>,
    seen: HashSet<usize>,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `entry` unless this exact `Arc` is already stored.
    pub fn record(&mut self, entry: Arc<LogRecord>) {
        // The stored Arc keeps the allocation alive, so its address is a
        // stable identity for the store's lifetime.
        let key = Arc::as_ptr(&entry) as usize;
        if self.seen.insert(key) {
            self.records.push(entry);
        }
    }

    /// Matching records in insertion order.
    pub fn query(&self, predicate: impl Fn(&LogRecord) -> bool) -> Vec<Arc<LogRecord>> {
        self.records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<LogRecord>> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
