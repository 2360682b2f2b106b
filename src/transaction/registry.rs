use crate::ids::TransactionId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Registry record of an in-flight transaction.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionEntry {
    pub id: TransactionId,
    pub method: String,
    pub path: String,
    #[serde(skip)]
    pub started_at: Instant,
}

impl TransactionEntry {
    #[must_use]
    pub fn age(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Map of pending transactions, keyed by id.
///
/// Owned by one [`TransactionManager`](super::TransactionManager); only the manager
/// inserts and removes entries. Diagnostics get a read-only [`RegistryView`].
#[derive(Debug, Clone, Default)]
pub struct TransactionRegistry {
    entries: Arc<DashMap<TransactionId, TransactionEntry>>,
}

impl TransactionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new pending entry under `candidate`, or under a fresh id when a
    /// registered transaction already holds it.
    pub(crate) fn register(
        &self,
        candidate: TransactionId,
        method: &str,
        path: &str,
        started_at: Instant,
    ) -> TransactionEntry {
        let mut id = candidate;
        loop {
            if let Entry::Vacant(slot) = self.entries.entry(id) {
                let entry = TransactionEntry {
                    id,
                    method: method.to_string(),
                    path: path.to_string(),
                    started_at,
                };
                slot.insert(entry.clone());
                return entry;
            }
            id = TransactionId::new();
        }
    }

    pub(crate) fn remove(&self, id: &TransactionId) -> Option<TransactionEntry> {
        self.entries.remove(id).map(|(_, entry)| entry)
    }

    #[must_use]
    pub fn view(&self) -> RegistryView {
        RegistryView {
            entries: Arc::clone(&self.entries),
        }
    }
}

/// Read-only window on a [`TransactionRegistry`] for health and diagnostics endpoints.
#[derive(Debug, Clone)]
pub struct RegistryView {
    entries: Arc<DashMap<TransactionId, TransactionEntry>>,
}

impl RegistryView {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &TransactionId) -> bool {
        self.entries.contains_key(id)
    }

    /// Ids of pending transactions, oldest first.
    #[must_use]
    pub fn ids(&self) -> Vec<TransactionId> {
        let mut ids: Vec<TransactionId> = self.entries.iter().map(|e| *e.key()).collect();
        ids.sort();
        ids
    }

    /// Copy of every pending entry, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TransactionEntry> {
        let mut entries: Vec<TransactionEntry> =
            self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by_key(|e| e.started_at);
        entries
    }
}
