//! Process-lifetime store of parsed uploads
//!
//! Uploads are parsed once and kept in memory, keyed by their sanitized
//! filename, until the process exits or the same filename is uploaded again.

use crate::types::UploadedTable;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Keyed store of parsed uploads
///
/// Implementations hold their lock only for the duration of a single call.
/// Readers receive an `Arc` snapshot, so a re-upload never changes a table a
/// pipeline run is already reading.
pub trait UploadStore: Send + Sync {
    /// Look up a parsed upload by filename
    fn get(&self, filename: &str) -> Option<Arc<UploadedTable>>;

    /// Store a parsed upload, replacing any previous upload with the same filename
    fn put(&self, table: UploadedTable) -> Arc<UploadedTable>;

    /// Number of stored uploads
    fn len(&self) -> usize;

    /// Whether the store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every stored upload
    fn clear(&self);
}

/// In-memory [`UploadStore`] backed by a `RwLock<HashMap>`
#[derive(Debug, Default)]
pub struct InMemoryUploadRegistry {
    tables: RwLock<HashMap<String, Arc<UploadedTable>>>,
}

impl InMemoryUploadRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }
}

impl UploadStore for InMemoryUploadRegistry {
    fn get(&self, filename: &str) -> Option<Arc<UploadedTable>> {
        // A poisoned lock still guards a consistent map: writers only insert or clear
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables.get(filename).cloned()
    }

    fn put(&self, table: UploadedTable) -> Arc<UploadedTable> {
        let table = Arc::new(table);
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if tables
            .insert(table.filename.clone(), Arc::clone(&table))
            .is_some()
        {
            tracing::debug!(filename = %table.filename, "Replaced existing upload");
        }
        table
    }

    fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn clear(&self) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
