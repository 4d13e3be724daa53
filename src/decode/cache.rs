//! Per-document cache of decoded streams
//!
//! Documents never change once loaded, so entries are never invalidated;
//! the cache lives exactly as long as the document's decode service.

use std::collections::HashMap;
use std::sync::Arc;

use super::types::DecodedStream;
use crate::graph::ObjectRef;

#[derive(Default)]
pub struct StreamCache {
    entries: HashMap<ObjectRef, Arc<DecodedStream>>,
}

impl StreamCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, target: &ObjectRef) -> Option<Arc<DecodedStream>> {
        self.entries.get(target).cloned()
    }

    #[must_use]
    pub fn contains(&self, target: &ObjectRef) -> bool {
        self.entries.contains_key(target)
    }

    /// Insert a final result, returning the shared handle.
    ///
    /// If an entry already exists it wins, so every caller observes the
    /// same instance for a given object.
    pub fn insert(&mut self, stream: DecodedStream) -> Arc<DecodedStream> {
        Arc::clone(
            self.entries
                .entry(stream.target)
                .or_insert_with(|| Arc::new(stream)),
        )
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of raw byte lengths held
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.entries.values().map(|s| s.raw.len()).sum()
    }
}
