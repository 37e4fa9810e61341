//! Memoization of compiled selectors
//!
//! Compilation is a pure function of the selector string, so entries never
//! go stale and concurrent inserts of the same key are harmless. Selector
//! strings come from code rather than from document data, so the cache is
//! not bounded.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;

use crate::selector::{CompiledSelector, SelectorError};

/// Thread-safe selector string -> compiled selector map
#[derive(Debug, Default)]
pub struct SelectorCache {
    entries: DashMap<String, Arc<CompiledSelector>>,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `selector`, compiling and inserting it on a miss.
    ///
    /// Failed compilations are not cached.
    pub fn get_or_compile(&self, selector: &str) -> Result<Arc<CompiledSelector>, SelectorError> {
        if let Some(hit) = self.entries.get(selector) {
            return Ok(Arc::clone(hit.value()));
        }

        let compiled = Arc::new(CompiledSelector::new(selector)?);
        debug!("selector cache miss: {:?} -> {}", selector, compiled.xpath());

        // Another thread may have won the race; keep whichever landed first
        let entry = self.entries.entry(selector.to_string()).or_insert(compiled);
        Ok(Arc::clone(entry.value()))
    }

    /// Cached entry for `selector`, if any
    pub fn get(&self, selector: &str) -> Option<Arc<CompiledSelector>> {
        self.entries.get(selector).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
