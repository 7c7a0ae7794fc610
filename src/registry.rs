//! Per-document detector registry.
//!
//! There is at most one navigation detector per document. Rather than a
//! hidden slot on a global window object, the mapping is an explicit value
//! the embedding application owns and tears down.

use std::collections::HashMap;

use crate::config::NavigationConfig;
use crate::nav::NavigationDetector;
use crate::page::Document;

/// Maps document identity to its single [`NavigationDetector`].
#[derive(Default)]
pub struct DetectorRegistry {
    entries: HashMap<u64, NavigationDetector>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the document's detector, constructing it with default
    /// configuration on first use.
    pub fn create_if_missing(&mut self, doc: &Document) -> NavigationDetector {
        self.create_if_missing_with(doc, NavigationConfig::default())
    }

    /// Returns the document's detector, constructing it with the given
    /// configuration on first use. The configuration of an already existing
    /// detector is not changed.
    pub fn create_if_missing_with(
        &mut self,
        doc: &Document,
        config: NavigationConfig,
    ) -> NavigationDetector {
        self.entries
            .entry(doc.id())
            .or_insert_with(|| {
                log::debug!("creating navigation detector for document {}", doc.id());
                NavigationDetector::with_config(doc, config)
            })
            .clone()
    }

    pub fn get(&self, doc: &Document) -> Option<NavigationDetector> {
        self.entries.get(&doc.id()).cloned()
    }

    /// Disposes and removes the document's detector. Returns whether an
    /// entry existed.
    pub fn dispose(&mut self, doc: &Document) -> bool {
        match self.entries.remove(&doc.id()) {
            Some(detector) => {
                detector.dispose();
                true
            }
            None => false,
        }
    }

    /// Page-level teardown: disposes every detector and empties the map.
    pub fn dispose_all(&mut self) {
        for (_, detector) in self.entries.drain() {
            detector.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
