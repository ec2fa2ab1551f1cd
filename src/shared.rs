//! Shared documents for hosts.
//!
//! [`SharedDocument`] puts a document behind a `parking_lot::RwLock` so
//! several threads can read it while one merges into it. [`DocumentRegistry`]
//! owns any number of them by [`DocumentId`] for hosts that only hold ids.

use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::ParseError;
use crate::id::DocumentId;
use crate::node::Document;

// =============================================================================
// SharedDocument
// =============================================================================

/// Thread-safe handle to one document.
///
/// Clones share the same document.
#[derive(Debug, Clone)]
pub struct SharedDocument {
    id: DocumentId,
    inner: Arc<RwLock<Document>>,
}

impl SharedDocument {
    /// Wrap a document.
    pub fn new(doc: Document) -> Self {
        Self {
            id: doc.id(),
            inner: Arc::new(RwLock::new(doc)),
        }
    }

    /// Id of the wrapped document.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Execute a closure with read access to the document.
    pub fn with_read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Execute a closure with write access to the document.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }
}

// =============================================================================
// DocumentRegistry
// =============================================================================

/// Documents owned by id.
///
/// Destroying a document drops the registry's reference; clones of its
/// [`SharedDocument`] handed out earlier keep it alive until they drop.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    inner: Arc<RwLock<FxHashMap<DocumentId, SharedDocument>>>,
}

impl DocumentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document holding only a root.
    pub fn create_empty(&self) -> DocumentId {
        self.insert(Document::empty())
    }

    /// Parse `input` and register the result.
    pub fn parse(&self, input: &str) -> Result<DocumentId, ParseError> {
        Document::parse(input).map(|doc| self.insert(doc))
    }

    /// Register an existing document.
    pub fn insert(&self, doc: Document) -> DocumentId {
        let shared = SharedDocument::new(doc);
        let id = shared.id();
        self.inner.write().insert(id, shared);
        debug!("registered {id}");
        id
    }

    /// Look up a document.
    pub fn get(&self, id: DocumentId) -> Option<SharedDocument> {
        self.inner.read().get(&id).cloned()
    }

    /// Remove a document, returning whether it was registered.
    pub fn destroy(&self, id: DocumentId) -> bool {
        let removed = self.inner.write().remove(&id).is_some();
        if removed {
            debug!("destroyed {id}");
        }
        removed
    }

    /// Whether a document with this id is registered.
    pub fn contains(&self, id: DocumentId) -> bool {
        self.inner.read().contains_key(&id)
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether no documents are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Change;

    #[test]
    fn test_registry_lifecycle() {
        let registry = DocumentRegistry::new();
        assert!(registry.is_empty());

        let empty = registry.create_empty();
        let parsed = registry.parse("<a><b/></a>").unwrap();
        assert_ne!(empty, parsed);
        assert_eq!(registry.len(), 2);

        let doc = registry.get(parsed).unwrap();
        assert_eq!(doc.id(), parsed);
        assert_eq!(doc.with_read(|d| d.node_count()), 3);

        assert!(registry.destroy(parsed));
        assert!(!registry.destroy(parsed));
        assert!(!registry.contains(parsed));
        assert!(registry.get(parsed).is_none());

        // Handed-out clones outlive destroy.
        assert_eq!(doc.with_read(|d| d.to_string()), "<a>\n    <b />\n</a>");
    }

    #[test]
    fn test_parse_error_registers_nothing() {
        let registry = DocumentRegistry::new();
        assert!(registry.parse("<a>").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_shared_merge_across_threads() {
        let shared = SharedDocument::new(Document::parse("<a/>").unwrap());
        let incoming = Document::parse("<a>hi</a>").unwrap();

        let writer = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                let mut changes: Vec<Change> = Vec::new();
                shared.with_write(|doc| doc.merge(&incoming, &mut changes)).unwrap();
                changes.len()
            })
        };
        assert_eq!(writer.join().unwrap(), 1);
        assert_eq!(shared.with_read(|d| d.to_string()), "<a>\n    hi\n</a>");
    }
}
