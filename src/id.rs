//! Handle types for document-owned storage
//!
//! Every node and attribute lives in a slot of an arena owned by exactly one
//! [`Document`](crate::Document). Callers refer to them through small `Copy`
//! handles:
//!
//! - **DocumentId**: process-unique identity of the issuing document
//! - **Slot index**: position in the arena, reused after the slot is freed
//! - **Generation**: bumped every time the slot is freed
//!
//! A handle is only accepted by the document whose id it carries, and only
//! while its generation matches the slot. This turns "foreign handle" and
//! "stale handle after removal" into detectable errors instead of silently
//! reading whatever node currently occupies the slot.
//!
//! # Slot reuse
//!
//! Freed slots go to a free list and are handed out again by later adds.
//! A reused slot has the same [`NodeRef::index`] as the node it replaced,
//! but a different generation, so old handles keep failing.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

// =============================================================================
// DocumentId
// =============================================================================

static NEXT_DOCUMENT_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique identity of a document
///
/// Allocated once when a document is created and never reused within the
/// process (until the counter wraps after 2^32 documents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u32);

impl DocumentId {
    /// Allocate a fresh id
    pub(crate) fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u32 value
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc{}", self.0)
    }
}

// =============================================================================
// NodeRef
// =============================================================================

/// Handle to a node in a document
///
/// # Memory Layout
///
/// - 12 bytes, `Copy`, no heap allocation
/// - Equality compares document, slot and generation
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct NodeRef {
    pub(crate) doc: DocumentId,
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeRef {
    #[inline]
    pub(crate) const fn new(doc: DocumentId, index: u32, generation: u32) -> Self {
        Self { doc, index, generation }
    }

    /// Slot index inside the issuing document
    ///
    /// This is the small integer hosts usually key their own node tables by.
    /// It is only unique among the nodes that are alive at the same time.
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Document that issued this handle
    #[inline]
    pub const fn document(&self) -> DocumentId {
        self.doc
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}v{}@{}", self.index, self.generation, self.doc)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.index)
    }
}

// =============================================================================
// AttributeRef
// =============================================================================

/// Handle to an attribute in a document's attribute store
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct AttributeRef {
    pub(crate) doc: DocumentId,
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl AttributeRef {
    #[inline]
    pub(crate) const fn new(doc: DocumentId, index: u32, generation: u32) -> Self {
        Self { doc, index, generation }
    }

    /// Slot index inside the issuing document's attribute store
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Document that issued this handle
    #[inline]
    pub const fn document(&self) -> DocumentId {
        self.doc
    }
}

impl fmt::Debug for AttributeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attr{}v{}@{}", self.index, self.generation, self.doc)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ids_are_unique() {
        let a = DocumentId::next();
        let b = DocumentId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_node_ref_equality_includes_generation() {
        let doc = DocumentId::next();
        let first = NodeRef::new(doc, 3, 0);
        let reused = NodeRef::new(doc, 3, 1);
        assert_eq!(first.index(), reused.index());
        assert_ne!(first, reused);
    }

    #[test]
    fn test_node_ref_equality_includes_document() {
        let a = NodeRef::new(DocumentId::next(), 0, 0);
        let b = NodeRef::new(DocumentId::next(), 0, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_format() {
        let doc = DocumentId(7);
        let node = NodeRef::new(doc, 12, 2);
        assert_eq!(format!("{}", node), "node12");
        assert_eq!(format!("{:?}", node), "node12v2@doc7");
    }
}
