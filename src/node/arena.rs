//! Generation-stamped slot storage and the node arena
//!
//! [`Slots`] is the shared storage primitive behind both the node arena and
//! the attribute store: a vector of slots, a LIFO free list and a per-slot
//! generation counter. [`NodeArena`] layers the tree relation on top of it:
//! every live node knows its parent and its ordered children.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::error::{DomError, DomResult};
use crate::id::{DocumentId, NodeRef};

use super::NodeData;

// =============================================================================
// Slots<T>
// =============================================================================

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Vector of reusable, generation-stamped slots
///
/// Freed slots are reused last-in first-out. Allocation order is therefore a
/// pure function of the sequence of inserts and removes, which keeps slot
/// indices reproducible between two documents that go through the same edits.
#[derive(Debug, Clone)]
pub(crate) struct Slots<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }
}

impl<T> Slots<T> {
    /// Store a value, returning `(index, generation)`.
    pub(crate) fn insert(&mut self, value: T) -> (u32, u32) {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return (index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        (index, 0)
    }

    #[inline]
    pub(crate) fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.slots
            .get(index as usize)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_ref())
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        self.slots
            .get_mut(index as usize)
            .filter(|slot| slot.generation == generation)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Take the value out and retire the slot.
    ///
    /// The generation is bumped so every handle issued for this slot stops
    /// resolving, including after the slot is handed out again.
    pub(crate) fn remove(&mut self, index: u32, generation: u32) -> Option<T> {
        let slot = self.slots.get_mut(index as usize)?;
        if slot.generation != generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.live -= 1;
        Some(value)
    }

    /// Number of occupied slots
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }
}

// =============================================================================
// NodeArena
// =============================================================================

/// Children list inline capacity; most elements have few children
pub(crate) type ChildList = SmallVec<[NodeRef; 4]>;

#[derive(Debug, Clone)]
pub(crate) struct NodeEntry {
    pub(crate) data: NodeData,
    pub(crate) parent: Option<NodeRef>,
    pub(crate) children: ChildList,
}

/// All nodes of one document
///
/// Slot 0 always holds the root, which is created with the arena and can
/// never be freed.
#[derive(Debug, Clone)]
pub(crate) struct NodeArena {
    doc: DocumentId,
    slots: Slots<NodeEntry>,
    root: NodeRef,
}

impl NodeArena {
    pub(crate) fn new(doc: DocumentId) -> Self {
        let mut slots = Slots::default();
        let (index, generation) = slots.insert(NodeEntry {
            data: NodeData::Root,
            parent: None,
            children: ChildList::new(),
        });
        Self {
            doc,
            slots,
            root: NodeRef::new(doc, index, generation),
        }
    }

    #[inline]
    pub(crate) fn root(&self) -> NodeRef {
        self.root
    }

    #[inline]
    pub(crate) fn document(&self) -> DocumentId {
        self.doc
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn entry(&self, node: NodeRef) -> DomResult<&NodeEntry> {
        if node.doc != self.doc {
            return Err(DomError::InvalidHandle(node));
        }
        self.slots
            .get(node.index, node.generation)
            .ok_or(DomError::InvalidHandle(node))
    }

    pub(crate) fn entry_mut(&mut self, node: NodeRef) -> DomResult<&mut NodeEntry> {
        if node.doc != self.doc {
            return Err(DomError::InvalidHandle(node));
        }
        self.slots
            .get_mut(node.index, node.generation)
            .ok_or(DomError::InvalidHandle(node))
    }

    #[inline]
    pub(crate) fn get(&self, node: NodeRef) -> DomResult<&NodeData> {
        self.entry(node).map(|entry| &entry.data)
    }

    #[inline]
    pub(crate) fn children(&self, node: NodeRef) -> DomResult<&[NodeRef]> {
        self.entry(node).map(|entry| entry.children.as_slice())
    }

    #[inline]
    pub(crate) fn parent(&self, node: NodeRef) -> DomResult<Option<NodeRef>> {
        self.entry(node).map(|entry| entry.parent)
    }

    /// Allocate a detached node whose parent link already points at `parent`.
    ///
    /// The caller must push the returned handle into `parent`'s child list
    /// before handing control back to users of the document.
    pub(crate) fn allocate(&mut self, data: NodeData, parent: NodeRef) -> DomResult<NodeRef> {
        if !self.get(parent)?.can_have_children() {
            return Err(DomError::NotAContainer(parent));
        }
        let (index, generation) = self.slots.insert(NodeEntry {
            data,
            parent: Some(parent),
            children: ChildList::new(),
        });
        Ok(NodeRef::new(self.doc, index, generation))
    }

    /// Replace the ordered child list of `node`.
    ///
    /// Every listed child must be live, already linked to `node` as its
    /// parent, and listed once.
    pub(crate) fn set_children(&mut self, node: NodeRef, children: ChildList) -> DomResult<()> {
        if !self.get(node)?.can_have_children() {
            return Err(DomError::NotAContainer(node));
        }
        let mut seen = FxHashSet::default();
        for child in &children {
            if self.parent(*child)? != Some(node) {
                return Err(DomError::InconsistentChildren {
                    parent: node,
                    reason: format!("{child:?} is not linked to this parent"),
                });
            }
            if !seen.insert(*child) {
                return Err(DomError::InconsistentChildren {
                    parent: node,
                    reason: format!("{child:?} is listed twice"),
                });
            }
        }
        self.entry_mut(node)?.children = children;
        Ok(())
    }

    /// Free a single slot, returning its entry.
    ///
    /// Does not touch the parent's child list or the node's own children.
    pub(crate) fn free(&mut self, node: NodeRef) -> DomResult<NodeEntry> {
        if node == self.root {
            return Err(DomError::RootRemoval);
        }
        if node.doc != self.doc {
            return Err(DomError::InvalidHandle(node));
        }
        self.slots
            .remove(node.index, node.generation)
            .ok_or(DomError::InvalidHandle(node))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_reuse_bumps_generation() {
        let mut slots = Slots::default();
        let (a, ga) = slots.insert("a");
        let (b, _) = slots.insert("b");
        assert_eq!(slots.len(), 2);

        assert_eq!(slots.remove(a, ga), Some("a"));
        assert_eq!(slots.remove(a, ga), None);
        assert_eq!(slots.get(a, ga), None);

        let (c, gc) = slots.insert("c");
        assert_eq!(c, a);
        assert_eq!(gc, ga + 1);
        assert_eq!(slots.get(c, gc), Some(&"c"));
        assert_eq!(slots.get(b, 0), Some(&"b"));
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_root_cannot_be_freed() {
        let mut arena = NodeArena::new(DocumentId::next());
        let root = arena.root();
        assert_eq!(arena.free(root).unwrap_err(), DomError::RootRemoval);
        assert!(arena.get(root).unwrap().is_root());
    }

    #[test]
    fn test_double_free_is_rejected() {
        let mut arena = NodeArena::new(DocumentId::next());
        let root = arena.root();
        let leaf = arena.allocate(NodeData::Leaf("x".into()), root).unwrap();
        arena.free(leaf).unwrap();
        assert_eq!(arena.free(leaf).unwrap_err(), DomError::InvalidHandle(leaf));
    }

    #[test]
    fn test_foreign_handle_is_rejected() {
        let a = NodeArena::new(DocumentId::next());
        let b = NodeArena::new(DocumentId::next());
        assert_eq!(
            a.get(b.root()).unwrap_err(),
            DomError::InvalidHandle(b.root())
        );
    }

    #[test]
    fn test_leaf_cannot_own_children() {
        let mut arena = NodeArena::new(DocumentId::next());
        let root = arena.root();
        let leaf = arena.allocate(NodeData::Leaf("x".into()), root).unwrap();
        assert_eq!(
            arena.allocate(NodeData::Leaf("y".into()), leaf).unwrap_err(),
            DomError::NotAContainer(leaf)
        );
    }

    #[test]
    fn test_set_children_checks_parent_links() {
        let mut arena = NodeArena::new(DocumentId::next());
        let root = arena.root();
        let leaf = arena.allocate(NodeData::Leaf("x".into()), root).unwrap();
        arena.set_children(root, ChildList::from_slice(&[leaf])).unwrap();
        assert_eq!(arena.children(root).unwrap(), &[leaf]);

        let dup = ChildList::from_slice(&[leaf, leaf]);
        assert!(matches!(
            arena.set_children(root, dup),
            Err(DomError::InconsistentChildren { .. })
        ));
    }
}
