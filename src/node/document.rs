//! Document type and tree edit primitives
//!
//! [`Document`] is the public face: navigation, queries and the two
//! reconciliation entry points. [`Tree`] holds the storage (node arena plus
//! attribute store) and the edit primitives every mutation goes through.
//! `Tree` is `Clone` so a batch of edits can be staged on a copy and only
//! committed once all of them succeeded.

use std::mem;

use log::{debug, warn};

use crate::attr::{Attribute, AttributeStore};
use crate::change::{Change, ChangeHandler};
use crate::diff;
use crate::error::{DomError, DomResult, ParseError, PatchError};
use crate::fragment::Root;
use crate::hash::StableHasher;
use crate::id::{AttributeRef, DocumentId, NodeRef};
use crate::parser::{self, ParseOptions};
use crate::patch::{self, Patch};

use super::arena::{ChildList, NodeArena};
use super::{AttributeList, Element, NodeData, NodeTree, TreeNode};

// =============================================================================
// Tree
// =============================================================================

/// Node arena and attribute store of one document
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    pub(crate) nodes: NodeArena,
    pub(crate) attrs: AttributeStore,
}

impl Tree {
    pub(crate) fn new() -> Self {
        let doc = DocumentId::next();
        Self {
            nodes: NodeArena::new(doc),
            attrs: AttributeStore::new(doc),
        }
    }

    #[inline]
    pub(crate) fn root(&self) -> NodeRef {
        self.nodes.root()
    }

    fn check_container(&self, parent: NodeRef) -> DomResult<()> {
        if self.nodes.get(parent)?.can_have_children() {
            Ok(())
        } else {
            Err(DomError::NotAContainer(parent))
        }
    }

    fn link(&mut self, parent: NodeRef, data: NodeData) -> DomResult<NodeRef> {
        let child = self.nodes.allocate(data, parent)?;
        self.nodes.entry_mut(parent)?.children.push(child);
        Ok(child)
    }

    /// Append a new element as the last child of `parent`.
    pub(crate) fn append_element(
        &mut self,
        parent: NodeRef,
        namespace: impl Into<compact_str::CompactString>,
        tag: impl Into<compact_str::CompactString>,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> DomResult<NodeRef> {
        self.check_container(parent)?;
        let attributes = attributes
            .into_iter()
            .map(|attr| self.attrs.allocate(attr))
            .collect();
        self.link(
            parent,
            NodeData::Element(Element {
                namespace: namespace.into(),
                tag: tag.into(),
                attributes,
            }),
        )
    }

    /// Append a new leaf as the last child of `parent`.
    pub(crate) fn append_leaf(&mut self, parent: NodeRef, text: impl Into<String>) -> DomResult<NodeRef> {
        self.link(parent, NodeData::Leaf(text.into()))
    }

    fn append_node(&mut self, parent: NodeRef, node: &TreeNode) -> DomResult<NodeRef> {
        match node {
            TreeNode::Element {
                namespace,
                tag,
                attributes,
                ..
            } => self.append_element(parent, namespace.clone(), tag.clone(), attributes.iter().cloned()),
            TreeNode::Leaf { text } => self.append_leaf(parent, text.clone()),
        }
    }

    /// Build `tree` and append it as the last child of `parent`.
    pub(crate) fn append_tree(&mut self, parent: NodeRef, tree: &NodeTree) -> DomResult<NodeRef> {
        let (top, rest) = tree
            .nodes()
            .split_first()
            .ok_or_else(|| DomError::corrupted("empty subtree"))?;
        let node = self.append_node(parent, top)?;
        self.build_children(node, top.child_count(), rest)?;
        Ok(node)
    }

    /// Append the pre-order `nodes` below `node`, which announced `count`
    /// direct children.
    fn build_children(&mut self, node: NodeRef, count: usize, nodes: &[TreeNode]) -> DomResult<()> {
        let mut nodes = nodes.iter();
        let mut open = vec![(node, count)];
        while let Some(top) = open.last_mut() {
            if top.1 == 0 {
                open.pop();
                continue;
            }
            top.1 -= 1;
            let parent = top.0;
            let next = nodes
                .next()
                .ok_or_else(|| DomError::corrupted(format!("subtree below {node:?} is truncated")))?;
            let child = self.append_node(parent, next)?;
            if next.child_count() > 0 {
                open.push((child, next.child_count()));
            }
        }
        Ok(())
    }

    /// Detach `node` from its parent and free its whole subtree.
    ///
    /// Returns the former parent.
    pub(crate) fn remove(&mut self, node: NodeRef) -> DomResult<NodeRef> {
        if node == self.root() {
            return Err(DomError::RootRemoval);
        }
        let parent = self
            .nodes
            .parent(node)?
            .ok_or_else(|| DomError::corrupted(format!("{node:?} has no parent")))?;
        let siblings = self.nodes.children(parent)?;
        let remaining: ChildList = siblings.iter().copied().filter(|child| *child != node).collect();
        if remaining.len() == siblings.len() {
            return Err(DomError::corrupted(format!("{node:?} missing from its parent")));
        }
        self.nodes.set_children(parent, remaining)?;
        self.free_subtree(node)?;
        Ok(parent)
    }

    /// Swap the content of `node` for `tree`, keeping the handle of `node`.
    ///
    /// Old descendants and attributes are freed before the new content is
    /// allocated. Returns the parent of `node`.
    pub(crate) fn replace(&mut self, node: NodeRef, tree: &NodeTree) -> DomResult<NodeRef> {
        if node == self.root() {
            return Err(DomError::RootRemoval);
        }
        let entry = self.nodes.entry_mut(node)?;
        let parent = entry
            .parent
            .ok_or_else(|| DomError::corrupted(format!("{node:?} has no parent")))?;
        let old_children = mem::take(&mut entry.children);
        let old_attributes = match &mut entry.data {
            NodeData::Element(elem) => mem::take(&mut elem.attributes),
            _ => AttributeList::new(),
        };

        for attr in old_attributes {
            self.attrs.free(attr)?;
        }
        for child in old_children {
            self.free_subtree(child)?;
        }

        let (top, rest) = tree
            .nodes()
            .split_first()
            .ok_or_else(|| DomError::corrupted("empty subtree"))?;
        let data = match top {
            TreeNode::Element {
                namespace,
                tag,
                attributes,
                ..
            } => NodeData::Element(Element {
                namespace: namespace.clone(),
                tag: tag.clone(),
                attributes: attributes
                    .iter()
                    .map(|attr| self.attrs.allocate(attr.clone()))
                    .collect(),
            }),
            TreeNode::Leaf { text } => NodeData::Leaf(text.clone()),
        };
        self.nodes.entry_mut(node)?.data = data;
        self.build_children(node, top.child_count(), rest)?;
        Ok(parent)
    }

    /// Rewrite the attribute list of an element.
    ///
    /// Existing attribute slots are reused position by position; surplus
    /// slots are freed and missing ones allocated.
    pub(crate) fn set_attributes(&mut self, node: NodeRef, attributes: &[Attribute]) -> DomResult<()> {
        let current = match self.nodes.get(node)? {
            NodeData::Element(elem) => elem.attributes.clone(),
            _ => return Err(DomError::NotAnElement(node)),
        };

        let mut next = AttributeList::with_capacity(attributes.len());
        for (i, attribute) in attributes.iter().enumerate() {
            match current.get(i) {
                Some(&handle) => {
                    self.attrs.update(handle, attribute.clone())?;
                    next.push(handle);
                }
                None => next.push(self.attrs.allocate(attribute.clone())),
            }
        }
        for &handle in current.iter().skip(attributes.len()) {
            self.attrs.free(handle)?;
        }

        if let NodeData::Element(elem) = &mut self.nodes.entry_mut(node)?.data {
            elem.attributes = next;
        }
        Ok(())
    }

    /// Overwrite the text of a leaf.
    pub(crate) fn set_text(&mut self, node: NodeRef, text: &str) -> DomResult<()> {
        match &mut self.nodes.entry_mut(node)?.data {
            NodeData::Leaf(current) => {
                current.clear();
                current.push_str(text);
                Ok(())
            }
            _ => Err(DomError::NotALeaf(node)),
        }
    }

    fn free_subtree(&mut self, node: NodeRef) -> DomResult<()> {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let entry = self.nodes.free(current)?;
            if let NodeData::Element(elem) = entry.data {
                for attr in elem.attributes {
                    self.attrs.free(attr)?;
                }
            }
            stack.extend(entry.children.into_iter().rev());
        }
        Ok(())
    }
}

// =============================================================================
// Document
// =============================================================================

/// A markup tree with handle-addressed nodes
///
/// # Handles
///
/// Every [`NodeRef`] and [`AttributeRef`] is bound to the document that issued
/// it. Passing a handle from another document, or one whose node was removed,
/// fails with [`DomError::InvalidHandle`] / [`DomError::InvalidAttribute`].
///
/// # Borrowed views
///
/// [`children`](Self::children) and [`attribute_refs`](Self::attribute_refs)
/// return slices borrowed from the document, so they cannot outlive the next
/// mutation.
#[derive(Debug)]
pub struct Document {
    pub(crate) tree: Tree,
    pub(crate) fragment: Option<Root>,
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl Document {
    /// Create a document holding only a root
    pub fn empty() -> Self {
        Self {
            tree: Tree::new(),
            fragment: None,
        }
    }

    /// Parse markup with the default options
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parser::parse(input, &ParseOptions::default())
    }

    /// Parse markup with explicit options
    pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Self, ParseError> {
        parser::parse(input, options)
    }

    /// Identity of this document; carried by every handle it issues
    #[inline]
    pub fn id(&self) -> DocumentId {
        self.tree.nodes.document()
    }

    /// The root node
    #[inline]
    pub fn root(&self) -> NodeRef {
        self.tree.root()
    }

    /// Number of live nodes, root included
    pub fn node_count(&self) -> usize {
        self.tree.nodes.len()
    }

    /// Number of live attributes
    pub fn attribute_count(&self) -> usize {
        self.tree.attrs.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    /// Payload of a node
    #[inline]
    pub fn get(&self, node: NodeRef) -> DomResult<&NodeData> {
        self.tree.nodes.get(node)
    }

    /// Ordered children of a node (empty for leaves)
    #[inline]
    pub fn children(&self, node: NodeRef) -> DomResult<&[NodeRef]> {
        self.tree.nodes.children(node)
    }

    /// Parent of a node; `None` only for the root
    #[inline]
    pub fn parent(&self, node: NodeRef) -> DomResult<Option<NodeRef>> {
        self.tree.nodes.parent(node)
    }

    /// Ordered attribute handles of a node (empty for root and leaves)
    pub fn attribute_refs(&self, node: NodeRef) -> DomResult<&[AttributeRef]> {
        Ok(match self.get(node)? {
            NodeData::Element(elem) => elem.attributes.as_slice(),
            _ => &[],
        })
    }

    /// Ordered attributes of a node
    pub fn attributes(&self, node: NodeRef) -> DomResult<Vec<&Attribute>> {
        self.attribute_refs(node)?
            .iter()
            .map(|attr| self.tree.attrs.get(*attr))
            .collect()
    }

    /// Attribute behind a handle
    #[inline]
    pub fn attribute(&self, attr: AttributeRef) -> DomResult<&Attribute> {
        self.tree.attrs.get(attr)
    }

    /// First attribute of `node` addressed by `name` (`ns:name` or `name`)
    pub fn get_attribute_by_name(&self, node: NodeRef, name: &str) -> DomResult<Option<&Attribute>> {
        for attr in self.attribute_refs(node)? {
            let attribute = self.tree.attrs.get(*attr)?;
            if attribute.matches_name(name) {
                return Ok(Some(attribute));
            }
        }
        Ok(None)
    }

    /// Pre-order walk of every node below `node` (excluding `node` itself)
    pub fn descendants(&self, node: NodeRef) -> DomResult<Descendants<'_>> {
        let stack = self.children(node)?.iter().rev().copied().collect();
        Ok(Descendants { doc: self, stack })
    }

    /// Pre-order walk of every node below the root
    pub(crate) fn walk(&self) -> Descendants<'_> {
        let stack = self
            .children(self.root())
            .map(|children| children.iter().rev().copied().collect())
            .unwrap_or_default();
        Descendants { doc: self, stack }
    }

    /// Every non-root node whose payload matches, in document order
    pub fn find_all<F>(&self, predicate: F) -> Vec<NodeRef>
    where
        F: Fn(&NodeData) -> bool,
    {
        self.walk()
            .filter(|node| self.get(*node).is_ok_and(&predicate))
            .collect()
    }

    /// Copy a subtree out into an owned, handle-free [`NodeTree`]
    ///
    /// The root has no `NodeTree` form and yields [`DomError::NotAnElement`].
    pub fn subtree(&self, node: NodeRef) -> DomResult<NodeTree> {
        if self.get(node)?.is_root() {
            return Err(DomError::NotAnElement(node));
        }
        let nodes = std::iter::once(node)
            .chain(self.descendants(node)?)
            .map(|current| -> DomResult<TreeNode> {
                let children = self.children(current)?.len();
                Ok(match self.get(current)? {
                    NodeData::Element(elem) => TreeNode::Element {
                        namespace: elem.namespace.clone(),
                        tag: elem.tag.clone(),
                        attributes: self.attributes(current)?.into_iter().cloned().collect(),
                        children,
                    },
                    NodeData::Leaf(text) => TreeNode::Leaf { text: text.clone() },
                    NodeData::Root => return Err(DomError::corrupted(format!("root below {node:?}"))),
                })
            })
            .collect::<DomResult<_>>()?;
        Ok(NodeTree { nodes })
    }

    /// Structural hash of a subtree
    ///
    /// Depends only on shape, names, attributes and text, never on handles,
    /// so tree-equivalent subtrees of different documents hash equally.
    pub fn fingerprint(&self, node: NodeRef) -> DomResult<u64> {
        let mut hasher = StableHasher::new();
        for current in std::iter::once(node).chain(self.descendants(node)?) {
            hasher = match self.get(current)? {
                NodeData::Root => hasher.update_tag(0),
                NodeData::Element(elem) => {
                    let mut hasher = hasher
                        .update_tag(1)
                        .update_str(&elem.namespace)
                        .update_str(&elem.tag)
                        .update_usize(elem.attributes.len());
                    for attr in &elem.attributes {
                        let attr = self.attribute(*attr)?;
                        hasher = hasher
                            .update_str(&attr.namespace)
                            .update_str(&attr.name)
                            .update_str(&attr.value);
                    }
                    hasher
                }
                NodeData::Leaf(text) => hasher.update_tag(2).update_str(text),
            };
            hasher = hasher.update_usize(self.children(current)?.len());
        }
        Ok(hasher.finish())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconciliation
    // ─────────────────────────────────────────────────────────────────────────

    /// Mutate this document until it is equivalent to `incoming`
    ///
    /// Nodes are aligned by position. Matching nodes keep their handles,
    /// and `handler` receives one [`Change`] per edit in document order.
    /// Fails only if this document's internal state is inconsistent, in which
    /// case it is left untouched.
    pub fn merge<H>(&mut self, incoming: &Document, handler: &mut H) -> DomResult<()>
    where
        H: ChangeHandler + ?Sized,
    {
        let diff = diff::diff(self, incoming)?;
        debug!("merge {} <- {}: {}", self.id(), incoming.id(), diff.stats);
        let changes = self.commit(&diff.patches).map_err(|err| match err {
            PatchError::Dom { source, .. } => source,
            other => DomError::corrupted(other.to_string()),
        })?;
        changes.into_iter().for_each(|change| handler.handle(change));
        Ok(())
    }

    /// Decode a JSON structural patch and apply it
    ///
    /// All-or-nothing: on any error the document is unchanged and `handler`
    /// is never called.
    pub fn apply_patch<H>(&mut self, bytes: &[u8], handler: &mut H) -> Result<(), PatchError>
    where
        H: ChangeHandler + ?Sized,
    {
        let patches = patch::decode(bytes).inspect_err(|err| {
            warn!("rejected patch for {}: {err}", self.id());
        })?;
        self.apply_checked(&patches, handler)
    }

    /// Apply already-decoded patch edits, with the same guarantees as
    /// [`apply_patch`](Self::apply_patch)
    ///
    /// Names are checked with [`patch::validate`] first.
    pub fn apply_patches<H>(&mut self, patches: &[Patch], handler: &mut H) -> Result<(), PatchError>
    where
        H: ChangeHandler + ?Sized,
    {
        patch::validate(patches).inspect_err(|err| {
            warn!("rejected patch for {}: {err}", self.id());
        })?;
        self.apply_checked(patches, handler)
    }

    fn apply_checked<H>(&mut self, patches: &[Patch], handler: &mut H) -> Result<(), PatchError>
    where
        H: ChangeHandler + ?Sized,
    {
        let changes = self.commit(patches).inspect_err(|err| {
            warn!("rejected patch for {}: {err}", self.id());
        })?;
        debug!("applied {} patch edits to {}", patches.len(), self.id());
        changes.into_iter().for_each(|change| handler.handle(change));
        Ok(())
    }

    /// Apply edits to a staged copy and swap it in once every edit succeeded.
    pub(crate) fn commit(&mut self, patches: &[Patch]) -> Result<Vec<Change>, PatchError> {
        if patches.is_empty() {
            return Ok(Vec::new());
        }
        let mut staged = self.tree.clone();
        let changes = patch::apply(&mut staged, patches)?;
        self.tree = staged;
        Ok(changes)
    }
}

// =============================================================================
// Descendants
// =============================================================================

/// Pre-order iterator over node handles
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeRef>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let node = self.stack.pop()?;
        if let Ok(children) = self.doc.children(node) {
            self.stack.extend(children.iter().rev().copied());
        }
        Some(node)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::parse(r##"<a x="1"><b/>text<svg:c xlink:href="#h"/></a>"##).unwrap()
    }

    fn first_child(doc: &Document, node: NodeRef) -> NodeRef {
        doc.children(node).unwrap()[0]
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::empty();
        let root = doc.root();
        assert!(doc.get(root).unwrap().is_root());
        assert!(doc.children(root).unwrap().is_empty());
        assert_eq!(doc.parent(root).unwrap(), None);
        assert!(doc.attributes(root).unwrap().is_empty());
        assert_eq!(doc.node_count(), 1);
    }

    #[test]
    fn test_parent_child_consistency() {
        let doc = sample();
        for node in doc.descendants(doc.root()).unwrap() {
            let parent = doc.parent(node).unwrap().unwrap();
            assert!(doc.children(parent).unwrap().contains(&node));
        }
        assert_eq!(doc.descendants(doc.root()).unwrap().count(), 4);
    }

    #[test]
    fn test_attribute_lookup() {
        let doc = sample();
        let a = first_child(&doc, doc.root());
        assert_eq!(doc.get_attribute_by_name(a, "x").unwrap().unwrap().value, "1");
        assert!(doc.get_attribute_by_name(a, "y").unwrap().is_none());

        let c = doc.children(a).unwrap()[2];
        let href = doc.get_attribute_by_name(c, "xlink:href").unwrap().unwrap();
        assert_eq!(href.namespace, "xlink");
        assert_eq!(doc.get(c).unwrap().as_element().unwrap().qualified_name(), "svg:c");
    }

    #[test]
    fn test_find_all_in_document_order() {
        let doc = sample();
        let elements = doc.find_all(NodeData::is_element);
        let tags: Vec<_> = elements
            .iter()
            .map(|node| doc.get(*node).unwrap().as_element().unwrap().tag.to_string())
            .collect();
        assert_eq!(tags, ["a", "b", "c"]);
        assert_eq!(doc.find_all(NodeData::is_leaf).len(), 1);
    }

    #[test]
    fn test_remove_frees_subtree() {
        let mut doc = sample();
        let a = first_child(&doc, doc.root());
        let b = first_child(&doc, a);
        let x = doc.attribute_refs(a).unwrap()[0];

        let parent = doc.tree.remove(a).unwrap();
        assert_eq!(parent, doc.root());
        assert_eq!(doc.get(a).unwrap_err(), DomError::InvalidHandle(a));
        assert_eq!(doc.children(b).unwrap_err(), DomError::InvalidHandle(b));
        assert_eq!(doc.attribute(x).unwrap_err(), DomError::InvalidAttribute(x));
        assert_eq!(doc.node_count(), 1);
        assert_eq!(doc.attribute_count(), 0);
    }

    #[test]
    fn test_root_cannot_be_removed_or_replaced() {
        let mut doc = sample();
        let root = doc.root();
        assert_eq!(doc.tree.remove(root).unwrap_err(), DomError::RootRemoval);
        assert_eq!(
            doc.tree.replace(root, &NodeTree::leaf("x")).unwrap_err(),
            DomError::RootRemoval
        );
    }

    #[test]
    fn test_replace_keeps_top_handle() {
        let mut doc = sample();
        let a = first_child(&doc, doc.root());
        let b = first_child(&doc, a);

        let tree = NodeTree::element("p").with_child(NodeTree::leaf("new"));
        doc.tree.replace(a, &tree).unwrap();

        assert_eq!(first_child(&doc, doc.root()), a);
        assert_eq!(doc.get(a).unwrap().as_element().unwrap().tag, "p");
        assert!(doc.attribute_refs(a).unwrap().is_empty());
        assert!(doc.get(b).is_err());
        assert_eq!(doc.subtree(a).unwrap(), tree);
    }

    #[test]
    fn test_set_attributes_reuses_slots() {
        let mut doc = Document::parse(r#"<a x="1" y="2" z="3"/>"#).unwrap();
        let a = first_child(&doc, doc.root());
        let before = doc.attribute_refs(a).unwrap().to_vec();

        doc.tree
            .set_attributes(a, &[Attribute::new("x", "9"), Attribute::new("w", "0")])
            .unwrap();
        let after = doc.attribute_refs(a).unwrap().to_vec();
        assert_eq!(after, before[..2]);
        assert_eq!(doc.attribute(after[1]).unwrap(), &Attribute::new("w", "0"));
        assert!(doc.attribute(before[2]).is_err());
    }

    #[test]
    fn test_leaf_edits_are_checked() {
        let mut doc = sample();
        let a = first_child(&doc, doc.root());
        let text = doc.children(a).unwrap()[1];
        assert_eq!(doc.tree.set_text(a, "x").unwrap_err(), DomError::NotALeaf(a));
        assert_eq!(
            doc.tree.set_attributes(text, &[]).unwrap_err(),
            DomError::NotAnElement(text)
        );
        assert_eq!(
            doc.tree.append_leaf(text, "child").unwrap_err(),
            DomError::NotAContainer(text)
        );
    }

    #[test]
    fn test_fingerprint_ignores_handles() {
        let a = sample();
        let b = sample();
        assert_eq!(a.fingerprint(a.root()).unwrap(), b.fingerprint(b.root()).unwrap());

        let c = Document::parse(r##"<a x="2"><b/>text<svg:c xlink:href="#h"/></a>"##).unwrap();
        assert_ne!(a.fingerprint(a.root()).unwrap(), c.fingerprint(c.root()).unwrap());
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let a = sample();
        let b = sample();
        let node = first_child(&b, b.root());
        assert_eq!(a.get(node).unwrap_err(), DomError::InvalidHandle(node));
        assert!(a.attributes(node).is_err());
    }

    #[test]
    fn test_apply_patches_checks_names() {
        let mut doc = sample();
        let before = doc.to_string();
        let patches = [
            Patch::SetText {
                path: patch::NodePath::from_slice(&[0, 1]),
                text: "changed".into(),
            },
            Patch::Append {
                parent: patch::NodePath::from_slice(&[0]),
                node: NodeTree::element("b").with_attribute(Attribute::new("c x\"y", "1")),
            },
        ];
        let err = doc.apply_patches(&patches, &mut |_: Change| {}).unwrap_err();
        assert!(matches!(err, PatchError::Decode(_)), "{err}");
        assert_eq!(doc.to_string(), before);
    }
}
