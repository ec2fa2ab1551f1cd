//! Node payloads and detached subtrees
//!
//! A node is one of three shapes:
//!
//! - [`NodeData::Root`]: exactly one per document, never removed
//! - [`NodeData::Element`]: namespace, tag and ordered attribute handles
//! - [`NodeData::Leaf`]: a text run, never has children
//!
//! Children are not stored in the payload; they live next to it in the
//! arena and are read through [`Document::children`].
//!
//! [`NodeTree`] is the owned, handle-free form of a subtree. It is what
//! patches carry and what reconciliation builds new content from.

pub(crate) mod arena;
mod document;

pub use document::{Descendants, Document};
pub(crate) use document::Tree;

use std::borrow::Cow;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::attr::Attribute;
use crate::id::AttributeRef;

// =============================================================================
// NodeData
// =============================================================================

/// Ordered attribute handles of one element
pub type AttributeList = SmallVec<[AttributeRef; 4]>;

/// Payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Document root
    Root,
    /// Element node
    Element(Element),
    /// Text node
    Leaf(String),
}

impl NodeData {
    impl_enum_accessors!(element: Element, leaf: String);

    /// Check if this is the root node
    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// Root and elements own children; leaves never do
    #[inline]
    pub fn can_have_children(&self) -> bool {
        !self.is_leaf()
    }
}

// =============================================================================
// Element
// =============================================================================

/// Element payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Namespace prefix, empty when unqualified
    pub namespace: CompactString,
    /// Tag name
    pub tag: CompactString,
    /// Attribute handles in source order
    pub attributes: AttributeList,
}

impl Element {
    /// `ns:tag`, or just `tag` when unqualified
    pub fn qualified_name(&self) -> Cow<'_, str> {
        if self.namespace.is_empty() {
            Cow::Borrowed(self.tag.as_str())
        } else {
            Cow::Owned(format!("{}:{}", self.namespace, self.tag))
        }
    }

    /// Whether two elements have the same (namespace, tag)
    #[inline]
    pub fn same_name(&self, namespace: &str, tag: &str) -> bool {
        self.namespace == namespace && self.tag == tag
    }
}

// =============================================================================
// NodeTree
// =============================================================================

/// One node of a [`NodeTree`]
///
/// Serialized as `{"kind": "element", "tag": "p", "children": 1}` or
/// `{"kind": "leaf", "text": "hi"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// Element header; its children follow it in pre-order
    Element {
        /// Namespace prefix
        #[serde(default, skip_serializing_if = "CompactString::is_empty")]
        namespace: CompactString,
        /// Tag name
        tag: CompactString,
        /// Attributes in order
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        attributes: Vec<Attribute>,
        /// Number of direct children
        #[serde(default, skip_serializing_if = "is_zero")]
        children: usize,
    },
    /// Text run
    Leaf {
        /// Text content
        text: String,
    },
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl TreeNode {
    /// Number of direct children (always zero for leaves)
    #[inline]
    pub fn child_count(&self) -> usize {
        match self {
            Self::Element { children, .. } => *children,
            Self::Leaf { .. } => 0,
        }
    }
}

/// Owned subtree with no handles
///
/// Stored and serialized as a flat pre-order list of [`TreeNode`]s, each
/// element recording how many children follow it. Building, copying and
/// decoding a subtree therefore never recurses, however deep it is.
/// Deserialization rejects lists that do not describe exactly one subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TreeNode>", into = "Vec<TreeNode>")]
pub struct NodeTree {
    nodes: Vec<TreeNode>,
}

impl NodeTree {
    /// Unqualified element with no attributes or children
    pub fn element(tag: impl Into<CompactString>) -> Self {
        Self {
            nodes: vec![TreeNode::Element {
                namespace: CompactString::default(),
                tag: tag.into(),
                attributes: Vec::new(),
                children: 0,
            }],
        }
    }

    /// Text leaf
    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            nodes: vec![TreeNode::Leaf { text: text.into() }],
        }
    }

    /// Builder: add an attribute (no-op on leaves)
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        if let Some(TreeNode::Element { attributes, .. }) = self.nodes.first_mut() {
            attributes.push(attribute);
        }
        self
    }

    /// Builder: add a child (no-op on leaves)
    pub fn with_child(mut self, child: NodeTree) -> Self {
        if let Some(TreeNode::Element { children, .. }) = self.nodes.first_mut() {
            *children += 1;
            self.nodes.extend(child.nodes);
        }
        self
    }

    /// Nodes in pre-order; the first one is the top of the subtree
    #[inline]
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Number of nodes in this subtree, itself included
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl TryFrom<Vec<TreeNode>> for NodeTree {
    type Error = String;

    fn try_from(nodes: Vec<TreeNode>) -> Result<Self, String> {
        // Nodes still owed to the subtree: one for the top, plus every
        // announced child.
        let mut pending: usize = 1;
        for (i, node) in nodes.iter().enumerate() {
            if pending == 0 {
                return Err(format!("node {i} lies outside the subtree"));
            }
            pending = (pending - 1)
                .checked_add(node.child_count())
                .filter(|owed| *owed < nodes.len() - i)
                .ok_or_else(|| format!("node {i} announces more children than follow it"))?;
        }
        if pending == 0 {
            Ok(Self { nodes })
        } else {
            Err("empty subtree".to_string())
        }
    }
}

impl From<NodeTree> for Vec<TreeNode> {
    fn from(tree: NodeTree) -> Self {
        tree.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_data_accessors() {
        let mut leaf = NodeData::Leaf("hi".into());
        assert!(leaf.is_leaf());
        assert!(!leaf.can_have_children());
        leaf.as_leaf_mut().unwrap().push('!');
        assert_eq!(leaf.as_leaf().map(String::as_str), Some("hi!"));
        assert!(NodeData::Root.can_have_children());
        assert!(NodeData::Root.as_element().is_none());
    }

    #[test]
    fn test_qualified_name() {
        let elem = Element {
            namespace: "svg".into(),
            tag: "rect".into(),
            attributes: AttributeList::new(),
        };
        assert_eq!(elem.qualified_name(), "svg:rect");
        assert!(elem.same_name("svg", "rect"));
        assert!(!elem.same_name("", "rect"));
    }

    #[test]
    fn test_node_tree_json_shape() {
        let tree = NodeTree::element("p")
            .with_attribute(Attribute::new("class", "x"))
            .with_child(NodeTree::element("b").with_child(NodeTree::leaf("hi")))
            .with_child(NodeTree::leaf("tail"));
        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"[{"kind":"element","tag":"p","attributes":[{"name":"class","value":"x"}],"children":2},"#,
                r#"{"kind":"element","tag":"b","children":1},{"kind":"leaf","text":"hi"},"#,
                r#"{"kind":"leaf","text":"tail"}]"#
            )
        );
        let back: NodeTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
        assert_eq!(back.node_count(), 4);
    }

    #[test]
    fn test_node_tree_shape_is_checked() {
        let bad = [
            "[]",
            r#"[{"kind":"leaf","text":"a"},{"kind":"leaf","text":"b"}]"#,
            r#"[{"kind":"element","tag":"p","children":2},{"kind":"leaf","text":"a"}]"#,
            r#"[{"kind":"element","tag":"p","children":18446744073709551615}]"#,
        ];
        for json in bad {
            assert!(serde_json::from_str::<NodeTree>(json).is_err(), "{json}");
        }
    }

    #[test]
    fn test_deep_node_tree_decodes() {
        let mut json = String::from("[");
        for _ in 0..1000 {
            json.push_str(r#"{"kind":"element","tag":"a","children":1},"#);
        }
        json.push_str(r#"{"kind":"leaf","text":"x"}]"#);
        let tree: NodeTree = serde_json::from_str(&json).unwrap();
        assert_eq!(tree.node_count(), 1001);
    }
}
