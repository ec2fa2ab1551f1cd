//! Structural patches
//!
//! A patch is an ordered list of [`Patch`] edits. Each edit addresses its
//! target by a [`NodePath`] of child indices from the root, resolved against
//! the tree as it stands when that edit runs.
//!
//! Patches are produced by [`diff`](crate::diff::diff) and consumed by
//! [`Document::merge`](crate::Document::merge), or decoded from JSON and fed
//! to [`Document::apply_patch`](crate::Document::apply_patch). Both routes
//! share one application path, so they report identical notifications.
//!
//! # Wire format
//!
//! ```json
//! [
//!   {"op": "set_attributes", "path": [0], "attributes": [{"name": "x", "value": "2"}]},
//!   {"op": "set_text", "path": [0, 1], "text": "hello"},
//!   {"op": "append", "parent": [0], "node": [{"kind": "element", "tag": "c", "children": 1}, {"kind": "leaf", "text": "hi"}]},
//!   {"op": "remove", "path": [0, 2]},
//!   {"op": "replace", "path": [0, 0], "node": [{"kind": "leaf", "text": "text"}]}
//! ]
//! ```
//!
//! Subtrees travel as flat pre-order lists (see [`NodeTree`]), so a patch of
//! any depth decodes without nesting. Decoding also rejects element and
//! attribute names that would not print back to parseable markup.

mod apply;
mod codec;

pub(crate) use apply::apply;
pub use codec::{decode, encode, validate};

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::attr::Attribute;
use crate::node::NodeTree;

/// Child indices from the root to a node; empty addresses the root
pub type NodePath = SmallVec<[usize; 8]>;

/// A single positioned edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Patch {
    /// Rewrite the attribute list of an element
    SetAttributes {
        /// Target element
        path: NodePath,
        /// Complete new attribute list
        attributes: Vec<Attribute>,
    },
    /// Overwrite the text of a leaf
    SetText {
        /// Target leaf
        path: NodePath,
        /// New text
        text: String,
    },
    /// Build a subtree and append it as the last child
    Append {
        /// Root or element receiving the child
        parent: NodePath,
        /// Subtree to build
        node: NodeTree,
    },
    /// Free a node and its subtree
    Remove {
        /// Node to remove; never the root
        path: NodePath,
    },
    /// Rebuild a node wholesale, keeping its handle
    Replace {
        /// Node to replace; never the root
        path: NodePath,
        /// New content
        node: NodeTree,
    },
}

impl Patch {
    /// Path this edit resolves before running
    pub fn path(&self) -> &[usize] {
        match self {
            Self::SetAttributes { path, .. }
            | Self::SetText { path, .. }
            | Self::Remove { path }
            | Self::Replace { path, .. } => path,
            Self::Append { parent, .. } => parent,
        }
    }

    /// Wire name of the operation
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::SetAttributes { .. } => "set_attributes",
            Self::SetText { .. } => "set_text",
            Self::Append { .. } => "append",
            Self::Remove { .. } => "remove",
            Self::Replace { .. } => "replace",
        }
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.op_name(), self.path())
    }
}
