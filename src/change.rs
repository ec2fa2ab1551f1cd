//! Change notifications
//!
//! Reconciliation reports every edit it makes to the target document as a
//! [`Change`], delivered in order to a [`ChangeHandler`]. Hosts mirror the
//! tree in their own representation (native views, a remote client) keyed by
//! [`NodeRef::index`].

use std::fmt;

use crate::id::NodeRef;

/// Kind of edit applied to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// Attributes of an element or text of a leaf were updated in place
    Change,
    /// The node was created and appended to its parent
    Add,
    /// The node and its subtree were freed; its handle is now invalid
    Remove,
    /// The node's content was rebuilt wholesale under the same handle
    Replace,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Change => "change",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
        })
    }
}

/// One edit notification
///
/// `parent` is set for [`Add`](ChangeType::Add), [`Remove`](ChangeType::Remove)
/// and [`Replace`](ChangeType::Replace), and `None` for in-place
/// [`Change`](ChangeType::Change)s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Change {
    /// What happened
    pub kind: ChangeType,
    /// Affected node
    pub node: NodeRef,
    /// Parent of the affected node, for structural edits
    pub parent: Option<NodeRef>,
}

impl Change {
    pub(crate) fn updated(node: NodeRef) -> Self {
        Self {
            kind: ChangeType::Change,
            node,
            parent: None,
        }
    }

    pub(crate) fn structural(kind: ChangeType, node: NodeRef, parent: NodeRef) -> Self {
        Self {
            kind,
            node,
            parent: Some(parent),
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent {
            Some(parent) => write!(f, "{} {} under {}", self.kind, self.node, parent),
            None => write!(f, "{} {}", self.kind, self.node),
        }
    }
}

/// Receiver of change notifications
///
/// Implemented for every `FnMut(Change)` closure and for `Vec<Change>`,
/// which simply collects.
pub trait ChangeHandler {
    /// Called once per edit, in application order
    fn handle(&mut self, change: Change);
}

impl<F> ChangeHandler for F
where
    F: FnMut(Change),
{
    #[inline]
    fn handle(&mut self, change: Change) {
        self(change)
    }
}

impl ChangeHandler for Vec<Change> {
    #[inline]
    fn handle(&mut self, change: Change) {
        self.push(change);
    }
}
