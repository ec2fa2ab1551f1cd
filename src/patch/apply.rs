//! Edit application
//!
//! The single mutation path shared by tree merge and patch apply. Edits run
//! in order against a [`Tree`]; each successful edit yields exactly one
//! [`Change`]. The first failing edit aborts the batch, so callers run this
//! on a staged copy when they need atomicity.

use log::trace;

use crate::change::{Change, ChangeType};
use crate::error::{DomError, PatchError};
use crate::id::NodeRef;
use crate::node::{NodeData, Tree};

use super::Patch;

/// Apply `patches` in order, returning one notification per edit.
pub(crate) fn apply(tree: &mut Tree, patches: &[Patch]) -> Result<Vec<Change>, PatchError> {
    let mut changes = Vec::with_capacity(patches.len());
    for (index, patch) in patches.iter().enumerate() {
        let change = apply_one(tree, index, patch)?;
        trace!("{patch} -> {change}");
        changes.push(change);
    }
    Ok(changes)
}

fn apply_one(tree: &mut Tree, index: usize, patch: &Patch) -> Result<Change, PatchError> {
    let dom = |source: DomError| PatchError::Dom { index, source };
    let node = resolve(tree, index, patch.path())?;

    match patch {
        Patch::SetAttributes { attributes, .. } => {
            if !tree.nodes.get(node).map_err(dom)?.is_element() {
                return Err(PatchError::structural(
                    index,
                    format!("set_attributes target {:?} is not an element", patch.path()),
                ));
            }
            tree.set_attributes(node, attributes).map_err(dom)?;
            Ok(Change::updated(node))
        }
        Patch::SetText { text, .. } => {
            if !tree.nodes.get(node).map_err(dom)?.is_leaf() {
                return Err(PatchError::structural(
                    index,
                    format!("set_text target {:?} is not a leaf", patch.path()),
                ));
            }
            tree.set_text(node, text).map_err(dom)?;
            Ok(Change::updated(node))
        }
        Patch::Append { node: subtree, .. } => {
            if !tree.nodes.get(node).map_err(dom)?.can_have_children() {
                return Err(PatchError::structural(
                    index,
                    format!("append parent {:?} is a leaf", patch.path()),
                ));
            }
            let child = tree.append_tree(node, subtree).map_err(dom)?;
            Ok(Change::structural(ChangeType::Add, child, node))
        }
        Patch::Remove { .. } => {
            let parent = tree.remove(node).map_err(dom)?;
            Ok(Change::structural(ChangeType::Remove, node, parent))
        }
        Patch::Replace { node: subtree, .. } => {
            let parent = tree.replace(node, subtree).map_err(dom)?;
            Ok(Change::structural(ChangeType::Replace, node, parent))
        }
    }
}

/// Walk `path` from the root.
fn resolve(tree: &Tree, index: usize, path: &[usize]) -> Result<NodeRef, PatchError> {
    let mut node = tree.root();
    for (depth, &position) in path.iter().enumerate() {
        let children = tree
            .nodes
            .children(node)
            .map_err(|source| PatchError::Dom { index, source })?;
        node = match children.get(position) {
            Some(child) => *child,
            None => {
                let kind = match tree.nodes.get(node) {
                    Ok(NodeData::Leaf(_)) => "a leaf",
                    _ => "out of range",
                };
                return Err(PatchError::structural(
                    index,
                    format!("path {path:?} does not resolve: step {depth} is {kind}"),
                ));
            }
        };
    }
    Ok(node)
}
