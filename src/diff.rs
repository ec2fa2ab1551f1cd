//! Positional tree diff
//!
//! Computes the edit list that turns one document into another. This is a
//! pure function of the two trees; applying the result is the job of
//! [`Document::merge`](crate::Document::merge).
//!
//! # Algorithm
//!
//! Both roots are matched, then every matched pair of nodes is compared:
//!
//! 1. Elements with the same (namespace, tag) stay in place. Their attribute
//!    lists are compared pairwise in order; any difference rewrites the
//!    whole list as one edit. Their children are then aligned.
//! 2. Leaves stay in place; different text becomes one edit.
//! 3. Anything else (element vs leaf, different name) replaces the target
//!    node wholesale with a copy of the incoming subtree.
//!
//! Children are aligned by position. The common prefix recurses left to
//! right, surplus target children are removed left to right, and surplus
//! incoming children are appended left to right. A parent never sees both
//! removes and appends in one diff.
//!
//! # Complexity
//!
//! - Time: O(n + m) node visits
//! - Space: O(depth + width) for the path and the work stack, plus the
//!   edit list
//!
//! The walk keeps its own stack, so nesting depth is bounded only by memory.

use std::fmt;

use crate::attr::Attribute;
use crate::error::{DomResult, PatchError};
use crate::id::NodeRef;
use crate::node::{Document, NodeData};
use crate::patch::{self, NodePath, Patch};

// =============================================================================
// Public Types
// =============================================================================

/// Statistics from diff operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of node pairs compared
    pub nodes_compared: usize,
    /// Number of compared nodes left untouched
    pub nodes_kept: usize,
    /// Number of attribute list rewrites
    pub attribute_updates: usize,
    /// Number of text updates
    pub text_updates: usize,
    /// Number of nodes replaced wholesale
    pub nodes_replaced: usize,
    /// Number of subtrees appended
    pub nodes_added: usize,
    /// Number of subtrees removed
    pub nodes_removed: usize,
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compared={} kept={} attrs={} text={} replaced={} added={} removed={}",
            self.nodes_compared,
            self.nodes_kept,
            self.attribute_updates,
            self.text_updates,
            self.nodes_replaced,
            self.nodes_added,
            self.nodes_removed
        )
    }
}

/// Result of a diff
#[derive(Debug, Clone, Default)]
pub struct Diff {
    /// Path-addressed edits, in the order their notifications are emitted
    pub patches: Vec<Patch>,
    /// Statistics about the diff
    pub stats: DiffStats,
}

impl Diff {
    /// Check if any changes were detected
    pub fn has_changes(&self) -> bool {
        !self.patches.is_empty()
    }

    /// Encode the edits as a JSON patch for [`Document::apply_patch`]
    pub fn to_json(&self) -> Result<Vec<u8>, PatchError> {
        patch::encode(&self.patches)
    }
}

// =============================================================================
// Diff Context
// =============================================================================

/// Pending work, popped from a stack so deep trees never recurse
enum Task {
    /// Compare one matched pair; `depth` is the parent's path length
    Pair {
        old: NodeRef,
        new: NodeRef,
        depth: usize,
        index: usize,
    },
    /// Emit the removes and appends of a matched parent, after its prefix
    Tail { old: NodeRef, new: NodeRef, depth: usize },
}

struct DiffContext<'a> {
    target: &'a Document,
    incoming: &'a Document,
    path: NodePath,
    tasks: Vec<Task>,
    patches: Vec<Patch>,
    stats: DiffStats,
}

/// Compute the edits that make `target` equivalent to `incoming`
///
/// Fails only when either document is internally inconsistent.
pub fn diff(target: &Document, incoming: &Document) -> DomResult<Diff> {
    let mut ctx = DiffContext {
        target,
        incoming,
        path: NodePath::new(),
        tasks: Vec::new(),
        patches: Vec::new(),
        stats: DiffStats::default(),
    };
    ctx.stats.nodes_compared += 1;
    ctx.schedule_children(target.root(), incoming.root())?;

    while let Some(task) = ctx.tasks.pop() {
        match task {
            Task::Pair { old, new, depth, index } => {
                ctx.path.truncate(depth);
                ctx.path.push(index);
                ctx.diff_node(old, new)?;
            }
            Task::Tail { old, new, depth } => {
                ctx.path.truncate(depth);
                ctx.diff_tail(old, new)?;
            }
        }
    }

    Ok(Diff {
        patches: ctx.patches,
        stats: ctx.stats,
    })
}

impl DiffContext<'_> {
    fn diff_node(&mut self, old: NodeRef, new: NodeRef) -> DomResult<()> {
        self.stats.nodes_compared += 1;
        let (target, incoming) = (self.target, self.incoming);

        match (target.get(old)?, incoming.get(new)?) {
            (NodeData::Element(a), NodeData::Element(b)) if a.same_name(&b.namespace, &b.tag) => {
                let old_attrs = target.attributes(old)?;
                let new_attrs = incoming.attributes(new)?;
                if old_attrs == new_attrs {
                    self.stats.nodes_kept += 1;
                } else {
                    self.stats.attribute_updates += 1;
                    self.patches.push(Patch::SetAttributes {
                        path: self.path.clone(),
                        attributes: new_attrs.into_iter().cloned().collect::<Vec<Attribute>>(),
                    });
                }
                self.schedule_children(old, new)
            }
            (NodeData::Leaf(a), NodeData::Leaf(b)) => {
                if a == b {
                    self.stats.nodes_kept += 1;
                } else {
                    self.stats.text_updates += 1;
                    self.patches.push(Patch::SetText {
                        path: self.path.clone(),
                        text: b.clone(),
                    });
                }
                Ok(())
            }
            _ => {
                self.stats.nodes_replaced += 1;
                self.patches.push(Patch::Replace {
                    path: self.path.clone(),
                    node: incoming.subtree(new)?,
                });
                Ok(())
            }
        }
    }

    /// Queue the common prefix left to right, then the tail.
    fn schedule_children(&mut self, old: NodeRef, new: NodeRef) -> DomResult<()> {
        let depth = self.path.len();
        let old_children = self.target.children(old)?;
        let new_children = self.incoming.children(new)?;

        self.tasks.push(Task::Tail { old, new, depth });
        for (index, (a, b)) in old_children.iter().zip(new_children).enumerate().rev() {
            self.tasks.push(Task::Pair {
                old: *a,
                new: *b,
                depth,
                index,
            });
        }
        Ok(())
    }

    fn diff_tail(&mut self, old: NodeRef, new: NodeRef) -> DomResult<()> {
        let (target, incoming) = (self.target, self.incoming);
        let old_children = target.children(old)?;
        let new_children = incoming.children(new)?;
        let shared = old_children.len().min(new_children.len());

        // Each remove shifts the next surplus child into position `shared`.
        for _ in shared..old_children.len() {
            self.stats.nodes_removed += 1;
            let mut path = self.path.clone();
            path.push(shared);
            self.patches.push(Patch::Remove { path });
        }

        for child in &new_children[shared..] {
            self.stats.nodes_added += 1;
            self.patches.push(Patch::Append {
                parent: self.path.clone(),
                node: incoming.subtree(*child)?,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeTree;

    fn diff_str(a: &str, b: &str) -> Diff {
        diff(&Document::parse(a).unwrap(), &Document::parse(b).unwrap()).unwrap()
    }

    fn path(indices: &[usize]) -> NodePath {
        NodePath::from_slice(indices)
    }

    #[test]
    fn test_identical_trees() {
        let d = diff_str(r#"<a x="1"><b/>t</a>"#, r#"<a x="1"><b/>t</a>"#);
        assert!(!d.has_changes());
        assert_eq!(d.stats.nodes_kept, 3);
    }

    #[test]
    fn test_append_and_remove() {
        let d = diff_str("<a><b/></a>", "<a><b/><c/><d/></a>");
        assert_eq!(
            d.patches,
            vec![
                Patch::Append {
                    parent: path(&[0]),
                    node: NodeTree::element("c"),
                },
                Patch::Append {
                    parent: path(&[0]),
                    node: NodeTree::element("d"),
                },
            ]
        );

        let d = diff_str("<a><b/><c/><d/></a>", "<a><b/></a>");
        assert_eq!(
            d.patches,
            vec![Patch::Remove { path: path(&[0, 1]) }, Patch::Remove { path: path(&[0, 1]) }]
        );
        assert_eq!(d.stats.nodes_removed, 2);
    }

    #[test]
    fn test_attribute_list_rewritten_once() {
        let d = diff_str(r#"<a x="1" y="2"/>"#, r#"<a x="1" y="3" z="4"/>"#);
        assert_eq!(d.patches.len(), 1);
        match &d.patches[0] {
            Patch::SetAttributes { path: p, attributes } => {
                assert_eq!(p.as_slice(), &[0]);
                assert_eq!(attributes.len(), 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_attribute_order_matters() {
        let d = diff_str(r#"<a x="1" y="2"/>"#, r#"<a y="2" x="1"/>"#);
        assert_eq!(d.stats.attribute_updates, 1);
    }

    #[test]
    fn test_replace_on_kind_or_name_change() {
        let d = diff_str("<a><b><i/></b>t</a>", "<a><c/><e/></a>");
        assert_eq!(
            d.patches,
            vec![
                Patch::Replace {
                    path: path(&[0, 0]),
                    node: NodeTree::element("c"),
                },
                Patch::Replace {
                    path: path(&[0, 1]),
                    node: NodeTree::element("e"),
                },
            ]
        );

        let d = diff_str("<svg:a/>", "<a/>");
        assert_eq!(d.stats.nodes_replaced, 1);
    }

    #[test]
    fn test_edits_follow_document_order() {
        let d = diff_str("<a><b>1</b><c>2</c><d/></a><e/>", "<a><b>one</b><c>two</c></a><e/><f/>");
        let paths: Vec<_> = d.patches.iter().map(|p| (p.op_name(), p.path().to_vec())).collect();
        assert_eq!(
            paths,
            [
                ("set_text", vec![0, 0, 0]),
                ("set_text", vec![0, 1, 0]),
                ("remove", vec![0, 2]),
                ("append", vec![]),
            ]
        );
    }

    #[test]
    fn test_parent_edit_precedes_children() {
        let d = diff_str(r#"<a x="1">old</a>"#, r#"<a x="2">new</a>"#);
        let ops: Vec<_> = d.patches.iter().map(Patch::op_name).collect();
        assert_eq!(ops, ["set_attributes", "set_text"]);
    }
}
