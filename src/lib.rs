//! livedom - Arena-backed markup documents with identity-preserving reconciliation
//!
//! ## Core Concepts
//!
//! **Handles, not pointers**: every node and attribute lives in an arena owned
//! by its [`Document`] and is addressed by a [`NodeRef`] / [`AttributeRef`].
//! Handles carry the issuing document's id and a slot generation, so stale and
//! foreign handles are reported as [`DomError`]s instead of reading the wrong
//! node.
//!
//! **Reconciliation**: [`Document::merge`] mutates a document until it matches
//! another one, keeping the handles of every node that survives and reporting
//! each edit as a [`Change`]. The same edits can travel as a JSON structural
//! patch and be replayed with [`Document::apply_patch`].
//!
//! ## Modules
//! - `node`: Document, node payloads and detached subtrees
//! - `parser` / `render`: markup in and out
//! - `diff` / `patch`: positional diff and structural patches
//! - `change`: change notifications
//! - `fragment`: server-rendered statics/dynamics fragments and streams
//! - `select`: element selectors
//! - `shared`: thread-safe documents and the host registry
//!
//! ## Usage
//!
//! ```
//! use livedom::{Change, ChangeType, Document};
//!
//! let mut doc = Document::parse("<ul><li>one</li></ul>").unwrap();
//! let incoming = Document::parse("<ul><li>one</li><li>two</li></ul>").unwrap();
//!
//! let mut changes: Vec<Change> = Vec::new();
//! doc.merge(&incoming, &mut changes).unwrap();
//!
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes[0].kind, ChangeType::Add);
//! assert_eq!(doc.to_string(), incoming.to_string());
//! ```

#[macro_use]
mod macros;

// =============================================================================
// Modules
// =============================================================================

/// Attribute values and storage
pub mod attr;

/// Change notifications
pub mod change;

/// Positional tree diff
pub mod diff;

/// Error types
pub mod error;

/// Rendered statics/dynamics fragments
pub mod fragment;

/// Content hashing
pub mod hash;

/// Document, node and attribute handles
pub mod id;

/// Node types: Document, NodeData, Element, NodeTree
pub mod node;

/// Markup parser
pub mod parser;

/// Structural patches
pub mod patch;

/// Prelude for common imports
pub mod prelude;

/// Markup serialization
pub mod render;

/// Element selectors
pub mod select;

/// Shared documents and the host registry
pub mod shared;

/// Source positions
pub mod span;

// =============================================================================
// Re-exports
// =============================================================================

// Node types
pub use node::{Descendants, Document, Element, NodeData, NodeTree, TreeNode};

// Attribute types
pub use attr::Attribute;

// Identity
pub use id::{AttributeRef, DocumentId, NodeRef};

// Notifications
pub use change::{Change, ChangeHandler, ChangeType};

// Reconciliation and patches
pub use diff::{Diff, DiffStats};
pub use patch::{NodePath, Patch};

// Parsing and printing
pub use parser::ParseOptions;
pub use render::PrintOptions;

// Queries
pub use select::{Selection, Selector};

// Fragments
pub use fragment::{FragmentError, Root, RootDiff, Stream, StreamItem};

// Sharing
pub use shared::{DocumentRegistry, SharedDocument};

// Hashing
pub use hash::StableHasher;

// Span
pub use span::SourcePosition;

// Error types
pub use error::{DomError, DomResult, ParseError, PatchError};

// =============================================================================
// Tests
// =============================================================================
