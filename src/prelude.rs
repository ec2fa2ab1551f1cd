//! Prelude module for common imports.
//!
//! ```
//! use livedom::prelude::*;
//! ```

// Document and nodes
pub use crate::node::{Document, Element, NodeData, NodeTree, TreeNode};

// Attributes
pub use crate::attr::Attribute;

// Identity
pub use crate::id::{AttributeRef, DocumentId, NodeRef};

// Notifications
pub use crate::change::{Change, ChangeHandler, ChangeType};

// Reconciliation and patches
pub use crate::diff::{diff, Diff, DiffStats};
pub use crate::patch::{NodePath, Patch};

// Parsing and printing
pub use crate::parser::ParseOptions;
pub use crate::render::PrintOptions;

// Queries
pub use crate::select::{Selection, Selector};

// Sharing
pub use crate::shared::{DocumentRegistry, SharedDocument};

// Error
pub use crate::error::{DomError, DomResult, ParseError, PatchError};
pub use crate::fragment::FragmentError;
