//! Error types for livedom.
//!
//! Three families, kept apart so callers can tell programming mistakes from
//! bad input:
//!
//! - [`DomError`]: contract violations against a document (stale or foreign
//!   handles, edits that break tree invariants)
//! - [`ParseError`]: malformed source text
//! - [`PatchError`]: malformed or inapplicable structural patches

use thiserror::Error;

use crate::id::{AttributeRef, NodeRef};
use crate::span::SourcePosition;

/// Errors raised by document navigation and editing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// Node handle is stale (its slot was freed) or was issued by another document
    #[error("invalid node handle {0:?}")]
    InvalidHandle(NodeRef),

    /// Attribute handle is stale or was issued by another document
    #[error("invalid attribute handle {0:?}")]
    InvalidAttribute(AttributeRef),

    /// The root node can never be removed or replaced
    #[error("the root node cannot be removed or replaced")]
    RootRemoval,

    /// Operation needs an element node
    #[error("{0:?} is not an element")]
    NotAnElement(NodeRef),

    /// Operation needs a leaf node
    #[error("{0:?} is not a leaf")]
    NotALeaf(NodeRef),

    /// Leaves cannot own children
    #[error("{0:?} cannot have children")]
    NotAContainer(NodeRef),

    /// Child list handed to `set_children` is not consistent with the tree
    #[error("inconsistent child list for {parent:?}: {reason}")]
    InconsistentChildren {
        /// Parent whose child list was rejected
        parent: NodeRef,
        /// What was wrong
        reason: String,
    },

    /// Internal tree state is inconsistent
    #[error("document corrupted: {0}")]
    Corrupted(String),
}

/// Result type alias for document operations.
pub type DomResult<T> = Result<T, DomError>;

impl DomError {
    /// Create a corruption error with a message.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        Self::Corrupted(msg.into())
    }
}

/// Syntax error while parsing markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at {position}: {message}")]
pub struct ParseError {
    /// Human-readable description
    pub message: String,
    /// Where the problem was detected
    pub position: SourcePosition,
}

impl ParseError {
    /// Create a syntax error at a byte offset of `input`.
    pub fn at(input: &str, offset: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: SourcePosition::from_offset(input, offset),
        }
    }
}

/// Errors raised while decoding or applying a structural patch.
///
/// Patch application is all-or-nothing: whenever one of these is returned,
/// the target document has not been modified.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The patch bytes are not a valid patch encoding
    #[error("patch decode error: {0}")]
    Decode(String),

    /// An edit does not fit the live tree (bad path, wrong node kind, ...)
    #[error("patch edit #{index} does not match the document: {reason}")]
    Structural {
        /// Position of the offending edit in the patch
        index: usize,
        /// What did not match
        reason: String,
    },

    /// An edit violated a document contract
    #[error("patch edit #{index} rejected: {source}")]
    Dom {
        /// Position of the offending edit in the patch
        index: usize,
        /// Underlying document error
        #[source]
        source: DomError,
    },
}

impl PatchError {
    /// Create a decode error from any error type.
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Create a structural mismatch error for edit `index`.
    pub fn structural(index: usize, reason: impl Into<String>) -> Self {
        Self::Structural {
            index,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParseError::at("<a>\n</b>", 4, "mismatched end tag");
        assert_eq!(err.to_string(), "syntax error at 2:1: mismatched end tag");

        let err = PatchError::structural(2, "path [0, 4] does not exist");
        assert_eq!(
            err.to_string(),
            "patch edit #2 does not match the document: path [0, 4] does not exist"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DomError>();
        assert_send_sync::<ParseError>();
        assert_send_sync::<PatchError>();
    }
}
