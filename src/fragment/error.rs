//! Rendered fragment errors

use thiserror::Error;

use crate::error::{DomError, ParseError};

/// Errors while folding a fragment diff into a rendered root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// A regular fragment was updated by a comprehension diff, or the reverse
    #[error("fragment type mismatch")]
    TypeMismatch,

    /// An update targets a component that does not exist, or shared statics
    /// point at one
    #[error("component {0} not found")]
    MissingComponent(i32),

    /// Shared statics refer back to the component itself
    #[error("shared statics of component {0} form a cycle")]
    SharedCycle(i32),

    /// A stream diff names a different stream than the one it updates
    #[error("stream id mismatch: have {0}, diff has {1}")]
    StreamIdMismatch(String, String),
}

/// Errors while rendering a root to markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("fragment has no statics")]
    MissingStatics,

    #[error("template {0} not found")]
    TemplateNotFound(i32),

    #[error("dynamic child {0} not found")]
    MissingChild(usize),

    #[error("component {0} not found")]
    ComponentNotFound(i32),

    #[error("component {0} renders itself")]
    ComponentCycle(i32),

    #[error("component {0} has unresolved shared statics")]
    UnresolvedStatics(i32),
}

/// Errors from the fragment entry points on [`Document`](crate::Document).
#[derive(Debug, Error)]
pub enum FragmentError {
    /// JSON was well-formed but not a rendered fragment
    #[error("invalid fragment: {0}")]
    Decode(String),

    #[error("invalid fragment json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("fragment merge failed: {0}")]
    Merge(#[from] MergeError),

    #[error("fragment render failed: {0}")]
    Render(#[from] RenderError),

    /// The rendered markup did not parse
    #[error("rendered fragment is not valid markup: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Dom(#[from] DomError),

    /// The document was not created by `parse_fragment_json`
    #[error("document has no rendered fragment")]
    NoFragment,
}

impl FragmentError {
    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}
