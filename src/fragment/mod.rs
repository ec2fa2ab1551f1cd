//! Rendered fragments
//!
//! A server can describe markup as a tree of *statics* (literal text that
//! never changes) interleaved with *dynamics* (the parts that do), then send
//! only the dynamics that changed. This module keeps the last full
//! description as a [`Root`], folds incoming [`RootDiff`]s into it, renders
//! it back to markup and reconciles a [`Document`] against the result.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "s": ["<p class=\"", "\">", "</p>"],
//!   "0": "note",
//!   "1": {"d": [["a"], ["b"]], "s": ["<i>", "</i>"]},
//!   "c": {"1": {"0": "x", "s": ["<b>", "</b>"]}}
//! }
//! ```
//!
//! - `"s"`: statics, or the id of a template declared by an enclosing
//!   comprehension's `"p"`
//! - numeric keys: dynamic children (text, a nested fragment, or a
//!   component id)
//! - `"d"`: comprehension rows, each rendered against the same statics
//! - `"c"`: components by id; a component's `"s"` may name another
//!   component to share its statics, negative for one from before the diff
//! - `"stream"`: on a comprehension, turns its rows into a [`Stream`] that
//!   diffs edit by row id instead of replacing
//!
//! A stream entry is an array holding the stream id, an array of inserts
//! `[row_id, at, limit]`, an array of row ids to delete and a reset flag,
//! in any order. A row's id is the dynamic that renders as ` id="..."`.

mod decode;
mod error;
mod merge;
mod render;

use log::debug;
use rustc_hash::FxHashMap;

use crate::change::ChangeHandler;
use crate::node::Document;

pub use error::{FragmentError, MergeError, RenderError};

/// Dynamic children by position
pub type Children = FxHashMap<usize, Child>;

/// Template statics by id
pub type Templates = FxHashMap<i32, Vec<String>>;

/// Components by id
pub type Components = FxHashMap<i32, Component>;

/// The last full rendered description of a document
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub(crate) fragment: Fragment,
    pub(crate) components: Components,
}

/// An update to a [`Root`]
#[derive(Debug, Clone, PartialEq)]
pub struct RootDiff {
    pub(crate) fragment: Fragment,
    pub(crate) components: FxHashMap<i32, ComponentDiff>,
}

/// Statics interleaved with dynamics
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Statics with one dynamic between each pair
    Regular {
        /// Absent in a diff that only updates children
        statics: Option<Statics>,
        /// Dynamics keyed by the gap they fill
        children: Children,
    },
    /// The same statics repeated once per row
    Comprehension {
        /// Absent in a diff that keeps the current statics
        statics: Option<Statics>,
        /// One row of dynamics per repetition
        dynamics: Vec<Vec<Child>>,
        /// Statics that nested fragments refer to by id
        templates: Templates,
        /// Set when rows are edited by id rather than replaced
        stream: Option<Stream>,
    },
}

/// Literal text between dynamics
#[derive(Debug, Clone, PartialEq)]
pub enum Statics {
    /// The text itself
    Inline(Vec<String>),
    /// Reference into the templates of an enclosing comprehension
    Template(i32),
}

/// A dynamic part of a fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    /// Nested statics and dynamics
    Fragment(Fragment),
    /// Rendered from the component with this id
    Component(i32),
    /// Inserted as is
    Text(String),
}

/// A fragment with its own id, shared across the root
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Its own statics, or those of another component
    pub statics: ComponentStatics,
    /// Dynamics keyed by the gap they fill
    pub children: Children,
}

/// Where a component's statics come from
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatics {
    /// Carried by the component
    Inline(Vec<String>),
    /// Statics of another component; negative ids refer to the previous root
    Shared(i32),
}

/// Update for one component
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentDiff {
    /// Full replacement, sent when the diff carries statics
    Replace(Component),
    /// Child updates merged into the existing component
    Update(Children),
}

/// Row edits for a streamed comprehension
///
/// Edits apply in a fixed order: reset, then deletes, then inserts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stream {
    /// Stream id; every later diff must carry the same one
    pub id: String,
    /// Rows from the diff to place, in order
    pub inserts: Vec<StreamItem>,
    /// Ids of rows to drop
    pub deletes: Vec<String>,
    /// Drop every current row first
    pub reset: bool,
}

/// Placement of one streamed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamItem {
    /// Row id, matched against the row's ` id="..."` dynamic
    pub id: String,
    /// Row index to insert at; `-1` appends
    pub at: i32,
    /// Rows kept after the insert: the first `n` when positive, the last
    /// `-n` when negative
    pub limit: Option<i32>,
}

/// One entry of a `"stream"` array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamAttribute {
    /// The stream id
    Id(String),
    /// Rows to insert
    Inserts(Vec<StreamItem>),
    /// Row ids to delete
    Deletes(Vec<String>),
    /// Whether to clear the stream first
    Reset(bool),
}

impl TryFrom<Vec<StreamAttribute>> for Stream {
    type Error = FragmentError;

    fn try_from(attributes: Vec<StreamAttribute>) -> Result<Self, Self::Error> {
        let mut id = None;
        let mut stream = Stream::default();
        for attribute in attributes {
            match attribute {
                StreamAttribute::Id(value) => id = Some(value),
                StreamAttribute::Inserts(items) => stream.inserts.extend(items),
                StreamAttribute::Deletes(ids) => stream.deletes.extend(ids),
                StreamAttribute::Reset(reset) => stream.reset |= reset,
            }
        }
        stream.id = id.ok_or_else(|| FragmentError::decode("stream has no id"))?;
        Ok(stream)
    }
}

impl Stream {
    /// The stream as kept in a merged root, with its edits spent
    pub(crate) fn settled(&self) -> Stream {
        Stream {
            id: self.id.clone(),
            ..Stream::default()
        }
    }
}

impl Fragment {
    /// The fragment's statics, absent in diffs that keep the current ones
    pub fn statics(&self) -> Option<&Statics> {
        match self {
            Fragment::Regular { statics, .. } | Fragment::Comprehension { statics, .. } => statics.as_ref(),
        }
    }
}

impl Root {
    /// Decode a full rendered description.
    pub fn from_json(json: &str) -> Result<Self, FragmentError> {
        let mut root = decode::root(json)?;
        merge::resolve_shared(&mut root.components, &Components::default())?;
        Ok(root)
    }

    /// The top-level fragment
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// The component with this id
    pub fn component(&self, id: i32) -> Option<&Component> {
        self.components.get(&id)
    }
}

impl RootDiff {
    /// Decode an update.
    pub fn from_json(json: &str) -> Result<Self, FragmentError> {
        decode::root_diff(json)
    }
}

// =============================================================================
// Document integration
// =============================================================================

impl Document {
    /// Build a document from a full rendered description
    ///
    /// The description is kept so later diffs can be merged with
    /// [`merge_fragment_json`](Self::merge_fragment_json).
    pub fn parse_fragment_json(json: &str) -> Result<Document, FragmentError> {
        let root = Root::from_json(json)?;
        let mut doc = Document::parse(&root.render()?)?;
        doc.fragment = Some(root);
        Ok(doc)
    }

    /// Fold a rendered diff into this document
    ///
    /// The diff is merged into the stored description, rendered, parsed and
    /// reconciled with [`merge`](Self::merge), so `handler` sees the same
    /// notifications a tree merge would produce. On any error the document
    /// and its stored description are unchanged.
    pub fn merge_fragment_json<H>(&mut self, json: &str, handler: &mut H) -> Result<(), FragmentError>
    where
        H: ChangeHandler + ?Sized,
    {
        let current = self.fragment.as_ref().ok_or(FragmentError::NoFragment)?;
        let diff = RootDiff::from_json(json)?;
        let next = current.clone().merge(diff)?;
        let markup = next.render()?;
        let incoming = Document::parse(&markup)?;
        debug!("fragment diff for {} rendered {} bytes", self.id(), markup.len());

        self.merge(&incoming, handler)?;
        self.fragment = Some(next);
        Ok(())
    }

    /// The rendered description this document was built from, if any
    pub fn fragment(&self) -> Option<&Root> {
        self.fragment.as_ref()
    }
}
