//! Attribute system
//!
//! Attributes are `(namespace, name, value)` string triples. Each lives in
//! its own slot of a document's [`AttributeStore`] and is owned by exactly
//! one element, which lists it by [`AttributeRef`].

use std::borrow::Cow;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::{DomError, DomResult};
use crate::id::{AttributeRef, DocumentId};
use crate::node::arena::Slots;

// =============================================================================
// Attribute
// =============================================================================

/// A single namespaced attribute
///
/// Equality is structural and case-sensitive over all three fields. No
/// normalization happens anywhere: `Class` and `class` are different names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    /// Namespace prefix, empty when the attribute is unqualified
    #[serde(default, skip_serializing_if = "CompactString::is_empty")]
    pub namespace: CompactString,
    /// Local name
    pub name: CompactString,
    /// Value, empty for valueless attributes
    #[serde(default)]
    pub value: String,
}

impl Attribute {
    /// Create an unqualified attribute
    pub fn new(name: impl Into<CompactString>, value: impl Into<String>) -> Self {
        Self {
            namespace: CompactString::default(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a namespaced attribute
    pub fn namespaced(
        namespace: impl Into<CompactString>,
        name: impl Into<CompactString>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// `ns:name`, or just `name` when unqualified
    pub fn qualified_name(&self) -> Cow<'_, str> {
        if self.namespace.is_empty() {
            Cow::Borrowed(self.name.as_str())
        } else {
            Cow::Owned(format!("{}:{}", self.namespace, self.name))
        }
    }

    /// Whether this attribute is addressed by `qualified` (`ns:name` or `name`)
    pub fn matches_name(&self, qualified: &str) -> bool {
        match qualified.split_once(':') {
            Some((ns, name)) => self.namespace == ns && self.name == name,
            None => self.namespace.is_empty() && self.name == qualified,
        }
    }
}

// =============================================================================
// AttributeStore
// =============================================================================

/// Slot storage for every attribute of one document
#[derive(Debug, Clone)]
pub(crate) struct AttributeStore {
    doc: DocumentId,
    slots: Slots<Attribute>,
}

impl AttributeStore {
    pub(crate) fn new(doc: DocumentId) -> Self {
        Self {
            doc,
            slots: Slots::default(),
        }
    }

    /// Store an attribute and return its handle
    pub fn allocate(&mut self, attribute: Attribute) -> AttributeRef {
        let (index, generation) = self.slots.insert(attribute);
        AttributeRef::new(self.doc, index, generation)
    }

    /// Look up an attribute
    pub fn get(&self, attr: AttributeRef) -> DomResult<&Attribute> {
        if attr.doc != self.doc {
            return Err(DomError::InvalidAttribute(attr));
        }
        self.slots
            .get(attr.index, attr.generation)
            .ok_or(DomError::InvalidAttribute(attr))
    }

    /// Overwrite an attribute in place, keeping its handle
    pub fn update(&mut self, attr: AttributeRef, attribute: Attribute) -> DomResult<()> {
        if attr.doc != self.doc {
            return Err(DomError::InvalidAttribute(attr));
        }
        let slot = self
            .slots
            .get_mut(attr.index, attr.generation)
            .ok_or(DomError::InvalidAttribute(attr))?;
        *slot = attribute;
        Ok(())
    }

    /// Release an attribute slot; the handle becomes invalid
    pub fn free(&mut self, attr: AttributeRef) -> DomResult<Attribute> {
        if attr.doc != self.doc {
            return Err(DomError::InvalidAttribute(attr));
        }
        self.slots
            .remove(attr.index, attr.generation)
            .ok_or(DomError::InvalidAttribute(attr))
    }

    /// Number of live attributes
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
