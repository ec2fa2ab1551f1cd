//! Element selection
//!
//! [`Selector`] is a small tree of predicates over elements: tag and id
//! tests, attribute tests and the descendant and child combinators.
//! [`Document::select`] walks a document in pre-order and yields every
//! element that matches.
//!
//! Tag names are compared qualified (`svg:rect`). Attribute names follow
//! [`Attribute::matches_name`](crate::Attribute::matches_name): `ns:name`
//! addresses a namespaced attribute and a bare name an unqualified one.

use crate::error::DomResult;
use crate::id::NodeRef;
use crate::node::{Descendants, Document, NodeData};

/// Predicate over the elements of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every element, `*`
    All,
    /// Elements with this qualified tag name, `p`
    Tag(String),
    /// Elements whose `id` attribute equals this value, `#main`
    Id(String),
    /// Elements matching both, `p.note`
    And(Box<Selector>, Box<Selector>),
    /// Elements matching either, `p, li`
    Or(Box<Selector>, Box<Selector>),
    /// Elements matching the second with an ancestor matching the first, `ul li`
    Descendant(Box<Selector>, Box<Selector>),
    /// Elements matching the second whose parent matches the first, `ul > li`
    Child(Box<Selector>, Box<Selector>),
    /// Elements carrying this attribute, `[href]`
    Attribute(String),
    /// Attribute value equals, `[lang=en]`
    AttributeValue(String, String),
    /// Attribute value is a whitespace-separated list containing, `[class~=x]`
    AttributeValueWhitespacedContains(String, String),
    /// Attribute value starts with, `[href^=https]`
    AttributeValueStartsWith(String, String),
    /// Attribute value ends with, `[src$=.png]`
    AttributeValueEndsWith(String, String),
    /// Attribute value contains, `[title*=draft]`
    AttributeValueSubstring(String, String),
}

impl Selector {
    /// Shorthand for [`Selector::Tag`]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    /// Shorthand for [`Selector::Id`]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Shorthand for [`Selector::Attribute`]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute(name.into())
    }

    /// Both `self` and `other`
    pub fn and(self, other: Selector) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Either `self` or `other`
    pub fn or(self, other: Selector) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// `inner` below an element matching `self`
    pub fn descendant(self, inner: Selector) -> Self {
        Self::Descendant(Box::new(self), Box::new(inner))
    }

    /// `inner` directly below an element matching `self`
    pub fn child(self, inner: Selector) -> Self {
        Self::Child(Box::new(self), Box::new(inner))
    }

    /// Whether at most one element can match
    ///
    /// True for id selections, which lets [`Selection`] stop after the first
    /// hit.
    pub fn is_unique(&self) -> bool {
        match self {
            Self::Id(_) => true,
            Self::And(left, right) => left.is_unique() || right.is_unique(),
            Self::Descendant(_, inner) | Self::Child(_, inner) => inner.is_unique(),
            _ => false,
        }
    }

    /// Whether `node` matches; the root, leaves and stale handles never do
    pub fn matches(&self, node: NodeRef, doc: &Document) -> bool {
        let Ok(NodeData::Element(elem)) = doc.get(node) else {
            return false;
        };

        match self {
            Self::All => true,
            Self::Tag(name) => elem.qualified_name() == name.as_str(),
            Self::Id(id) => any_attribute(doc, node, "id", |value| value == id.as_str()),
            Self::And(left, right) => left.matches(node, doc) && right.matches(node, doc),
            Self::Or(left, right) => left.matches(node, doc) || right.matches(node, doc),
            Self::Descendant(ancestor, inner) => {
                inner.matches(node, doc) && ancestors(doc, node).any(|parent| ancestor.matches(parent, doc))
            }
            Self::Child(parent, inner) => {
                inner.matches(node, doc) && ancestors(doc, node).next().is_some_and(|p| parent.matches(p, doc))
            }
            Self::Attribute(name) => any_attribute(doc, node, name, |_| true),
            Self::AttributeValue(name, expected) => any_attribute(doc, node, name, |value| value == expected.as_str()),
            Self::AttributeValueWhitespacedContains(name, expected) => {
                any_attribute(doc, node, name, |value| value.split_whitespace().any(|part| part == expected.as_str()))
            }
            Self::AttributeValueStartsWith(name, prefix) => {
                any_attribute(doc, node, name, |value| value.starts_with(prefix.as_str()))
            }
            Self::AttributeValueEndsWith(name, suffix) => {
                any_attribute(doc, node, name, |value| value.ends_with(suffix.as_str()))
            }
            Self::AttributeValueSubstring(name, needle) => {
                any_attribute(doc, node, name, |value| value.contains(needle.as_str()))
            }
        }
    }
}

fn any_attribute(doc: &Document, node: NodeRef, name: &str, test: impl Fn(&str) -> bool) -> bool {
    doc.attributes(node).is_ok_and(|attributes| {
        attributes
            .iter()
            .any(|attr| attr.matches_name(name) && test(&attr.value))
    })
}

/// Parents of `node`, nearest first
fn ancestors(doc: &Document, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
    std::iter::successors(doc.parent(node).ok().flatten(), move |current| {
        doc.parent(*current).ok().flatten()
    })
}

/// Pre-order iterator over the elements matching a [`Selector`]
pub struct Selection<'a> {
    doc: &'a Document,
    selector: Selector,
    walk: Descendants<'a>,
    unique: bool,
    done: bool,
}

impl Iterator for Selection<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        if self.done {
            return None;
        }
        let found = self.walk.find(|node| self.selector.matches(*node, self.doc));
        self.done = found.is_none() || self.unique;
        found
    }
}

impl Document {
    /// Every element of the document matching `selector`, in document order
    pub fn select(&self, selector: Selector) -> Selection<'_> {
        Selection {
            doc: self,
            unique: selector.is_unique(),
            selector,
            walk: self.walk(),
            done: false,
        }
    }

    /// Elements below `node` (excluding `node`) matching `selector`
    pub fn select_within(&self, node: NodeRef, selector: Selector) -> DomResult<Selection<'_>> {
        Ok(Selection {
            doc: self,
            unique: selector.is_unique(),
            selector,
            walk: self.descendants(node)?,
            done: false,
        })
    }

    /// First element whose `id` attribute equals `id`
    pub fn get_by_id(&self, id: &str) -> Option<NodeRef> {
        self.select(Selector::id(id)).next()
    }
}
