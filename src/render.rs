//! Markup rendering
//!
//! Renders whole documents or single subtrees back to markup text.
//!
//! Canonical form: `<ns:tag ns:name="value">...</ns:tag>`, with childless
//! elements written as `<tag />`. Text and attribute values are escaped so the
//! output always parses back to the same tree.

use std::fmt;

use crate::error::DomResult;
use crate::id::NodeRef;
use crate::node::{Document, NodeData};

// =============================================================================
// PrintOptions
// =============================================================================

/// Configuration for markup rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintOptions {
    /// Write everything on one line with no added whitespace.
    pub minify: bool,
    /// Spaces per nesting level when not minified.
    pub indent: usize,
}

impl PrintOptions {
    /// One node per line, four spaces per level.
    pub const PRETTY: Self = Self {
        minify: false,
        indent: 4,
    };

    /// No added whitespace.
    pub const MINIFIED: Self = Self {
        minify: true,
        indent: 0,
    };

    /// Set the indentation width used by pretty output.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[inline]
    fn pretty(&self) -> bool {
        !self.minify
    }
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self::PRETTY
    }
}

// =============================================================================
// Printer
// =============================================================================

struct Printer<'a, W: fmt::Write + ?Sized> {
    doc: &'a Document,
    options: &'a PrintOptions,
    writer: &'a mut W,
    first: bool,
}

impl<W: fmt::Write + ?Sized> Printer<'_, W> {
    fn line_start(&mut self, depth: usize) -> fmt::Result {
        if !self.options.pretty() {
            return Ok(());
        }
        if self.first {
            self.first = false;
        } else {
            self.writer.write_char('\n')?;
        }
        for _ in 0..depth * self.options.indent {
            self.writer.write_char(' ')?;
        }
        Ok(())
    }

    /// Render `node` and everything below it.
    ///
    /// Walks with an explicit stack of open and close steps. The outer
    /// result reports a bad handle, the inner one a writer error.
    fn run(&mut self, node: NodeRef) -> DomResult<fmt::Result> {
        let mut steps = vec![Step::Open(node, 0)];
        while let Some(step) = steps.pop() {
            let written = match step {
                Step::Open(node, depth) => self.open(node, depth, &mut steps)?,
                Step::Close(node, depth) => self.close(node, depth)?,
            };
            if written.is_err() {
                return Ok(written);
            }
        }
        Ok(Ok(()))
    }

    fn open(&mut self, node: NodeRef, depth: usize, steps: &mut Vec<Step>) -> DomResult<fmt::Result> {
        let doc = self.doc;
        let children = doc.children(node)?;
        match doc.get(node)? {
            NodeData::Root => {
                steps.extend(children.iter().rev().map(|child| Step::Open(*child, depth)));
                Ok(Ok(()))
            }
            NodeData::Leaf(text) => Ok(self
                .line_start(depth)
                .and_then(|()| write_escaped(self.writer, text, false))),
            NodeData::Element(elem) => {
                let name = elem.qualified_name();
                let attributes = doc.attributes(node)?;
                let written = self.line_start(depth).and_then(|()| {
                    write!(self.writer, "<{name}")?;
                    for attr in &attributes {
                        write!(self.writer, " {}=\"", attr.qualified_name())?;
                        write_escaped(self.writer, &attr.value, true)?;
                        self.writer.write_char('"')?;
                    }
                    if children.is_empty() {
                        self.writer.write_str(" />")
                    } else {
                        self.writer.write_char('>')
                    }
                });
                if !children.is_empty() {
                    steps.push(Step::Close(node, depth));
                    steps.extend(children.iter().rev().map(|child| Step::Open(*child, depth + 1)));
                }
                Ok(written)
            }
        }
    }

    fn close(&mut self, node: NodeRef, depth: usize) -> DomResult<fmt::Result> {
        let doc = self.doc;
        let Some(elem) = doc.get(node)?.as_element() else {
            return Ok(Ok(()));
        };
        let name = elem.qualified_name();
        Ok(self
            .line_start(depth)
            .and_then(|()| write!(self.writer, "</{name}>")))
    }
}

enum Step {
    Open(NodeRef, usize),
    Close(NodeRef, usize),
}

/// Escape markup special characters.
///
/// Attribute values additionally escape `"`.
fn write_escaped<W: fmt::Write + ?Sized>(writer: &mut W, text: &str, attribute: bool) -> fmt::Result {
    let mut last = 0;
    for (i, c) in text.char_indices() {
        let escaped = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' if attribute => "&quot;",
            _ => continue,
        };
        writer.write_str(&text[last..i])?;
        writer.write_str(escaped)?;
        last = i + c.len_utf8();
    }
    writer.write_str(&text[last..])
}

// =============================================================================
// Document rendering
// =============================================================================

impl Document {
    /// Render the subtree at `node` into `writer`
    ///
    /// Rendering the root renders its children one after another.
    /// The outer result reports a bad handle, the inner one a writer error.
    pub fn print_node<W>(&self, node: NodeRef, writer: &mut W, options: &PrintOptions) -> DomResult<fmt::Result>
    where
        W: fmt::Write + ?Sized,
    {
        let mut printer = Printer {
            doc: self,
            options,
            writer,
            first: true,
        };
        printer.run(node)
    }

    /// Render the whole document into `writer`
    pub fn print<W>(&self, writer: &mut W, options: &PrintOptions) -> fmt::Result
    where
        W: fmt::Write + ?Sized,
    {
        self.print_node(self.root(), writer, options)
            .unwrap_or_else(|_| Err(fmt::Error))
    }

    /// Render the whole document with explicit options
    pub fn to_string_with(&self, options: &PrintOptions) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail.
        let _ = self.print(&mut output, options);
        output
    }

    /// Render the subtree at `node` in pretty form
    pub fn node_to_string(&self, node: NodeRef) -> DomResult<String> {
        self.node_to_string_with(node, &PrintOptions::PRETTY)
    }

    /// Render the subtree at `node` with explicit options
    pub fn node_to_string_with(&self, node: NodeRef, options: &PrintOptions) -> DomResult<String> {
        let mut output = String::new();
        let _ = self.print_node(node, &mut output, options)?;
        Ok(output)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = if f.alternate() {
            PrintOptions::MINIFIED
        } else {
            PrintOptions::PRETTY
        };
        self.print(f, &options)
    }
}

// =============================================================================
// Tests
// =============================================================================
