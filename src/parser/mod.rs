//! Markup parser
//!
//! Builds a fresh [`Document`] from markup text in one pass, allocating nodes
//! straight into the new document's arena.
//!
//! # Supported syntax
//!
//! - Start, end and self-closing tags; `prefix:name` element and attribute
//!   names put `prefix` in the namespace field
//! - Double-quoted, single-quoted, unquoted and valueless attributes
//! - Character references (`&lt;`, `&#60;`, `&#x3C;`, ...)
//! - `<![CDATA[...]]>` sections, taken as literal text
//! - Comments, doctypes and processing instructions, which are skipped
//!
//! # Policy
//!
//! Parsing fails closed: mismatched or stray end tags, elements left open at
//! the end of input, unterminated constructs, invalid names and invalid
//! character references are all errors. No element is implied or closed
//! implicitly.
//!
//! Text is handled per [`ParseOptions`]: by default each text run is trimmed
//! and whitespace-only runs are dropped.

mod entities;
mod scanner;

use compact_str::CompactString;

use crate::attr::Attribute;
use crate::error::ParseError;
use crate::id::NodeRef;
use crate::node::{Document, Tree};

pub(crate) use scanner::is_qualified_name;
use scanner::Scanner;

// =============================================================================
// ParseOptions
// =============================================================================

/// Configuration for parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Trim every text run and drop the ones that are only whitespace.
    pub trim_whitespace: bool,
}

impl ParseOptions {
    /// Trim text runs (the default).
    pub const TRIM: Self = Self { trim_whitespace: true };

    /// Keep every text run byte for byte.
    pub const PRESERVE: Self = Self {
        trim_whitespace: false,
    };

    /// Keep whitespace exactly as written.
    pub fn preserve_whitespace() -> Self {
        Self::PRESERVE
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::TRIM
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Parse `input` into a new document.
pub fn parse(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    let mut parser = Parser {
        input,
        scanner: Scanner::new(input),
        options,
        tree: Tree::new(),
        open: Vec::new(),
        text: String::new(),
    };
    parser.run()?;
    Ok(Document {
        tree: parser.tree,
        fragment: None,
    })
}

/// Parse independent inputs, in parallel when the `parallel` feature is on.
///
/// Results are in input order.
#[cfg(feature = "parallel")]
pub fn parse_many<S>(inputs: &[S], options: &ParseOptions) -> Vec<Result<Document, ParseError>>
where
    S: AsRef<str> + Sync,
{
    use rayon::prelude::*;

    inputs
        .par_iter()
        .map(|input| parse(input.as_ref(), options))
        .collect()
}

/// Parse independent inputs, in parallel when the `parallel` feature is on.
///
/// Results are in input order.
#[cfg(not(feature = "parallel"))]
pub fn parse_many<S>(inputs: &[S], options: &ParseOptions) -> Vec<Result<Document, ParseError>>
where
    S: AsRef<str>,
{
    inputs
        .iter()
        .map(|input| parse(input.as_ref(), options))
        .collect()
}

// =============================================================================
// Parser
// =============================================================================

struct OpenElement {
    node: NodeRef,
    name: (usize, usize),
    start: usize,
}

struct Parser<'a> {
    input: &'a str,
    scanner: Scanner<'a>,
    options: &'a ParseOptions,
    tree: Tree,
    open: Vec<OpenElement>,
    text: String,
}

impl Parser<'_> {
    fn error(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::at(self.input, offset, message)
    }

    fn current(&self) -> NodeRef {
        self.open.last().map_or_else(|| self.tree.root(), |open| open.node)
    }

    fn run(&mut self) -> Result<(), ParseError> {
        while !self.scanner.is_eof() {
            let start = self.scanner.position();
            let Some(lt) = self.scanner.find_byte(b'<') else {
                self.push_text(start, self.input.len())?;
                self.scanner.set_position(self.input.len());
                break;
            };
            self.push_text(start, lt)?;
            self.scanner.set_position(lt);

            if self.scanner.starts_with(b"<!--") {
                self.skip_past(b"-->", "unterminated comment")?;
            } else if self.scanner.starts_with(b"<![CDATA[") {
                self.cdata()?;
            } else if self.scanner.starts_with(b"<!") {
                self.skip_past(b">", "unterminated doctype")?;
            } else if self.scanner.starts_with(b"<?") {
                self.skip_past(b"?>", "unterminated processing instruction")?;
            } else if self.scanner.starts_with(b"</") {
                self.flush_text()?;
                self.end_tag()?;
            } else {
                self.flush_text()?;
                self.start_tag()?;
            }
        }

        self.flush_text()?;
        if let Some(open) = self.open.last() {
            let input = self.input;
            let name = &input[open.name.0..open.name.1];
            return Err(self.error(open.start, format!("unclosed element <{name}>")));
        }
        Ok(())
    }

    fn skip_past(&mut self, terminator: &[u8], message: &str) -> Result<(), ParseError> {
        let start = self.scanner.position();
        match self.scanner.find(terminator) {
            Some(end) => {
                self.scanner.set_position(end + terminator.len());
                Ok(())
            }
            None => Err(self.error(start, message)),
        }
    }

    fn cdata(&mut self) -> Result<(), ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(b"<![CDATA[".len());
        let body = self.scanner.position();
        match self.scanner.find(b"]]>") {
            Some(end) => {
                self.text.push_str(&self.input[body..end]);
                self.scanner.set_position(end + 3);
                Ok(())
            }
            None => Err(self.error(start, "unterminated CDATA section")),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Text
    // ─────────────────────────────────────────────────────────────────────────

    fn push_text(&mut self, start: usize, end: usize) -> Result<(), ParseError> {
        if start == end {
            return Ok(());
        }
        let decoded = entities::decode(&self.input[start..end])
            .map_err(|(offset, message)| self.error(start + offset, message))?;
        self.text.push_str(&decoded);
        Ok(())
    }

    fn flush_text(&mut self) -> Result<(), ParseError> {
        if self.text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.text);
        let text = if self.options.trim_whitespace {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(());
            }
            trimmed.to_string()
        } else {
            text
        };
        let parent = self.current();
        self.tree
            .append_leaf(parent, text)
            .map(drop)
            .map_err(|err| ParseError::at(self.input, self.scanner.position(), err.to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tags
    // ─────────────────────────────────────────────────────────────────────────

    /// Read a `prefix:local` or `local` name into (namespace, local)
    fn qualified_name(&mut self, what: &str) -> Result<((usize, usize), CompactString, CompactString), ParseError> {
        let at = self.scanner.position();
        let Some((start, end)) = self.scanner.read_name() else {
            return Err(self.error(at, format!("expected {what} name")));
        };
        let name = &self.input[start..end];
        let (namespace, local) = match name.split_once(':') {
            None => ("", name),
            Some((ns, local)) if !ns.is_empty() && !local.is_empty() && !local.contains(':') => (ns, local),
            Some(_) => return Err(self.error(start, format!("invalid {what} name `{name}`"))),
        };
        Ok(((start, end), namespace.into(), local.into()))
    }

    fn start_tag(&mut self) -> Result<(), ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(1);
        let (name, namespace, tag) = self.qualified_name("element")?;

        let mut attributes = Vec::new();
        let self_closing = loop {
            let spaced = self.scanner.skip_whitespace() > 0;
            match self.scanner.peek() {
                None => return Err(self.error(start, "unterminated start tag")),
                Some(b'>') => {
                    self.scanner.advance(1);
                    break false;
                }
                Some(b'/') => {
                    self.scanner.advance(1);
                    if self.scanner.peek() != Some(b'>') {
                        return Err(self.error(self.scanner.position(), "expected `>` after `/`"));
                    }
                    self.scanner.advance(1);
                    break true;
                }
                Some(_) if !spaced => {
                    return Err(self.error(self.scanner.position(), "expected whitespace before attribute"));
                }
                Some(_) => attributes.push(self.attribute()?),
            }
        };

        let parent = self.current();
        let node = self
            .tree
            .append_element(parent, namespace, tag, attributes)
            .map_err(|err| self.error(start, err.to_string()))?;
        if !self_closing {
            self.open.push(OpenElement { node, name, start });
        }
        Ok(())
    }

    fn attribute(&mut self) -> Result<Attribute, ParseError> {
        let (_, namespace, name) = self.qualified_name("attribute")?;
        let after_name = self.scanner.position();
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'=') {
            self.scanner.set_position(after_name);
            return Ok(Attribute::namespaced(namespace, name, String::new()));
        }
        self.scanner.advance(1);
        self.scanner.skip_whitespace();

        let at = self.scanner.position();
        let (start, end) = match self.scanner.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.scanner.advance(1);
                let Some(close) = self.scanner.find_byte(quote) else {
                    return Err(self.error(at, "unterminated attribute value"));
                };
                self.scanner.set_position(close + 1);
                (at + 1, close)
            }
            _ => {
                let (start, end) = self.scanner.read_unquoted();
                let raw = &self.input[start..end];
                if raw.is_empty() || raw.contains(['"', '\'', '<', '=', '`']) {
                    return Err(self.error(at, "invalid unquoted attribute value"));
                }
                (start, end)
            }
        };
        let value = entities::decode(&self.input[start..end])
            .map_err(|(offset, message)| self.error(start + offset, message))?;
        Ok(Attribute::namespaced(namespace, name, value.into_owned()))
    }

    fn end_tag(&mut self) -> Result<(), ParseError> {
        let start = self.scanner.position();
        self.scanner.advance(2);
        let at = self.scanner.position();
        let Some((name_start, name_end)) = self.scanner.read_name() else {
            return Err(self.error(at, "expected element name"));
        };
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(self.error(self.scanner.position(), "unterminated end tag"));
        }
        self.scanner.advance(1);

        let input = self.input;
        let name = &input[name_start..name_end];
        match self.open.last().map(|open| &input[open.name.0..open.name.1]) {
            None => Err(self.error(start, format!("unexpected end tag </{name}>"))),
            Some(expected) if expected != name => Err(self.error(
                start,
                format!("mismatched end tag: expected </{expected}>, found </{name}>"),
            )),
            Some(_) => {
                self.open.pop();
                Ok(())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
