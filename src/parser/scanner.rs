//! Byte cursor over markup input
//!
//! Delimiter searches go through `memchr`, which picks SIMD implementations
//! at runtime where available.

use memchr::{memchr, memmem};

/// Cursor over the input bytes
///
/// Positions are byte offsets into the original `&str`. The parser only
/// stops on ASCII delimiters, so every position it slices at is a char
/// boundary.
pub(crate) struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub(crate) fn new(input: &'a str) -> Self {
        Scanner {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    #[inline]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub(crate) fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    #[inline]
    pub(crate) fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Skip ASCII whitespace, returning how many bytes were skipped
    #[inline]
    pub(crate) fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        while let Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0c') = self.peek() {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Absolute position of the next occurrence of `byte`
    #[inline]
    pub(crate) fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Absolute position of the next occurrence of `needle`
    #[inline]
    pub(crate) fn find(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.input[self.pos..], needle).map(|i| self.pos + i)
    }

    /// Consume a name, returning its `(start, end)` byte range
    ///
    /// Names start with a letter, `_` or any non-ASCII byte and continue with
    /// letters, digits, `_`, `-`, `.`, `:` or non-ASCII bytes.
    pub(crate) fn read_name(&mut self) -> Option<(usize, usize)> {
        let start = self.pos;
        if !self.peek().is_some_and(is_name_start_char) {
            return None;
        }
        self.pos += 1;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        Some((start, self.pos))
    }

    /// Consume an unquoted attribute value, returning its byte range
    pub(crate) fn read_unquoted(&mut self) -> (usize, usize) {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'>') {
                break;
            }
            self.pos += 1;
        }
        (start, self.pos)
    }
}

/// Whether `namespace` and `local` form a name the parser would read back
/// into the same pair
///
/// `local` must be a non-empty name without `:`; a non-empty `namespace`
/// must be a name without `:` as well.
pub(crate) fn is_qualified_name(namespace: &str, local: &str) -> bool {
    let first = if namespace.is_empty() { local } else { namespace };
    let valid = |part: &str| !part.is_empty() && part.bytes().all(|b| b != b':' && is_name_char(b));
    first.bytes().next().is_some_and(is_name_start_char) && valid(local) && (namespace.is_empty() || valid(namespace))
}

#[inline]
fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_') || b >= 0x80
}

#[inline]
fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_helpers() {
        let scanner = Scanner::new("hello <!-- x --> <world>");
        assert_eq!(scanner.find_byte(b'<'), Some(6));
        assert_eq!(scanner.find(b"-->"), Some(13));
        assert_eq!(scanner.find_byte(b'>'), Some(15));
    }

    #[test]
    fn test_read_name() {
        let mut scanner = Scanner::new("svg:rect-1 x");
        assert_eq!(scanner.read_name(), Some((0, 10)));
        assert_eq!(scanner.skip_whitespace(), 1);
        assert_eq!(scanner.read_name(), Some((11, 12)));
        assert!(scanner.is_eof());
    }

    #[test]
    fn test_name_cannot_start_with_digit() {
        let mut scanner = Scanner::new("1abc");
        assert_eq!(scanner.read_name(), None);
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn test_qualified_name_rules() {
        assert!(is_qualified_name("", "a"));
        assert!(is_qualified_name("svg", "rect-1"));
        assert!(is_qualified_name("x", "1"));
        assert!(is_qualified_name("", "é"));
        assert!(!is_qualified_name("", ""));
        assert!(!is_qualified_name("svg", ""));
        assert!(!is_qualified_name("", "b c"));
        assert!(!is_qualified_name("", "x\"y"));
        assert!(!is_qualified_name("", "a:b"));
        assert!(!is_qualified_name("a:b", "c"));
        assert!(!is_qualified_name("", "1a"));
        assert!(!is_qualified_name("-x", "a"));
    }

    #[test]
    fn test_read_unquoted() {
        let mut scanner = Scanner::new("a/b>");
        assert_eq!(scanner.read_unquoted(), (0, 3));
        assert_eq!(scanner.peek(), Some(b'>'));
    }
}
