//! Character reference decoding
//!
//! Handles:
//! - Built-in entities: `&lt; &gt; &amp; &quot; &apos;`
//! - Numeric character references: `&#123; &#x7B;`
//!
//! An `&` that is not followed by a name or `#` is kept literally. Anything
//! that starts like a reference but is not a valid one is an error.
//!
//! Returns `Cow::Borrowed` when no `&` is present.

use std::borrow::Cow;

use memchr::memchr;

/// A bad reference: byte offset of its `&` within the input, and a message
pub(crate) type EntityError = (usize, String);

/// Decode all character references in `input`
pub(crate) fn decode(input: &str) -> Result<Cow<'_, str>, EntityError> {
    let bytes = input.as_bytes();
    if memchr(b'&', bytes).is_none() {
        return Ok(Cow::Borrowed(input));
    }

    let mut out = String::with_capacity(input.len());
    let mut pos = 0;
    while let Some(offset) = memchr(b'&', &bytes[pos..]) {
        let amp = pos + offset;
        out.push_str(&input[pos..amp]);

        let starts_reference = bytes
            .get(amp + 1)
            .is_some_and(|b| *b == b'#' || b.is_ascii_alphabetic());
        if !starts_reference {
            out.push('&');
            pos = amp + 1;
            continue;
        }

        let Some(semi) = memchr(b';', &bytes[amp..]).map(|i| amp + i) else {
            return Err((amp, "unterminated character reference".to_string()));
        };
        let name = &input[amp + 1..semi];
        match decode_one(name) {
            Some(c) => out.push(c),
            None => return Err((amp, format!("invalid character reference `&{name};`"))),
        }
        pos = semi + 1;
    }
    out.push_str(&input[pos..]);
    Ok(Cow::Owned(out))
}

fn decode_one(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            // U+0000 is not a valid character reference.
            char::from_u32(code).filter(|c| *c != '\0')
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_references_borrows() {
        assert!(matches!(decode("plain text"), Ok(Cow::Borrowed("plain text"))));
    }

    #[test]
    fn test_named_and_numeric() {
        assert_eq!(decode("a &lt;b&gt; &amp; &quot;c&quot; &apos;").unwrap(), "a <b> & \"c\" '");
        assert_eq!(decode("&#65;&#x42;&#X43;").unwrap(), "ABC");
        assert_eq!(decode("&#x1F600;").unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_bare_ampersand_is_literal() {
        assert_eq!(decode("fish & chips &").unwrap(), "fish & chips &");
    }

    #[test]
    fn test_invalid_references() {
        assert_eq!(decode("x &nbsp; y").unwrap_err().0, 2);
        assert!(decode("&#xD800;").is_err());
        assert!(decode("&#0;").is_err());
        assert!(decode("&#;").is_err());
        assert!(decode("&lt").is_err());
    }
}
