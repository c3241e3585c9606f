//! JSON string escaping and unescaping.

use crate::error::Error;
use std::borrow::Cow;
use std::fmt::Write as _;

/// Appends `input` to `out` with JSON escaping: the short forms for the
/// common control characters, `\u00XX` for the rest, and UTF-8 passed
/// through untouched.
pub fn escape_into(out: &mut String, input: &str) {
    for c in input.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
}

/// Decodes the body of a JSON string (the bytes between the quotes).
/// Borrows when no escape is present. `\uXXXX` sequences are full UTF-16
/// code units; surrogate pairs are assembled into a single code point, and
/// lone surrogates are rejected.
pub fn unescape(raw: &[u8]) -> Result<Cow<'_, str>, Error> {
    if !raw.contains(&b'\\') {
        return std::str::from_utf8(raw)
            .map(Cow::Borrowed)
            .map_err(|_| Error::InvalidUtf8);
    }

    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != b'\\' {
            let start = i;
            while i < raw.len() && raw[i] != b'\\' {
                i += 1;
            }
            out.push_str(std::str::from_utf8(&raw[start..i]).map_err(|_| Error::InvalidUtf8)?);
            continue;
        }
        i += 1;
        let escape = *raw.get(i).ok_or(Error::InvalidEscape)?;
        match escape {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{8}'),
            b'f' => out.push('\u{c}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => {
                let (c, consumed) = unicode_escape(&raw[i + 1..])?;
                out.push(c);
                i += consumed;
            }
            _ => return Err(Error::InvalidEscape),
        }
        i += 1;
    }
    Ok(Cow::Owned(out))
}

/// Parses the hex digits following `\u`, consuming a trailing low-surrogate
/// escape when the first unit is a high surrogate. Returns the decoded
/// character and how many bytes beyond the `u` were consumed.
fn unicode_escape(rest: &[u8]) -> Result<(char, usize), Error> {
    let high = hex4(rest)?;
    if (0xDC00..0xE000).contains(&high) {
        // Lone low surrogate.
        return Err(Error::InvalidEscape);
    }
    if (0xD800..0xDC00).contains(&high) {
        if rest.get(4) != Some(&b'\\') || rest.get(5) != Some(&b'u') {
            return Err(Error::InvalidEscape);
        }
        let low = hex4(&rest[6..])?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(Error::InvalidEscape);
        }
        let code = 0x10000 + (((high - 0xD800) as u32) << 10) + (low - 0xDC00) as u32;
        let c = char::from_u32(code).ok_or(Error::InvalidEscape)?;
        return Ok((c, 10));
    }
    let c = char::from_u32(high as u32).ok_or(Error::InvalidEscape)?;
    Ok((c, 4))
}

fn hex4(raw: &[u8]) -> Result<u16, Error> {
    if raw.len() < 4 {
        return Err(Error::InvalidEscape);
    }
    let mut out = 0u16;
    for &b in &raw[..4] {
        let digit = (b as char).to_digit(16).ok_or(Error::InvalidEscape)?;
        out = (out << 4) | digit as u16;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(input: &str) -> String {
        let mut out = String::new();
        escape_into(&mut out, input);
        out
    }

    #[test]
    fn test_escape_control_characters() {
        assert_eq!(escape("a\"b"), "a\\\"b");
        assert_eq!(escape("back\\slash"), "back\\\\slash");
        assert_eq!(escape("\u{8}\u{c}\n\r\t"), "\\b\\f\\n\\r\\t");
        assert_eq!(escape("\u{1}"), "\\u0001");
        assert_eq!(escape("café"), "café");
    }

    #[test]
    fn test_unescape_borrows_without_escapes() {
        let decoded = unescape(b"plain text").unwrap();
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded, "plain text");
    }

    #[test]
    fn test_unescape_short_forms() {
        assert_eq!(unescape(br#"a\"b\\c\/d"#).unwrap(), "a\"b\\c/d");
        assert_eq!(unescape(br"\b\f\n\r\t").unwrap(), "\u{8}\u{c}\n\r\t");
    }

    #[test]
    fn test_unescape_unicode() {
        assert_eq!(unescape(br"\u0041").unwrap(), "A");
        assert_eq!(unescape(br"\u00e9").unwrap(), "é");
        // Multi-byte code points survive whole instead of being truncated to
        // their low byte.
        assert_eq!(unescape(br"\u2603").unwrap(), "☃");
    }

    #[test]
    fn test_unescape_surrogate_pair() {
        assert_eq!(unescape(br"\ud83d\ude00").unwrap(), "😀");
    }

    #[test]
    fn test_unescape_rejects_lone_surrogates() {
        assert!(matches!(unescape(br"\ud83d"), Err(Error::InvalidEscape)));
        assert!(matches!(unescape(br"\ude00"), Err(Error::InvalidEscape)));
        assert!(matches!(
            unescape(br"\ud83dA"),
            Err(Error::InvalidEscape)
        ));
    }

    #[test]
    fn test_unescape_rejects_malformed() {
        assert!(matches!(unescape(br"\q"), Err(Error::InvalidEscape)));
        assert!(matches!(unescape(br"\u12"), Err(Error::InvalidEscape)));
        assert!(matches!(unescape(b"\\"), Err(Error::InvalidEscape)));
        assert!(matches!(unescape(&[0xFF]), Err(Error::InvalidUtf8)));
    }

    #[test]
    fn test_escape_round_trip() {
        let original = "mixed \"content\"\nwith\ttabs and ☃";
        let escaped = escape(original);
        let decoded = unescape(escaped.as_bytes()).unwrap();
        assert_eq!(decoded, original);
    }
}
