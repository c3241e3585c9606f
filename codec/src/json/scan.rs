//! Hand-rolled JSON value scanner.
//!
//! The parser never builds a token stream: it classifies a value by its first
//! byte, finds the value's extent with [`scan_value_end`], and hands the
//! exact slice to the type being decoded. Extent scanning tracks whether the
//! cursor is inside quotes, whether the previous character was an escape, and
//! the nested bracket depth.

use crate::error::Error;

/// What the first byte of a JSON value says it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `[`
    List,
    /// `{`
    Object,
    /// `"`
    String,
    /// `-` or a digit
    Number,
    /// `t`, `f`, or `n` (true / false / null)
    Literal,
}

impl ValueKind {
    /// Diagnostic name.
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::List => "list",
            ValueKind::Object => "object",
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Literal => "literal",
        }
    }
}

/// Classifies the first byte of a value, or `None` if no value can start
/// with it.
pub fn classify(byte: u8) -> Option<ValueKind> {
    match byte {
        b'[' => Some(ValueKind::List),
        b'{' => Some(ValueKind::Object),
        b'"' => Some(ValueKind::String),
        b'-' | b'0'..=b'9' => Some(ValueKind::Number),
        b't' | b'f' | b'n' => Some(ValueKind::Literal),
        _ => None,
    }
}

/// Classifies the value starting at `idx`, failing on an impossible first
/// byte.
pub fn classify_at(buf: &[u8], idx: usize) -> Result<ValueKind, Error> {
    let byte = *buf.get(idx).ok_or(Error::EndOfBuffer)?;
    classify(byte).ok_or(Error::UnexpectedToken(byte as char, idx))
}

/// Returns the index one past the last character of the value starting at
/// `start`. Strings terminate at their closing unescaped quote; numbers and
/// literals at the next top-level comma, whitespace, or closing bracket;
/// arrays and objects when their open/close counts balance to zero.
pub fn scan_value_end(buf: &[u8], start: usize, kind: ValueKind) -> Result<usize, Error> {
    match kind {
        ValueKind::String => {
            let mut escaped = false;
            let mut i = start + 1;
            while i < buf.len() {
                let b = buf[i];
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    return Ok(i + 1);
                }
                i += 1;
            }
            Err(Error::EndOfBuffer)
        }
        ValueKind::Number | ValueKind::Literal => {
            let mut i = start;
            while i < buf.len()
                && !matches!(buf[i], b',' | b']' | b'}' | b' ' | b'\t' | b'\n' | b'\r')
            {
                i += 1;
            }
            if i == start {
                return Err(Error::UnexpectedToken(buf[start] as char, start));
            }
            Ok(i)
        }
        ValueKind::List | ValueKind::Object => {
            let mut depth = 0usize;
            let mut in_quotes = false;
            let mut escaped = false;
            let mut i = start;
            while i < buf.len() {
                let b = buf[i];
                if in_quotes {
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == b'"' {
                        in_quotes = false;
                    }
                } else {
                    match b {
                        b'"' => in_quotes = true,
                        b'[' | b'{' => depth += 1,
                        b']' | b'}' => {
                            depth = depth
                                .checked_sub(1)
                                .ok_or(Error::UnexpectedToken(b as char, i))?;
                            if depth == 0 {
                                return Ok(i + 1);
                            }
                        }
                        _ => {}
                    }
                }
                i += 1;
            }
            Err(Error::EndOfBuffer)
        }
    }
}

/// Skips whitespace and, when `separator` is given, exactly one occurrence of
/// that separator (plus surrounding whitespace). Fails on any other
/// non-whitespace byte found before the separator, or on end of input.
pub fn advance_to_next(buf: &[u8], mut idx: usize, separator: Option<u8>) -> Result<usize, Error> {
    let mut seen = separator.is_none();
    while idx < buf.len() {
        let b = buf[idx];
        if b.is_ascii_whitespace() {
            idx += 1;
            continue;
        }
        if !seen && Some(b) == separator {
            seen = true;
            idx += 1;
            continue;
        }
        return if seen {
            Ok(idx)
        } else {
            Err(Error::UnexpectedToken(b as char, idx))
        };
    }
    Err(Error::EndOfBuffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end_of(src: &str) -> Result<usize, Error> {
        let kind = classify_at(src.as_bytes(), 0)?;
        scan_value_end(src.as_bytes(), 0, kind)
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(b'['), Some(ValueKind::List));
        assert_eq!(classify(b'{'), Some(ValueKind::Object));
        assert_eq!(classify(b'"'), Some(ValueKind::String));
        assert_eq!(classify(b'-'), Some(ValueKind::Number));
        assert_eq!(classify(b'7'), Some(ValueKind::Number));
        assert_eq!(classify(b't'), Some(ValueKind::Literal));
        assert_eq!(classify(b'n'), Some(ValueKind::Literal));
        assert_eq!(classify(b'x'), None);
    }

    #[test]
    fn test_scan_string() {
        assert_eq!(end_of(r#""abc""#).unwrap(), 5);
        assert_eq!(end_of(r#""a\"b" rest"#).unwrap(), 6);
        assert_eq!(end_of(r#""esc\\""#).unwrap(), 7);
        assert!(matches!(end_of(r#""unterminated"#), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_scan_number_and_literal() {
        assert_eq!(end_of("-12.5e3, next").unwrap(), 7);
        assert_eq!(end_of("42]").unwrap(), 2);
        assert_eq!(end_of("true}").unwrap(), 4);
        assert_eq!(end_of("null").unwrap(), 4);
    }

    #[test]
    fn test_scan_nested_containers() {
        assert_eq!(end_of(r#"[1, [2, 3], {"a": 4}] trailing"#).unwrap(), 21);
        assert_eq!(end_of(r#"{"k": "va]ue"}"#).unwrap(), 14);
        assert_eq!(end_of(r#"{"quote": "\""}"#).unwrap(), 15);
        assert!(matches!(end_of("[1, 2"), Err(Error::EndOfBuffer)));
    }

    #[test]
    fn test_advance_to_next() {
        let src = b"  , x";
        assert_eq!(advance_to_next(src, 0, Some(b',')).unwrap(), 4);
        assert_eq!(advance_to_next(src, 3, None).unwrap(), 4);
        assert!(matches!(
            advance_to_next(b"  x", 0, Some(b',')),
            Err(Error::UnexpectedToken('x', 2))
        ));
        assert!(matches!(
            advance_to_next(b"   ", 0, None),
            Err(Error::EndOfBuffer)
        ));
    }
}
