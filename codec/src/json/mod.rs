//! Self-describing JSON text format.
//!
//! The parser works on slices rather than a token stream: a value's kind is
//! read from its first byte, its extent found by [`scan::scan_value_end`],
//! and the exact slice handed to the type being decoded, mirroring how the
//! binary codec hands each type its exact frame payload. Output is
//! pretty-printed with two-space indentation.

mod containers;
mod primitives;
mod printer;
pub(crate) mod scan;
pub(crate) mod text;

use crate::error::Error;
use crate::schema::Reflect;
pub use containers::{read_keyed, read_sequence, write_keyed, write_sequence, JsonKey};
use paste::paste;
pub use printer::Printer;
use scan::ValueKind;
use std::borrow::Cow;
use wireform_arena::Transaction;

/// Trait for types that can be printed as a JSON value.
pub trait ToJson {
    /// Prints this value at the printer's current position.
    fn to_json(&self, out: &mut Printer) -> Result<(), Error>;
}

/// Trait for types that can be parsed from the exact slice of one JSON value.
pub trait FromJson: Sized {
    /// Parses a value from `raw`, which holds exactly one JSON value.
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error>;
}

/// Walks the entries of a JSON object, yielding each unescaped key with the
/// exact slice of its value.
pub struct ObjectScanner<'a> {
    buf: &'a [u8],
    idx: usize,
    first: bool,
    done: bool,
}

impl<'a> ObjectScanner<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self, Error> {
        let start = scan::advance_to_next(buf, 0, None)?;
        if buf[start] != b'{' {
            return Err(Error::UnexpectedToken(buf[start] as char, start));
        }
        Ok(Self {
            buf,
            idx: start + 1,
            first: true,
            done: false,
        })
    }

    /// Next `key: value` entry, or `None` once the closing brace is reached.
    pub fn next_entry(&mut self) -> Result<Option<(Cow<'a, str>, &'a [u8])>, Error> {
        if self.done {
            return Ok(None);
        }
        let mut idx = scan::advance_to_next(self.buf, self.idx, None)?;
        if self.buf[idx] == b'}' {
            self.done = true;
            self.idx = idx + 1;
            return Ok(None);
        }
        if !self.first {
            if self.buf[idx] != b',' {
                return Err(Error::UnexpectedToken(self.buf[idx] as char, idx));
            }
            idx = scan::advance_to_next(self.buf, idx + 1, None)?;
        }
        self.first = false;

        if self.buf[idx] != b'"' {
            return Err(Error::UnexpectedToken(self.buf[idx] as char, idx));
        }
        let key_end = scan::scan_value_end(self.buf, idx, ValueKind::String)?;
        let key = text::unescape(&self.buf[idx + 1..key_end - 1])?;

        let value_start = scan::advance_to_next(self.buf, key_end, Some(b':'))?;
        let kind = scan::classify_at(self.buf, value_start)?;
        let value_end = scan::scan_value_end(self.buf, value_start, kind)?;
        self.idx = value_end;
        Ok(Some((key, &self.buf[value_start..value_end])))
    }

    /// Verifies nothing but whitespace follows the closing brace.
    pub fn finish(&self) -> Result<(), Error> {
        finish_at(self.buf, self.idx)
    }
}

/// Walks the elements of a JSON array, yielding each element's exact slice.
pub struct ListScanner<'a> {
    buf: &'a [u8],
    idx: usize,
    first: bool,
    done: bool,
}

impl<'a> ListScanner<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self, Error> {
        let start = scan::advance_to_next(buf, 0, None)?;
        if buf[start] != b'[' {
            return Err(Error::UnexpectedToken(buf[start] as char, start));
        }
        Ok(Self {
            buf,
            idx: start + 1,
            first: true,
            done: false,
        })
    }

    /// Next element, or `None` once the closing bracket is reached.
    pub fn next_value(&mut self) -> Result<Option<&'a [u8]>, Error> {
        if self.done {
            return Ok(None);
        }
        let mut idx = scan::advance_to_next(self.buf, self.idx, None)?;
        if self.buf[idx] == b']' {
            self.done = true;
            self.idx = idx + 1;
            return Ok(None);
        }
        if !self.first {
            if self.buf[idx] != b',' {
                return Err(Error::UnexpectedToken(self.buf[idx] as char, idx));
            }
            idx = scan::advance_to_next(self.buf, idx + 1, None)?;
        }
        self.first = false;

        let kind = scan::classify_at(self.buf, idx)?;
        let end = scan::scan_value_end(self.buf, idx, kind)?;
        self.idx = end;
        Ok(Some(&self.buf[idx..end]))
    }

    /// Verifies nothing but whitespace follows the closing bracket.
    pub fn finish(&self) -> Result<(), Error> {
        finish_at(self.buf, self.idx)
    }
}

fn finish_at(buf: &[u8], idx: usize) -> Result<(), Error> {
    if buf[idx..].iter().all(u8::is_ascii_whitespace) {
        Ok(())
    } else {
        Err(Error::ExtraData(buf.len() - idx))
    }
}

/// Generic composite-record print: an object with one entry per field, in
/// descriptor order.
pub fn write_record<R: Reflect>(value: &R, out: &mut Printer) -> Result<(), Error> {
    let descriptor = R::descriptor();
    if descriptor.fields.is_empty() {
        return out.raw("{}");
    }
    out.raw("{")?;
    out.indent();
    for (i, field) in descriptor.fields.iter().enumerate() {
        if i > 0 {
            out.raw(",")?;
        }
        out.newline()?;
        out.string(field.name)?;
        out.raw(" : ")?;
        (field.to_json)(value, out)?;
    }
    out.dedent();
    out.newline()?;
    out.raw("}")
}

/// Generic composite-record parse. An object is matched by field name: keys
/// with no matching field are skipped, and fields with no matching key keep
/// their `Default` value. An array is matched positionally in descriptor
/// order, and surplus elements are an error.
pub fn read_record<R: Reflect>(raw: &[u8], txn: &mut Transaction) -> Result<R, Error> {
    let descriptor = R::descriptor();
    let start = scan::advance_to_next(raw, 0, None)?;
    let mut out = R::default();
    match scan::classify_at(raw, start)? {
        ValueKind::Object => {
            let mut scanner = ObjectScanner::new(&raw[start..])?;
            while let Some((key, value)) = scanner.next_entry()? {
                let Some(field) = descriptor.fields.iter().find(|f| key == f.name) else {
                    continue;
                };
                (field.from_json)(&mut out, value, txn)?;
            }
            scanner.finish()?;
        }
        ValueKind::List => {
            let mut scanner = ListScanner::new(&raw[start..])?;
            let mut fields = descriptor.fields.iter();
            while let Some(value) = scanner.next_value()? {
                let field = fields.next().ok_or(Error::ExtraData(value.len()))?;
                (field.from_json)(&mut out, value, txn)?;
            }
            scanner.finish()?;
        }
        kind => return Err(Error::TypeMismatch(descriptor.name, kind.name())),
    }
    if let Some(finalize) = descriptor.finalize {
        finalize(&mut out)?;
    }
    Ok(out)
}

// Tuples are anonymous records: a positional array, one element per slot.
macro_rules! impl_json_for_tuple {
    ($($index:literal),*) => {
        paste! {
            impl<$( [<T $index>]: ToJson ),*> ToJson for ( $( [<T $index>], )* ) {
                fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
                    out.raw("[")?;
                    out.indent();
                    $(
                        if $index > 0 {
                            out.raw(",")?;
                        }
                        out.newline()?;
                        self.$index.to_json(out)?;
                    )*
                    out.dedent();
                    out.newline()?;
                    out.raw("]")
                }
            }

            impl<$( [<T $index>]: FromJson ),*> FromJson for ( $( [<T $index>], )* ) {
                fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
                    let mut scanner = ListScanner::new(raw)?;
                    let value = ( $(
                        [<T $index>]::from_json(
                            scanner.next_value()?.ok_or(Error::EndOfBuffer)?,
                            txn,
                        )?,
                    )* );
                    if let Some(extra) = scanner.next_value()? {
                        return Err(Error::ExtraData(extra.len()));
                    }
                    scanner.finish()?;
                    Ok(value)
                }
            }
        }
    };
}

impl_json_for_tuple!(0);
impl_json_for_tuple!(0, 1);
impl_json_for_tuple!(0, 1, 2);
impl_json_for_tuple!(0, 1, 2, 3);
impl_json_for_tuple!(0, 1, 2, 3, 4);
impl_json_for_tuple!(0, 1, 2, 3, 4, 5);

#[cfg(test)]
mod tests {
    use super::*;

    fn object_entries(src: &str) -> Vec<(String, String)> {
        let mut scanner = ObjectScanner::new(src.as_bytes()).unwrap();
        let mut entries = Vec::new();
        while let Some((key, value)) = scanner.next_entry().unwrap() {
            entries.push((
                key.into_owned(),
                String::from_utf8(value.to_vec()).unwrap(),
            ));
        }
        scanner.finish().unwrap();
        entries
    }

    #[test]
    fn test_object_scanner() {
        let entries = object_entries(r#"{"a" : 1, "b": [2, 3], "c":"x,y"}"#);
        assert_eq!(
            entries,
            vec![
                ("a".into(), "1".into()),
                ("b".into(), "[2, 3]".into()),
                ("c".into(), "\"x,y\"".into()),
            ]
        );
    }

    #[test]
    fn test_object_scanner_empty_and_escaped_keys() {
        assert!(object_entries("{}").is_empty());
        assert!(object_entries("  { }  ").is_empty());
        let entries = object_entries(r#"{"\n" : null}"#);
        assert_eq!(entries, vec![("\n".into(), "null".into())]);
    }

    #[test]
    fn test_object_scanner_rejects_malformed() {
        let mut scanner = ObjectScanner::new(br#"{"a" 1}"#).unwrap();
        assert!(matches!(
            scanner.next_entry(),
            Err(Error::UnexpectedToken('1', _))
        ));

        let mut scanner = ObjectScanner::new(br#"{"a": 1,}"#).unwrap();
        assert!(scanner.next_entry().unwrap().is_some());
        assert!(matches!(
            scanner.next_entry(),
            Err(Error::UnexpectedToken('}', _))
        ));

        assert!(matches!(
            ObjectScanner::new(b"[1]"),
            Err(Error::UnexpectedToken('[', 0))
        ));
    }

    #[test]
    fn test_list_scanner() {
        let mut scanner = ListScanner::new(b" [1, \"a\", [2]] ").unwrap();
        assert_eq!(scanner.next_value().unwrap().unwrap(), b"1");
        assert_eq!(scanner.next_value().unwrap().unwrap(), b"\"a\"");
        assert_eq!(scanner.next_value().unwrap().unwrap(), b"[2]");
        assert!(scanner.next_value().unwrap().is_none());
        scanner.finish().unwrap();
    }

    #[test]
    fn test_list_scanner_trailing_garbage() {
        let mut scanner = ListScanner::new(b"[] x").unwrap();
        assert!(scanner.next_value().unwrap().is_none());
        assert!(matches!(scanner.finish(), Err(Error::ExtraData(_))));
    }

    #[test]
    fn test_tuple_round_trip() {
        let value = (1u8, String::from("two"), true);
        let mut out = Printer::new();
        value.to_json(&mut out).unwrap();
        let rendered = out.into_bytes().unwrap();
        assert_eq!(
            std::str::from_utf8(&rendered).unwrap(),
            "[\n  1,\n  \"two\",\n  true\n]"
        );
        let decoded: (u8, String, bool) =
            FromJson::from_json(&rendered, &mut Transaction::new()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_tuple_arity_mismatch() {
        let mut txn = Transaction::new();
        assert!(matches!(
            <(u8, u8)>::from_json(b"[1]", &mut txn),
            Err(Error::EndOfBuffer)
        ));
        assert!(matches!(
            <(u8,)>::from_json(b"[1, 2]", &mut txn),
            Err(Error::ExtraData(_))
        ));
    }
}
