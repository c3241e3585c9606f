//! JSON codec implementations for primitive and pointer-like types.

use super::printer::Printer;
use super::scan::{self, ValueKind};
use super::{text, FromJson, ListScanner, ToJson};
use crate::error::Error;
use bytes::Bytes;
use wireform_arena::Transaction;

/// Checks that `raw` is exactly one value of the expected kind.
fn expect_exact(raw: &[u8], expected: ValueKind, name: &'static str) -> Result<usize, Error> {
    let kind = scan::classify_at(raw, 0)?;
    if kind != expected {
        return Err(Error::TypeMismatch(name, kind.name()));
    }
    let end = scan::scan_value_end(raw, 0, kind)?;
    if end != raw.len() {
        return Err(Error::ExtraData(raw.len() - end));
    }
    Ok(end)
}

fn parse_number<T: std::str::FromStr>(raw: &[u8], name: &'static str) -> Result<T, Error> {
    expect_exact(raw, ValueKind::Number, name)?;
    let digits = std::str::from_utf8(raw).map_err(|_| Error::InvalidUtf8)?;
    digits
        .parse()
        .map_err(|_| Error::MalformedNumber(digits.to_owned()))
}

macro_rules! impl_json_integer {
    ($type:ty) => {
        impl ToJson for $type {
            #[inline]
            fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
                out.raw(&self.to_string())
            }
        }

        impl FromJson for $type {
            #[inline]
            fn from_json(raw: &[u8], _: &mut Transaction) -> Result<Self, Error> {
                parse_number(raw, stringify!($type))
            }
        }
    };
}

macro_rules! impl_json_float {
    ($type:ty) => {
        impl ToJson for $type {
            #[inline]
            fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
                // JSON has no encoding for NaN or the infinities.
                if !self.is_finite() {
                    return Err(Error::MalformedNumber(self.to_string()));
                }
                out.raw(&self.to_string())
            }
        }

        impl FromJson for $type {
            #[inline]
            fn from_json(raw: &[u8], _: &mut Transaction) -> Result<Self, Error> {
                parse_number(raw, stringify!($type))
            }
        }
    };
}

impl_json_integer!(u8);
impl_json_integer!(u16);
impl_json_integer!(u32);
impl_json_integer!(u64);
impl_json_integer!(u128);
impl_json_integer!(i8);
impl_json_integer!(i16);
impl_json_integer!(i32);
impl_json_integer!(i64);
impl_json_integer!(i128);
impl_json_float!(f32);
impl_json_float!(f64);

impl ToJson for bool {
    #[inline]
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        out.raw(if *self { "true" } else { "false" })
    }
}

impl FromJson for bool {
    #[inline]
    fn from_json(raw: &[u8], _: &mut Transaction) -> Result<Self, Error> {
        match raw {
            b"true" => Ok(true),
            b"false" => Ok(false),
            _ => Err(Error::InvalidBool),
        }
    }
}

impl ToJson for String {
    #[inline]
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        out.string(self)
    }
}

impl FromJson for String {
    #[inline]
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        let end = expect_exact(raw, ValueKind::String, "String")?;
        let decoded = text::unescape(&raw[1..end - 1])?;
        txn.claim(decoded.len())?;
        Ok(decoded.into_owned())
    }
}

// Raw byte buffers have no JSON analogue, so they travel as an array of
// numbers.
impl ToJson for Bytes {
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        if self.is_empty() {
            return out.raw("[]");
        }
        out.raw("[")?;
        out.indent();
        for (i, byte) in self.iter().enumerate() {
            if i > 0 {
                out.raw(",")?;
            }
            out.newline()?;
            out.raw(&byte.to_string())?;
        }
        out.dedent();
        out.newline()?;
        out.raw("]")
    }
}

impl FromJson for Bytes {
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        let mut scanner = ListScanner::new(raw)?;
        let mut bytes = Vec::new();
        while let Some(value) = scanner.next_value()? {
            txn.claim(1)?;
            bytes.push(u8::from_json(value, txn)?);
        }
        scanner.finish()?;
        Ok(Bytes::from(bytes))
    }
}

impl<T: ToJson> ToJson for Option<T> {
    #[inline]
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        match self {
            Some(inner) => inner.to_json(out),
            None => out.raw("null"),
        }
    }
}

impl<T: FromJson> FromJson for Option<T> {
    #[inline]
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        if raw == b"null" {
            return Ok(None);
        }
        T::from_json(raw, txn).map(Some)
    }
}

impl<T: ToJson> ToJson for Box<T> {
    #[inline]
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        self.as_ref().to_json(out)
    }
}

impl<T: FromJson> FromJson for Box<T> {
    #[inline]
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        txn.claim(std::mem::size_of::<T>())?;
        T::from_json(raw, txn).map(Box::new)
    }
}
