//! Generic JSON algorithms over the container protocol.
//!
//! Sequences print as arrays. Keyed collections print as objects when the
//! key type is string-like, and as an array of `[key, value]` pairs when it
//! is not (JSON object keys must be strings). Readers accept either shape
//! regardless of the key type.

use super::scan::{self, ValueKind};
use super::{FromJson, ListScanner, ObjectScanner, Printer, ToJson};
use crate::containers::{Keyed, Sequence};
use crate::error::Error;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;
use wireform_arena::Transaction;

/// How a type behaves in JSON object-key position.
pub trait JsonKey: Sized {
    /// Whether values of this type print naturally as object keys.
    const STRING_LIKE: bool;

    /// Prints the key in object position, quotes included.
    fn write_key(&self, out: &mut Printer) -> Result<(), Error>;

    /// Parses a key from its unescaped object-position text.
    fn parse_key(text: &str) -> Result<Self, Error>;
}

impl JsonKey for String {
    const STRING_LIKE: bool = true;

    fn write_key(&self, out: &mut Printer) -> Result<(), Error> {
        out.string(self)
    }

    fn parse_key(text: &str) -> Result<Self, Error> {
        Ok(text.to_owned())
    }
}

macro_rules! impl_json_key_integer {
    ($type:ty) => {
        impl JsonKey for $type {
            const STRING_LIKE: bool = false;

            fn write_key(&self, out: &mut Printer) -> Result<(), Error> {
                out.string(&self.to_string())
            }

            fn parse_key(text: &str) -> Result<Self, Error> {
                text.parse()
                    .map_err(|_| Error::MalformedNumber(text.to_owned()))
            }
        }
    };
}

impl_json_key_integer!(u8);
impl_json_key_integer!(u16);
impl_json_key_integer!(u32);
impl_json_key_integer!(u64);
impl_json_key_integer!(u128);
impl_json_key_integer!(i8);
impl_json_key_integer!(i16);
impl_json_key_integer!(i32);
impl_json_key_integer!(i64);
impl_json_key_integer!(i128);

/// Prints any list-like container as an array.
pub fn write_sequence<S: Sequence>(seq: &S, out: &mut Printer) -> Result<(), Error>
where
    S::Item: ToJson,
{
    if seq.is_empty() {
        return out.raw("[]");
    }
    out.raw("[")?;
    out.indent();
    for (i, item) in seq.iter_items().enumerate() {
        if i > 0 {
            out.raw(",")?;
        }
        out.newline()?;
        item.to_json(out)?;
    }
    out.dedent();
    out.newline()?;
    out.raw("]")
}

/// Parses any list-like container from an array.
pub fn read_sequence<S: Sequence>(raw: &[u8], txn: &mut Transaction) -> Result<S, Error>
where
    S::Item: FromJson,
{
    let mut scanner = ListScanner::new(raw)?;
    let mut out = S::default();
    while let Some(value) = scanner.next_value()? {
        txn.claim(std::mem::size_of::<S::Item>())?;
        out.push_item(S::Item::from_json(value, txn)?);
    }
    scanner.finish()?;
    Ok(out)
}

/// Prints any key/value collection: an object for string-like keys, an array
/// of `[key, value]` pairs otherwise.
pub fn write_keyed<M: Keyed>(map: &M, out: &mut Printer) -> Result<(), Error>
where
    M::Key: JsonKey + ToJson,
    M::Value: ToJson,
{
    if M::Key::STRING_LIKE {
        if map.is_empty() {
            return out.raw("{}");
        }
        out.raw("{")?;
        out.indent();
        for (i, (key, value)) in map.iter_pairs().enumerate() {
            if i > 0 {
                out.raw(",")?;
            }
            out.newline()?;
            key.write_key(out)?;
            out.raw(" : ")?;
            value.to_json(out)?;
        }
        out.dedent();
        out.newline()?;
        out.raw("}")
    } else {
        if map.is_empty() {
            return out.raw("[]");
        }
        out.raw("[")?;
        out.indent();
        for (i, (key, value)) in map.iter_pairs().enumerate() {
            if i > 0 {
                out.raw(",")?;
            }
            out.newline()?;
            out.raw("[")?;
            key.to_json(out)?;
            out.raw(", ")?;
            value.to_json(out)?;
            out.raw("]")?;
        }
        out.dedent();
        out.newline()?;
        out.raw("]")
    }
}

/// Parses any key/value collection from either shape. Each pair is assembled
/// inside a scratch transaction and only moved into the permanent collection
/// once both halves decoded.
pub fn read_keyed<M: Keyed>(raw: &[u8], txn: &mut Transaction) -> Result<M, Error>
where
    M::Key: JsonKey + FromJson + 'static,
    M::Value: FromJson + 'static,
{
    let start = scan::advance_to_next(raw, 0, None)?;
    let mut out = M::default();
    match scan::classify_at(raw, start)? {
        ValueKind::Object => {
            let mut scanner = ObjectScanner::new(&raw[start..])?;
            while let Some((key, value)) = scanner.next_entry()? {
                let mut scratch = Transaction::new();
                let key = scratch.stage(M::Key::parse_key(&key)?);
                let value = M::Value::from_json(value, &mut scratch)?;
                let value = scratch.stage(value);
                txn.claim(std::mem::size_of::<(M::Key, M::Value)>())?;
                out.insert_pair(scratch.take(key), scratch.take(value));
                scratch.commit();
            }
            scanner.finish()?;
        }
        ValueKind::List => {
            let mut scanner = ListScanner::new(&raw[start..])?;
            while let Some(entry) = scanner.next_value()? {
                let mut pair = ListScanner::new(entry)?;
                let mut scratch = Transaction::new();
                let key = M::Key::from_json(
                    pair.next_value()?.ok_or(Error::EndOfBuffer)?,
                    &mut scratch,
                )?;
                let key = scratch.stage(key);
                let value = M::Value::from_json(
                    pair.next_value()?.ok_or(Error::EndOfBuffer)?,
                    &mut scratch,
                )?;
                let value = scratch.stage(value);
                if let Some(extra) = pair.next_value()? {
                    return Err(Error::ExtraData(extra.len()));
                }
                pair.finish()?;
                txn.claim(std::mem::size_of::<(M::Key, M::Value)>())?;
                out.insert_pair(scratch.take(key), scratch.take(value));
                scratch.commit();
            }
            scanner.finish()?;
        }
        kind => return Err(Error::TypeMismatch("map", kind.name())),
    }
    Ok(out)
}

impl<T: ToJson> ToJson for Vec<T> {
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        write_sequence(self, out)
    }
}

impl<T: FromJson> FromJson for Vec<T> {
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_sequence(raw, txn)
    }
}

impl<T: ToJson> ToJson for VecDeque<T> {
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        write_sequence(self, out)
    }
}

impl<T: FromJson> FromJson for VecDeque<T> {
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_sequence(raw, txn)
    }
}

impl<T: ToJson> ToJson for LinkedList<T> {
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        write_sequence(self, out)
    }
}

impl<T: FromJson> FromJson for LinkedList<T> {
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_sequence(raw, txn)
    }
}

impl<T: ToJson + Eq + Hash> ToJson for HashSet<T> {
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        write_sequence(self, out)
    }
}

impl<T: FromJson + Eq + Hash> FromJson for HashSet<T> {
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_sequence(raw, txn)
    }
}

impl<T: ToJson + Ord> ToJson for BTreeSet<T> {
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        write_sequence(self, out)
    }
}

impl<T: FromJson + Ord> FromJson for BTreeSet<T> {
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_sequence(raw, txn)
    }
}

impl<K: JsonKey + ToJson + Eq + Hash, V: ToJson> ToJson for HashMap<K, V> {
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        write_keyed(self, out)
    }
}

impl<K, V> FromJson for HashMap<K, V>
where
    K: JsonKey + FromJson + Eq + Hash + 'static,
    V: FromJson + 'static,
{
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_keyed(raw, txn)
    }
}

impl<K: JsonKey + ToJson + Ord, V: ToJson> ToJson for BTreeMap<K, V> {
    fn to_json(&self, out: &mut Printer) -> Result<(), Error> {
        write_keyed(self, out)
    }
}

impl<K, V> FromJson for BTreeMap<K, V>
where
    K: JsonKey + FromJson + Ord + 'static,
    V: FromJson + 'static,
{
    fn from_json(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_keyed(raw, txn)
    }
}
