//! Generic binary algorithms over the container protocol.
//!
//! A sequence is `[count:u32]` followed by `count` framed elements. A keyed
//! collection is the same with each entry a framed key/value pair (two nested
//! frames). Concrete containers delegate here through their hook traits.

use super::{read_frame, read_len, write_framed, FromMemory, ToMemory, LEN_PREFIX};
use crate::containers::{Keyed, Sequence};
use crate::error::Error;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;
use wireform_arena::{Arena, Transaction};

/// Encodes any list-like container.
pub fn write_sequence<S: Sequence>(seq: &S, arena: &mut Arena) -> Result<(), Error>
where
    S::Item: ToMemory,
{
    let count = u32::try_from(seq.len())
        .map_err(|_| Error::LengthExceeded(seq.len(), u32::MAX as usize))?;
    arena.push(&count.to_le_bytes())?;
    for item in seq.iter_items() {
        write_framed(arena, |a| item.to_memory(a))?;
    }
    Ok(())
}

/// Decodes any list-like container. The declared count is never trusted for
/// pre-sizing beyond what the remaining input could possibly hold.
pub fn read_sequence<S: Sequence>(raw: &[u8], txn: &mut Transaction) -> Result<S, Error>
where
    S::Item: FromMemory,
{
    let mut buf = raw;
    let count = read_len(&mut buf)?;
    let mut out = S::default();
    out.grow_hint(count.min(buf.len() / LEN_PREFIX));
    for _ in 0..count {
        let payload = read_frame(&mut buf)?;
        let item = S::Item::from_memory(payload, txn)?;
        txn.claim(std::mem::size_of::<S::Item>())?;
        out.push_item(item);
    }
    if !buf.is_empty() {
        return Err(Error::ExtraData(buf.len()));
    }
    Ok(out)
}

/// Encodes any key/value collection.
pub fn write_keyed<M: Keyed>(map: &M, arena: &mut Arena) -> Result<(), Error>
where
    M::Key: ToMemory,
    M::Value: ToMemory,
{
    let count = u32::try_from(map.len())
        .map_err(|_| Error::LengthExceeded(map.len(), u32::MAX as usize))?;
    arena.push(&count.to_le_bytes())?;
    for (key, value) in map.iter_pairs() {
        write_framed(arena, |entry| {
            write_framed(entry, |a| key.to_memory(a))?;
            write_framed(entry, |a| value.to_memory(a))
        })?;
    }
    Ok(())
}

/// Decodes any key/value collection. Each pair is assembled inside a scratch
/// transaction and only moved into the permanent collection once both halves
/// decoded.
pub fn read_keyed<M: Keyed>(raw: &[u8], txn: &mut Transaction) -> Result<M, Error>
where
    M::Key: FromMemory + 'static,
    M::Value: FromMemory + 'static,
{
    let mut buf = raw;
    let count = read_len(&mut buf)?;
    let mut out = M::default();
    out.grow_hint(count.min(buf.len() / LEN_PREFIX));
    for _ in 0..count {
        let mut entry = read_frame(&mut buf)?;

        let mut scratch = Transaction::new();
        let key = M::Key::from_memory(read_frame(&mut entry)?, &mut scratch)?;
        let key = scratch.stage(key);
        let value = M::Value::from_memory(read_frame(&mut entry)?, &mut scratch)?;
        let value = scratch.stage(value);
        if !entry.is_empty() {
            return Err(Error::ExtraData(entry.len()));
        }
        txn.claim(std::mem::size_of::<(M::Key, M::Value)>())?;
        out.insert_pair(scratch.take(key), scratch.take(value));
        scratch.commit();
    }
    if !buf.is_empty() {
        return Err(Error::ExtraData(buf.len()));
    }
    Ok(out)
}

impl<T: ToMemory> ToMemory for Vec<T> {
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        write_sequence(self, arena)
    }
}

impl<T: FromMemory> FromMemory for Vec<T> {
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_sequence(raw, txn)
    }
}

impl<T: ToMemory> ToMemory for VecDeque<T> {
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        write_sequence(self, arena)
    }
}

impl<T: FromMemory> FromMemory for VecDeque<T> {
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_sequence(raw, txn)
    }
}

impl<T: ToMemory> ToMemory for LinkedList<T> {
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        write_sequence(self, arena)
    }
}

impl<T: FromMemory> FromMemory for LinkedList<T> {
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_sequence(raw, txn)
    }
}

impl<T: ToMemory + Eq + Hash> ToMemory for HashSet<T> {
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        write_sequence(self, arena)
    }
}

impl<T: FromMemory + Eq + Hash> FromMemory for HashSet<T> {
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_sequence(raw, txn)
    }
}

impl<T: ToMemory + Ord> ToMemory for BTreeSet<T> {
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        write_sequence(self, arena)
    }
}

impl<T: FromMemory + Ord> FromMemory for BTreeSet<T> {
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_sequence(raw, txn)
    }
}

impl<K: ToMemory + Eq + Hash, V: ToMemory> ToMemory for HashMap<K, V> {
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        write_keyed(self, arena)
    }
}

impl<K: FromMemory + Eq + Hash + 'static, V: FromMemory + 'static> FromMemory for HashMap<K, V> {
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_keyed(raw, txn)
    }
}

impl<K: ToMemory + Ord, V: ToMemory> ToMemory for BTreeMap<K, V> {
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        write_keyed(self, arena)
    }
}

impl<K: FromMemory + Ord + 'static, V: FromMemory + 'static> FromMemory for BTreeMap<K, V> {
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        read_keyed(raw, txn)
    }
}
