//! Length-prefixed binary wire format.
//!
//! Every framed value is encoded as a 4-byte little-endian length followed by
//! that many payload bytes. Composite records frame each field in descriptor
//! order; lists frame each element after a leading count. Because a frame's
//! length is not known until its payload has been written, the encoder
//! reserves a placeholder through the arena and patches it afterwards.
//!
//! Decoding hands every value its *exact* payload slice, which is what allows
//! numeric payloads narrower than the native width to be accepted (see
//! [`primitives`]).

mod containers;
mod primitives;

use crate::error::Error;
use crate::schema::Reflect;
pub use containers::{read_keyed, read_sequence, write_keyed, write_sequence};
use paste::paste;
use wireform_arena::{Arena, Transaction};

/// Width of a frame's length prefix and a list's element count.
pub(crate) const LEN_PREFIX: usize = 4;

/// Trait for types that can be binary-encoded into an arena.
pub trait ToMemory {
    /// Appends this value's payload bytes to the arena. Framing (the length
    /// prefix) is the enclosing context's job.
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error>;
}

/// Trait for types that can be binary-decoded from an exact payload slice.
pub trait FromMemory: Sized {
    /// Decodes a value from `raw`, which holds exactly this value's payload.
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error>;
}

/// Splits `n` bytes off the front of the cursor.
pub(crate) fn take<'a>(buf: &mut &'a [u8], n: usize) -> Result<&'a [u8], Error> {
    if buf.len() < n {
        return Err(Error::EndOfBuffer);
    }
    let (head, tail) = buf.split_at(n);
    *buf = tail;
    Ok(head)
}

/// Reads a 4-byte little-endian length.
pub(crate) fn read_len(buf: &mut &[u8]) -> Result<usize, Error> {
    let raw = take(buf, LEN_PREFIX)?;
    let mut le = [0u8; LEN_PREFIX];
    le.copy_from_slice(raw);
    Ok(u32::from_le_bytes(le) as usize)
}

/// Reads a `[len:u32][payload]` frame, bounds-checking the declared length
/// against the remaining input.
pub(crate) fn read_frame<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], Error> {
    let len = read_len(buf)?;
    take(buf, len)
}

/// Writes a `[len:u32][payload]` frame: a placeholder length, the payload
/// produced by `body`, then the patched-in true length.
pub(crate) fn write_framed(
    arena: &mut Arena,
    body: impl FnOnce(&mut Arena) -> Result<(), Error>,
) -> Result<(), Error> {
    let mark = arena.size();
    arena.push(&[0u8; LEN_PREFIX])?;
    let start = arena.size();
    body(arena)?;
    let len = arena.size() - start;
    let len32 =
        u32::try_from(len).map_err(|_| Error::LengthExceeded(len, u32::MAX as usize))?;
    arena.write_at(mark, &len32.to_le_bytes())?;
    Ok(())
}

/// Generic composite-record encode: each field framed, in descriptor order.
pub fn write_record<R: Reflect>(value: &R, arena: &mut Arena) -> Result<(), Error> {
    for field in &R::descriptor().fields {
        write_framed(arena, |a| (field.to_wire)(value, a))?;
    }
    Ok(())
}

/// Generic composite-record decode: fields read sequentially in descriptor
/// order, each from its own bounds-checked frame. Trailing bytes are an
/// error, as is running out of input before the last field.
pub fn read_record<R: Reflect>(raw: &[u8], txn: &mut Transaction) -> Result<R, Error> {
    let descriptor = R::descriptor();
    let mut buf = raw;
    let mut out = R::default();
    for field in &descriptor.fields {
        let payload = read_frame(&mut buf)?;
        (field.from_wire)(&mut out, payload, txn)?;
    }
    if !buf.is_empty() {
        return Err(Error::ExtraData(buf.len()));
    }
    if let Some(finalize) = descriptor.finalize {
        finalize(&mut out)?;
    }
    Ok(out)
}

// Tuples are anonymous records: every element gets its own frame.
macro_rules! impl_wire_for_tuple {
    ($($index:literal),*) => {
        paste! {
            impl<$( [<T $index>]: ToMemory ),*> ToMemory for ( $( [<T $index>], )* ) {
                fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
                    $( write_framed(arena, |a| self.$index.to_memory(a))?; )*
                    Ok(())
                }
            }

            impl<$( [<T $index>]: FromMemory ),*> FromMemory for ( $( [<T $index>], )* ) {
                fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
                    let mut buf = raw;
                    let value = ( $( [<T $index>]::from_memory(read_frame(&mut buf)?, txn)?, )* );
                    if !buf.is_empty() {
                        return Err(Error::ExtraData(buf.len()));
                    }
                    Ok(value)
                }
            }
        }
    };
}

impl_wire_for_tuple!(0);
impl_wire_for_tuple!(0, 1);
impl_wire_for_tuple!(0, 1, 2);
impl_wire_for_tuple!(0, 1, 2, 3);
impl_wire_for_tuple!(0, 1, 2, 3, 4);
impl_wire_for_tuple!(0, 1, 2, 3, 4, 5);
