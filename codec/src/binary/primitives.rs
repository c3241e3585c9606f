//! Binary codec implementations for primitive and pointer-like types.
//!
//! Numerics are fixed-width little-endian on the wire. Because every value is
//! decoded from its exact payload slice, a numeric field may arrive narrower
//! than its native width (a `u32` stored as 1, 2, or 4 bytes): unsigned
//! values are zero-extended, signed values sign-extended, and any width that
//! is not a standard integer width no wider than the native one is rejected.

use super::{FromMemory, ToMemory};
use crate::error::Error;
use bytes::Bytes;
use wireform_arena::{Arena, Transaction};

/// Accepts payload widths that match a standard integer width no wider than
/// `native`, zero-extending into a `u128`.
fn decode_unsigned(raw: &[u8], name: &'static str, native: usize) -> Result<u128, Error> {
    let width = raw.len();
    if !matches!(width, 1 | 2 | 4 | 8 | 16) || width > native {
        return Err(Error::InvalidWidth(name, width));
    }
    let mut out = 0u128;
    for (i, byte) in raw.iter().enumerate() {
        out |= (*byte as u128) << (8 * i);
    }
    Ok(out)
}

/// As [`decode_unsigned`], but sign-extends from the payload's top bit.
fn decode_signed(raw: &[u8], name: &'static str, native: usize) -> Result<i128, Error> {
    let magnitude = decode_unsigned(raw, name, native)?;
    let bits = 8 * raw.len();
    if bits == 128 {
        return Ok(magnitude as i128);
    }
    let sign_bit = 1u128 << (bits - 1);
    if magnitude & sign_bit != 0 {
        Ok((magnitude | (u128::MAX << bits)) as i128)
    } else {
        Ok(magnitude as i128)
    }
}

macro_rules! impl_unsigned {
    ($type:ty) => {
        impl ToMemory for $type {
            #[inline]
            fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
                arena.push(&self.to_le_bytes()).map_err(Error::from)
            }
        }

        impl FromMemory for $type {
            #[inline]
            fn from_memory(raw: &[u8], _: &mut Transaction) -> Result<Self, Error> {
                decode_unsigned(raw, stringify!($type), std::mem::size_of::<$type>())
                    .map(|v| v as $type)
            }
        }
    };
}

macro_rules! impl_signed {
    ($type:ty) => {
        impl ToMemory for $type {
            #[inline]
            fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
                arena.push(&self.to_le_bytes()).map_err(Error::from)
            }
        }

        impl FromMemory for $type {
            #[inline]
            fn from_memory(raw: &[u8], _: &mut Transaction) -> Result<Self, Error> {
                decode_signed(raw, stringify!($type), std::mem::size_of::<$type>())
                    .map(|v| v as $type)
            }
        }
    };
}

impl_unsigned!(u8);
impl_unsigned!(u16);
impl_unsigned!(u32);
impl_unsigned!(u64);
impl_unsigned!(u128);
impl_signed!(i8);
impl_signed!(i16);
impl_signed!(i32);
impl_signed!(i64);
impl_signed!(i128);

impl ToMemory for f32 {
    #[inline]
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        arena.push(&self.to_le_bytes()).map_err(Error::from)
    }
}

impl FromMemory for f32 {
    #[inline]
    fn from_memory(raw: &[u8], _: &mut Transaction) -> Result<Self, Error> {
        let bytes: [u8; 4] = raw
            .try_into()
            .map_err(|_| Error::InvalidWidth("f32", raw.len()))?;
        Ok(f32::from_le_bytes(bytes))
    }
}

impl ToMemory for f64 {
    #[inline]
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        arena.push(&self.to_le_bytes()).map_err(Error::from)
    }
}

impl FromMemory for f64 {
    #[inline]
    fn from_memory(raw: &[u8], _: &mut Transaction) -> Result<Self, Error> {
        // A 4-byte payload widens from f32, the floating-point analogue of
        // integer width widening.
        match raw.len() {
            8 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(raw);
                Ok(f64::from_le_bytes(bytes))
            }
            4 => {
                let mut bytes = [0u8; 4];
                bytes.copy_from_slice(raw);
                Ok(f32::from_le_bytes(bytes) as f64)
            }
            width => Err(Error::InvalidWidth("f64", width)),
        }
    }
}

impl ToMemory for bool {
    #[inline]
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        arena.push(&[*self as u8]).map_err(Error::from)
    }
}

impl FromMemory for bool {
    #[inline]
    fn from_memory(raw: &[u8], _: &mut Transaction) -> Result<Self, Error> {
        match raw {
            [0] => Ok(false),
            [1] => Ok(true),
            [_] => Err(Error::InvalidBool),
            _ => Err(Error::InvalidWidth("bool", raw.len())),
        }
    }
}

// Strings carry no stored length: the enclosing frame already knows it.
impl ToMemory for String {
    #[inline]
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        arena.push(self.as_bytes()).map_err(Error::from)
    }
}

impl FromMemory for String {
    #[inline]
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        txn.claim(raw.len())?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidUtf8)
    }
}

impl ToMemory for Bytes {
    #[inline]
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        arena.push(self).map_err(Error::from)
    }
}

impl FromMemory for Bytes {
    #[inline]
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        txn.claim(raw.len())?;
        Ok(Bytes::copy_from_slice(raw))
    }
}

/// Optional values encode absence as a zero-length payload. A consequence of
/// the wire format: a present value whose own encoding is empty (for example
/// `Some(String::new())`) is indistinguishable from `None` and decodes as
/// `None`.
impl<T: ToMemory> ToMemory for Option<T> {
    #[inline]
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        match self {
            Some(inner) => inner.to_memory(arena),
            None => Ok(()),
        }
    }
}

impl<T: FromMemory> FromMemory for Option<T> {
    #[inline]
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        if raw.is_empty() {
            // The pointee decoder must not run for an absent value.
            return Ok(None);
        }
        T::from_memory(raw, txn).map(Some)
    }
}

impl<T: ToMemory> ToMemory for Box<T> {
    #[inline]
    fn to_memory(&self, arena: &mut Arena) -> Result<(), Error> {
        self.as_ref().to_memory(arena)
    }
}

impl<T: FromMemory> FromMemory for Box<T> {
    #[inline]
    fn from_memory(raw: &[u8], txn: &mut Transaction) -> Result<Self, Error> {
        txn.claim(std::mem::size_of::<T>())?;
        T::from_memory(raw, txn).map(Box::new)
    }
}
