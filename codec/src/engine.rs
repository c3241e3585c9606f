//! Top-level serialization entry points.
//!
//! Every call runs against a fresh [`Arena`] (encode) or [`Transaction`]
//! (decode). The transaction is committed only after the whole value decodes,
//! so a failure partway through drops everything staged so far and leaves no
//! partial state behind.

use crate::binary::{FromMemory, ToMemory};
use crate::error::Error;
use crate::json::{FromJson, Printer, ToJson};
use bytes::Bytes;
use tracing::trace;
use wireform_arena::{Arena, Transaction};

/// Wire format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Length-prefixed little-endian binary.
    Binary,
    /// Pretty-printed JSON text.
    Json,
}

/// Umbrella trait for types encodable and decodable in every format.
pub trait Persist: ToMemory + FromMemory + ToJson + FromJson {}

impl<T: ToMemory + FromMemory + ToJson + FromJson> Persist for T {}

/// Serializes `value` into a fresh buffer.
pub fn serialize<T: Persist>(value: &T, format: Format) -> Result<Bytes, Error> {
    let raw = match format {
        Format::Binary => {
            let mut arena = Arena::new();
            value.to_memory(&mut arena)?;
            arena.into_bytes()?
        }
        Format::Json => {
            let mut out = Printer::new();
            value.to_json(&mut out)?;
            out.into_bytes()?
        }
    };
    trace!(?format, len = raw.len(), "serialized value");
    Ok(raw)
}

/// Deserializes a value from `raw`.
pub fn deserialize<T: Persist>(raw: &[u8], format: Format) -> Result<T, Error> {
    decode(raw, format, Transaction::new())
}

/// As [`deserialize`], but fails once decoded values claim more than
/// `max_alloc` bytes. The cap bounds what hostile input can make the decoder
/// allocate, independent of the input's declared lengths.
pub fn deserialize_bounded<T: Persist>(
    raw: &[u8],
    format: Format,
    max_alloc: usize,
) -> Result<T, Error> {
    decode(raw, format, Transaction::with_budget(max_alloc))
}

/// Deserializes into an existing value. On error `target` is untouched.
pub fn deserialize_into<T: Persist>(
    target: &mut T,
    raw: &[u8],
    format: Format,
) -> Result<(), Error> {
    *target = deserialize(raw, format)?;
    Ok(())
}

fn decode<T: Persist>(raw: &[u8], format: Format, mut txn: Transaction) -> Result<T, Error> {
    let value = match format {
        Format::Binary => T::from_memory(raw, &mut txn)?,
        Format::Json => T::from_json(raw.trim_ascii(), &mut txn)?,
    };
    txn.commit();
    trace!(?format, len = raw.len(), "deserialized value");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        id: u32,
        name: String,
        tags: Vec<u16>,
    }
    crate::record!(Sample { id, name, tags });

    fn sample() -> Sample {
        Sample {
            id: 7,
            name: String::from("seven"),
            tags: vec![1, 2],
        }
    }

    #[test]
    fn test_binary_round_trip() {
        let raw = serialize(&sample(), Format::Binary).unwrap();
        let back: Sample = deserialize(&raw, Format::Binary).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_json_round_trip_and_shape() {
        let raw = serialize(&sample(), Format::Json).unwrap();
        assert_eq!(
            std::str::from_utf8(&raw).unwrap(),
            "{\n  \"id\" : 7,\n  \"name\" : \"seven\",\n  \"tags\" : [\n    1,\n    2\n  ]\n}"
        );
        let back: Sample = deserialize(&raw, Format::Json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_json_surrounding_whitespace_tolerated() {
        let back: Sample =
            deserialize(b"  {\"id\": 1, \"name\": \"x\", \"tags\": []}\n", Format::Json)
                .unwrap();
        assert_eq!(back.id, 1);
    }

    #[test]
    fn test_bounded_deserialize_rejects_oversized() {
        let raw = serialize(&sample(), Format::Binary).unwrap();
        assert!(deserialize_bounded::<Sample>(&raw, Format::Binary, 2).is_err());
        let back = deserialize_bounded::<Sample>(&raw, Format::Binary, 1024).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn test_deserialize_into_preserves_target_on_error() {
        let mut target = sample();
        assert!(deserialize_into(&mut target, b"not json", Format::Json).is_err());
        assert_eq!(target, sample());

        let raw = serialize(&Sample::default(), Format::Binary).unwrap();
        deserialize_into(&mut target, &raw, Format::Binary).unwrap();
        assert_eq!(target, Sample::default());
    }
}
