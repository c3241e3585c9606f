//! Type descriptors for composite records.
//!
//! A [`Descriptor`] is the schema the generic record algorithms walk: an
//! ordered list of fields, each carrying its name and one accessor per
//! backend operation. Descriptors are usually generated by the [`record!`]
//! macro, but nothing stops a caller from building one by hand (for example
//! to attach a [`Descriptor::finalize`] hook).

use crate::error::Error;
use crate::json::Printer;
use wireform_arena::{Arena, Transaction};

/// One field of a composite record: a name plus type-erased accessors for
/// each backend.
pub struct Field<R: 'static> {
    /// Field name as it appears in self-describing formats.
    pub name: &'static str,
    /// Binary-encodes the field into the arena.
    pub to_wire: fn(&R, &mut Arena) -> Result<(), Error>,
    /// Binary-decodes the field from its exact payload slice.
    pub from_wire: fn(&mut R, &[u8], &mut Transaction) -> Result<(), Error>,
    /// JSON-prints the field.
    pub to_json: fn(&R, &mut Printer) -> Result<(), Error>,
    /// JSON-parses the field from its exact value slice.
    pub from_json: fn(&mut R, &[u8], &mut Transaction) -> Result<(), Error>,
}

/// Schema of a composite record, consumed by the generic record algorithms
/// of every backend.
pub struct Descriptor<R: 'static> {
    /// Record name, for diagnostics.
    pub name: &'static str,
    /// Fields in wire order.
    pub fields: Vec<Field<R>>,
    /// Optional two-phase construction hook, run after all fields decoded.
    pub finalize: Option<fn(&mut R) -> Result<(), Error>>,
}

/// Types that expose a [`Descriptor`] of their fields.
pub trait Reflect: Default + 'static {
    /// The record's schema. Field order here is the binary wire order.
    fn descriptor() -> &'static Descriptor<Self>;
}

/// Generates a [`Reflect`] descriptor and all four backend impls for a
/// struct with `Default`.
///
/// ```
/// use wireform_codec::{record, Format};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
/// record!(Point { x, y });
///
/// let raw = wireform_codec::serialize(&Point { x: 3, y: -4 }, Format::Binary).unwrap();
/// let back: Point = wireform_codec::deserialize(&raw, Format::Binary).unwrap();
/// assert_eq!(back, Point { x: 3, y: -4 });
/// ```
#[macro_export]
macro_rules! record {
    ($name:ident { $($field:ident),+ $(,)? }) => {
        $crate::record!(@build $name { $($field),+ } None);
    };
    ($name:ident { $($field:ident),+ $(,)? } finalize = $fin:expr) => {
        $crate::record!(@build $name { $($field),+ } Some($fin));
    };
    (@build $name:ident { $($field:ident),+ } $fin:expr) => {
        impl $crate::schema::Reflect for $name {
            fn descriptor() -> &'static $crate::schema::Descriptor<Self> {
                static DESCRIPTOR: ::std::sync::OnceLock<$crate::schema::Descriptor<$name>> =
                    ::std::sync::OnceLock::new();
                DESCRIPTOR.get_or_init(|| $crate::schema::Descriptor {
                    name: stringify!($name),
                    fields: vec![
                        $($crate::schema::Field {
                            name: stringify!($field),
                            to_wire: |r: &$name, arena: &mut $crate::Arena| {
                                $crate::binary::ToMemory::to_memory(&r.$field, arena)
                            },
                            from_wire: |r: &mut $name,
                                        raw: &[u8],
                                        txn: &mut $crate::Transaction| {
                                r.$field = $crate::binary::FromMemory::from_memory(raw, txn)?;
                                Ok(())
                            },
                            to_json: |r: &$name, out: &mut $crate::json::Printer| {
                                $crate::json::ToJson::to_json(&r.$field, out)
                            },
                            from_json: |r: &mut $name,
                                        src: &[u8],
                                        txn: &mut $crate::Transaction| {
                                r.$field = $crate::json::FromJson::from_json(src, txn)?;
                                Ok(())
                            },
                        },)+
                    ],
                    finalize: $fin,
                })
            }
        }

        impl $crate::binary::ToMemory for $name {
            fn to_memory(
                &self,
                arena: &mut $crate::Arena,
            ) -> ::std::result::Result<(), $crate::Error> {
                $crate::binary::write_record(self, arena)
            }
        }

        impl $crate::binary::FromMemory for $name {
            fn from_memory(
                raw: &[u8],
                txn: &mut $crate::Transaction,
            ) -> ::std::result::Result<Self, $crate::Error> {
                $crate::binary::read_record(raw, txn)
            }
        }

        impl $crate::json::ToJson for $name {
            fn to_json(
                &self,
                out: &mut $crate::json::Printer,
            ) -> ::std::result::Result<(), $crate::Error> {
                $crate::json::write_record(self, out)
            }
        }

        impl $crate::json::FromJson for $name {
            fn from_json(
                src: &[u8],
                txn: &mut $crate::Transaction,
            ) -> ::std::result::Result<Self, $crate::Error> {
                $crate::json::read_record(src, txn)
            }
        }
    };
}
