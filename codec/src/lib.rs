//! Multi-format object serialization.
//!
//! A single schema drives every wire format: a type describes its fields once
//! (usually through the [`record!`] macro) and gets a length-prefixed binary
//! encoding and a self-describing JSON encoding for free. Decoders are built
//! for untrusted input: declared lengths are bounds-checked against the
//! actual input, never trusted for allocation, and an optional byte budget
//! caps what any one decode may allocate.
//!
//! Encoding accumulates bytes in a [`wireform_arena::Arena`]; decoding stages
//! partially-built values in a [`wireform_arena::Transaction`] that rolls
//! back on failure, so a malformed input can never leave half-constructed
//! state behind.
//!
//! ```
//! use wireform_codec::{deserialize, record, serialize, Format};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Peer {
//!     address: String,
//!     port: u16,
//! }
//! record!(Peer { address, port });
//!
//! let peer = Peer {
//!     address: String::from("203.0.113.7"),
//!     port: 9000,
//! };
//! for format in [Format::Binary, Format::Json] {
//!     let raw = serialize(&peer, format).unwrap();
//!     let back: Peer = deserialize(&raw, format).unwrap();
//!     assert_eq!(back, peer);
//! }
//! ```

pub mod binary;
pub mod containers;
pub mod engine;
pub mod error;
pub mod json;
pub mod schema;

pub use engine::{
    deserialize, deserialize_bounded, deserialize_into, serialize, Format, Persist,
};
pub use error::Error;
pub use wireform_arena::{Arena, Slot, Transaction};
