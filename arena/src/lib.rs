//! Memory plumbing for the wireform serialization engine.
//!
//! # Overview
//!
//! Two allocators with opposite lifecycles:
//!
//! - [`Arena`] grows a logical byte buffer from piecewise writes without
//!   repeated reallocation. Encoders append (and occasionally prepend) small
//!   slices across a linked list of fixed-capacity chunks and only pay for a
//!   single merge when the finished buffer is requested.
//! - [`Transaction`] guards a decode in progress. Values built from untrusted
//!   input are staged inside the transaction and either moved out into the
//!   caller's object graph (followed by [`Transaction::commit`]) or dropped
//!   in reverse construction order when the transaction unwinds.
//!
//! # Buffer ownership
//!
//! A finished arena is converted into [`bytes::Bytes`] via
//! [`Arena::into_bytes`]: exactly one logical owner of the backing
//! allocation, with cheap reference-counted clones acting as read-only links.
//! Mutating or freeing a buffer while another thread reads a link is the
//! caller's responsibility to prevent; the types here never share mutable
//! state between operations.

pub mod arena;
pub mod error;
pub mod transaction;

pub use arena::Arena;
pub use error::Error;
pub use transaction::{Slot, Transaction};
