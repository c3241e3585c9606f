//! Error types for codec operations

use thiserror::Error;

/// Error type for codec operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
    #[error("invalid payload width for {0}: {1} bytes")]
    InvalidWidth(&'static str, usize),
    #[error("malformed number: {0}")]
    MalformedNumber(String),
    #[error("unexpected character {0:?} at byte {1}")]
    UnexpectedToken(char, usize),
    #[error("type mismatch for {0}: found {1}")]
    TypeMismatch(&'static str, &'static str),
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid utf-8 in string payload")]
    InvalidUtf8,
    #[error("invalid bool")]
    InvalidBool,
    #[error("length exceeded: {0} > {1}")]
    LengthExceeded(usize, usize),
    #[error(transparent)]
    Memory(#[from] wireform_arena::Error),
}
