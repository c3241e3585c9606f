//! Indented JSON output over an [`Arena`].

use super::text::escape_into;
use crate::error::Error;
use bytes::Bytes;
use wireform_arena::Arena;

const INDENT: &str = "  ";

/// Accumulates pretty-printed JSON text. Containers call [`Printer::indent`]
/// and [`Printer::dedent`] around their entries; [`Printer::newline`] emits a
/// line break followed by the current indentation.
pub struct Printer {
    arena: Arena,
    depth: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            depth: 0,
        }
    }

    /// Appends text verbatim.
    pub fn raw(&mut self, text: &str) -> Result<(), Error> {
        self.arena.push(text.as_bytes()).map_err(Error::from)
    }

    /// Appends `text` as a quoted, escaped JSON string.
    pub fn string(&mut self, text: &str) -> Result<(), Error> {
        let mut escaped = String::with_capacity(text.len() + 2);
        escaped.push('"');
        escape_into(&mut escaped, text);
        escaped.push('"');
        self.raw(&escaped)
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth = self.depth.saturating_sub(1);
    }

    /// Line break plus indentation for the current depth.
    pub fn newline(&mut self) -> Result<(), Error> {
        self.arena.push(b"\n")?;
        for _ in 0..self.depth {
            self.arena.push(INDENT.as_bytes())?;
        }
        Ok(())
    }

    /// Consumes the printer, returning the rendered document.
    pub fn into_bytes(self) -> Result<Bytes, Error> {
        self.arena.into_bytes().map_err(Error::from)
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}
