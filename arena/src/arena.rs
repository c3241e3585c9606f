//! Chunked arena allocator.
//!
//! Encoders rarely know the size of their output up front: a record writes a
//! placeholder length, encodes the field, then patches the real length in
//! once known. The arena supports this by growing a logical buffer at both
//! ends across a doubly-linked list of fixed-capacity chunks and deferring
//! the cost of contiguity until [`Arena::contiguous`] or
//! [`Arena::into_bytes`] is called.

use crate::Error;
use bytes::Bytes;
use std::collections::VecDeque;

/// Capacity of a freshly created chunk unless a larger allocation forces it.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// A fixed-capacity byte region. `start..end` is the live sub-range, which
/// lets both ends be trimmed without moving memory.
struct Chunk {
    data: Vec<u8>,
    start: usize,
    end: usize,
}

impl Chunk {
    /// Allocates a zeroed chunk, reporting exhaustion instead of aborting.
    fn with_capacity(capacity: usize) -> Result<Self, Error> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailed(capacity))?;
        data.resize(capacity, 0);
        Ok(Self {
            data,
            start: 0,
            end: 0,
        })
    }

    #[inline]
    fn live(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    fn room_back(&self) -> usize {
        self.data.len() - self.end
    }
}

/// Append-mostly memory pool built from linked fixed-size chunks, producing
/// one contiguous buffer on demand.
pub struct Arena {
    chunks: VecDeque<Chunk>,
    size: usize,
    chunk_size: usize,
}

impl Arena {
    /// Creates an empty arena with the default chunk size.
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Creates an empty arena whose chunks hold `chunk_size` bytes unless a
    /// single allocation demands more.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunks: VecDeque::new(),
            size: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Current live byte count, in O(1).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of chunks currently linked. Mostly useful to observe merge
    /// behavior.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Reserves `n` bytes at the back of the logical buffer and returns the
    /// writable slice. Extends the last chunk if it has room, otherwise links
    /// a new chunk sized `max(n, chunk_size)`. The returned bytes are not
    /// guaranteed to be zeroed.
    pub fn allocate(&mut self, n: usize) -> Result<&mut [u8], Error> {
        if n == 0 {
            return Ok(&mut []);
        }
        if self.chunks.back().map_or(true, |c| c.room_back() < n) {
            self.chunks
                .push_back(Chunk::with_capacity(n.max(self.chunk_size))?);
        }
        self.size += n;
        let chunk = self.chunks.back_mut().expect("chunk linked above");
        let start = chunk.end;
        chunk.end += n;
        Ok(&mut chunk.data[start..chunk.end])
    }

    /// Reserves `n` bytes at the front of the logical buffer. Symmetric to
    /// [`Arena::allocate`].
    pub fn allocate_front(&mut self, n: usize) -> Result<&mut [u8], Error> {
        if n == 0 {
            return Ok(&mut []);
        }
        if self.chunks.front().map_or(true, |c| c.start < n) {
            let capacity = n.max(self.chunk_size);
            let mut chunk = Chunk::with_capacity(capacity)?;
            chunk.start = capacity;
            chunk.end = capacity;
            self.chunks.push_front(chunk);
        }
        self.size += n;
        let chunk = self.chunks.front_mut().expect("chunk linked above");
        chunk.start -= n;
        Ok(&mut chunk.data[chunk.start..chunk.start + n])
    }

    /// Appends a copy of `bytes` at the back.
    pub fn push(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.allocate(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Prepends a copy of `bytes` at the front.
    pub fn push_front(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.allocate_front(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Shrinks the buffer by `n` bytes from the back, unlinking chunks that
    /// become fully consumed. Popping more than `size()` clears the arena.
    pub fn pop(&mut self, n: usize) {
        let mut remaining = n.min(self.size);
        self.size -= remaining;
        while remaining > 0 {
            let Some(back) = self.chunks.back_mut() else {
                break;
            };
            let live = back.live();
            if live <= remaining {
                remaining -= live;
                self.chunks.pop_back();
            } else {
                back.end -= remaining;
                remaining = 0;
            }
        }
    }

    /// Shrinks the buffer by `n` bytes from the front. Symmetric to
    /// [`Arena::pop`].
    pub fn pop_front(&mut self, n: usize) {
        let mut remaining = n.min(self.size);
        self.size -= remaining;
        while remaining > 0 {
            let Some(front) = self.chunks.front_mut() else {
                break;
            };
            let live = front.live();
            if live <= remaining {
                remaining -= live;
                self.chunks.pop_front();
            } else {
                front.start += remaining;
                remaining = 0;
            }
        }
    }

    /// Overwrites already-allocated bytes at a logical offset from the front.
    /// Used to patch placeholder length prefixes once a frame's true size is
    /// known.
    ///
    /// Offsets are only stable while the front of the buffer is untouched:
    /// `allocate_front`/`pop_front` shift every logical offset.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), Error> {
        let end = offset
            .checked_add(bytes.len())
            .ok_or(Error::OutOfBounds {
                offset,
                len: bytes.len(),
                size: self.size,
            })?;
        if end > self.size {
            return Err(Error::OutOfBounds {
                offset,
                len: bytes.len(),
                size: self.size,
            });
        }
        let mut skip = offset;
        let mut src = bytes;
        for chunk in self.chunks.iter_mut() {
            let live = chunk.live();
            if skip >= live {
                skip -= live;
                continue;
            }
            let at = chunk.start + skip;
            let take = (live - skip).min(src.len());
            chunk.data[at..at + take].copy_from_slice(&src[..take]);
            src = &src[take..];
            skip = 0;
            if src.is_empty() {
                break;
            }
        }
        Ok(())
    }

    /// Returns one slice spanning the whole buffer, merging chunks into a
    /// single chunk first if more than one exists or the first chunk has a
    /// non-zero start offset. This is the only O(total-size) operation.
    pub fn contiguous(&mut self) -> Result<&[u8], Error> {
        self.make_contiguous()?;
        Ok(self
            .chunks
            .front()
            .map(|c| &c.data[c.start..c.end])
            .unwrap_or(&[]))
    }

    /// Merges (if necessary) and transfers ownership of the finished buffer,
    /// leaving nothing behind.
    pub fn into_bytes(mut self) -> Result<Bytes, Error> {
        self.make_contiguous()?;
        match self.chunks.pop_front() {
            Some(mut chunk) => {
                chunk.data.truncate(chunk.end);
                Ok(Bytes::from(chunk.data))
            }
            None => Ok(Bytes::new()),
        }
    }

    /// Drops every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.size = 0;
    }

    fn make_contiguous(&mut self) -> Result<(), Error> {
        let fragmented =
            self.chunks.len() > 1 || self.chunks.front().map_or(false, |c| c.start != 0);
        if !fragmented {
            return Ok(());
        }
        let mut merged = Chunk::with_capacity(self.size)?;
        for chunk in &self.chunks {
            let live = chunk.live();
            merged.data[merged.end..merged.end + live]
                .copy_from_slice(&chunk.data[chunk.start..chunk.end]);
            merged.end += live;
        }
        self.chunks.clear();
        self.chunks.push_back(merged);
        Ok(())
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let mut arena = Arena::new();
        assert_eq!(arena.size(), 0);
        assert!(arena.is_empty());
        assert_eq!(arena.contiguous().unwrap(), &[] as &[u8]);
        assert_eq!(arena.into_bytes().unwrap(), Bytes::new());
    }

    #[test]
    fn test_push_and_read_back() {
        let mut arena = Arena::new();
        arena.push(b"hello ").unwrap();
        arena.push(b"world").unwrap();
        assert_eq!(arena.size(), 11);
        assert_eq!(arena.chunk_count(), 1);
        assert_eq!(arena.contiguous().unwrap(), b"hello world");
    }

    #[test]
    fn test_large_allocation_links_new_chunk() {
        let mut arena = Arena::new();
        arena.allocate(10).unwrap().fill(1);
        // Does not fit in the remainder of the first chunk.
        arena.allocate(DEFAULT_CHUNK_SIZE * 2).unwrap().fill(2);
        assert_eq!(arena.chunk_count(), 2);
        arena.pop(5);

        // allocate(10) + allocate(8192) - pop(5) = 8197 contiguous bytes.
        let data = arena.contiguous().unwrap().to_vec();
        assert_eq!(data.len(), 10 + DEFAULT_CHUNK_SIZE * 2 - 5);
        assert_eq!(arena.chunk_count(), 1);
        assert!(data[..10].iter().all(|&b| b == 1));
        assert!(data[10..].iter().all(|&b| b == 2));
    }

    #[test]
    fn test_allocate_front() {
        let mut arena = Arena::new();
        arena.push(b"body").unwrap();
        arena.push_front(b"head ").unwrap();
        assert_eq!(arena.size(), 9);
        assert_eq!(arena.contiguous().unwrap(), b"head body");
    }

    #[test]
    fn test_pop_front_trims_and_unlinks() {
        let mut arena = Arena::with_chunk_size(4);
        arena.push(b"abcd").unwrap();
        arena.push(b"efgh").unwrap();
        assert_eq!(arena.chunk_count(), 2);
        arena.pop_front(6);
        assert_eq!(arena.size(), 2);
        assert_eq!(arena.chunk_count(), 1);
        assert_eq!(arena.contiguous().unwrap(), b"gh");
    }

    #[test]
    fn test_pop_more_than_size_clears() {
        let mut arena = Arena::new();
        arena.push(b"abc").unwrap();
        arena.pop(100);
        assert!(arena.is_empty());
        assert_eq!(arena.chunk_count(), 0);
    }

    #[test]
    fn test_contiguity_after_mixed_operations() {
        let mut arena = Arena::with_chunk_size(8);
        arena.push(b"22").unwrap();
        arena.push_front(b"111").unwrap();
        arena.push(b"333333333333").unwrap(); // spans into a new chunk
        arena.pop(4);
        arena.pop_front(1);
        assert_eq!(arena.size(), 12);
        assert_eq!(arena.contiguous().unwrap(), b"112233333333");
        assert_eq!(arena.contiguous().unwrap().len(), arena.size());
    }

    #[test]
    fn test_write_at_patches_length_prefix() {
        let mut arena = Arena::with_chunk_size(8);
        let mark = arena.size();
        arena.push(&[0u8; 4]).unwrap();
        arena.push(b"payload that crosses a chunk boundary").unwrap();
        let len = (arena.size() - 4) as u32;
        arena.write_at(mark, &len.to_le_bytes()).unwrap();
        let data = arena.contiguous().unwrap();
        assert_eq!(u32::from_le_bytes([data[0], data[1], data[2], data[3]]), len);
        assert_eq!(&data[4..], b"payload that crosses a chunk boundary");
    }

    #[test]
    fn test_write_at_out_of_bounds() {
        let mut arena = Arena::new();
        arena.push(b"ab").unwrap();
        assert!(matches!(
            arena.write_at(1, &[0, 0]),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_into_bytes_transfers_ownership() {
        let mut arena = Arena::with_chunk_size(4);
        arena.push(b"one").unwrap();
        arena.push(b"two").unwrap();
        let bytes = arena.into_bytes().unwrap();
        assert_eq!(bytes, Bytes::from_static(b"onetwo"));

        // Links may read the same allocation after the owner is gone.
        let link = bytes.clone();
        drop(bytes);
        assert_eq!(link, Bytes::from_static(b"onetwo"));
    }

    #[test]
    fn test_zero_length_operations() {
        let mut arena = Arena::new();
        assert_eq!(arena.allocate(0).unwrap().len(), 0);
        assert_eq!(arena.allocate_front(0).unwrap().len(), 0);
        arena.pop(0);
        arena.pop_front(0);
        assert!(arena.is_empty());
    }
}
