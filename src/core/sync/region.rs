/*!
 * Shared Region
 *
 * A block of 32-bit atomic words that several agents reference at once.
 * Cloning a region is how it is handed to another agent; the memory lives
 * as long as any clone does.
 */

use super::word::AtomicWord;
use crate::core::errors::{SyncError, SyncResult};
use crate::core::limits::WORD_SIZE;
use std::fmt;
use std::sync::atomic::AtomicU32;
use std::sync::Arc;

struct RegionInner {
    words: Box<[AtomicU32]>,
    byte_len: usize,
}

/// Reference-counted shared memory region
///
/// The region is addressed in bytes, like the raw buffer another agent would
/// receive, but can only be touched a whole aligned word at a time. A
/// trailing partial word (when `byte_len` is not a multiple of 4) exists for
/// length bookkeeping only and can never be addressed.
#[derive(Clone)]
pub struct SharedRegion {
    inner: Arc<RegionInner>,
}

impl SharedRegion {
    /// Allocate a zero-filled region of `byte_len` bytes
    pub fn new(byte_len: usize) -> Self {
        let word_count = byte_len.div_ceil(WORD_SIZE);
        let words = (0..word_count).map(|_| AtomicU32::new(0)).collect();
        Self {
            inner: Arc::new(RegionInner { words, byte_len }),
        }
    }

    /// Allocate a region sized for `words` whole words
    pub fn with_words(words: usize) -> Self {
        Self::new(words * WORD_SIZE)
    }

    /// Length of the region in bytes
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.inner.byte_len
    }

    /// Number of whole words that can be addressed
    #[inline]
    pub fn word_count(&self) -> usize {
        self.inner.byte_len / WORD_SIZE
    }

    /// Whether both handles refer to the same memory
    #[inline]
    pub fn ptr_eq(&self, other: &SharedRegion) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Validate that `words` words starting at `byte_offset` fit the region
    pub fn check_span(&self, byte_offset: usize, words: usize) -> SyncResult<()> {
        if byte_offset % WORD_SIZE != 0 {
            return Err(SyncError::NotAligned {
                offset: byte_offset,
            });
        }
        let required = words * WORD_SIZE;
        match byte_offset.checked_add(required) {
            Some(end) if end <= self.byte_len() => Ok(()),
            _ => Err(SyncError::OutOfRange {
                offset: byte_offset,
                required,
                length: self.byte_len(),
            }),
        }
    }

    /// Validated handle to the word at `byte_offset`
    pub fn word(&self, byte_offset: usize) -> SyncResult<AtomicWord> {
        self.check_span(byte_offset, 1)?;
        Ok(AtomicWord::new_unchecked(self.clone(), byte_offset / WORD_SIZE))
    }

    /// Word at `index`; callers have validated the span
    #[inline]
    pub(crate) fn cell(&self, index: usize) -> &AtomicU32 {
        &self.inner.words[index]
    }
}

impl fmt::Debug for SharedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRegion")
            .field("byte_len", &self.byte_len())
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
