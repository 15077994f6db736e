//! Payload spans.

use std::ops::Range;

/// Location of a bin's payload inside the blob it was parsed from.
///
/// A span does not own or copy any bytes. Resolve it against the same blob
/// with [`PayloadSpan::slice`]; the returned slice borrows from the blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PayloadSpan {
    /// Byte offset of the payload from the start of the blob.
    pub offset: usize,
    /// Payload length in bytes.
    pub len: usize,
}

impl PayloadSpan {
    /// Create a new span.
    #[inline]
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Offset one past the last payload byte, saturating at `usize::MAX`.
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset.saturating_add(self.len)
    }

    /// Byte range covered by the payload.
    #[inline]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Check if the payload is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrow the payload from `blob`, or `None` if the span lies outside it.
    #[inline]
    pub fn slice<'a>(&self, blob: &'a [u8]) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(self.len)?;
        blob.get(self.offset..end)
    }
}
