//! Single-pass blob parser.

use std::fmt;

use embedfs_common::{BinaryReader, Endian, Interner};
use tracing::{debug, trace};

use crate::format::{BlobHeader, MIN_BIN_SIZE, MIN_BUCKET_SIZE};
use crate::index::{Bin, BlobIndex, Bucket};
use crate::{Error, PayloadSpan, Result};

/// Options controlling how a blob is parsed.
///
/// # Example
///
/// ```
/// use embedfs_store::{Endian, ParseOptions};
///
/// let options = ParseOptions::new()
///     .byte_order(Endian::Little)
///     .verify_counts(false);
/// assert_eq!(options.endian, Endian::Little);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseOptions {
    /// Byte order of the 4-byte fields. Must match the producer.
    pub endian: Endian,
    /// Reject blobs whose per-bucket bin counts do not add up to the header's
    /// total.
    pub verify_counts: bool,
    /// Accept bytes after the last payload.
    pub allow_trailing: bool,
}

impl ParseOptions {
    /// Default options: big-endian, verified counts, trailing bytes allowed.
    pub const fn new() -> Self {
        Self {
            endian: Endian::Big,
            verify_counts: true,
            allow_trailing: true,
        }
    }

    /// Set the byte order.
    pub const fn byte_order(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Enable or disable the header count check.
    pub const fn verify_counts(mut self, verify: bool) -> Self {
        self.verify_counts = verify;
        self
    }

    /// Enable or disable acceptance of trailing bytes.
    pub const fn allow_trailing(mut self, allow: bool) -> Self {
        self.allow_trailing = allow;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::new()
    }
}

fn truncated(what: &'static str) -> impl FnOnce(embedfs_common::Error) -> Error {
    move |err| match err {
        embedfs_common::Error::UnexpectedEof {
            offset,
            needed,
            available,
        } => Error::malformed(
            offset,
            format!("truncated {what}: needed {needed} bytes, {available} available"),
        ),
        other => Error::Common(other),
    }
}

impl<S: Copy + Eq + fmt::Debug> BlobIndex<S> {
    /// Parse a blob, interning every bucket and bin name with `interner`.
    ///
    /// One forward pass fills both arrays; payloads are recorded as spans
    /// into `blob` and never copied.
    pub fn parse<I>(blob: &[u8], interner: &mut I, options: &ParseOptions) -> Result<Self>
    where
        I: Interner<Symbol = S>,
    {
        let mut reader = BinaryReader::with_endian(blob, options.endian);

        let header: BlobHeader = reader.read_struct().map_err(truncated("header"))?;
        let bucket_count = header.bucket_count(options.endian) as usize;
        let bin_count = header.bin_count(options.endian) as usize;

        // Counts come from the blob; never reserve more than it could hold.
        let mut buckets = Vec::with_capacity(bucket_count.min(reader.remaining() / MIN_BUCKET_SIZE));
        let mut bins = Vec::with_capacity(bin_count.min(reader.remaining() / MIN_BIN_SIZE));

        let mut index = 0usize;
        for _ in 0..bucket_count {
            let name = reader.read_short_bytes().map_err(truncated("bucket name"))?;
            let name = interner.intern(name);

            let count_offset = reader.position();
            let count = reader.read_u32().map_err(truncated("bin count"))? as usize;

            let start_index = index;
            index = index
                .checked_add(count)
                .ok_or_else(|| Error::malformed(count_offset, "bin count overflows"))?;

            for _ in 0..count {
                let bin_name = reader.read_short_bytes().map_err(truncated("bin name"))?;
                let bin_name = interner.intern(bin_name);

                let len = reader.read_u32().map_err(truncated("payload length"))? as usize;
                let offset = reader.position();
                reader.skip(len).map_err(truncated("payload"))?;

                bins.push(Bin {
                    name: bin_name,
                    payload: PayloadSpan::new(offset, len),
                });
            }

            trace!(bucket = ?name, bins = count, "registered bucket");
            buckets.push(Bucket {
                name,
                start_index,
                end_index: index,
            });
        }

        if options.verify_counts && index != bin_count {
            return Err(Error::malformed(
                4,
                format!("header declares {bin_count} bins, buckets hold {index}"),
            ));
        }

        if !options.allow_trailing && !reader.is_empty() {
            return Err(Error::malformed(
                reader.position(),
                format!("{} trailing bytes", reader.remaining()),
            ));
        }

        debug!(
            buckets = buckets.len(),
            bins = bins.len(),
            bytes = reader.position(),
            "parsed blob index"
        );

        Ok(Self { buckets, bins })
    }
}
