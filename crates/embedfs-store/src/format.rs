//! Wire format definitions.
//!
//! ```text
//! u32  total_bucket_count
//! u32  total_bin_count            sum across all buckets
//! repeated total_bucket_count times:
//!     u8   name_length
//!     [u8] bucket_name
//!     u32  bin_count_in_this_bucket
//!     repeated bin_count_in_this_bucket times:
//!         u8   name_length
//!         [u8] bin_name
//!         u32  payload_length
//!         [u8] payload
//! ```
//!
//! The 4-byte fields use a single byte order for the whole blob (see
//! [`Endian`]); it is not recorded in the blob itself.

use embedfs_common::Endian;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Longest bucket or bin name the one-byte length prefix can describe.
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// Smallest possible encoding of a bucket: empty name, zero bins.
pub(crate) const MIN_BUCKET_SIZE: usize = 1 + 4;

/// Smallest possible encoding of a bin: empty name, empty payload.
pub(crate) const MIN_BIN_SIZE: usize = 1 + 4;

/// Fixed header at the start of every blob.
///
/// Counts are kept as raw bytes because their byte order is a property of
/// the producer, not of the host.
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct BlobHeader {
    bucket_count: [u8; 4],
    bin_count: [u8; 4],
}

impl BlobHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 8;

    /// Build a header from counts.
    pub fn new(bucket_count: u32, bin_count: u32, endian: Endian) -> Self {
        let mut header = Self::default();
        endian.write_u32(&mut header.bucket_count, bucket_count);
        endian.write_u32(&mut header.bin_count, bin_count);
        header
    }

    /// Declared number of buckets.
    #[inline]
    pub fn bucket_count(&self, endian: Endian) -> u32 {
        endian.read_u32(&self.bucket_count)
    }

    /// Declared number of bins across all buckets.
    #[inline]
    pub fn bin_count(&self, endian: Endian) -> u32 {
        endian.read_u32(&self.bin_count)
    }
}
