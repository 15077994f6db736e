//! Blob builder.
//!
//! Produces the wire format read by [`BlobIndex::parse`](crate::BlobIndex::parse).
//!
//! # Example
//!
//! ```
//! use embedfs_store::{BlobBuilder, EmbedStore, ParseOptions};
//!
//! let mut builder = BlobBuilder::new();
//! let lib = builder.bucket("lib");
//! builder.add_bin(lib, "lists.beam", b"FOR1".to_vec());
//!
//! let blob = builder.build()?;
//! let store = EmbedStore::parse(blob, ParseOptions::default())?;
//! assert_eq!(store.lookup_by_name(b"lists.beam")?, b"FOR1");
//! # Ok::<(), embedfs_store::Error>(())
//! ```

use std::io::{self, Write};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use embedfs_common::Endian;
use zerocopy::IntoBytes;

use crate::format::{BlobHeader, MAX_NAME_LEN};
use crate::{Error, Result};

/// Handle to a bucket in the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketHandle(usize);

#[derive(Debug, Clone)]
struct BucketDef {
    name: Vec<u8>,
    bins: Vec<BinDef>,
}

#[derive(Debug, Clone)]
struct BinDef {
    name: Vec<u8>,
    payload: Vec<u8>,
}

/// Builder for embedded blobs.
///
/// Buckets are written in declaration order and bins in insertion order.
/// Duplicate bucket or bin names are kept as-is.
#[derive(Debug, Clone, Default)]
pub struct BlobBuilder {
    endian: Endian,
    buckets: Vec<BucketDef>,
}

impl BlobBuilder {
    /// Create a new empty big-endian builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the byte order of the 4-byte fields.
    pub fn with_byte_order(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Declare a new bucket.
    pub fn bucket(&mut self, name: impl AsRef<[u8]>) -> BucketHandle {
        self.buckets.push(BucketDef {
            name: name.as_ref().to_vec(),
            bins: Vec::new(),
        });
        BucketHandle(self.buckets.len() - 1)
    }

    /// Append a bin to a bucket.
    ///
    /// # Panics
    ///
    /// Panics if `bucket` was returned by a different builder.
    pub fn add_bin(&mut self, bucket: BucketHandle, name: impl AsRef<[u8]>, payload: Vec<u8>) {
        self.buckets[bucket.0].bins.push(BinDef {
            name: name.as_ref().to_vec(),
            payload,
        });
    }

    /// Number of declared buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of bins across all buckets.
    pub fn bin_count(&self) -> usize {
        self.buckets.iter().map(|b| b.bins.len()).sum()
    }

    /// Build the blob and return the raw bytes.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut output)?;
        Ok(output)
    }

    /// Build the blob and write it to a file.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = self.build()?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Write the blob to a writer.
    ///
    /// Every name and length is checked before the first byte is written.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.validate()?;

        let header = BlobHeader::new(
            self.buckets.len() as u32,
            self.bin_count() as u32,
            self.endian,
        );
        writer.write_all(header.as_bytes())?;

        for bucket in &self.buckets {
            write_name(writer, &bucket.name)?;
            self.write_u32(writer, bucket.bins.len() as u32)?;

            for bin in &bucket.bins {
                write_name(writer, &bin.name)?;
                self.write_u32(writer, bin.payload.len() as u32)?;
                writer.write_all(&bin.payload)?;
            }
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        check_u32("bucket count", self.buckets.len())?;
        check_u32("bin count", self.bin_count())?;

        for bucket in &self.buckets {
            check_name(&bucket.name)?;
            check_u32("bin count", bucket.bins.len())?;
            for bin in &bucket.bins {
                check_name(&bin.name)?;
                check_u32("payload length", bin.payload.len())?;
            }
        }
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        let bins: usize = self
            .buckets
            .iter()
            .flat_map(|b| &b.bins)
            .map(|b| 1 + b.name.len() + 4 + b.payload.len())
            .sum();
        let buckets: usize = self.buckets.iter().map(|b| 1 + b.name.len() + 4).sum();
        BlobHeader::SIZE + buckets + bins
    }

    fn write_u32<W: Write>(&self, writer: &mut W, value: u32) -> io::Result<()> {
        match self.endian {
            Endian::Big => writer.write_u32::<BigEndian>(value),
            Endian::Little => writer.write_u32::<LittleEndian>(value),
        }
    }
}

fn write_name<W: Write>(writer: &mut W, name: &[u8]) -> io::Result<()> {
    writer.write_u8(name.len() as u8)?;
    writer.write_all(name)
}

fn check_name(name: &[u8]) -> Result<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(Error::NameTooLong { len: name.len() });
    }
    Ok(())
}

fn check_u32(what: &'static str, len: usize) -> Result<()> {
    if u32::try_from(len).is_err() {
        return Err(Error::TooLarge { what, len });
    }
    Ok(())
}
