//! Read-only resource store over an embedded binary blob.
//!
//! A blob groups named payloads ("bins") into named namespaces
//! ("buckets"). It is produced once at build time, linked into the binary,
//! and parsed into an immutable index at startup. Lookups never copy
//! payload bytes.
//!
//! Lookup rules:
//!
//! - Scoped lookups ([`BlobIndex::lookup_in_bucket`]) resolve inside one
//!   bucket; the first bin with the name wins.
//! - Name-only lookups ([`BlobIndex::lookup_by_name`]) search every bucket
//!   from the last registered bin backwards, so a later bucket shadows an
//!   earlier one.
//! - Listings ([`BlobIndex::list_all_buckets`],
//!   [`BlobIndex::list_bins_in_bucket`]) come out in reverse storage order.
//!
//! # Example
//!
//! ```
//! use embedfs_store::{BlobBuilder, EmbedStore, NotFound, ParseOptions};
//!
//! let mut builder = BlobBuilder::new();
//! let lib = builder.bucket("lib");
//! builder.add_bin(lib, "a.beam", b"X".to_vec());
//! let app = builder.bucket("app");
//! builder.add_bin(app, "a.beam", b"Z".to_vec());
//!
//! let store = EmbedStore::parse(builder.build()?, ParseOptions::default())?;
//!
//! assert_eq!(store.lookup_by_name(b"a.beam"), Ok(&b"Z"[..]));
//! assert_eq!(store.lookup_in_bucket(b"lib", b"a.beam"), Ok(&b"X"[..]));
//! assert_eq!(store.lookup_in_bucket(b"ebin", b"a.beam"), Err(NotFound::Bucket));
//! # Ok::<(), embedfs_store::Error>(())
//! ```

mod builder;
mod embedded;
mod error;
pub mod format;
mod index;
mod parser;
mod span;
mod store;

pub use builder::{BlobBuilder, BucketHandle};
pub use embedded::EmbeddedFs;
pub use error::{Error, NotFound, Result};
pub use index::{Bin, BlobIndex, Bucket};
pub use parser::ParseOptions;
pub use span::PayloadSpan;
pub use store::{EmbedStore, Entry};

pub use embedfs_common::{Endian, Interner, Symbol, SymbolTable};

/// Re-export of the memory map backing [`EmbedStore::open`].
pub use memmap2::Mmap;
