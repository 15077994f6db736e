//! embedfs - read-only resources packed into the running binary.
//!
//! This crate provides a unified interface to the embedfs crates.
//!
//! # Crates
//!
//! - [`embedfs_common`] - Binary reading and name interning
//! - [`embedfs_store`] - Blob format, parser, index and lookups
//!
//! # Example
//!
//! ```no_run
//! use embedfs::prelude::*;
//!
//! // Usually `include_bytes!` of the blob written by `embedfs pack`.
//! const BLOB: &[u8] = &[0; 8];
//! static EMBEDDED: EmbeddedFs = EmbeddedFs::new(BLOB);
//!
//! let store = EMBEDDED.initialize()?;
//! for bucket in store.list_all_buckets() {
//!     println!("{}", String::from_utf8_lossy(bucket));
//! }
//!
//! match store.lookup_by_name(b"app.beam") {
//!     Ok(code) => println!("{} bytes", code.len()),
//!     Err(NotFound::Entry) => println!("not embedded"),
//!     Err(NotFound::Bucket) => unreachable!(),
//! }
//! # Ok::<(), embedfs::store::Error>(())
//! ```

pub use embedfs_common as common;
pub use embedfs_store as store;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use embedfs_common::{BinaryReader, Endian, Interner, Symbol, SymbolTable};
    pub use embedfs_store::{
        BlobBuilder, BlobIndex, EmbedStore, EmbeddedFs, NotFound, ParseOptions, PayloadSpan,
    };
}

// Re-export commonly used types at the crate root
pub use embedfs_store::{EmbedStore, EmbeddedFs, Error, NotFound, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
