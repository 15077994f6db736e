//! Process-wide store over a blob linked into the binary.
//!
//! ```
//! use embedfs_store::EmbeddedFs;
//!
//! const BLOB: &[u8] = b"\x00\x00\x00\x00\x00\x00\x00\x00";
//! static EMBEDDED: EmbeddedFs = EmbeddedFs::new(BLOB);
//!
//! assert!(EMBEDDED.get().is_err());
//! let store = EMBEDDED.initialize()?;
//! assert!(store.list_all_buckets().is_empty());
//! # Ok::<(), embedfs_store::Error>(())
//! ```

use std::sync::OnceLock;

use tracing::info;

use crate::{EmbedStore, Error, ParseOptions, Result};

/// A store that is parsed exactly once and then shared by every reader.
///
/// Initialization publishes the parsed index through a [`OnceLock`], so all
/// reads that observe an initialized store also observe the complete index.
pub struct EmbeddedFs {
    blob: &'static [u8],
    options: ParseOptions,
    store: OnceLock<EmbedStore<&'static [u8]>>,
}

impl EmbeddedFs {
    /// Wrap a static blob, parsed with default options.
    pub const fn new(blob: &'static [u8]) -> Self {
        Self::with_options(blob, ParseOptions::new())
    }

    /// Wrap a static blob with explicit parse options.
    pub const fn with_options(blob: &'static [u8], options: ParseOptions) -> Self {
        Self {
            blob,
            options,
            store: OnceLock::new(),
        }
    }

    /// Parse the blob. Must be called once, before the first lookup.
    pub fn initialize(&self) -> Result<&EmbedStore<&'static [u8]>> {
        if self.store.get().is_some() {
            return Err(Error::AlreadyInitialized);
        }

        let store = EmbedStore::parse(self.blob, self.options)?;
        // Lost a race with a concurrent initialize.
        self.store.set(store).map_err(|_| Error::AlreadyInitialized)?;

        let store = self.get()?;
        info!(
            buckets = store.index().bucket_count(),
            bins = store.index().bin_count(),
            "embedded store initialized"
        );
        Ok(store)
    }

    /// The initialized store.
    pub fn get(&self) -> Result<&EmbedStore<&'static [u8]>> {
        self.store.get().ok_or(Error::NotInitialized)
    }

    /// The store, parsing it first if nobody has yet.
    pub fn get_or_initialize(&self) -> Result<&EmbedStore<&'static [u8]>> {
        match self.initialize() {
            Err(Error::AlreadyInitialized) => self.get(),
            other => other,
        }
    }

    /// Check if [`initialize`](Self::initialize) has completed.
    pub fn is_initialized(&self) -> bool {
        self.store.get().is_some()
    }
}

impl std::fmt::Debug for EmbeddedFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedFs")
            .field("bytes", &self.blob.len())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
