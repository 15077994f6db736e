//! Name-keyed store over a blob.

use std::fs::File;
use std::path::Path;

use embedfs_common::{Symbol, SymbolTable};
use memmap2::Mmap;
use tracing::debug;

use crate::{BlobIndex, Bucket, NotFound, ParseOptions, PayloadSpan, Result};

/// A parsed blob together with the symbol table its names were interned in.
///
/// `B` is whatever owns or borrows the bytes: a `&'static [u8]` from
/// `include_bytes!`, a `Vec<u8>`, or a memory map from [`EmbedStore::open`].
/// Payloads are returned as slices borrowed from the blob.
pub struct EmbedStore<B> {
    blob: B,
    index: BlobIndex<Symbol>,
    symbols: SymbolTable,
}

/// One bin as seen by [`EmbedStore::entries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Entry<'a> {
    /// Name of the owning bucket.
    pub bucket: &'a [u8],
    /// Name of the bin.
    pub name: &'a [u8],
    /// Payload bytes.
    pub data: &'a [u8],
}

impl EmbedStore<Mmap> {
    /// Memory-map a blob file and parse it.
    pub fn open<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only; the file is expected to stay
        // unchanged while the store is alive.
        let mmap = unsafe { Mmap::map(&file)? };

        debug!(path = %path.display(), bytes = mmap.len(), "mapped blob file");
        Self::parse(mmap, options)
    }
}

impl<B: AsRef<[u8]>> EmbedStore<B> {
    /// Parse `blob` with a fresh symbol table.
    pub fn parse(blob: B, options: ParseOptions) -> Result<Self> {
        Self::parse_with_symbols(blob, SymbolTable::new(), options)
    }

    /// Parse `blob`, interning names into an existing symbol table.
    pub fn parse_with_symbols(blob: B, mut symbols: SymbolTable, options: ParseOptions) -> Result<Self> {
        let index = BlobIndex::parse(blob.as_ref(), &mut symbols, &options)?;
        Ok(Self {
            blob,
            index,
            symbols,
        })
    }

    /// The raw blob.
    #[inline]
    pub fn blob(&self) -> &[u8] {
        self.blob.as_ref()
    }

    /// The symbol-keyed index.
    #[inline]
    pub fn index(&self) -> &BlobIndex<Symbol> {
        &self.index
    }

    /// The symbol table holding every bucket and bin name.
    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Bytes of a symbol interned by this store.
    #[inline]
    pub fn name(&self, symbol: Symbol) -> &[u8] {
        self.symbols.resolve(symbol).unwrap_or_default()
    }

    /// Resolve a span produced by this store's index.
    #[inline]
    pub fn payload(&self, span: PayloadSpan) -> &[u8] {
        span.slice(self.blob()).unwrap_or_default()
    }

    /// Names of all buckets, last declared first.
    pub fn list_all_buckets(&self) -> Vec<&[u8]> {
        self.names(self.index.list_all_buckets())
    }

    /// First bucket declared with `name`.
    pub fn find_bucket(&self, name: &[u8]) -> Option<&Bucket<Symbol>> {
        self.index.find_bucket(self.symbols.get(name)?)
    }

    /// Names of the bins in a bucket, last stored first.
    pub fn list_bins_in_bucket(&self, bucket: &[u8]) -> std::result::Result<Vec<&[u8]>, NotFound> {
        let bucket = self.symbols.get(bucket).ok_or(NotFound::Bucket)?;
        Ok(self.names(self.index.list_bins_in_bucket(bucket)?))
    }

    /// Payload of the first bin named `name` in `bucket`.
    pub fn lookup_in_bucket(&self, bucket: &[u8], name: &[u8]) -> std::result::Result<&[u8], NotFound> {
        let bucket = self.symbols.get(bucket).ok_or(NotFound::Bucket)?;
        // The bucket is checked first so an unknown bucket is never
        // reported as a missing entry.
        let Some(name) = self.symbols.get(name) else {
            return match self.index.find_bucket(bucket) {
                Some(_) => Err(NotFound::Entry),
                None => Err(NotFound::Bucket),
            };
        };
        let span = self.index.lookup_in_bucket(bucket, name)?;
        Ok(self.payload(span))
    }

    /// Payload of the last registered bin named `name`, in any bucket.
    pub fn lookup_by_name(&self, name: &[u8]) -> std::result::Result<&[u8], NotFound> {
        let name = self.symbols.get(name).ok_or(NotFound::Entry)?;
        let span = self.index.lookup_by_name(name)?;
        Ok(self.payload(span))
    }

    /// Iterate over every bin in storage order.
    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> + '_ {
        self.index.buckets().iter().flat_map(move |bucket| {
            let bucket_name = self.name(bucket.name);
            self.index.bins_of(bucket).iter().map(move |bin| Entry {
                bucket: bucket_name,
                name: self.name(bin.name),
                data: self.payload(bin.payload),
            })
        })
    }

    fn names(&self, symbols: Vec<Symbol>) -> Vec<&[u8]> {
        symbols.into_iter().map(|s| self.name(s)).collect()
    }
}

impl<B: AsRef<[u8]>> std::fmt::Debug for EmbedStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedStore")
            .field("bytes", &self.blob().len())
            .field("buckets", &self.index.bucket_count())
            .field("bins", &self.index.bin_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlobBuilder, Endian, Error};

    fn store() -> EmbedStore<Vec<u8>> {
        let mut builder = BlobBuilder::new();
        let lib = builder.bucket("lib");
        builder.add_bin(lib, "a.beam", b"X".to_vec());
        builder.add_bin(lib, "b.beam", b"Y".to_vec());
        builder.bucket("empty");
        let app = builder.bucket("app");
        builder.add_bin(app, "a.beam", b"Z".to_vec());

        EmbedStore::parse(builder.build().unwrap(), ParseOptions::default()).unwrap()
    }

    #[test]
    fn test_shadowing_by_name() {
        let store = store();

        assert_eq!(store.lookup_by_name(b"a.beam"), Ok(&b"Z"[..]));
        assert_eq!(store.lookup_in_bucket(b"lib", b"a.beam"), Ok(&b"X"[..]));
        assert_eq!(store.lookup_in_bucket(b"app", b"a.beam"), Ok(&b"Z"[..]));
    }

    #[test]
    fn test_not_found_kinds() {
        let store = store();

        assert_eq!(store.lookup_in_bucket(b"nope", b"a.beam"), Err(NotFound::Bucket));
        assert_eq!(store.lookup_in_bucket(b"nope", b"never.seen"), Err(NotFound::Bucket));
        assert_eq!(store.lookup_in_bucket(b"lib", b"never.seen"), Err(NotFound::Entry));
        assert_eq!(store.lookup_in_bucket(b"app", b"b.beam"), Err(NotFound::Entry));
        assert_eq!(store.lookup_by_name(b"never.seen"), Err(NotFound::Entry));
        assert_eq!(store.list_bins_in_bucket(b"nope"), Err(NotFound::Bucket));
        assert_eq!(store.list_bins_in_bucket(b"empty"), Ok(Vec::new()));
    }

    #[test]
    fn test_listing_order() {
        let store = store();

        assert_eq!(
            store.list_all_buckets(),
            vec![&b"app"[..], &b"empty"[..], &b"lib"[..]]
        );
        assert_eq!(
            store.list_bins_in_bucket(b"lib").unwrap(),
            vec![&b"b.beam"[..], &b"a.beam"[..]]
        );
    }

    #[test]
    fn test_entries_in_storage_order() {
        let store = store();
        let entries: Vec<(&[u8], &[u8], &[u8])> =
            store.entries().map(|e| (e.bucket, e.name, e.data)).collect();

        assert_eq!(
            entries,
            vec![
                (&b"lib"[..], &b"a.beam"[..], &b"X"[..]),
                (&b"lib"[..], &b"b.beam"[..], &b"Y"[..]),
                (&b"app"[..], &b"a.beam"[..], &b"Z"[..]),
            ]
        );
    }

    #[test]
    fn test_lookup_does_not_intern() {
        let store = store();
        let before = store.symbols().len();

        let _ = store.lookup_by_name(b"unknown");
        let _ = store.list_bins_in_bucket(b"unknown");
        assert_eq!(store.symbols().len(), before);
    }

    #[test]
    fn test_find_bucket_by_name() {
        let store = store();
        let bucket = store.find_bucket(b"empty").unwrap();

        assert!(bucket.is_empty());
        assert_eq!(bucket.start_index, 2);
        assert!(store.find_bucket(b"missing").is_none());
    }

    #[test]
    fn test_payload_of_foreign_span_is_empty() {
        let store = store();

        assert_eq!(store.payload(PayloadSpan::new(usize::MAX, 1)), b"");
        assert_eq!(store.payload(PayloadSpan::new(store.blob().len(), 1)), b"");
    }

    #[test]
    fn test_static_blob() {
        static BLOB: &[u8] = b"\x00\x00\x00\x01\x00\x00\x00\x01\x01s\x00\x00\x00\x01\x01f\x00\x00\x00\x03abc";
        let store = EmbedStore::parse(BLOB, ParseOptions::default()).unwrap();

        assert_eq!(store.blob().as_ptr(), BLOB.as_ptr());
        assert_eq!(store.lookup_in_bucket(b"s", b"f"), Ok(&b"abc"[..]));
    }

    #[test]
    fn test_open_mapped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embed.fs");

        let mut builder = BlobBuilder::new().with_byte_order(Endian::Little);
        let b = builder.bucket("priv");
        builder.add_bin(b, "config", b"{}".to_vec());
        builder.write_to_file(&path).unwrap();

        let options = ParseOptions::new().byte_order(Endian::Little);
        let store = EmbedStore::open(&path, options).unwrap();
        assert_eq!(store.lookup_by_name(b"config"), Ok(&b"{}"[..]));
    }

    #[test]
    fn test_open_missing_file() {
        let err = EmbedStore::open("/nonexistent/embed.fs", ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
