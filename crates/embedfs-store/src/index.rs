//! Bucket and bin index.
//!
//! [`BlobIndex`] holds the two flat arrays produced by the parser and
//! answers every lookup with a linear scan. Blobs carry a few dozen buckets
//! and bins at most, so no hashing is involved.

use std::ops::Range;

use crate::{NotFound, PayloadSpan};

/// A named namespace owning a contiguous range of bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bucket<S> {
    /// Interned bucket name.
    pub name: S,
    /// First bin of the bucket.
    pub start_index: usize,
    /// One past the last bin of the bucket.
    pub end_index: usize,
}

impl<S> Bucket<S> {
    /// Range of the bucket's bins in [`BlobIndex::bins`].
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    /// Number of bins in the bucket.
    #[inline]
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    /// Check if the bucket has no bins.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }
}

/// A named payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bin<S> {
    /// Interned bin name.
    pub name: S,
    /// Where the payload lives in the blob.
    pub payload: PayloadSpan,
}

/// Immutable index over a parsed blob.
///
/// Built once by [`BlobIndex::parse`]; every method takes `&self`, so any
/// number of readers may share it once parsing has completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobIndex<S> {
    pub(crate) buckets: Vec<Bucket<S>>,
    pub(crate) bins: Vec<Bin<S>>,
}

impl<S: Copy + Eq> BlobIndex<S> {
    /// Names of all buckets, last declared first.
    ///
    /// Duplicated bucket names appear once per declaration.
    pub fn list_all_buckets(&self) -> Vec<S> {
        self.buckets.iter().rev().map(|b| b.name).collect()
    }

    /// First bucket declared with `name`.
    pub fn find_bucket(&self, name: S) -> Option<&Bucket<S>> {
        self.buckets.iter().find(|b| b.name == name)
    }

    /// Names of the bins in a bucket, last stored first.
    ///
    /// A bucket without bins yields an empty list; an unknown bucket yields
    /// [`NotFound::Bucket`].
    pub fn list_bins_in_bucket(&self, bucket: S) -> Result<Vec<S>, NotFound> {
        let bucket = self.find_bucket(bucket).ok_or(NotFound::Bucket)?;
        Ok(self.bins_of(bucket).iter().rev().map(|b| b.name).collect())
    }

    /// Payload of the first bin named `name` inside `bucket`.
    ///
    /// Scoped lookups ignore shadowing: the earliest declaration in the
    /// bucket wins.
    pub fn lookup_in_bucket(&self, bucket: S, name: S) -> Result<PayloadSpan, NotFound> {
        let bucket = self.find_bucket(bucket).ok_or(NotFound::Bucket)?;
        self.bins_of(bucket)
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.payload)
            .ok_or(NotFound::Entry)
    }

    /// Payload of the last registered bin named `name`, in any bucket.
    ///
    /// Scanning backwards lets a later bucket shadow a same-named bin of an
    /// earlier one.
    pub fn lookup_by_name(&self, name: S) -> Result<PayloadSpan, NotFound> {
        self.bins
            .iter()
            .rev()
            .find(|b| b.name == name)
            .map(|b| b.payload)
            .ok_or(NotFound::Entry)
    }
}

impl<S> BlobIndex<S> {
    /// All buckets in declaration order.
    #[inline]
    pub fn buckets(&self) -> &[Bucket<S>] {
        &self.buckets
    }

    /// All bins in storage order.
    #[inline]
    pub fn bins(&self) -> &[Bin<S>] {
        &self.bins
    }

    /// Bins of one bucket in storage order.
    ///
    /// Returns an empty slice for a bucket that does not belong to this index.
    #[inline]
    pub fn bins_of(&self, bucket: &Bucket<S>) -> &[Bin<S>] {
        self.bins.get(bucket.range()).unwrap_or(&[])
    }

    /// Number of buckets.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of bins across all buckets.
    #[inline]
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Check if the index holds no buckets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use embedfs_common::{Interner, Symbol, SymbolTable};

    use super::*;
    use crate::{BlobBuilder, ParseOptions};

    fn parse(blob: &[u8]) -> (BlobIndex<Symbol>, SymbolTable) {
        let mut symbols = SymbolTable::new();
        let index = BlobIndex::parse(blob, &mut symbols, &ParseOptions::default()).unwrap();
        (index, symbols)
    }

    fn shadowing_blob() -> Vec<u8> {
        let mut builder = BlobBuilder::new();
        let lib = builder.bucket("lib");
        builder.add_bin(lib, "a.beam", b"X".to_vec());
        builder.add_bin(lib, "b.beam", b"Y".to_vec());
        let app = builder.bucket("app");
        builder.add_bin(app, "a.beam", b"Z".to_vec());
        builder.build().unwrap()
    }

    fn payload<'a>(blob: &'a [u8], span: PayloadSpan) -> &'a [u8] {
        span.slice(blob).unwrap()
    }

    #[test]
    fn test_shadowing() {
        let blob = shadowing_blob();
        let (index, symbols) = parse(&blob);
        let lib = symbols.get(b"lib").unwrap();
        let app = symbols.get(b"app").unwrap();
        let a = symbols.get(b"a.beam").unwrap();

        assert_eq!(payload(&blob, index.lookup_by_name(a).unwrap()), b"Z");
        assert_eq!(payload(&blob, index.lookup_in_bucket(lib, a).unwrap()), b"X");
        assert_eq!(payload(&blob, index.lookup_in_bucket(app, a).unwrap()), b"Z");
    }

    #[test]
    fn test_global_lookup_unshadowed() {
        let blob = shadowing_blob();
        let (index, symbols) = parse(&blob);
        let b = symbols.get(b"b.beam").unwrap();

        assert_eq!(payload(&blob, index.lookup_by_name(b).unwrap()), b"Y");
    }

    #[test]
    fn test_first_wins_within_bucket() {
        let mut builder = BlobBuilder::new();
        let lib = builder.bucket("lib");
        builder.add_bin(lib, "dup", b"first".to_vec());
        builder.add_bin(lib, "dup", b"second".to_vec());
        let blob = builder.build().unwrap();

        let (index, symbols) = parse(&blob);
        let lib = symbols.get(b"lib").unwrap();
        let dup = symbols.get(b"dup").unwrap();

        assert_eq!(payload(&blob, index.lookup_in_bucket(lib, dup).unwrap()), b"first");
        // Global lookup still prefers the last registration.
        assert_eq!(payload(&blob, index.lookup_by_name(dup).unwrap()), b"second");
    }

    #[test]
    fn test_list_all_buckets_reversed() {
        let mut builder = BlobBuilder::new();
        builder.bucket("P");
        builder.bucket("Q");
        builder.bucket("R");
        let blob = builder.build().unwrap();

        let (index, symbols) = parse(&blob);
        let names: Vec<&[u8]> = index
            .list_all_buckets()
            .into_iter()
            .map(|s| symbols.resolve(s).unwrap())
            .collect();

        assert_eq!(names, vec![&b"R"[..], &b"Q"[..], &b"P"[..]]);
    }

    #[test]
    fn test_list_bins_reversed() {
        let mut builder = BlobBuilder::new();
        let b = builder.bucket("b");
        builder.add_bin(b, "one", Vec::new());
        builder.add_bin(b, "two", Vec::new());
        builder.add_bin(b, "three", Vec::new());
        let blob = builder.build().unwrap();

        let (index, symbols) = parse(&blob);
        let bucket = symbols.get(b"b").unwrap();
        let names: Vec<&[u8]> = index
            .list_bins_in_bucket(bucket)
            .unwrap()
            .into_iter()
            .map(|s| symbols.resolve(s).unwrap())
            .collect();

        assert_eq!(names, vec![&b"three"[..], &b"two"[..], &b"one"[..]]);
    }

    #[test]
    fn test_unknown_bucket_vs_empty_bucket() {
        let mut builder = BlobBuilder::new();
        builder.bucket("empty");
        let full = builder.bucket("full");
        builder.add_bin(full, "x", b"1".to_vec());
        let blob = builder.build().unwrap();

        let mut symbols = SymbolTable::new();
        let index = BlobIndex::parse(&blob, &mut symbols, &ParseOptions::default()).unwrap();
        // Interned by the caller only, never registered as a bucket.
        let missing = symbols.intern(b"missing");
        let empty = symbols.get(b"empty").unwrap();
        let x = symbols.get(b"x").unwrap();

        assert_eq!(index.list_bins_in_bucket(missing), Err(NotFound::Bucket));
        assert_eq!(index.lookup_in_bucket(missing, x), Err(NotFound::Bucket));
        assert_eq!(index.list_bins_in_bucket(empty), Ok(Vec::new()));
        assert_eq!(index.lookup_in_bucket(empty, x), Err(NotFound::Entry));
    }

    #[test]
    fn test_missing_entry() {
        let blob = shadowing_blob();
        let (index, mut symbols) = parse(&blob);
        let lib = symbols.get(b"lib").unwrap();
        let c = symbols.intern(b"c.beam");

        assert_eq!(index.lookup_in_bucket(lib, c), Err(NotFound::Entry));
        assert_eq!(index.lookup_by_name(c), Err(NotFound::Entry));
    }

    #[test]
    fn test_duplicate_buckets() {
        let mut builder = BlobBuilder::new();
        let first = builder.bucket("dup");
        builder.add_bin(first, "a", b"1".to_vec());
        let second = builder.bucket("dup");
        builder.add_bin(second, "b", b"2".to_vec());
        let blob = builder.build().unwrap();

        let (index, symbols) = parse(&blob);
        let dup = symbols.get(b"dup").unwrap();
        let b = symbols.get(b"b").unwrap();

        assert_eq!(index.list_all_buckets(), vec![dup, dup]);
        // find_bucket returns the first declaration.
        let found = index.find_bucket(dup).unwrap();
        assert_eq!(found.range(), 0..1);
        // So the second bucket's bins are unreachable by scoped lookup.
        assert_eq!(index.lookup_in_bucket(dup, b), Err(NotFound::Entry));
        assert_eq!(payload(&blob, index.lookup_by_name(b).unwrap()), b"2");
    }

    #[test]
    fn test_find_every_bucket() {
        let mut builder = BlobBuilder::new();
        for name in ["kernel", "stdlib", "app"] {
            let b = builder.bucket(name);
            builder.add_bin(b, "mod.beam", name.as_bytes().to_vec());
        }
        let blob = builder.build().unwrap();
        let (index, _) = parse(&blob);

        for bucket in index.buckets() {
            assert_eq!(index.find_bucket(bucket.name), Some(bucket));
            assert_eq!(index.list_all_buckets().iter().filter(|&&n| n == bucket.name).count(), 1);
        }
    }

    #[test]
    fn test_storage_order_concatenation() {
        let mut builder = BlobBuilder::new();
        let a = builder.bucket("a");
        builder.add_bin(a, "1", b"one".to_vec());
        builder.add_bin(a, "2", b"two".to_vec());
        builder.bucket("empty");
        let c = builder.bucket("c");
        builder.add_bin(c, "3", b"three".to_vec());
        let blob = builder.build().unwrap();
        let (index, _) = parse(&blob);

        let concatenated: Vec<Bin<Symbol>> = index
            .buckets()
            .iter()
            .flat_map(|b| index.bins_of(b).iter().copied())
            .collect();

        assert_eq!(concatenated, index.bins());
        assert_eq!(index.bin_count(), 3);
        let total: usize = index.buckets().iter().map(Bucket::len).sum();
        assert_eq!(total, index.bin_count());
    }

    #[test]
    fn test_single_bin_bucket() {
        let mut builder = BlobBuilder::new();
        let only = builder.bucket("only");
        builder.add_bin(only, "file", b"contents".to_vec());
        let blob = builder.build().unwrap();
        let (index, symbols) = parse(&blob);
        let only = symbols.get(b"only").unwrap();
        let file = symbols.get(b"file").unwrap();

        assert_eq!(index.list_bins_in_bucket(only), Ok(vec![file]));
        assert_eq!(payload(&blob, index.lookup_in_bucket(only, file).unwrap()), b"contents");
        assert_eq!(payload(&blob, index.lookup_by_name(file).unwrap()), b"contents");
    }

    #[test]
    fn test_zero_buckets() {
        let blob = BlobBuilder::new().build().unwrap();
        let (index, mut symbols) = parse(&blob);
        let anything = symbols.intern(b"anything");

        assert!(index.is_empty());
        assert!(index.list_all_buckets().is_empty());
        assert_eq!(index.find_bucket(anything), None);
        assert_eq!(index.list_bins_in_bucket(anything), Err(NotFound::Bucket));
        assert_eq!(index.lookup_in_bucket(anything, anything), Err(NotFound::Bucket));
        assert_eq!(index.lookup_by_name(anything), Err(NotFound::Entry));
    }

    #[test]
    fn test_lookups_are_idempotent() {
        let blob = shadowing_blob();
        let (index, symbols) = parse(&blob);
        let lib = symbols.get(b"lib").unwrap();
        let a = symbols.get(b"a.beam").unwrap();
        let snapshot = index.clone();

        assert_eq!(index.list_all_buckets(), index.list_all_buckets());
        assert_eq!(index.list_bins_in_bucket(lib), index.list_bins_in_bucket(lib));
        assert_eq!(index.lookup_in_bucket(lib, a), index.lookup_in_bucket(lib, a));
        assert_eq!(index.lookup_by_name(a), index.lookup_by_name(a));
        assert_eq!(index, snapshot);
    }

    #[test]
    fn test_bins_of_foreign_bucket() {
        let blob = shadowing_blob();
        let (index, symbols) = parse(&blob);
        let foreign = Bucket {
            name: symbols.get(b"lib").unwrap(),
            start_index: 10,
            end_index: 20,
        };

        assert!(index.bins_of(&foreign).is_empty());
    }
}
