//! Name interning.
//!
//! Bucket and bin names are interned once while a blob is parsed; from then
//! on names are compared as [`Symbol`]s, never byte-wise.

use std::fmt;
use std::hash::BuildHasherDefault;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use crate::Result;

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Converts byte-string names into comparable handles.
///
/// Interning the same bytes twice must return equal symbols, and distinct
/// bytes must return distinct symbols.
pub trait Interner {
    /// Handle type. Equality is expected to be O(1).
    type Symbol: Copy + Eq + fmt::Debug;

    /// Intern `name`, returning its handle.
    fn intern(&mut self, name: &[u8]) -> Self::Symbol;
}

/// Handle to a name in a [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol(u32);

impl Symbol {
    /// Index of the symbol in its table.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bidirectional map between byte-string names and [`Symbol`]s.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    names: Vec<Box<[u8]>>,
    symbols: FxHashMap<Box<[u8]>, Symbol>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an already interned name without inserting it.
    #[inline]
    pub fn get(&self, name: &[u8]) -> Option<Symbol> {
        self.symbols.get(name).copied()
    }

    /// Get the bytes of a symbol.
    #[inline]
    pub fn resolve(&self, symbol: Symbol) -> Option<&[u8]> {
        self.names.get(symbol.index()).map(|n| &**n)
    }

    /// Get the name of a symbol as UTF-8.
    pub fn resolve_str(&self, symbol: Symbol) -> Option<Result<&str>> {
        self.resolve(symbol)
            .map(|bytes| std::str::from_utf8(bytes).map_err(Into::into))
    }

    /// Number of distinct names.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over all symbols and their names, in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &[u8])> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (Symbol(i as u32), &**name))
    }
}

impl Interner for SymbolTable {
    type Symbol = Symbol;

    fn intern(&mut self, name: &[u8]) -> Symbol {
        if let Some(symbol) = self.get(name) {
            return symbol;
        }

        let symbol = Symbol(self.names.len() as u32);
        self.names.push(name.into());
        self.symbols.insert(name.into(), symbol);
        symbol
    }
}
