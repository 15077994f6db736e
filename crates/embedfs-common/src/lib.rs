//! Common utilities for embedfs.
//!
//! This crate provides the foundational types shared by the embedfs crates:
//!
//! - [`BinaryReader`] - Zero-copy, endian-aware reading from byte slices
//! - [`Endian`] - Byte order of the fixed-width fields in a blob
//! - [`Interner`] / [`SymbolTable`] - Name interning with O(1) equality

mod error;
mod reader;
mod symbol;

pub use error::{Error, Result};
pub use reader::{BinaryReader, Endian};
pub use symbol::{Interner, Symbol, SymbolTable};

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
