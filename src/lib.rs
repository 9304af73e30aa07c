//! Bethesda archives come in several flavors, and each one stores its directory in a different way. This crate parses the directory of every flavor ([`tes3`], [`tes4`], [`fo4`]) into one flat list of [`FileStruct`] entries, and then merges any number of archives and loose-file directories into a single case-insensitive namespace through the [`vfs`] module.
//!
//! # Reading
//! ```rust,no_run
//! use bsa_vfs::vfs::{self, Manager};
//! use std::io::Read as _;
//!
//! fn example() -> bsa_vfs::Result<()> {
//!     let config = vfs::Config::builder()
//!         .data_dir("path/to/morrowind/Data Files")
//!         .archive("Morrowind.bsa")
//!         .build();
//!     let mut manager = Manager::new();
//!     vfs::register_archives(&mut manager, &config)?;
//!     let mut stream = manager.get("Icons/Gold.dds")?;
//!     let mut bytes = Vec::new();
//!     stream.read_to_end(&mut bytes)?;
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::pedantic,
    clippy::single_char_lifetime_names,
    clippy::std_instead_of_core
)]
#![allow(
    unknown_lints,
    clippy::enum_glob_use,
    clippy::missing_errors_doc,
    clippy::struct_field_names
)]

mod cc;
mod codec;
mod containers;
mod derive;
mod entry;
pub mod fo4;
mod guess;
mod index;
mod io;
mod path;
mod protocols;
pub mod tes3;
pub mod tes4;
#[cfg(test)]
mod test_support;
pub mod vfs;

pub use self::{
    containers::{Bytes, Stream},
    entry::{FileStruct, Hash},
    guess::{guess_format, FileFormat},
    index::{
        ArchiveIndex, Iter as IndexIter, Matching as MatchingIter, Prefixed as PrefixedIter,
    },
    path::{normalize_filename, normalize_in_place},
};

use core::num::TryFromIntError;
use lzzzz::lz4f;
use std::io as std_io;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no archive named {0} exists in any data directory")]
    ArchiveNotFound(BString),

    #[error("declared sizes in the archive header are inconsistent: {0}")]
    CorruptHeader(&'static str),

    #[error("buffer failed to decompress to the expected size... expected {expected} bytes, but got {actual} bytes")]
    DecompressionSizeMismatch { expected: usize, actual: usize },

    #[error("a file name in directory {directory} is empty")]
    EmptyFileName { directory: BString },

    #[error("an operation on an integer would have truncated and corrupted data")]
    IntegralTruncation,

    #[error("invalid sentinel read from chunk: {0}")]
    InvalidChunkSentinel(u32),

    #[error("invalid chunk size read from file header: {0}")]
    InvalidChunkSize(u16),

    #[error("invalid format read from archive header: {0}")]
    InvalidFormat(u32),

    #[error("invalid magic read from archive header: {0}")]
    InvalidMagic(u32),

    #[error("invalid version read from archive header: {0}")]
    InvalidVersion(u32),

    #[error(transparent)]
    Io(#[from] std_io::Error),

    #[error(transparent)]
    LZ4(#[from] lzzzz::Error),

    #[error(transparent)]
    LZ4F(#[from] lz4f::Error),

    #[error("entry spanning {offset}..{offset}+{size} lies outside of the {len} byte archive")]
    OffsetOutOfBounds { offset: u64, size: u64, len: u64 },

    #[error("attempted to seek to {position}, but the source is only {len} bytes long")]
    OutOfRange { position: usize, len: usize },

    #[error("field of {len} bytes exceeds the limit of {limit} bytes")]
    OversizedField { len: usize, limit: usize },

    #[error("no resource named {0} exists in the virtual file system")]
    ResourceNotFound(BString),

    #[error("attempted to read {wanted} bytes, but only {remaining} bytes remain")]
    TruncatedRead { wanted: usize, remaining: usize },

    #[error("the archive format could not be determined")]
    UnsupportedArchiveFormat,

    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}

impl From<TryFromIntError> for Error {
    fn from(_: TryFromIntError) -> Self {
        Self::IntegralTruncation
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// Makes a deep copy of the input.
///
/// The lifetime of the result is independent of the input buffer.
pub struct Copied<'copy>(pub &'copy [u8]);

mod private {
    pub trait Sealed {}
}

use private::Sealed;

/// A trait that enables reading from various sources.
pub trait Reader<T>: Sealed {
    type Error;
    type Item;

    /// Reads an instance of `Self::Item` from the given source.
    fn read(source: T) -> core::result::Result<Self::Item, Self::Error>;
}

pub use bstr::{BStr, BString, ByteSlice, ByteVec};

/// Convenience using statements for traits that are needed to work with the library.
pub mod prelude {
    pub use crate::{
        vfs::{Archive as _, File as _},
        Reader as _,
    };
}
