#![doc(alias = "oblivion")]
#![doc(alias = "fallout 3")]
#![doc(alias = "fo3")]
#![doc(alias = "fallout new vegas")]
#![doc(alias = "fnv")]
#![doc(alias = "tes5")]
#![doc(alias = "skyrim")]
#![doc(alias = "sse")]

//! TES IV: Oblivion
//!
//! This format debuted with Oblivion and sunset with Skyrim: SSE. It is the first format to introduce compression, and utilizes zlib (or lz4 frames for SSE) for this purpose. Files are grouped into folders: the directory holds every folder record first, then each folder's name followed by its file records, and finally one flat blob with every file name.
//!
//! The directory is flattened into [`FileStruct`](crate::FileStruct) entries named `folder\file`, ordered by folder hash and then by file hash. When two folders share a hash, the later folder replaces the earlier one entirely; when two files in one folder share a hash, the later file wins.
//!
//! # Reading
//! ```rust,no_run
//! use bsa_vfs::{prelude::*, tes4::Archive};
//! use std::path::Path;
//!
//! fn example() -> Option<()> {
//!     let path = Path::new("path/to/oblivion/Data/Oblivion - Misc.bsa");
//!     let (archive, options) = Archive::read(path).ok()?;
//!     println!("version {:?}, compressed: {}", options.version(), options.flags().compressed());
//!     for (index, file) in archive.files().iter().enumerate() {
//!         let bytes = archive.open(index).ok()?;
//!         println!("{}: {} bytes", file.name(), bytes.len());
//!     }
//!     Some(())
//! }
//! ```

mod archive;

pub use self::archive::{Archive, Flags as ArchiveFlags, Options as ArchiveOptions};

/// The archive version.
///
/// Each version has an impact on the abi of the TES4 archive file format.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub enum Version {
    #[default]
    v103 = 103,
    v104 = 104,
    v105 = 105,
}

impl Version {
    /// The Elder Scrolls IV: Oblivion.
    pub const TES4: Self = Self::v103;
    /// Fallout 3.
    pub const FO3: Self = Self::v104;
    /// Fallout: New Vegas.
    pub const FNV: Self = Self::v104;
    /// The Elder Scrolls V: Skyrim.
    pub const TES5: Self = Self::v104;
    /// The Elder Scrolls V: Skyrim - Special Edition.
    pub const SSE: Self = Self::v105;
}
