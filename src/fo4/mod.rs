#![doc(alias = "fallout 4")]
#![doc(alias = "fo76")]
#![doc(alias = "starfield")]
#![doc(alias = "ba2")]

//! Fallout 4
//!
//! This format debuted with Fallout 4 and is still in use by Starfield. Archives come in two flavors: general archives (GNRL) hold arbitrary files, while texture archives (DX10) hold textures whose DDS headers have been stripped and replaced by a compact description of the mip chain. Every file is split into one or more chunks which are compressed independently.
//!
//! Files are addressed by the string table at the end of the archive. Archives without one can only be used by hash, so they contribute no entries here. Opening a texture rebuilds its DDS header in front of the decompressed mips.
//!
//! # Reading
//! ```rust,no_run
//! use bsa_vfs::{fo4::Archive, prelude::*};
//! use std::path::Path;
//!
//! fn example() -> Option<()> {
//!     let path = Path::new("path/to/fallout4/Data/Fallout4 - Textures1.ba2");
//!     let (archive, options) = Archive::read(path).ok()?;
//!     println!("{:?} archive, version {:?}", options.format(), options.version());
//!     for (index, file) in archive.files().iter().enumerate() {
//!         let dds = archive.open(index).ok()?;
//!         println!("{}: {} bytes", file.name(), dds.len());
//!     }
//!     Some(())
//! }
//! ```

mod archive;
mod chunk;
mod dds;
mod file;

pub use self::{
    archive::{Archive, Options as ArchiveOptions},
    chunk::Chunk,
    file::{DX10Header, File, FileHeader, Hash},
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionFormat {
    #[default]
    Zip,
    LZ4,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    #[default]
    GNRL,
    DX10,
}

/// The archive version.
///
/// Each version has an impact on the abi of the FO4 archive file format.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub enum Version {
    #[default]
    v1 = 1,
    v2 = 2,
    v3 = 3,
    v7 = 7,
    v8 = 8,
}

impl Version {
    /// Fallout 4.
    pub const FO4: Self = Self::v1;
    /// Fallout 4 after its next generation update.
    pub const FO4_NEXT_GEN: Self = Self::v8;
    /// Fallout 76.
    pub const FO76: Self = Self::v1;
    /// Starfield.
    pub const SF: Self = Self::v2;
}
