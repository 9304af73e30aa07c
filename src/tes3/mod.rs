//! TES III: Morrowind
//!
//! This format debuted and sunset with Morrowind. It is the simplest of all the formats, using no compression or special tricks to organize the data. The directory is a flat table of `(size, offset)` records, followed by a table of offsets into a blob of null-terminated names, followed by one [`Hash`](crate::Hash) per file.
//!
//! # Reading
//! ```rust,no_run
//! use bsa_vfs::{prelude::*, tes3::Archive};
//! use std::path::Path;
//!
//! fn example() -> Option<()> {
//!     let path = Path::new("path/to/morrowind/Data Files/Morrowind.bsa");
//!     let archive = Archive::read(path).ok()?;
//!     let index = archive.find(bsa_vfs::tes3::hash_file("icons/gold.dds"))?;
//!     let bytes = archive.open(index).ok()?;
//!     println!("{} bytes", bytes.len());
//!     Some(())
//! }
//! ```

mod archive;
mod hashing;

pub use self::{archive::Archive, hashing::hash_file};
