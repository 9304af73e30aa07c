//! The virtual file system.
//!
//! A [`Manager`] merges any number of [`Archive`]s into one case-insensitive namespace. Archives are consulted in the order they were added, and when two of them provide the same path the one added last wins. This is how load order gives later mods priority over earlier ones.
//!
//! The index is only rebuilt on request: adding an archive has no visible effect until [`Manager::build_index`] runs again.
//!
//! # Lookups
//! ```rust,no_run
//! use bsa_vfs::{
//!     prelude::*,
//!     vfs::{self, FileSystemArchive, Manager},
//! };
//!
//! fn example() -> bsa_vfs::Result<()> {
//!     let mut manager = Manager::new();
//!     manager.add_archive(vfs::open_archive("Data Files/Morrowind.bsa".as_ref())?);
//!     manager.add_archive(FileSystemArchive::new("Data Files")?);
//!     manager.build_index();
//!
//!     assert!(manager.exists("meshes\\Base_Anim.nif") == manager.exists("MESHES/base_anim.NIF"));
//!     for (path, _) in manager.paths_with_prefix("icons/") {
//!         println!("{path}");
//!     }
//!     Ok(())
//! }
//! ```

mod archive;
mod manager;
mod register;

use crate::{Result, Stream};
use bstr::BStr;
use std::{path::Path, sync::Arc};

pub use self::{
    archive::{open_archive, BsaArchive, Family, FileSystemArchive},
    manager::Manager,
    register::{register_archives, Config, ConfigBuilder},
};

/// The table every [`Archive`] contributes to.
pub type FileMap = crate::ArchiveIndex<Arc<dyn File>>;

/// A single resource which can be read any number of times.
pub trait File: Send + Sync {
    /// Produces a fresh stream over the resource's contents.
    ///
    /// Every call is independent: streams never share a cursor, so resources may be opened concurrently.
    fn open(&self) -> Result<Stream>;

    /// Where the resource lives on disk, if it is a loose file.
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// A source of resources that can be registered with a [`Manager`].
pub trait Archive: Send + Sync {
    /// Inserts every resource this archive provides into `files`, replacing whatever was there under the same path.
    fn list_resources(&self, files: &mut FileMap);

    /// Checks if the archive provides the given normalized path.
    fn contains(&self, path: &BStr) -> bool;

    /// A human readable description, such as the file the archive was read from.
    fn description(&self) -> String;
}
