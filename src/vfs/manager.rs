use crate::{
    index::{Iter, Matching, Prefixed},
    path,
    vfs::{Archive, File, FileMap},
    Error, Result, Stream,
};
use bstr::ByteSlice as _;
use std::{path::Path, sync::Arc};
use tracing::info;

/// Merges registered archives into one lookup table.
///
/// The manager starts out empty. [`add_archive`](Self::add_archive) only queues an archive, and [`build_index`](Self::build_index) discards the current table and rebuilds it from every queued archive in registration order. Lookups never touch the file system directly: a path that is not in the table does not exist.
///
/// Once the index is built the manager is only read, so it can be shared between threads and queried concurrently.
#[derive(Default)]
pub struct Manager {
    archives: Vec<Box<dyn Archive>>,
    files: FileMap,
}

impl Manager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an archive behind every archive added before it.
    pub fn add_archive<A>(&mut self, archive: A)
    where
        A: Archive + 'static,
    {
        self.archives.push(Box::new(archive));
    }

    /// Rebuilds the lookup table from scratch, letting later archives replace the resources of earlier ones.
    pub fn build_index(&mut self) {
        self.files.clear();
        for archive in &self.archives {
            archive.list_resources(&mut self.files);
        }
        info!(
            archives = self.archives.len(),
            files = self.files.len(),
            "built vfs index"
        );
    }

    /// Forgets every archive along with the lookup table built from them.
    pub fn reset(&mut self) {
        self.files.clear();
        self.archives.clear();
    }

    #[must_use]
    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    #[must_use]
    pub fn exists<P>(&self, path: &P) -> bool
    where
        P: ?Sized + AsRef<[u8]>,
    {
        self.files.contains(path)
    }

    #[must_use]
    pub fn find<P>(&self, path: &P) -> Option<&Arc<dyn File>>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        self.files.get(path)
    }

    /// Opens a fresh stream over the resource at `path`.
    pub fn get<P>(&self, path: &P) -> Result<Stream>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        self.lookup(path)?.open()
    }

    /// Every indexed path in normalized order, paired with the resource that won it.
    pub fn index(&self) -> Iter<'_, Arc<dyn File>> {
        self.files.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Every indexed path under the given prefix, in normalized order.
    pub fn paths_with_prefix<P>(&self, prefix: &P) -> Prefixed<'_, Arc<dyn File>>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        self.files.with_prefix(prefix)
    }

    /// Every indexed path matching the wildcard `pattern`, in normalized order.
    ///
    /// The pattern is normalized like a path. `*` matches any run of bytes, separators included, and `?` matches exactly one byte.
    pub fn paths_matching<P>(&self, pattern: &P) -> Matching<'_, Arc<dyn File>>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        self.files.matching(pattern)
    }

    /// Describes the archive with the highest priority that provides `path`.
    #[must_use]
    pub fn archive_description<P>(&self, path: &P) -> Option<String>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        let path = path::normalize_filename(path);
        self.archives
            .iter()
            .rev()
            .find(|x| x.contains(path.as_bstr()))
            .map(|x| x.description())
    }

    /// Where the resource at `path` lives on disk. Only loose files have one.
    pub fn absolute_file_name<P>(&self, path: &P) -> Result<&Path>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        self.lookup(path)?
            .path()
            .ok_or_else(|| Error::ResourceNotFound(path.as_ref().into()))
    }

    fn lookup<P>(&self, path: &P) -> Result<&Arc<dyn File>>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        self.files
            .get(path)
            .ok_or_else(|| Error::ResourceNotFound(path.as_ref().into()))
    }
}
