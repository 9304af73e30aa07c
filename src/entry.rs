use bstr::BStr;
use core::{cmp::Ordering, fmt};
use std::sync::Arc;

/// The identity hash used by Morrowind archives.
///
/// Hashes are not unique: collisions are observed in shipped archives and never cause a read to fail.
#[derive(Clone, Copy, Debug, Default)]
#[repr(C)]
pub struct Hash {
    pub low: u32,
    pub high: u32,
}

impl Hash {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn numeric(&self) -> u64 {
        (u64::from(self.low) << 32) | u64::from(self.high)
    }
}

impl PartialEq for Hash {
    fn eq(&self, other: &Self) -> bool {
        self.numeric() == other.numeric()
    }
}

impl Eq for Hash {}

impl PartialOrd for Hash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Hash {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric().cmp(&other.numeric())
    }
}

/// One directory entry of an archive.
///
/// The name is not owned by the entry. Instead, every entry read from the same archive shares one names buffer, and the entry remembers the byte range that belongs to it.
#[derive(Clone)]
pub struct FileStruct {
    /// The size as it was stored on disk. For compressed archives this still carries the flag bits.
    pub file_size: u32,
    /// The absolute offset of the entry's data within the archive.
    pub offset: u64,
    pub hash: Hash,
    pub name_offset: u32,
    pub name_size: u32,
    names: Arc<[u8]>,
}

impl FileStruct {
    /// Callers guarantee that the name range lies within `names`.
    #[must_use]
    pub(crate) fn new(
        file_size: u32,
        offset: u64,
        hash: Hash,
        name_offset: u32,
        name_size: u32,
        names: Arc<[u8]>,
    ) -> Self {
        debug_assert!(name_offset as usize + name_size as usize <= names.len());
        Self {
            file_size,
            offset,
            hash,
            name_offset,
            name_size,
            names,
        }
    }

    /// The entry's name, with its original case and separators.
    #[must_use]
    pub fn name(&self) -> &BStr {
        let start = self.name_offset as usize;
        let stop = start + self.name_size as usize;
        self.names[start..stop].into()
    }

    /// The buffer shared by all entries of the owning archive.
    #[must_use]
    pub fn names_buffer(&self) -> &Arc<[u8]> {
        &self.names
    }
}

impl fmt::Debug for FileStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStruct")
            .field("name", &self.name())
            .field("file_size", &self.file_size)
            .field("offset", &self.offset)
            .field("hash", &self.hash)
            .finish()
    }
}
