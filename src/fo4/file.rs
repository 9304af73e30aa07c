use crate::fo4::Chunk;
use core::slice;

/// Identity hashes stored for every record. Lookups go through names, so these are informational.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
#[repr(C)]
pub struct Hash {
    pub file: u32,
    pub extension: u32,
    pub directory: u32,
}

/// The texture description carried by every record of a DX10 archive.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DX10Header {
    pub height: u16,
    pub width: u16,
    pub mip_count: u8,
    /// A `DXGI_FORMAT` value.
    pub format: u8,
    pub flags: u8,
    pub tile_mode: u8,
}

impl DX10Header {
    /// Cube maps store six faces per mip level.
    #[must_use]
    pub fn is_cubemap(&self) -> bool {
        self.flags & 1 != 0
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FileHeader {
    #[default]
    GNRL,
    DX10(DX10Header),
}

impl From<DX10Header> for FileHeader {
    fn from(value: DX10Header) -> Self {
        Self::DX10(value)
    }
}

/// The directory record of one file: its header and the chunks its data is split across.
#[derive(Clone, Debug, Default)]
pub struct File {
    pub(crate) hash: Hash,
    pub(crate) header: FileHeader,
    pub(crate) chunks: Vec<Chunk>,
}

impl File {
    #[must_use]
    pub fn as_slice(&self) -> &[Chunk] {
        &self.chunks
    }

    #[must_use]
    pub fn hash(&self) -> Hash {
        self.hash
    }

    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// The total size of the file's chunks once decompressed, not counting any reconstructed texture header.
    #[must_use]
    pub fn decompressed_len(&self) -> u64 {
        self.chunks.iter().map(|x| u64::from(x.decompressed_size)).sum()
    }
}

impl<'a> IntoIterator for &'a File {
    type Item = &'a Chunk;
    type IntoIter = slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
