use core::ops::Deref;
use memmap2::Mmap;
use std::{fs, io, sync::Arc};

/// The complete contents of one archive file, shared by every entry read from it.
pub(crate) enum Backing {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Backing {
    pub(crate) fn map(fd: &fs::File) -> io::Result<Self> {
        if fd.metadata()?.len() == 0 {
            return Ok(Self::Owned(Vec::new()));
        }

        // SAFETY: archives are treated as read-only for the lifetime of the mapping
        let mapping = unsafe { Mmap::map(fd) }?;
        Ok(Self::Mapped(mapping))
    }

    #[must_use]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Owned(x) => x,
            Self::Mapped(x) => x,
        }
    }
}

struct Mapping {
    pos: usize,
    len: usize,
    backing: Arc<Backing>,
}

impl Mapping {
    #[must_use]
    fn as_bytes(&self) -> &[u8] {
        &self.backing.as_bytes()[self.pos..self.pos + self.len]
    }
}

enum Inner {
    Owned(Vec<u8>),
    Mapped(Mapping),
}

/// The contents of one resource, either decompressed into its own buffer or viewed in place inside the archive.
pub struct Bytes {
    inner: Inner,
}

impl Bytes {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.inner {
            Inner::Owned(x) => x,
            Inner::Mapped(x) => x.as_bytes(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.inner {
            Inner::Owned(x) => x.len(),
            Inner::Mapped(x) => x.len,
        }
    }

    #[must_use]
    pub fn into_stream(self) -> Stream {
        io::Cursor::new(self)
    }

    #[must_use]
    pub(crate) fn from_owned(bytes: Vec<u8>) -> Self {
        Self {
            inner: Inner::Owned(bytes),
        }
    }

    /// The caller guarantees `pos + len` lies within `backing`.
    #[must_use]
    pub(crate) fn from_mapped(pos: usize, len: usize, backing: Arc<Backing>) -> Self {
        debug_assert!(pos + len <= backing.as_bytes().len());
        Self {
            inner: Inner::Mapped(Mapping { pos, len, backing }),
        }
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl Default for Bytes {
    fn default() -> Self {
        Self::from_owned(Vec::new())
    }
}

/// An independently positioned reader over one resource.
pub type Stream = io::Cursor<Bytes>;
