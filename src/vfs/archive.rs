use crate::{
    fo4, guess,
    path::normalize_in_place,
    tes3, tes4,
    vfs::{Archive, File, FileMap},
    ArchiveIndex, Bytes, Error, FileFormat, FileStruct, Reader as _, Result, Stream,
};
use bstr::{BStr, BString, ByteVec as _};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// An archive of any supported family.
pub enum Family {
    TES3(tes3::Archive),
    TES4(tes4::Archive),
    FO4(fo4::Archive),
}

impl Family {
    #[must_use]
    pub fn files(&self) -> &[FileStruct] {
        match self {
            Self::TES3(x) => x.files(),
            Self::TES4(x) => x.files(),
            Self::FO4(x) => x.files(),
        }
    }

    pub fn open(&self, index: usize) -> Result<Bytes> {
        match self {
            Self::TES3(x) => x.open(index),
            Self::TES4(x) => x.open(index),
            Self::FO4(x) => x.open(index),
        }
    }

    #[must_use]
    fn name(&self) -> &'static str {
        match self {
            Self::TES3(_) => "tes3",
            Self::TES4(_) => "tes4",
            Self::FO4(x) => match x.options().format() {
                fo4::Format::GNRL => "ba2 general",
                fo4::Format::DX10 => "ba2 texture",
            },
        }
    }
}

impl From<tes3::Archive> for Family {
    fn from(value: tes3::Archive) -> Self {
        Self::TES3(value)
    }
}

impl From<tes4::Archive> for Family {
    fn from(value: tes4::Archive) -> Self {
        Self::TES4(value)
    }
}

impl From<fo4::Archive> for Family {
    fn from(value: fo4::Archive) -> Self {
        Self::FO4(value)
    }
}

struct ArchiveFile {
    archive: Arc<Family>,
    index: usize,
}

impl File for ArchiveFile {
    fn open(&self) -> Result<Stream> {
        Ok(self.archive.open(self.index)?.into_stream())
    }
}

/// Exposes the named entries of a [`Family`] archive.
pub struct BsaArchive {
    path: PathBuf,
    family: &'static str,
    files: FileMap,
}

impl BsaArchive {
    /// Wraps an archive that has already been read. The `path` is only used for its description.
    #[must_use]
    pub fn new<P, A>(path: P, archive: A) -> Self
    where
        P: Into<PathBuf>,
        A: Into<Family>,
    {
        let archive = Arc::new(archive.into());
        let path = path.into();
        let unnamed = archive.files().iter().filter(|x| x.name().is_empty()).count();
        if unnamed > 0 {
            warn!(
                path = %path.display(),
                unnamed,
                "archive has entries without names, which can't be addressed"
            );
        }

        let mut files = FileMap::new();
        for (name, &index) in &ArchiveIndex::from_entries(archive.files()) {
            let file = ArchiveFile {
                archive: Arc::clone(&archive),
                index,
            };
            files.insert_normalized(name.to_owned(), Arc::new(file));
        }

        Self {
            path,
            family: archive.name(),
            files,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Archive for BsaArchive {
    fn list_resources(&self, files: &mut FileMap) {
        for (path, file) in &self.files {
            files.insert_normalized(path.to_owned(), Arc::clone(file));
        }
    }

    fn contains(&self, path: &BStr) -> bool {
        self.files.contains(path)
    }

    fn description(&self) -> String {
        format!("{} archive {}", self.family, self.path.display())
    }
}

/// Detects the family of the archive at `path` and reads it.
pub fn open_archive(path: &Path) -> Result<BsaArchive> {
    let fd = fs::File::open(path)?;
    let family: Family = match guess::guess_format(&mut &fd) {
        Some(FileFormat::TES3) => tes3::Archive::read(&fd)?.into(),
        Some(FileFormat::TES4) => tes4::Archive::read(&fd)?.0.into(),
        Some(FileFormat::FO4(_)) => fo4::Archive::read(&fd)?.0.into(),
        None => return Err(Error::UnsupportedArchiveFormat),
    };

    debug!(path = %path.display(), family = family.name(), "opened archive");
    Ok(BsaArchive::new(path, family))
}

struct LooseFile {
    path: PathBuf,
}

impl File for LooseFile {
    fn open(&self) -> Result<Stream> {
        let bytes = fs::read(&self.path)?;
        Ok(Bytes::from_owned(bytes).into_stream())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Loose files under a data directory.
pub struct FileSystemArchive {
    root: PathBuf,
    files: FileMap,
}

impl FileSystemArchive {
    /// Walks `root` once, indexing every file beneath it by its path relative to `root`.
    ///
    /// When two files normalize to the same path, the one that sorts first by name is kept.
    pub fn new<P>(root: P) -> Result<Self>
    where
        P: Into<PathBuf>,
    {
        let root = root.into();
        let mut files = FileMap::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry?;
            // follows symlinks, unlike the walk itself
            if !entry.path().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };

            let mut key = BString::from(<Vec<u8>>::from_path_lossy(relative).into_owned());
            normalize_in_place(&mut key);
            if files.contains(&key) {
                warn!(path = %entry.path().display(), "skipping loose file that shadows an earlier one");
                continue;
            }

            let file = LooseFile {
                path: entry.into_path(),
            };
            files.insert_normalized(key, Arc::new(file));
        }

        debug!(root = %root.display(), files = files.len(), "indexed loose files");
        Ok(Self { root, files })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Archive for FileSystemArchive {
    fn list_resources(&self, files: &mut FileMap) {
        for (path, file) in &self.files {
            files.insert_normalized(path.to_owned(), Arc::clone(file));
        }
    }

    fn contains(&self, path: &BStr) -> bool {
        self.files.contains(path)
    }

    fn description(&self) -> String {
        format!("loose files in {}", self.root.display())
    }
}
