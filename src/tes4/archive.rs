use crate::{
    codec,
    containers::{Backing, Bytes},
    derive,
    io::{Endian, Source},
    protocols::{self, BZString, ZString},
    tes4::Version,
    Error, FileStruct, Hash, Result,
};
use bstr::BString;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, trace};

bitflags::bitflags! {
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Flags: u32 {
        const DIRECTORY_STRINGS = 1 << 0;
        const FILE_STRINGS = 1 << 1;
        const COMPRESSED = 1 << 2;
        const RETAIN_DIRECTORY_NAMES = 1 << 3;
        const RETAIN_FILE_NAMES = 1 << 4;
        const RETAIN_FILE_NAME_OFFSETS = 1 << 5;
        const XBOX_ARCHIVE = 1 << 6;
        const RETAIN_STRINGS_DURING_STARTUP = 1 << 7;
        const EMBEDDED_FILE_NAMES = 1 << 8;
        const XBOX_COMPRESSED = 1 << 9;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::DIRECTORY_STRINGS | Self::FILE_STRINGS
    }
}

impl Flags {
    #[must_use]
    pub fn directory_strings(&self) -> bool {
        self.contains(Self::DIRECTORY_STRINGS)
    }

    #[must_use]
    pub fn file_strings(&self) -> bool {
        self.contains(Self::FILE_STRINGS)
    }

    /// The default compression state of every file in the archive.
    #[must_use]
    pub fn compressed(&self) -> bool {
        self.contains(Self::COMPRESSED)
    }

    /// Hashes are stored big-endian.
    #[must_use]
    pub fn xbox_archive(&self) -> bool {
        self.contains(Self::XBOX_ARCHIVE)
    }

    /// Each file's data is prefixed by its full path. Never set for [`Version::v103`].
    #[must_use]
    pub fn embedded_file_names(&self) -> bool {
        self.contains(Self::EMBEDDED_FILE_NAMES)
    }
}

mod constants {
    use crate::cc;

    pub const BSA: u32 = cc::make_four(b"BSA");
    pub const HEADER_SIZE: u32 = 0x24;

    pub const FILE_FLAG_COMPRESSION: u32 = 1 << 30;
    pub const FILE_FLAG_SECONDARY_ARCHIVE: u32 = 1 << 31;

    pub const FILE_ENTRY_SIZE: usize = 0x10;
    pub const MAX_FILE_NAME_LEN: usize = 255;
}

struct Header {
    version: Version,
    folders_offset: u32,
    archive_flags: Flags,
    folder_count: u32,
    folder_names_len: u32,
    file_names_len: u32,
    file_flags: u32,
}

impl Header {
    #[must_use]
    fn hash_endian(&self) -> Endian {
        if self.archive_flags.xbox_archive() {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

struct FileRecord {
    hash: u64,
    size: u32,
    offset: u32,
    name: BString,
}

struct FolderRecord<'bytes> {
    hash: u64,
    count: u32,
    name: &'bytes [u8],
    files: Vec<FileRecord>,
}

/// Archive-wide settings read from the header.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    version: Version,
    flags: Flags,
    file_flags: u32,
}

impl Options {
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    #[must_use]
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// The content types stored in the archive. Informational only.
    #[must_use]
    pub fn file_flags(&self) -> u32 {
        self.file_flags
    }
}

/// An Oblivion through Skyrim: SSE archive whose directory has been read and flattened.
pub struct Archive {
    files: Vec<FileStruct>,
    backing: Arc<Backing>,
    options: Options,
}

type ReadResult = (Archive, Options);
derive::reader!(Archive => ReadResult);
derive::entries!(Archive);

impl Archive {
    #[must_use]
    pub fn options(&self) -> Options {
        self.options
    }

    /// Reads the data belonging to the entry at `index`, decompressing it if needed.
    ///
    /// The archive's compression flag is toggled per file by bit 30 of the stored size.
    pub fn open(&self, index: usize) -> Result<Bytes> {
        let file = self.files.get(index).ok_or(Error::OutOfRange {
            position: index,
            len: self.files.len(),
        })?;
        let compression_flipped = file.file_size & constants::FILE_FLAG_COMPRESSION != 0;
        let size = file.file_size & !constants::FILE_FLAG_COMPRESSION;

        let bytes = self.backing.as_bytes();
        let len = bytes.len() as u64;
        if file.offset + u64::from(size) > len {
            return Err(Error::OffsetOutOfBounds {
                offset: file.offset,
                size: size.into(),
                len,
            });
        }

        let start: usize = file.offset.try_into()?;
        let mut source = Source::new(&bytes[start..start + size as usize]);
        if self.options.flags.embedded_file_names() {
            source.read_protocol::<protocols::BString>(Endian::Little)?;
        }

        trace!(name = %file.name(), compression_flipped, "opening tes4 file");
        if self.options.flags.compressed() == compression_flipped {
            let pos = start + source.stream_position();
            Ok(Bytes::from_mapped(
                pos,
                source.remaining(),
                Arc::clone(&self.backing),
            ))
        } else {
            let decompressed_len: u32 = source.read(Endian::Little)?;
            let data = source.read_bytes(source.remaining())?;
            let out = match self.options.version {
                Version::v103 | Version::v104 => {
                    codec::decompress_zlib(data, decompressed_len as usize)?
                }
                Version::v105 => codec::decompress_lz4_frame(data, decompressed_len as usize)?,
            };
            Ok(Bytes::from_owned(out))
        }
    }

    fn do_read(backing: Arc<Backing>) -> Result<ReadResult> {
        let bytes = backing.as_bytes();
        let mut source = Source::new(bytes);
        let mut header = Self::read_header(&mut source)?;
        source.seek_absolute(header.folders_offset as usize)?;

        let mut folders = Vec::new();
        for _ in 0..header.folder_count {
            let folder = Self::read_folder_record(&mut source, &header)?;
            folders.push(folder);
        }

        for folder in &mut folders {
            Self::read_folder_contents(&mut source, &mut header, folder)?;
        }

        if header.archive_flags.file_strings() {
            source.seek_relative(header.folder_names_len as usize)?;
            for folder in &mut folders {
                for file in &mut folder.files {
                    file.name = Self::read_file_name(&mut source, &mut header, folder.name)?;
                }
            }
        } else if header.archive_flags.embedded_file_names() {
            for file in folders.iter_mut().flat_map(|x| x.files.iter_mut()) {
                file.name = Self::read_embedded_name(bytes, file.offset)?;
            }
        }

        let mut map: BTreeMap<u64, BTreeMap<u64, FileRecord>> = BTreeMap::new();
        for folder in folders {
            let files = folder.files.into_iter().map(|x| (x.hash, x)).collect();
            map.insert(folder.hash, files);
        }

        let files = Self::flatten(map.values().flat_map(BTreeMap::values))?;
        let options = Options {
            version: header.version,
            flags: header.archive_flags,
            file_flags: header.file_flags,
        };

        debug!(
            version = ?options.version,
            files = files.len(),
            "read tes4 archive directory"
        );
        Ok((
            Self {
                files,
                backing,
                options,
            },
            options,
        ))
    }

    fn flatten<'a, I>(records: I) -> Result<Vec<FileStruct>>
    where
        I: Iterator<Item = &'a FileRecord>,
    {
        let mut buffer = Vec::new();
        let mut layout = Vec::new();
        for record in records {
            let name_offset: u32 = buffer.len().try_into()?;
            let name_size: u32 = record.name.len().try_into()?;
            buffer.extend_from_slice(&record.name);
            buffer.push(b'\0');
            layout.push((record, name_offset, name_size));
        }

        let names: Arc<[u8]> = buffer.into();
        let files = layout
            .into_iter()
            .map(|(record, name_offset, name_size)| {
                FileStruct::new(
                    record.size,
                    u64::from(record.offset & !constants::FILE_FLAG_SECONDARY_ARCHIVE),
                    Hash::new(),
                    name_offset,
                    name_size,
                    Arc::clone(&names),
                )
            })
            .collect();
        Ok(files)
    }

    fn read_folder_record<'bytes>(
        source: &mut Source<'bytes>,
        header: &Header,
    ) -> Result<FolderRecord<'bytes>> {
        let hash = source.read(header.hash_endian())?;
        let count = source.read(Endian::Little)?;
        match header.version {
            Version::v103 | Version::v104 => {
                let _offset: u32 = source.read(Endian::Little)?;
            }
            Version::v105 => {
                let (_padding, _offset): (u32, u64) = source.read(Endian::Little)?;
            }
        }

        Ok(FolderRecord {
            hash,
            count,
            name: &[],
            files: Vec::new(),
        })
    }

    fn read_folder_contents<'bytes>(
        source: &mut Source<'bytes>,
        header: &mut Header,
        folder: &mut FolderRecord<'bytes>,
    ) -> Result<()> {
        if header.archive_flags.directory_strings() {
            let start = source.stream_position();
            folder.name = source.read_protocol::<BZString>(Endian::Little)?;
            let consumed: u32 = (source.stream_position() - start - 1).try_into()?;
            header.folder_names_len = header
                .folder_names_len
                .checked_sub(consumed)
                .ok_or(Error::CorruptHeader(
                    "folder names exceed their declared length",
                ))?;
        }

        let plausible = source.remaining() / constants::FILE_ENTRY_SIZE;
        folder.files.reserve((folder.count as usize).min(plausible));
        for _ in 0..folder.count {
            let hash = source.read(header.hash_endian())?;
            let (size, offset) = source.read(Endian::Little)?;
            folder.files.push(FileRecord {
                hash,
                size,
                offset,
                name: BString::default(),
            });
        }

        Ok(())
    }

    fn read_file_name(
        source: &mut Source<'_>,
        header: &mut Header,
        directory: &[u8],
    ) -> Result<BString> {
        let name = source.read_protocol::<ZString>(Endian::Little)?;
        if name.is_empty() {
            return Err(Error::EmptyFileName {
                directory: directory.into(),
            });
        }
        if name.len() > constants::MAX_FILE_NAME_LEN {
            return Err(Error::OversizedField {
                len: name.len(),
                limit: constants::MAX_FILE_NAME_LEN,
            });
        }

        let consumed: u32 = (name.len() + 1).try_into()?;
        header.file_names_len = header
            .file_names_len
            .checked_sub(consumed)
            .ok_or(Error::CorruptHeader("file names exceed their declared length"))?;

        let mut path = BString::from(directory);
        if !path.is_empty() {
            path.push(b'\\');
        }
        path.extend_from_slice(name);
        Ok(path)
    }

    fn read_embedded_name(bytes: &[u8], offset: u32) -> Result<BString> {
        let mut source = Source::new(bytes);
        source.seek_absolute((offset & !constants::FILE_FLAG_SECONDARY_ARCHIVE) as usize)?;
        let name = source.read_protocol::<protocols::BString>(Endian::Little)?;
        Ok(name.into())
    }

    fn read_header(source: &mut Source<'_>) -> Result<Header> {
        let (
            magic,
            version,
            folders_offset,
            archive_flags,
            folder_count,
            _file_count,
            folder_names_len,
            file_names_len,
            file_flags,
        ): (u32, u32, u32, u32, u32, u32, u32, u32, u32) = source.read(Endian::Little)?;

        if magic != constants::BSA {
            return Err(Error::InvalidMagic(magic));
        }

        let version = match version {
            103 => Version::v103,
            104 => Version::v104,
            105 => Version::v105,
            _ => return Err(Error::InvalidVersion(version)),
        };

        if folders_offset < constants::HEADER_SIZE {
            return Err(Error::CorruptHeader("folder records overlap the header"));
        }

        // there probably exist "valid" archives which set extra bits, so it's not worth validating...
        let mut archive_flags = Flags::from_bits_truncate(archive_flags);
        if version == Version::v103 {
            archive_flags.remove(Flags::EMBEDDED_FILE_NAMES);
        }

        Ok(Header {
            version,
            folders_offset,
            archive_flags,
            folder_count,
            folder_names_len,
            file_names_len,
            file_flags,
        })
    }
}
