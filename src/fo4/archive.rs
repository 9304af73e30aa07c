use crate::{
    containers::{Backing, Bytes},
    derive,
    fo4::{dds, Chunk, CompressionFormat, DX10Header, File, FileHeader, Format, Hash, Version},
    io::{Endian, Source},
    protocols::WString,
    Error, FileStruct, Result,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

mod constants {
    use crate::cc;

    pub(crate) const MAGIC: u32 = cc::make_four(b"BTDX");

    pub(crate) const GNRL: u32 = cc::make_four(b"GNRL");
    pub(crate) const DX10: u32 = cc::make_four(b"DX10");

    pub(crate) const FILE_HEADER_SIZE_GNRL: u16 = 0x10;
    pub(crate) const FILE_HEADER_SIZE_DX10: u16 = 0x18;

    pub(crate) const CHUNK_SENTINEL: u32 = 0xBAAD_F00D;

    pub(crate) const COMPRESSION_LZ4: u32 = 3;
}

struct Header {
    version: Version,
    format: Format,
    file_count: u32,
    string_table_offset: u64,
    compression_format: CompressionFormat,
}

/// Info about the contents of the given archive.
#[derive(Clone, Copy, Debug, Default)]
pub struct Options {
    format: Format,
    version: Version,
    compression_format: CompressionFormat,
    strings: bool,
}

impl Options {
    #[must_use]
    pub fn compression_format(&self) -> CompressionFormat {
        self.compression_format
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Whether the archive carries a string table.
    #[must_use]
    pub fn strings(&self) -> bool {
        self.strings
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }
}

/// Represents the FO4 revision of the ba2 format.
pub struct Archive {
    files: Vec<FileStruct>,
    records: Vec<File>,
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

    /// The directory record behind the entry at `index`.
    #[must_use]
    pub fn file(&self, index: usize) -> Option<&File> {
        self.records.get(index)
    }

    /// Reads the data belonging to the entry at `index`.
    ///
    /// General files are their chunks concatenated. Textures are prefixed with a rebuilt DDS header.
    pub fn open(&self, index: usize) -> Result<Bytes> {
        let (file, record) = self
            .files
            .get(index)
            .zip(self.records.get(index))
            .ok_or(Error::OutOfRange {
                position: index,
                len: self.files.len(),
            })?;
        trace!(name = %file.name(), chunks = record.len(), "opening ba2 file");

        if let (FileHeader::GNRL, [chunk]) = (&record.header, record.as_slice()) {
            if !chunk.is_compressed() {
                return Ok(Bytes::from_mapped(
                    chunk.offset.try_into()?,
                    chunk.decompressed_len(),
                    Arc::clone(&self.backing),
                ));
            }
        }

        let mut out = Vec::new();
        if let FileHeader::DX10(header) = &record.header {
            dds::write_header(header, &mut out);
        }

        let bytes = self.backing.as_bytes();
        for chunk in record {
            let start: usize = chunk.offset.try_into()?;
            let data = &bytes[start..start + chunk.stored_len() as usize];
            chunk.decompress_into(data, self.options.compression_format, &mut out)?;
        }

        Ok(Bytes::from_owned(out))
    }

    fn do_read(backing: Arc<Backing>) -> Result<ReadResult> {
        let bytes = backing.as_bytes();
        let mut source = Source::new(bytes);
        let header = Self::read_header(&mut source)?;

        let mut records = Vec::new();
        for _ in 0..header.file_count {
            let record = Self::read_file(&mut source, &header)?;
            records.push(record);
        }

        let options = Options {
            format: header.format,
            version: header.version,
            compression_format: header.compression_format,
            strings: header.string_table_offset != 0,
        };

        let files = if options.strings {
            source.seek_absolute(header.string_table_offset.try_into()?)?;
            Self::read_names(&mut source, &records)?
        } else {
            warn!(
                records = records.len(),
                "ba2 archive has no string table, so none of its files can be addressed by name"
            );
            records.clear();
            Vec::new()
        };

        debug!(
            format = ?options.format,
            version = ?options.version,
            files = files.len(),
            "read ba2 archive directory"
        );
        Ok((
            Self {
                files,
                records,
                backing,
                options,
            },
            options,
        ))
    }

    fn read_names(source: &mut Source<'_>, records: &[File]) -> Result<Vec<FileStruct>> {
        let mut buffer = Vec::new();
        let mut ranges = Vec::with_capacity(records.len());
        for _ in records {
            let name = source.read_protocol::<WString>(Endian::Little)?;
            let name_offset: u32 = buffer.len().try_into()?;
            let name_size: u32 = name.len().try_into()?;
            buffer.extend_from_slice(name);
            buffer.push(b'\0');
            ranges.push((name_offset, name_size));
        }

        let names: Arc<[u8]> = buffer.into();
        records
            .iter()
            .zip(ranges)
            .map(|(record, (name_offset, name_size))| -> Result<FileStruct> {
                let offset = record.chunks.first().map_or(0, Chunk::offset);
                Ok(FileStruct::new(
                    record.decompressed_len().try_into()?,
                    offset,
                    crate::Hash::new(),
                    name_offset,
                    name_size,
                    Arc::clone(&names),
                ))
            })
            .collect()
    }

    fn read_chunk(source: &mut Source<'_>, header: &Header) -> Result<Chunk> {
        let (offset, compressed_size, decompressed_size): (u64, u32, u32) =
            source.read(Endian::Little)?;
        let mips = match header.format {
            Format::GNRL => None,
            Format::DX10 => {
                let (mip_first, mip_last) = source.read(Endian::Little)?;
                Some(mip_first..=mip_last)
            }
        };

        let sentinel = source.read(Endian::Little)?;
        if sentinel != constants::CHUNK_SENTINEL {
            return Err(Error::InvalidChunkSentinel(sentinel));
        }

        let chunk = Chunk {
            offset,
            compressed_size,
            decompressed_size,
            mips,
        };
        let size = u64::from(chunk.stored_len());
        let len = source.len() as u64;
        if offset.checked_add(size).map_or(true, |end| end > len) {
            return Err(Error::OffsetOutOfBounds { offset, size, len });
        }

        Ok(chunk)
    }

    fn read_file(source: &mut Source<'_>, header: &Header) -> Result<File> {
        let hash = Self::read_hash(source)?;
        let (_, chunk_count, chunk_size): (u8, u8, u16) = source.read(Endian::Little)?;
        if !matches!(
            (header.format, chunk_size),
            (Format::GNRL, constants::FILE_HEADER_SIZE_GNRL)
                | (Format::DX10, constants::FILE_HEADER_SIZE_DX10)
        ) {
            return Err(Error::InvalidChunkSize(chunk_size));
        }

        let file_header = match header.format {
            Format::GNRL => FileHeader::GNRL,
            Format::DX10 => {
                let (height, width, mip_count, format, flags, tile_mode) =
                    source.read(Endian::Little)?;
                DX10Header {
                    height,
                    width,
                    mip_count,
                    format,
                    flags,
                    tile_mode,
                }
                .into()
            }
        };

        let mut chunks = Vec::with_capacity(chunk_count.into());
        for _ in 0..chunk_count {
            let chunk = Self::read_chunk(source, header)?;
            chunks.push(chunk);
        }

        Ok(File {
            hash,
            header: file_header,
            chunks,
        })
    }

    fn read_hash(source: &mut Source<'_>) -> Result<Hash> {
        let (file, extension, directory) = source.read(Endian::Little)?;
        Ok(Hash {
            file,
            extension,
            directory,
        })
    }

    fn read_header(source: &mut Source<'_>) -> Result<Header> {
        let (magic, version, contents_format, file_count, string_table_offset): (
            u32,
            u32,
            u32,
            u32,
            u64,
        ) = source.read(Endian::Little)?;

        if magic != constants::MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let version = match version {
            1 => Version::v1,
            2 => Version::v2,
            3 => Version::v3,
            7 => Version::v7,
            8 => Version::v8,
            _ => return Err(Error::InvalidVersion(version)),
        };

        let format = match contents_format {
            constants::GNRL => Format::GNRL,
            constants::DX10 => Format::DX10,
            _ => return Err(Error::InvalidFormat(contents_format)),
        };

        if matches!(version, Version::v2 | Version::v3) {
            source.read::<u64>(Endian::Little)?;
        }

        let compression_format = if version == Version::v3 {
            let format: u32 = source.read(Endian::Little)?;
            if format == constants::COMPRESSION_LZ4 {
                CompressionFormat::LZ4
            } else {
                CompressionFormat::Zip
            }
        } else {
            CompressionFormat::Zip
        };

        Ok(Header {
            version,
            format,
            file_count,
            string_table_offset,
            compression_format,
        })
    }
}
