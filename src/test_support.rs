//! In-memory writers for the synthetic archives used throughout the unit tests.

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).expect("test data should fit in a u32")
}

pub(crate) mod compress {
    use flate2::{write::ZlibEncoder, Compression};
    use lzzzz::{lz4, lz4f};
    use std::io::Write as _;

    pub(crate) fn zlib(data: &[u8]) -> Vec<u8> {
        let mut e = ZlibEncoder::new(Vec::new(), Compression::default());
        e.write_all(data).expect("writing to a vec should not fail");
        e.finish().expect("zlib compression should not fail")
    }

    pub(crate) fn lz4_frame(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        lz4f::compress_to_vec(data, &mut out, &lz4f::Preferences::default())
            .expect("lz4 frame compression should not fail");
        out
    }

    pub(crate) fn lz4_block(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        lz4::compress_to_vec(data, &mut out, lz4::ACC_LEVEL_DEFAULT)
            .expect("lz4 block compression should not fail");
        out
    }
}

pub(crate) mod tes3 {
    use super::{len_u32, put_u32};
    use crate::tes3;

    /// Every table of a Morrowind archive, written verbatim.
    #[derive(Clone, Default)]
    pub(crate) struct Raw {
        /// Computed from the tables when left empty.
        pub(crate) directory_size: Option<u32>,
        /// `(size, offset)` pairs.
        pub(crate) records: Vec<(u32, u32)>,
        pub(crate) name_offsets: Vec<u32>,
        pub(crate) names: Vec<u8>,
        /// `(low, high)` pairs.
        pub(crate) hashes: Vec<(u32, u32)>,
        pub(crate) data: Vec<u8>,
    }

    impl Raw {
        pub(crate) fn to_bytes(&self) -> Vec<u8> {
            let count = len_u32(self.records.len());
            let directory_size = self
                .directory_size
                .unwrap_or_else(|| 12 * count + len_u32(self.names.len()));

            let mut out = Vec::new();
            put_u32(&mut out, 0x100);
            put_u32(&mut out, directory_size);
            put_u32(&mut out, count);
            for &(size, offset) in &self.records {
                put_u32(&mut out, size);
                put_u32(&mut out, offset);
            }
            for &offset in &self.name_offsets {
                put_u32(&mut out, offset);
            }
            out.extend_from_slice(&self.names);
            for &(low, high) in &self.hashes {
                put_u32(&mut out, low);
                put_u32(&mut out, high);
            }
            out.extend_from_slice(&self.data);
            out
        }
    }

    /// A well-formed archive holding the given files, in the given order.
    pub(crate) fn archive(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut raw = Raw::default();
        for (name, data) in files {
            let hash = tes3::hash_file(name);
            raw.records
                .push((len_u32(data.len()), len_u32(raw.data.len())));
            raw.name_offsets.push(len_u32(raw.names.len()));
            raw.names.extend_from_slice(name.as_bytes());
            raw.names.push(b'\0');
            raw.hashes.push((hash.low, hash.high));
            raw.data.extend_from_slice(data);
        }
        raw.to_bytes()
    }
}

pub(crate) mod tes4 {
    use super::{compress, len_u32, put_u32, put_u64};
    use crate::tes4::{ArchiveFlags, Version};

    pub(crate) struct FileRecord {
        pub(crate) hash: u64,
        pub(crate) size: u32,
        pub(crate) offset: u32,
        pub(crate) name: String,
    }

    impl FileRecord {
        pub(crate) fn new(hash: u64, size: u32, offset: u32, name: &str) -> Self {
            Self {
                hash,
                size,
                offset,
                name: name.to_owned(),
            }
        }
    }

    pub(crate) struct FolderRecord {
        pub(crate) hash: u64,
        pub(crate) name: String,
        pub(crate) files: Vec<FileRecord>,
    }

    impl FolderRecord {
        pub(crate) fn new(hash: u64, name: &str, files: Vec<FileRecord>) -> Self {
            Self {
                hash,
                name: name.to_owned(),
                files,
            }
        }
    }

    /// Header fields for a directory written record by record.
    pub(crate) struct Layout {
        pub(crate) version: u32,
        pub(crate) flags: ArchiveFlags,
        /// Computed from the folder names when left empty.
        pub(crate) folder_names_len: Option<u32>,
        /// Computed from the file names when left empty.
        pub(crate) file_names_len: Option<u32>,
    }

    impl Layout {
        pub(crate) fn new(version: Version) -> Self {
            Self {
                version: version as u32,
                flags: ArchiveFlags::default(),
                folder_names_len: None,
                file_names_len: None,
            }
        }

        fn folder_record_size(&self) -> usize {
            if self.version == Version::v105 as u32 {
                24
            } else {
                16
            }
        }

        /// The number of bytes [`write`](Self::write) produces.
        pub(crate) fn directory_len(&self, folders: &[FolderRecord]) -> usize {
            let mut len = 0x24 + folders.len() * self.folder_record_size();
            for folder in folders {
                if self.flags.directory_strings() {
                    len += folder.name.len() + 2;
                }
                len += folder.files.len() * 16;
                if self.flags.file_strings() {
                    len += folder.files.iter().map(|x| x.name.len() + 1).sum::<usize>();
                }
            }
            len
        }

        pub(crate) fn write(&self, folders: &[FolderRecord]) -> Vec<u8> {
            let file_count: usize = folders.iter().map(|x| x.files.len()).sum();
            let folder_names_len = self.folder_names_len.unwrap_or_else(|| {
                len_u32(folders.iter().map(|x| x.name.len() + 1).sum())
            });
            let file_names_len = self.file_names_len.unwrap_or_else(|| {
                len_u32(
                    folders
                        .iter()
                        .flat_map(|x| &x.files)
                        .map(|x| x.name.len() + 1)
                        .sum(),
                )
            });

            let mut out = Vec::new();
            out.extend_from_slice(b"BSA\0");
            put_u32(&mut out, self.version);
            put_u32(&mut out, 0x24);
            put_u32(&mut out, self.flags.bits());
            put_u32(&mut out, len_u32(folders.len()));
            put_u32(&mut out, len_u32(file_count));
            put_u32(&mut out, folder_names_len);
            put_u32(&mut out, file_names_len);
            put_u32(&mut out, 0);

            for folder in folders {
                put_u64(&mut out, folder.hash);
                put_u32(&mut out, len_u32(folder.files.len()));
                if self.version == Version::v105 as u32 {
                    put_u32(&mut out, 0);
                    put_u64(&mut out, 0);
                } else {
                    put_u32(&mut out, 0);
                }
            }

            for folder in folders {
                if self.flags.directory_strings() {
                    out.push(u8::try_from(folder.name.len() + 1).expect("folder name is too long"));
                    out.extend_from_slice(folder.name.as_bytes());
                    out.push(b'\0');
                }
                for file in &folder.files {
                    put_u64(&mut out, file.hash);
                    put_u32(&mut out, file.size);
                    put_u32(&mut out, file.offset);
                }
            }

            if self.flags.file_strings() {
                for file in folders.iter().flat_map(|x| &x.files) {
                    out.extend_from_slice(file.name.as_bytes());
                    out.push(b'\0');
                }
            }

            out
        }
    }

    /// One folder of files to pack, each flagged when its compression differs from the archive default.
    pub(crate) struct Packed<'a> {
        pub(crate) folder: &'a str,
        pub(crate) contents: &'a [(&'a str, &'a [u8], bool)],
    }

    impl<'a> Packed<'a> {
        pub(crate) fn new(folder: &'a str, contents: &'a [(&'a str, &'a [u8], bool)]) -> Self {
            Self { folder, contents }
        }
    }

    /// A complete archive, directory and data, laid out the way the games write them.
    pub(crate) fn pack(version: Version, flags: ArchiveFlags, folders: &[Packed<'_>]) -> Vec<u8> {
        let embedded = flags.embedded_file_names() && version != Version::v103;
        let mut blocks = Vec::new();
        let mut records = Vec::new();
        for (i, folder) in folders.iter().enumerate() {
            let mut files = Vec::new();
            for (j, &(name, data, flipped)) in folder.contents.iter().enumerate() {
                let mut block = Vec::new();
                if embedded {
                    let path = format!("{}\\{}", folder.folder, name);
                    block.push(u8::try_from(path.len()).expect("path is too long"));
                    block.extend_from_slice(path.as_bytes());
                }

                if flags.compressed() == flipped {
                    block.extend_from_slice(data);
                } else {
                    put_u32(&mut block, len_u32(data.len()));
                    let packed = match version {
                        Version::v103 | Version::v104 => compress::zlib(data),
                        Version::v105 => compress::lz4_frame(data),
                    };
                    block.extend_from_slice(&packed);
                }

                let mut size = len_u32(block.len());
                if flipped {
                    size |= 1 << 30;
                }
                files.push(FileRecord::new(j as u64 + 1, size, 0, name));
                blocks.push(block);
            }
            records.push(FolderRecord::new(i as u64 + 1, folder.folder, files));
        }

        let layout = Layout {
            flags,
            ..Layout::new(version)
        };
        let mut offset = layout.directory_len(&records);
        let mut block_iter = blocks.iter();
        for file in records.iter_mut().flat_map(|x| x.files.iter_mut()) {
            file.offset = len_u32(offset);
            offset += block_iter.next().map_or(0, Vec::len);
        }

        let mut out = layout.write(&records);
        for block in &blocks {
            out.extend_from_slice(block);
        }
        out
    }
}

pub(crate) mod fo4 {
    use super::{compress, len_u32, put_u16, put_u32, put_u64};
    use crate::fo4::DX10Header;

    pub(crate) struct Chunk<'a> {
        pub(crate) data: &'a [u8],
        pub(crate) compressed: bool,
        pub(crate) mips: (u16, u16),
    }

    impl<'a> Chunk<'a> {
        pub(crate) fn new(data: &'a [u8], compressed: bool) -> Self {
            Self {
                data,
                compressed,
                mips: (0, 0),
            }
        }
    }

    pub(crate) struct Entry<'a> {
        pub(crate) name: &'a str,
        /// Written in place of the record's position when set.
        pub(crate) file_hash: Option<u32>,
        pub(crate) texture: Option<DX10Header>,
        pub(crate) chunks: Vec<Chunk<'a>>,
    }

    impl<'a> Entry<'a> {
        pub(crate) fn general(name: &'a str, chunks: Vec<Chunk<'a>>) -> Self {
            Self {
                name,
                file_hash: None,
                texture: None,
                chunks,
            }
        }

        pub(crate) fn texture(name: &'a str, header: DX10Header, chunks: Vec<Chunk<'a>>) -> Self {
            Self {
                name,
                file_hash: None,
                texture: Some(header),
                chunks,
            }
        }

        pub(crate) fn with_file_hash(mut self, hash: u32) -> Self {
            self.file_hash = Some(hash);
            self
        }
    }

    /// Header fields for a BA2 archive, left overridable so tests can corrupt them.
    pub(crate) struct Layout {
        pub(crate) magic: [u8; 4],
        pub(crate) version: u32,
        pub(crate) format: [u8; 4],
        /// Only written for version 3.
        pub(crate) compression: u32,
        pub(crate) strings: bool,
        pub(crate) chunk_header_size: Option<u16>,
        pub(crate) sentinel: u32,
    }

    impl Layout {
        pub(crate) fn general() -> Self {
            Self {
                magic: *b"BTDX",
                version: 1,
                format: *b"GNRL",
                compression: 0,
                strings: true,
                chunk_header_size: None,
                sentinel: 0xBAAD_F00D,
            }
        }

        pub(crate) fn texture() -> Self {
            Self {
                format: *b"DX10",
                ..Self::general()
            }
        }

        fn is_texture(&self) -> bool {
            &self.format == b"DX10"
        }

        fn header_len(&self) -> usize {
            match self.version {
                2 => 0x20,
                3 => 0x24,
                _ => 0x18,
            }
        }

        fn pack_chunk(&self, data: &[u8]) -> Vec<u8> {
            if self.version == 3 && self.compression == 3 {
                compress::lz4_block(data)
            } else {
                compress::zlib(data)
            }
        }

        pub(crate) fn write(&self, entries: &[Entry<'_>]) -> Vec<u8> {
            let (record_len, chunk_len) = if self.is_texture() {
                (0x18, 0x18)
            } else {
                (0x10, 0x14)
            };
            let directory_len: usize = self.header_len()
                + entries
                    .iter()
                    .map(|x| record_len + x.chunks.len() * chunk_len)
                    .sum::<usize>();

            let stored: Vec<Vec<Vec<u8>>> = entries
                .iter()
                .map(|entry| {
                    entry
                        .chunks
                        .iter()
                        .map(|chunk| {
                            if chunk.compressed {
                                self.pack_chunk(chunk.data)
                            } else {
                                chunk.data.to_vec()
                            }
                        })
                        .collect()
                })
                .collect();
            let data_len: usize = stored.iter().flatten().map(Vec::len).sum();
            let string_table = if self.strings {
                (directory_len + data_len) as u64
            } else {
                0
            };

            let mut out = Vec::new();
            out.extend_from_slice(&self.magic);
            put_u32(&mut out, self.version);
            out.extend_from_slice(&self.format);
            put_u32(&mut out, len_u32(entries.len()));
            put_u64(&mut out, string_table);
            if self.version == 2 || self.version == 3 {
                put_u64(&mut out, 1);
            }
            if self.version == 3 {
                put_u32(&mut out, self.compression);
            }

            let mut offset = directory_len as u64;
            for (i, (entry, chunks)) in entries.iter().zip(&stored).enumerate() {
                put_u32(&mut out, entry.file_hash.unwrap_or_else(|| len_u32(i)));
                out.extend_from_slice(b"dds\0");
                put_u32(&mut out, 0);
                out.push(0);
                out.push(u8::try_from(chunks.len()).expect("too many chunks"));
                put_u16(
                    &mut out,
                    self.chunk_header_size
                        .unwrap_or(if self.is_texture() { 0x18 } else { 0x10 }),
                );
                if let Some(header) = &entry.texture {
                    put_u16(&mut out, header.height);
                    put_u16(&mut out, header.width);
                    out.push(header.mip_count);
                    out.push(header.format);
                    out.push(header.flags);
                    out.push(header.tile_mode);
                }

                for (chunk, bytes) in entry.chunks.iter().zip(chunks) {
                    put_u64(&mut out, offset);
                    let (compressed_size, decompressed_size) = if chunk.compressed {
                        (len_u32(bytes.len()), len_u32(chunk.data.len()))
                    } else {
                        (0, len_u32(bytes.len()))
                    };
                    put_u32(&mut out, compressed_size);
                    put_u32(&mut out, decompressed_size);
                    if self.is_texture() {
                        put_u16(&mut out, chunk.mips.0);
                        put_u16(&mut out, chunk.mips.1);
                    }
                    put_u32(&mut out, self.sentinel);
                    offset += bytes.len() as u64;
                }
            }

            for bytes in stored.iter().flatten() {
                out.extend_from_slice(bytes);
            }

            if self.strings {
                for entry in entries {
                    put_u16(
                        &mut out,
                        u16::try_from(entry.name.len()).expect("name is too long"),
                    );
                    out.extend_from_slice(entry.name.as_bytes());
                }
            }

            out
        }
    }
}
