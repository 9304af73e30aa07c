use crate::{
    containers::{Backing, Bytes},
    derive,
    io::{Endian, Source},
    protocols::ZString,
    Error, FileStruct, Hash, Result,
};
use std::sync::Arc;
use tracing::debug;

mod constants {
    pub const FILE_ENTRY_SIZE: u64 = 0x8;
    pub const HASH_SIZE: u64 = 0x8;
    pub const HEADER_MAGIC: u32 = 0x100;
    pub const HEADER_SIZE: u64 = 0xC;
    pub const NAME_OFFSET_SIZE: u64 = 0x4;

    /// The fewest bytes a single file can occupy between its record, name offset, name, and hash.
    pub const MINIMUM_FILE_FOOTPRINT: u64 = 21;
}

struct Offsets {
    name_offsets: usize,
    names: usize,
    hashes: usize,
    file_data: u64,
}

struct Header {
    directory_size: u32,
    file_count: u32,
}

impl Header {
    fn validate(&self, len: usize) -> Result<()> {
        let body = len as u64 - constants::HEADER_SIZE;
        let file_count = u64::from(self.file_count);
        let directory_size = u64::from(self.directory_size);
        if file_count * constants::MINIMUM_FILE_FOOTPRINT > body
            || directory_size + constants::HASH_SIZE * file_count > body
        {
            return Err(Error::CorruptHeader(
                "directory information is larger than the entire archive",
            ));
        }

        if directory_size < (constants::FILE_ENTRY_SIZE + constants::NAME_OFFSET_SIZE) * file_count
        {
            return Err(Error::CorruptHeader(
                "directory is too small to hold its own tables",
            ));
        }

        Ok(())
    }

    /// Must only be called once the header has been validated against the archive length.
    #[must_use]
    fn compute_offsets(&self) -> Offsets {
        let file_count = u64::from(self.file_count);
        let name_offsets = constants::HEADER_SIZE + constants::FILE_ENTRY_SIZE * file_count;
        let names = name_offsets + constants::NAME_OFFSET_SIZE * file_count;
        let hashes = constants::HEADER_SIZE + u64::from(self.directory_size);
        let file_data = hashes + constants::HASH_SIZE * file_count;
        #[allow(clippy::cast_possible_truncation)]
        Offsets {
            name_offsets: name_offsets as usize,
            names: names as usize,
            hashes: hashes as usize,
            file_data,
        }
    }
}

/// A Morrowind archive whose directory has been read and validated.
pub struct Archive {
    files: Vec<FileStruct>,
    backing: Arc<Backing>,
}

derive::reader!(Archive => Archive);
derive::entries!(Archive);

impl Archive {
    /// Finds the last entry carrying the given hash.
    #[must_use]
    pub fn find(&self, hash: Hash) -> Option<usize> {
        self.files.iter().rposition(|x| x.hash == hash)
    }

    /// Reads the data belonging to the entry at `index`.
    ///
    /// Morrowind archives are never compressed, so the result is a view into the archive itself.
    pub fn open(&self, index: usize) -> Result<Bytes> {
        let file = self.files.get(index).ok_or(Error::OutOfRange {
            position: index,
            len: self.files.len(),
        })?;
        let pos: usize = file.offset.try_into()?;
        let len = file.file_size as usize;
        Ok(Bytes::from_mapped(pos, len, Arc::clone(&self.backing)))
    }

    fn do_read(backing: Arc<Backing>) -> Result<Self> {
        let bytes = backing.as_bytes();
        let mut source = Source::new(bytes);
        let header = Self::read_header(&mut source)?;
        header.validate(source.len())?;

        let offsets = header.compute_offsets();
        let names: Arc<[u8]> = Arc::from(&bytes[offsets.names..offsets.hashes]);
        let mut files = Vec::with_capacity(header.file_count as usize);
        for i in 0..header.file_count as usize {
            let file = Self::read_file(&mut source, i, &offsets, &names)?;
            files.push(file);
        }

        debug!(files = files.len(), "read tes3 archive directory");
        Ok(Self { files, backing })
    }

    fn read_file(
        source: &mut Source<'_>,
        idx: usize,
        offsets: &Offsets,
        names: &Arc<[u8]>,
    ) -> Result<FileStruct> {
        let hash = source.save_restore_position(|source| -> Result<Hash> {
            source.seek_absolute(offsets.hashes + constants::HASH_SIZE as usize * idx)?;
            let (low, high) = source.read(Endian::Little)?;
            Ok(Hash { low, high })
        })?;

        let (name_offset, name_size) = source.save_restore_position(|source| -> Result<_> {
            source.seek_absolute(offsets.name_offsets + constants::NAME_OFFSET_SIZE as usize * idx)?;
            let name_offset: u32 = source.read(Endian::Little)?;
            let mut names = Source::new(names);
            names.seek_absolute(name_offset as usize)?;
            let name = names.read_protocol::<ZString>(Endian::Little)?;
            let name_size: u32 = name.len().try_into()?;
            Ok((name_offset, name_size))
        })?;

        let (size, offset): (u32, u32) = source.read(Endian::Little)?;
        let offset = offsets.file_data + u64::from(offset);
        let len = source.len() as u64;
        if offset + u64::from(size) > len {
            return Err(Error::OffsetOutOfBounds {
                offset,
                size: size.into(),
                len,
            });
        }

        Ok(FileStruct::new(
            size,
            offset,
            hash,
            name_offset,
            name_size,
            Arc::clone(names),
        ))
    }

    fn read_header(source: &mut Source<'_>) -> Result<Header> {
        let (magic, directory_size, file_count) = source.read(Endian::Little)?;
        match magic {
            constants::HEADER_MAGIC => Ok(Header {
                directory_size,
                file_count,
            }),
            _ => Err(Error::InvalidMagic(magic)),
        }
    }
}
