use crate::{codec, fo4::CompressionFormat, Result};
use core::ops::RangeInclusive;

/// One contiguous run of a file's data, as described by the directory.
///
/// General files usually hold a single chunk. Texture files split their mip chain across several chunks, largest mips first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Chunk {
    pub(crate) offset: u64,
    pub(crate) compressed_size: u32,
    pub(crate) decompressed_size: u32,
    pub(crate) mips: Option<RangeInclusive<u16>>,
}

impl Chunk {
    /// The absolute offset of the chunk's data within the archive.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.compressed_size != 0
    }

    #[must_use]
    pub fn decompressed_len(&self) -> usize {
        self.decompressed_size as usize
    }

    /// The number of bytes the chunk occupies on disk.
    #[must_use]
    pub fn stored_len(&self) -> u32 {
        if self.is_compressed() {
            self.compressed_size
        } else {
            self.decompressed_size
        }
    }

    /// The mip levels held by the chunk, for textures only.
    #[must_use]
    pub fn mips(&self) -> Option<RangeInclusive<u16>> {
        self.mips.clone()
    }

    /// `bytes` must be exactly the stored data of this chunk.
    pub(crate) fn decompress_into(
        &self,
        bytes: &[u8],
        format: CompressionFormat,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        if self.is_compressed() {
            let decompressed = match format {
                CompressionFormat::Zip => codec::decompress_zlib(bytes, self.decompressed_len())?,
                CompressionFormat::LZ4 => {
                    codec::decompress_lz4_block(bytes, self.decompressed_len())?
                }
            };
            out.extend_from_slice(&decompressed);
        } else {
            out.extend_from_slice(bytes);
        }
        Ok(())
    }
}
