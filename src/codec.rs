use crate::{Error, Result};
use flate2::read::ZlibDecoder;
use lzzzz::{lz4, lz4f};
use std::io::Read;

/// Declared sizes come from untrusted archives, so they only ever seed the buffer's capacity up to this point.
const MAX_PREALLOCATION: usize = 1 << 24;

/// No lz4 block expands by more than this factor, plus a few bytes of slack.
const LZ4_MAX_RATIO: usize = 255;
const LZ4_SLACK: usize = 16;

fn check_len(out: Vec<u8>, expected: usize) -> Result<Vec<u8>> {
    if out.len() == expected {
        Ok(out)
    } else {
        Err(Error::DecompressionSizeMismatch {
            expected,
            actual: out.len(),
        })
    }
}

/// Stops one byte past `expected`, so an oversized stream reports `expected + 1` as its actual size.
fn read_bounded<R>(reader: R, expected: usize) -> Result<Vec<u8>>
where
    R: Read,
{
    let limit = u64::try_from(expected)?.saturating_add(1);
    let mut out = Vec::with_capacity(expected.min(MAX_PREALLOCATION));
    reader.take(limit).read_to_end(&mut out)?;
    check_len(out, expected)
}

pub(crate) fn decompress_zlib(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    read_bounded(ZlibDecoder::new(data), expected)
}

pub(crate) fn decompress_lz4_frame(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let reader = lz4f::ReadDecompressor::new(data)?;
    read_bounded(reader, expected)
}

pub(crate) fn decompress_lz4_block(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let limit = data
        .len()
        .saturating_mul(LZ4_MAX_RATIO)
        .saturating_add(LZ4_SLACK);
    if expected > limit {
        return Err(Error::OversizedField {
            len: expected,
            limit,
        });
    }

    let mut out = vec![0; expected];
    let len = lz4::decompress(data, &mut out)?;
    out.truncate(len);
    check_len(out, expected)
}

#[cfg(test)]
mod tests {
    use crate::{
        codec::{decompress_lz4_block, decompress_lz4_frame, decompress_zlib},
        test_support::compress,
        Error,
    };

    const TEXT: &[u8] = b"the quick brown fox jumps over the lazy dog, again and again and again";

    #[test]
    fn zlib() -> anyhow::Result<()> {
        let packed = compress::zlib(TEXT);
        assert_eq!(decompress_zlib(&packed, TEXT.len())?, TEXT);
        Ok(())
    }

    #[test]
    fn lz4_frame() -> anyhow::Result<()> {
        let packed = compress::lz4_frame(TEXT);
        assert_eq!(decompress_lz4_frame(&packed, TEXT.len())?, TEXT);
        Ok(())
    }

    #[test]
    fn lz4_block() -> anyhow::Result<()> {
        let packed = compress::lz4_block(TEXT);
        assert_eq!(decompress_lz4_block(&packed, TEXT.len())?, TEXT);
        Ok(())
    }

    #[test]
    fn size_mismatch() -> anyhow::Result<()> {
        let packed = compress::zlib(TEXT);
        match decompress_zlib(&packed, TEXT.len() + 1) {
            Err(Error::DecompressionSizeMismatch { expected, actual }) => {
                assert_eq!(expected, TEXT.len() + 1);
                assert_eq!(actual, TEXT.len());
                Ok(())
            }
            Err(err) => Err(err.into()),
            Ok(_) => anyhow::bail!("decompression should have failed"),
        }
    }

    #[test]
    fn oversized_streams_stop_early() -> anyhow::Result<()> {
        let zeroes = vec![0u8; 1 << 20];
        let results = [
            decompress_zlib(&compress::zlib(&zeroes), 4),
            decompress_lz4_frame(&compress::lz4_frame(&zeroes), 4),
        ];
        for result in results {
            match result {
                Err(Error::DecompressionSizeMismatch {
                    expected: 4,
                    actual: 5,
                }) => (),
                Err(err) => return Err(err.into()),
                Ok(_) => anyhow::bail!("decompression should have failed"),
            }
        }
        Ok(())
    }

    #[test]
    fn implausible_block_sizes() -> anyhow::Result<()> {
        let packed = compress::lz4_block(TEXT);
        match decompress_lz4_block(&packed, 1 << 30) {
            Err(Error::OversizedField { len, limit }) => {
                assert_eq!(len, 1 << 30);
                assert!(limit < len);
                Ok(())
            }
            Err(err) => Err(err.into()),
            Ok(_) => anyhow::bail!("decompression should have failed"),
        }
    }

    #[test]
    fn garbage_does_not_decompress() {
        assert!(decompress_zlib(b"not zlib at all", 16).is_err());
        assert!(decompress_lz4_frame(b"not lz4 at all", 16).is_err());
    }
}
