use crate::{cc, fo4};
use std::io::Read;

/// The archive families this crate can read.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FileFormat {
    /// Morrowind's uncompressed archives. See [`tes3`](crate::tes3).
    TES3,
    /// Oblivion through Skyrim: SSE. See [`tes4`](crate::tes4).
    TES4,
    /// Fallout 4 and later, with the flavor named in the header. See [`fo4`](crate::fo4).
    FO4(fo4::Format),
}

const TES3: u32 = 0x100;
const BSA: u32 = cc::make_four(b"BSA");
const BTDX: u32 = cc::make_four(b"BTDX");
const GNRL: u32 = cc::make_four(b"GNRL");
const DX10: u32 = cc::make_four(b"DX10");

/// Sniffs the first 12 bytes of `source` to decide which family of archive it holds.
///
/// Returns [`None`] when the source is too short or its signature is not recognized. The source is left positioned after whatever was read.
#[allow(clippy::module_name_repetitions)]
pub fn guess_format<In>(source: &mut In) -> Option<FileFormat>
where
    In: ?Sized + Read,
{
    let mut buf = [0u8; 12];
    source.read_exact(&mut buf).ok()?;
    let word = |i: usize| u32::from_le_bytes([buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]);

    match (word(0), word(8)) {
        (TES3, _) => Some(FileFormat::TES3),
        (BSA, _) => Some(FileFormat::TES4),
        (BTDX, GNRL) => Some(FileFormat::FO4(fo4::Format::GNRL)),
        (BTDX, DX10) => Some(FileFormat::FO4(fo4::Format::DX10)),
        _ => None,
    }
}
