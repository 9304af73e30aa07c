/// Packs up to four ASCII bytes into the little-endian integer they form on disk.
///
/// Shorter codes are padded with zeroes, which is how `"BSA\0"` is spelled.
#[must_use]
pub(crate) const fn make_four(cc: &[u8]) -> u32 {
    let buffer = match cc.len() {
        0 => [0, 0, 0, 0],
        1 => [cc[0], 0, 0, 0],
        2 => [cc[0], cc[1], 0, 0],
        3 => [cc[0], cc[1], cc[2], 0],
        _ => [cc[0], cc[1], cc[2], cc[3]],
    };
    u32::from_le_bytes(buffer)
}
