use crate::{path, Hash};
use bstr::BString;

/// Produces the identity hash Morrowind stores alongside each file name.
///
/// The path is lower-cased and its separators are converted to backslashes before hashing, so `Meshes/Foo.nif` and `meshes\foo.nif` agree.
#[must_use]
pub fn hash_file<P>(path: &P) -> Hash
where
    P: ?Sized + AsRef<[u8]>,
{
    let mut path: BString = path
        .as_ref()
        .iter()
        .map(|&b| path::map_archive_byte(b))
        .collect::<Vec<_>>()
        .into();
    while path.last().is_some_and(|&x| x == b'\\') {
        path.pop();
    }
    while path.first().is_some_and(|&x| x == b'\\') {
        path.remove(0);
    }

    let midpoint = path.len() / 2;
    let mut h = Hash::new();
    let mut i: usize = 0;

    // rotate between first 4 bytes
    while i < midpoint {
        h.low ^= u32::from(path[i]) << ((i % 4) * 8);
        i += 1;
    }

    // rotate between last 4 bytes
    while i < path.len() {
        let rot = u32::from(path[i]) << (((i - midpoint) % 4) * 8);
        h.high = u32::rotate_right(h.high ^ rot, rot);
        i += 1;
    }

    h
}
