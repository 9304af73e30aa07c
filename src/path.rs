use bstr::{BStr, BString};

#[must_use]
const fn build_lookup_table(from: u8, to: u8) -> [u8; 256] {
    let mut table = [0u8; u8::MAX as usize + 1];
    let mut i: u8 = 0;
    loop {
        table[i as usize] = i;
        match i {
            u8::MAX => break,
            _ => i += 1,
        };
    }

    table[from as usize] = to;

    let offset = b'a' - b'A';
    let mut i = b'A';
    loop {
        table[i as usize] = i + offset;
        match i {
            b'Z' => break,
            _ => i += 1,
        };
    }

    table
}

/// Lookup table used for virtual file system keys.
const VFS_LUT: [u8; 256] = build_lookup_table(b'\\', b'/');

/// Lookup table used for names as they are hashed inside of archives.
const ARCHIVE_LUT: [u8; 256] = build_lookup_table(b'/', b'\\');

#[must_use]
fn map_byte(b: u8) -> u8 {
    VFS_LUT[b as usize]
}

#[must_use]
pub(crate) fn map_archive_byte(b: u8) -> u8 {
    ARCHIVE_LUT[b as usize]
}

/// Normalizes the given path in place, so that it can be used as a key into the virtual file system.
///
/// Backslashes are converted to forward slashes and ASCII letters are lower-cased. All other bytes are left untouched, regardless of locale.
pub fn normalize_in_place(path: &mut BString) {
    for b in path.iter_mut() {
        *b = map_byte(*b);
    }
}

/// Produces the normalized form of the given path.
///
/// ```rust
/// use bsa_vfs::normalize_filename;
///
/// assert_eq!(normalize_filename(b"Meshes\\Armor\\Iron.NIF"), "meshes/armor/iron.nif");
/// ```
#[must_use]
pub fn normalize_filename<P>(path: &P) -> BString
where
    P: ?Sized + AsRef<[u8]>,
{
    let mut path = BString::from(path.as_ref());
    normalize_in_place(&mut path);
    path
}

/// Compares two paths as if both were normalized, without allocating.
#[must_use]
pub(crate) fn paths_equal(lhs: &BStr, rhs: &BStr) -> bool {
    lhs.len() == rhs.len()
        && lhs
            .iter()
            .zip(rhs.iter())
            .all(|(&l, &r)| map_byte(l) == map_byte(r))
}

/// Matches a normalized path against a normalized wildcard pattern.
///
/// `*` matches any run of bytes, separators included, and `?` matches exactly one byte.
#[must_use]
pub(crate) fn wildcard_match(pattern: &[u8], path: &[u8]) -> bool {
    let (mut p, mut s) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while s < path.len() {
        match pattern.get(p) {
            Some(b'*') => {
                star = Some((p, s));
                p += 1;
            }
            Some(&c) if c == b'?' || c == path[s] => {
                p += 1;
                s += 1;
            }
            _ => match star {
                Some((star_p, star_s)) => {
                    // let the last star swallow one more byte
                    star = Some((star_p, star_s + 1));
                    p = star_p + 1;
                    s = star_s + 1;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

/// The part of a pattern before its first wildcard.
#[must_use]
pub(crate) fn literal_prefix(pattern: &[u8]) -> &[u8] {
    let end = pattern
        .iter()
        .position(|&c| c == b'*' || c == b'?')
        .unwrap_or(pattern.len());
    &pattern[..end]
}
