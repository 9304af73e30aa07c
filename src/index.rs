use crate::{path, FileStruct};
use bstr::{BStr, BString, ByteSlice as _};
use core::ops::Bound;
use std::collections::{btree_map, BTreeMap};

/// A sorted table keyed by normalized paths.
///
/// Every key is normalized on the way in, and every query is normalized before it is looked up, so lookups are case-insensitive and accept either separator. Inserting a path that is already present replaces the previous value.
#[derive(Clone, Debug)]
pub struct ArchiveIndex<V> {
    map: BTreeMap<BString, V>,
}

impl<V> Default for ArchiveIndex<V> {
    fn default() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }
}

impl<V> ArchiveIndex<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    #[must_use]
    pub fn contains<P>(&self, path: &P) -> bool
    where
        P: ?Sized + AsRef<[u8]>,
    {
        self.get(path).is_some()
    }

    #[must_use]
    pub fn get<P>(&self, path: &P) -> Option<&V>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        self.map.get(&path::normalize_filename(path))
    }

    /// Returns the value previously stored under the same normalized path, if any.
    pub fn insert<P>(&mut self, path: &P, value: V) -> Option<V>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        self.map.insert(path::normalize_filename(path), value)
    }

    /// Inserts under a key that is already normalized.
    pub(crate) fn insert_normalized(&mut self, path: BString, value: V) -> Option<V> {
        self.map.insert(path, value)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Every entry in normalized order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.map.iter(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Every entry whose normalized path starts with the normalized `prefix`, in normalized order.
    pub fn with_prefix<P>(&self, prefix: &P) -> Prefixed<'_, V>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        let prefix = path::normalize_filename(prefix);
        let inner = self
            .map
            .range::<BString, _>((Bound::Included(prefix.clone()), Bound::Unbounded));
        Prefixed { inner, prefix }
    }

    /// Every entry whose normalized path matches the normalized wildcard `pattern`, in normalized order.
    ///
    /// `*` matches any run of bytes, separators included, and `?` matches exactly one byte.
    pub fn matching<P>(&self, pattern: &P) -> Matching<'_, V>
    where
        P: ?Sized + AsRef<[u8]>,
    {
        let pattern = path::normalize_filename(pattern);
        let inner = self.with_prefix(path::literal_prefix(&pattern));
        Matching { inner, pattern }
    }
}

impl ArchiveIndex<usize> {
    /// Indexes the entries of one archive by name, mapping each normalized name to the position of its entry.
    ///
    /// Entries without a name can't be addressed, so they are skipped. When two entries normalize to the same name, the later entry wins.
    #[must_use]
    pub fn from_entries(files: &[FileStruct]) -> Self {
        let mut index = Self::new();
        for (i, file) in files.iter().enumerate() {
            if !file.name().is_empty() {
                index.insert(file.name(), i);
            }
        }
        index
    }
}

impl<'a, V> IntoIterator for &'a ArchiveIndex<V> {
    type Item = (&'a BStr, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// See [`ArchiveIndex::iter`].
pub struct Iter<'a, V> {
    inner: btree_map::Iter<'a, BString, V>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a BStr, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_bstr(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, V> ExactSizeIterator for Iter<'a, V> {}

/// See [`ArchiveIndex::with_prefix`].
pub struct Prefixed<'a, V> {
    inner: btree_map::Range<'a, BString, V>,
    prefix: BString,
}

impl<'a, V> Iterator for Prefixed<'a, V> {
    type Item = (&'a BStr, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .filter(|(k, _)| k.starts_with(self.prefix.as_bytes()))
            .map(|(k, v)| (k.as_bstr(), v))
    }
}

/// See [`ArchiveIndex::matching`].
pub struct Matching<'a, V> {
    inner: Prefixed<'a, V>,
    pattern: BString,
}

impl<'a, V> Iterator for Matching<'a, V> {
    type Item = (&'a BStr, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let pattern = self.pattern.as_bytes();
        self.inner
            .by_ref()
            .find(|(k, _)| path::wildcard_match(pattern, k.as_bytes()))
    }
}
