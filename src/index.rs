use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

/// Physical coordinate of one subfile: archive `minor` of `major`, subfile id `subid`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId {
    pub major: u32,
    pub minor: u32,
    pub subid: u32,
}

impl FileId {
    pub const fn new(major: u32, minor: u32, subid: u32) -> Self {
        Self {
            major,
            minor,
            subid,
        }
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.subid)
    }
}

/// Reference table metadata for one archive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub major: u32,
    pub minor: u32,
    pub crc: u32,
    pub version: u32,
    pub size: u32,
    /// djb2 name hash, only present when the reference table is named.
    pub name: Option<u32>,
    /// Subfile ids in storage order.
    pub subindices: Vec<u32>,
}

impl IndexEntry {
    pub fn subindex_count(&self) -> usize {
        self.subindices.len()
    }

    pub fn file_id(&self, subindex: usize) -> Option<FileId> {
        self.subindices
            .get(subindex)
            .map(|subid| FileId::new(self.major, self.minor, *subid))
    }
}

/// The sparse index of one major. Absent minors are holes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheIndexFile {
    major: u32,
    entries: BTreeMap<u32, Arc<IndexEntry>>,
    name_hash_table: HashMap<u32, u32>,
}

impl CacheIndexFile {
    pub fn new(major: u32) -> Self {
        Self {
            major,
            entries: BTreeMap::new(),
            name_hash_table: HashMap::new(),
        }
    }

    pub fn from_entries<I: IntoIterator<Item = IndexEntry>>(major: u32, entries: I) -> Self {
        let mut index = Self::new(major);
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    /// Adds or replaces the entry at `entry.minor`. A name shared by several
    /// entries resolves to the lowest minor.
    pub fn insert(&mut self, entry: IndexEntry) {
        let minor = entry.minor;
        let name = entry.name;
        let replaced = self.entries.insert(minor, Arc::new(entry));

        if let Some(old) = replaced.and_then(|old| old.name) {
            if self.name_hash_table.get(&old) == Some(&minor) {
                self.name_hash_table.remove(&old);
                if let Some(other) = self.entries.values().find(|e| e.name == Some(old)) {
                    self.name_hash_table.insert(old, other.minor);
                }
            }
        }
        if let Some(name) = name {
            let mapped = self.name_hash_table.entry(name).or_insert(minor);
            *mapped = (*mapped).min(minor);
        }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, minor: u32) -> Option<&Arc<IndexEntry>> {
        self.entries.get(&minor)
    }

    pub fn get_named(&self, name_hash: u32) -> Option<&Arc<IndexEntry>> {
        self.name_hash_table
            .get(&name_hash)
            .and_then(|minor| self.entries.get(minor))
    }

    /// Present entries in ascending minor order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<IndexEntry>> {
        self.entries.values()
    }

    /// Present entries with `start <= minor <= end`.
    pub fn range(&self, start: u32, end: u32) -> impl Iterator<Item = &Arc<IndexEntry>> {
        // BTreeMap::range panics on an inverted range
        (start <= end)
            .then(|| self.entries.range(start..=end))
            .into_iter()
            .flatten()
            .map(|(_, entry)| entry)
    }
}

/// A resolved physical location: an index entry and the position of the
/// wanted subfile in its `subindices`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheFileRef {
    pub index: Arc<IndexEntry>,
    pub subindex: usize,
}

impl CacheFileRef {
    pub fn new(index: Arc<IndexEntry>, subindex: usize) -> Self {
        Self { index, subindex }
    }

    /// The stored subfile id at `subindex`.
    pub fn subid(&self) -> Option<u32> {
        self.index.subindices.get(self.subindex).copied()
    }

    pub fn file_id(&self) -> Option<FileId> {
        self.index.file_id(self.subindex)
    }
}

/// One decoded subfile of an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubFile {
    pub fileid: u32,
    pub buffer: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(minor: u32, subindices: Vec<u32>, name: Option<u32>) -> IndexEntry {
        IndexEntry {
            major: 2,
            minor,
            crc: 0,
            version: 0,
            size: 0,
            name,
            subindices,
        }
    }

    #[test]
    fn test_range_skips_holes() {
        let index = CacheIndexFile::from_entries(
            2,
            vec![entry(1, vec![0], None), entry(4, vec![0], None), entry(9, vec![0], None)],
        );

        let minors: Vec<u32> = index.range(2, 9).map(|e| e.minor).collect();
        assert_eq!(vec![4, 9], minors);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let index = CacheIndexFile::from_entries(2, vec![entry(1, vec![0], None)]);
        assert_eq!(0, index.range(5, 1).count());
    }

    #[test]
    fn test_get_named() {
        let index = CacheIndexFile::from_entries(
            2,
            vec![entry(3, vec![0], Some(77)), entry(4, vec![0], None)],
        );

        assert_eq!(3, index.get_named(77).unwrap().minor);
        assert!(index.get_named(78).is_none());
    }

    #[test]
    fn test_file_ref_subid() {
        let file = CacheFileRef::new(Arc::new(entry(1, vec![0, 2, 5], None)), 2);
        assert_eq!(Some(5), file.subid());
        assert_eq!(Some(FileId::new(2, 1, 5)), file.file_id());
    }

    #[test]
    fn test_shared_name_resolves_to_lowest_minor() {
        let mut index = CacheIndexFile::from_entries(
            2,
            vec![entry(6, vec![0], Some(77)), entry(3, vec![0], Some(77))],
        );
        assert_eq!(3, index.get_named(77).unwrap().minor);

        // renaming minor 3 falls back to minor 6
        index.insert(entry(3, vec![0], Some(78)));
        assert_eq!(6, index.get_named(77).unwrap().minor);
        assert_eq!(3, index.get_named(78).unwrap().minor);

        index.insert(entry(6, vec![0], None));
        assert!(index.get_named(77).is_none());
    }
}
