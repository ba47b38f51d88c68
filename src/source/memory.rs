use super::{CacheFileSource, SourceError};
use crate::index::{CacheIndexFile, IndexEntry, SubFile};
use async_trait::async_trait;
use crc32fast::Hasher;
use std::{collections::HashMap, sync::Arc};

/// A cache held entirely in memory, assembled archive by archive.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    indices: HashMap<u32, Arc<CacheIndexFile>>,
    archives: HashMap<(u32, u32), Vec<SubFile>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds archive `minor` of `major`. Subfiles keep the given order, which
    /// becomes the storage order of the index entry.
    pub fn with_archive<I>(self, major: u32, minor: u32, files: I) -> Self
    where
        I: IntoIterator<Item = (u32, Vec<u8>)>,
    {
        self.insert(major, minor, None, files)
    }

    pub fn with_named_archive<I>(self, major: u32, minor: u32, name_hash: u32, files: I) -> Self
    where
        I: IntoIterator<Item = (u32, Vec<u8>)>,
    {
        self.insert(major, minor, Some(name_hash), files)
    }

    fn insert<I>(mut self, major: u32, minor: u32, name: Option<u32>, files: I) -> Self
    where
        I: IntoIterator<Item = (u32, Vec<u8>)>,
    {
        let files: Vec<SubFile> = files
            .into_iter()
            .map(|(fileid, buffer)| SubFile { fileid, buffer })
            .collect();

        let mut hasher = Hasher::new();
        for file in &files {
            hasher.update(&file.buffer);
        }

        let entry = IndexEntry {
            major,
            minor,
            crc: hasher.finalize(),
            version: 0,
            size: files.iter().map(|file| file.buffer.len() as u32).sum(),
            name,
            subindices: files.iter().map(|file| file.fileid).collect(),
        };

        let index = self
            .indices
            .entry(major)
            .or_insert_with(|| Arc::new(CacheIndexFile::new(major)));
        Arc::make_mut(index).insert(entry);
        self.archives.insert((major, minor), files);
        self
    }
}

#[async_trait]
impl CacheFileSource for MemorySource {
    async fn get_cache_index(&self, major: u32) -> Result<Arc<CacheIndexFile>, SourceError> {
        // a major without archives is an empty index, not an error
        Ok(self
            .indices
            .get(&major)
            .cloned()
            .unwrap_or_else(|| Arc::new(CacheIndexFile::new(major))))
    }

    async fn get_file_archive(&self, index: &IndexEntry) -> Result<Vec<SubFile>, SourceError> {
        self.archives
            .get(&(index.major, index.minor))
            .cloned()
            .ok_or(SourceError::NotFound {
                major: index.major,
                minor: index.minor,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_index_keeps_storage_order() {
        let source = MemorySource::new()
            .with_archive(19, 1, [(5, vec![5]), (0, vec![0]), (2, vec![2, 2])])
            .with_named_archive(19, 4, 77, [(0, vec![])]);

        let index = source.get_cache_index(19).await.unwrap();
        assert_eq!(2, index.len());

        let entry = index.get(1).unwrap();
        assert_eq!(vec![5, 0, 2], entry.subindices);
        assert_eq!(4, entry.size);
        assert_eq!(Some(4), index.get_named(77).map(|e| e.minor));
    }

    #[tokio::test]
    async fn test_get_file() {
        let source = MemorySource::new().with_archive(2, 6, [(0, b"a".to_vec()), (3, b"b".to_vec())]);

        assert_eq!(b"b".to_vec(), source.get_file(2, 6, 3).await.unwrap());
        assert!(matches!(
            source.get_file(2, 6, 1).await,
            Err(SourceError::MissingSubfile(_))
        ));
        assert!(matches!(
            source.get_archive_by_id(2, 7).await,
            Err(SourceError::NotFound { major: 2, minor: 7 })
        ));
        assert!(source.get_cache_index(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_file_by_id_unpacks() {
        // items hold 256 records per archive
        let source = MemorySource::new().with_archive(19, 4, [(18, b"item".to_vec())]);

        assert_eq!(b"item".to_vec(), source.get_file_by_id(19, 1042).await.unwrap());
    }
}
