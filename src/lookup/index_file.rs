use super::{
    check_dimensions, check_range, AddressError, AddressStrategy, LogicalIndex, LookupError,
    Reversible, Sealed,
};
use crate::{
    constants::major,
    index::{CacheFileRef, FileId, IndexEntry},
    source::CacheFileSource,
};
use async_trait::async_trait;
use std::sync::Arc;

/// The reference tables themselves, logical id `[major they describe]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexFileIndex;

impl Sealed for IndexFileIndex {}
impl Reversible for IndexFileIndex {}

#[async_trait]
impl AddressStrategy for IndexFileIndex {
    fn major(&self) -> Option<u32> {
        Some(major::INDEX)
    }

    fn logical_dimensions(&self) -> usize {
        1
    }

    fn multi_index_archives(&self) -> bool {
        false
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        Ok(vec![file.minor])
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        check_dimensions(id, 1)?;
        Ok(FileId::new(major::INDEX, id[0], 0))
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        check_range(start, end, 1)?;
        let index = source.get_cache_index(major::INDEX).await?;
        Ok(index
            .range(start[0], end[0])
            .map(|entry| CacheFileRef::new(Arc::clone(entry), 0))
            .collect())
    }
}

/// The master index at (255, 255). It is not listed in any index, so the
/// single entry is synthesized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RootIndexFileIndex;

impl RootIndexFileIndex {
    const FILE: FileId = FileId::new(major::INDEX, major::INDEX, 0);
}

impl Sealed for RootIndexFileIndex {}
impl Reversible for RootIndexFileIndex {}

#[async_trait]
impl AddressStrategy for RootIndexFileIndex {
    fn major(&self) -> Option<u32> {
        Some(major::INDEX)
    }

    fn logical_dimensions(&self) -> usize {
        0
    }

    fn multi_index_archives(&self) -> bool {
        false
    }

    fn file_to_logical(&self, _file: FileId) -> Result<LogicalIndex, AddressError> {
        Ok(Vec::new())
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        check_dimensions(id, 0)?;
        Ok(Self::FILE)
    }

    async fn logical_range_to_files(
        &self,
        _source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        check_range(start, end, 0)?;
        let entry = IndexEntry {
            major: Self::FILE.major,
            minor: Self::FILE.minor,
            crc: 0,
            version: 0,
            size: 0,
            name: None,
            subindices: vec![Self::FILE.subid],
        };
        Ok(vec![CacheFileRef::new(Arc::new(entry), 0)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[tokio::test]
    async fn test_index_files_by_minor() {
        let source = MemorySource::new()
            .with_archive(major::INDEX, 2, [(0, vec![])])
            .with_archive(major::INDEX, 19, [(0, vec![])])
            .with_archive(major::INDEX, 40, [(0, vec![])]);

        let files = IndexFileIndex
            .logical_range_to_files(&source, &[0], &[20])
            .await
            .unwrap();
        let minors: Vec<u32> = files.iter().map(|f| f.index.minor).collect();

        assert_eq!(vec![2, 19], minors);
    }

    #[tokio::test]
    async fn test_root_is_synthesized() {
        let files = RootIndexFileIndex
            .logical_range_to_files(&MemorySource::new(), &[], &[])
            .await
            .unwrap();

        assert_eq!(1, files.len());
        assert_eq!(Some(FileId::new(255, 255, 0)), files[0].file_id());
        assert_eq!(
            FileId::new(255, 255, 0),
            RootIndexFileIndex.logical_to_file(&[]).unwrap()
        );
    }
}
