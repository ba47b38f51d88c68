use super::{
    check_dimensions, check_range, AddressError, AddressStrategy, LogicalIndex, LookupError,
    Reversible, Sealed,
};
use crate::{
    filerange::filerange,
    index::{CacheFileRef, FileId},
    packing::{ArchiveSizes, PackingScheme},
    source::CacheFileSource,
};
use async_trait::async_trait;

/// Logical id `[minor, subfile]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StandardIndex {
    major: u32,
}

impl StandardIndex {
    pub fn new(major: u32) -> Self {
        Self { major }
    }
}

impl Sealed for StandardIndex {}
impl Reversible for StandardIndex {}

#[async_trait]
impl AddressStrategy for StandardIndex {
    fn major(&self) -> Option<u32> {
        Some(self.major)
    }

    fn logical_dimensions(&self) -> usize {
        2
    }

    fn multi_index_archives(&self) -> bool {
        true
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        Ok(vec![file.minor, file.subid])
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        check_dimensions(id, 2)?;
        Ok(FileId::new(self.major, id[0], id[1]))
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        check_range(start, end, 2)?;
        filerange(
            source,
            FileId::new(self.major, start[0], start[1]),
            FileId::new(self.major, end[0], end[1]),
        )
        .await
    }
}

/// Logical id `[record]`, packed densely into archives by `P`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkedIndex<P = ArchiveSizes> {
    major: u32,
    packing: P,
}

impl ChunkedIndex {
    pub fn new(major: u32) -> Self {
        Self::with_packing(major, ArchiveSizes)
    }
}

impl<P: PackingScheme> ChunkedIndex<P> {
    pub fn with_packing(major: u32, packing: P) -> Self {
        Self { major, packing }
    }
}

impl<P: PackingScheme> Sealed for ChunkedIndex<P> {}
impl<P: PackingScheme> Reversible for ChunkedIndex<P> {}

#[async_trait]
impl<P: PackingScheme> AddressStrategy for ChunkedIndex<P> {
    fn major(&self) -> Option<u32> {
        Some(self.major)
    }

    fn logical_dimensions(&self) -> usize {
        1
    }

    fn multi_index_archives(&self) -> bool {
        true
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        Ok(vec![self.packing.pack(self.major, file.minor, file.subid)?])
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        check_dimensions(id, 1)?;
        Ok(self.packing.unpack(self.major, id[0]))
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        check_range(start, end, 1)?;
        filerange(
            source,
            self.packing.unpack(self.major, start[0]),
            self.packing.unpack(self.major, end[0]),
        )
        .await
    }
}

/// Logical id `[minor]`, one record per archive at subfile 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoArchiveIndex {
    major: u32,
}

impl NoArchiveIndex {
    pub fn new(major: u32) -> Self {
        Self { major }
    }
}

impl Sealed for NoArchiveIndex {}
impl Reversible for NoArchiveIndex {}

#[async_trait]
impl AddressStrategy for NoArchiveIndex {
    fn major(&self) -> Option<u32> {
        Some(self.major)
    }

    fn logical_dimensions(&self) -> usize {
        1
    }

    fn multi_index_archives(&self) -> bool {
        false
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        if file.subid != 0 {
            return Err(AddressError::NonZeroSubfile(file));
        }
        Ok(vec![file.minor])
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        check_dimensions(id, 1)?;
        Ok(FileId::new(self.major, id[0], 0))
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        check_range(start, end, 1)?;
        filerange(
            source,
            FileId::new(self.major, start[0], 0),
            FileId::new(self.major, end[0], 0),
        )
        .await
    }
}

/// Logical id `[subfile]` inside one fixed archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SingleMinorIndex {
    major: u32,
    minor: u32,
}

impl SingleMinorIndex {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Sealed for SingleMinorIndex {}
impl Reversible for SingleMinorIndex {}

#[async_trait]
impl AddressStrategy for SingleMinorIndex {
    fn major(&self) -> Option<u32> {
        Some(self.major)
    }

    fn logical_dimensions(&self) -> usize {
        1
    }

    fn multi_index_archives(&self) -> bool {
        false
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        Ok(vec![file.subid])
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        check_dimensions(id, 1)?;
        Ok(FileId::new(self.major, self.minor, id[0]))
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        check_range(start, end, 1)?;
        filerange(
            source,
            FileId::new(self.major, self.minor, start[0]),
            FileId::new(self.major, self.minor, end[0]),
        )
        .await
    }
}

/// Logical id `[major, minor, subfile]`, the physical coordinate itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawIndex;

impl Sealed for RawIndex {}
impl Reversible for RawIndex {}

#[async_trait]
impl AddressStrategy for RawIndex {
    fn major(&self) -> Option<u32> {
        None
    }

    fn logical_dimensions(&self) -> usize {
        3
    }

    fn multi_index_archives(&self) -> bool {
        false
    }

    fn file_to_logical(&self, file: FileId) -> Result<LogicalIndex, AddressError> {
        Ok(vec![file.major, file.minor, file.subid])
    }

    fn logical_to_file(&self, id: &[u32]) -> Result<FileId, AddressError> {
        check_dimensions(id, 3)?;
        Ok(FileId::new(id[0], id[1], id[2]))
    }

    async fn logical_range_to_files(
        &self,
        source: &dyn CacheFileSource,
        start: &[u32],
        end: &[u32],
    ) -> Result<Vec<CacheFileRef>, LookupError> {
        check_range(start, end, 3)?;
        filerange(
            source,
            FileId::new(start[0], start[1], start[2]),
            FileId::new(end[0], end[1], end[2]),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::major, source::MemorySource};

    #[test]
    fn test_standard_round_trip() {
        let lookup = StandardIndex::new(major::FRAMES);
        let file = FileId::new(major::FRAMES, 12, 7);

        assert_eq!(vec![12, 7], lookup.file_to_logical(file).unwrap());
        assert_eq!(file, lookup.logical_to_file(&[12, 7]).unwrap());
        assert_eq!(
            Err(AddressError::Dimensions {
                expected: 2,
                found: 1
            }),
            lookup.logical_to_file(&[12])
        );
    }

    #[test]
    fn test_no_archive_rejects_subfile() {
        let lookup = NoArchiveIndex::new(major::MODELS);
        let file = FileId::new(major::MODELS, 3, 1);

        assert_eq!(Err(AddressError::NonZeroSubfile(file)), lookup.file_to_logical(file));
        assert_eq!(
            vec![3],
            lookup.file_to_logical(FileId::new(major::MODELS, 3, 0)).unwrap()
        );
    }

    #[tokio::test]
    async fn test_chunked_range_spans_archives() {
        let source = MemorySource::new()
            .with_archive(major::ITEMS, 0, [(254, vec![]), (255, vec![])])
            .with_archive(major::ITEMS, 1, [(0, vec![]), (1, vec![]), (2, vec![])]);
        let lookup = ChunkedIndex::new(major::ITEMS);

        let files = lookup
            .logical_range_to_files(&source, &[255], &[257])
            .await
            .unwrap();
        let ids: Vec<LogicalIndex> = files
            .iter()
            .map(|f| lookup.file_to_logical(f.file_id().unwrap()).unwrap())
            .collect();

        assert_eq!(vec![vec![255], vec![256], vec![257]], ids);
    }

    #[tokio::test]
    async fn test_single_minor_pins_archive() {
        let source = MemorySource::new()
            .with_archive(major::CONFIG, 11, [(0, vec![]), (4, vec![]), (8, vec![])])
            .with_archive(major::CONFIG, 12, [(4, vec![])]);
        let lookup = SingleMinorIndex::new(major::CONFIG, 11);

        let files = lookup
            .logical_range_to_files(&source, &[1], &[8])
            .await
            .unwrap();

        assert_eq!(2, files.len());
        assert!(files.iter().all(|f| f.index.minor == 11));
    }

    #[tokio::test]
    async fn test_raw_rejects_two_majors() {
        let source = MemorySource::new();

        assert!(matches!(
            RawIndex
                .logical_range_to_files(&source, &[2, 0, 0], &[3, 0, 0])
                .await,
            Err(LookupError::Address(AddressError::MultipleMajors { .. }))
        ));
    }
}
